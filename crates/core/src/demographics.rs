//! Demographic aggregation.
//!
//! Pure functions that bucket flat participant and employee records into
//! chart-ready rows of `{category, male, female, total}`.
//!
//! Every breakdown counts only records whose sex is recognized. The
//! ethnicity and province charts cover all of them, so their totals equal
//! [`SexTotals::total_recognized`]. The age chart also needs an age in a
//! known band; its total is `total_recognized - excluded_from_age`.
//! Records with an unrecognized sex are reported as
//! `excluded_from_sex_totals`.

use std::collections::HashMap;

use gad_db::entities::{
    employee,
    participant::{self, ParticipantType},
};
use serde::Serialize;

use crate::gazetteer::Gazetteer;

/// Normalized sex of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
    Unrecognized,
}

impl Sex {
    /// Trimmed, case-insensitive match against `male` and `female`.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("male") => Self::Male,
            Some("female") => Self::Female,
            _ => Self::Unrecognized,
        }
    }
}

/// Fixed age bands, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeBand {
    Under18,
    From18To24,
    From25To34,
    From35To44,
    From45To54,
    Over55,
}

impl AgeBand {
    pub const ALL: [Self; 6] = [
        Self::Under18,
        Self::From18To24,
        Self::From25To34,
        Self::From35To44,
        Self::From45To54,
        Self::Over55,
    ];

    /// Band for an age; `None` when the age is missing or negative.
    #[must_use]
    pub const fn from_age(age: Option<i32>) -> Option<Self> {
        match age {
            Some(a) if a < 0 => None,
            Some(0..=17) => Some(Self::Under18),
            Some(18..=24) => Some(Self::From18To24),
            Some(25..=34) => Some(Self::From25To34),
            Some(35..=44) => Some(Self::From35To44),
            Some(45..=54) => Some(Self::From45To54),
            Some(_) => Some(Self::Over55),
            None => None,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Under18 => "Under 18",
            Self::From18To24 => "18-24",
            Self::From25To34 => "25-34",
            Self::From35To44 => "35-44",
            Self::From45To54 => "45-54",
            Self::Over55 => "55+",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Highest educational attainment buckets, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EducationLevel {
    Elementary,
    HighSchool,
    Vocational,
    College,
    Masters,
    Doctorate,
    Unspecified,
}

impl EducationLevel {
    pub const ALL: [Self; 7] = [
        Self::Elementary,
        Self::HighSchool,
        Self::Vocational,
        Self::College,
        Self::Masters,
        Self::Doctorate,
        Self::Unspecified,
    ];

    /// Keyword match, checked from the highest level down.
    #[must_use]
    pub fn classify(raw: Option<&str>) -> Self {
        let Some(text) = raw.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty()) else {
            return Self::Unspecified;
        };

        let has = |words: &[&str]| words.iter().any(|w| text.contains(w));

        if has(&["doctor", "phd", "ph.d", "ed.d", "edd"]) {
            Self::Doctorate
        } else if has(&["master", "mba", "graduate studies"]) {
            Self::Masters
        } else if has(&["college", "bachelor", "baccalaureate", "undergraduate", "degree"]) {
            Self::College
        } else if has(&["vocational", "tesda", "technical"]) {
            Self::Vocational
        } else if has(&["high school", "secondary", "senior high", "junior high"]) {
            Self::HighSchool
        } else if has(&["elementary", "primary", "grade school"]) {
            Self::Elementary
        } else {
            Self::Unspecified
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Elementary => "Elementary",
            Self::HighSchool => "High School",
            Self::Vocational => "Vocational",
            Self::College => "College",
            Self::Masters => "Master's",
            Self::Doctorate => "Doctorate",
            Self::Unspecified => "Unspecified",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// One chart row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemographicBucket {
    pub category: String,
    pub male: u64,
    pub female: u64,
    /// Always `male + female`.
    pub total: u64,
}

impl DemographicBucket {
    fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            male: 0,
            female: 0,
            total: 0,
        }
    }

    fn add(&mut self, sex: Sex) {
        match sex {
            Sex::Male => self.male += 1,
            Sex::Female => self.female += 1,
            Sex::Unrecognized => return,
        }
        self.total += 1;
    }
}

/// Sex counts over a dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SexTotals {
    pub male: u64,
    pub female: u64,
    pub unrecognized: u64,
    pub total_recognized: u64,
}

/// All breakdowns of one dataset, computed together.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemographicSummary {
    pub total_records: u64,
    pub excluded_from_sex_totals: u64,
    /// Recognized sex but no age that falls in an age band.
    pub excluded_from_age: u64,
    pub sex: SexTotals,
    pub by_age: Vec<DemographicBucket>,
    pub by_ethnicity: Vec<DemographicBucket>,
    pub by_province: Vec<DemographicBucket>,
}

/// Read access to the demographic fields of a record.
pub trait DemographicRecord {
    fn sex(&self) -> Option<&str>;
    fn age(&self) -> Option<i32>;
    fn ethnic_group(&self) -> Option<&str>;
    fn other_ethnic_group(&self) -> Option<&str> {
        None
    }
    fn address(&self) -> Option<&str>;
}

impl DemographicRecord for participant::Model {
    fn sex(&self) -> Option<&str> {
        self.sex.as_deref()
    }
    fn age(&self) -> Option<i32> {
        self.age
    }
    fn ethnic_group(&self) -> Option<&str> {
        self.ethnic_group.as_deref()
    }
    fn other_ethnic_group(&self) -> Option<&str> {
        self.other_ethnic_group.as_deref()
    }
    fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }
}

impl DemographicRecord for employee::Model {
    fn sex(&self) -> Option<&str> {
        self.sex.as_deref()
    }
    fn age(&self) -> Option<i32> {
        self.age
    }
    fn ethnic_group(&self) -> Option<&str> {
        self.ethnic_group.as_deref()
    }
    fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }
}

/// Count records by sex.
pub fn sex_totals<R: DemographicRecord>(records: &[R]) -> SexTotals {
    let mut totals = SexTotals::default();
    for record in records {
        match Sex::parse(record.sex()) {
            Sex::Male => totals.male += 1,
            Sex::Female => totals.female += 1,
            Sex::Unrecognized => totals.unrecognized += 1,
        }
    }
    totals.total_recognized = totals.male + totals.female;
    totals
}

/// Age band by sex. Every band is present, in order, even when empty.
///
/// Only records with both a parseable age and a recognized sex are counted.
pub fn age_sex_breakdown<R: DemographicRecord>(records: &[R]) -> Vec<DemographicBucket> {
    let mut buckets: Vec<_> = AgeBand::ALL
        .iter()
        .map(|band| DemographicBucket::new(band.label()))
        .collect();

    for record in records {
        if let Some(band) = AgeBand::from_age(record.age()) {
            buckets[band.index()].add(Sex::parse(record.sex()));
        }
    }

    buckets
}

/// Ethnic group label of a record.
///
/// `Other`/`Others` defers to the free-text field; an empty group uses the
/// free-text field when present and `Unspecified` otherwise.
#[must_use]
pub fn ethnicity_label(ethnic_group: Option<&str>, other: Option<&str>) -> String {
    let group = ethnic_group.map(str::trim).filter(|s| !s.is_empty());
    let other = other.map(str::trim).filter(|s| !s.is_empty());

    match group {
        Some(g) if g.eq_ignore_ascii_case("other") || g.eq_ignore_ascii_case("others") => {
            other.unwrap_or("Other").to_string()
        }
        Some(g) => g.to_string(),
        None => other.unwrap_or("Unspecified").to_string(),
    }
}

/// Ethnic group by sex, largest first, ties by name.
///
/// Groups are matched case-insensitively; the first spelling seen is kept.
pub fn ethnicity_breakdown<R: DemographicRecord>(records: &[R]) -> Vec<DemographicBucket> {
    group_by(records, |r| {
        Some(ethnicity_label(r.ethnic_group(), r.other_ethnic_group()))
    })
}

/// Province by sex, in gazetteer order with "Other Locations" last.
pub fn province_breakdown<R: DemographicRecord>(
    records: &[R],
    gazetteer: &Gazetteer,
) -> Vec<DemographicBucket> {
    let mut buckets: Vec<_> = gazetteer
        .province_names()
        .chain(std::iter::once(crate::gazetteer::OTHER_LOCATIONS))
        .map(DemographicBucket::new)
        .collect();
    let other = buckets.len() - 1;

    for record in records {
        let index = gazetteer
            .locate(record.address().unwrap_or_default())
            .province
            .unwrap_or(other);
        buckets[index].add(Sex::parse(record.sex()));
    }

    buckets.retain(|b| b.total > 0);
    buckets
}

/// Highest educational attainment by sex, every level present in order.
pub fn education_breakdown(employees: &[employee::Model]) -> Vec<DemographicBucket> {
    let mut buckets: Vec<_> = EducationLevel::ALL
        .iter()
        .map(|level| DemographicBucket::new(level.label()))
        .collect();

    for employee in employees {
        let level = EducationLevel::classify(employee.education_level.as_deref());
        buckets[level.index()].add(Sex::parse(employee.sex.as_deref()));
    }

    buckets
}

/// Participant type by sex: students, staff/faculty, community members.
pub fn participant_type_breakdown(participants: &[participant::Model]) -> Vec<DemographicBucket> {
    let kinds = [
        ParticipantType::Student,
        ParticipantType::Staff,
        ParticipantType::Community,
    ];
    let mut buckets: Vec<_> = kinds
        .iter()
        .map(|k| DemographicBucket::new(k.label()))
        .collect();

    for p in participants {
        let index = match p.participant_type {
            ParticipantType::Student => 0,
            ParticipantType::Staff => 1,
            ParticipantType::Community => 2,
        };
        buckets[index].add(Sex::parse(p.sex.as_deref()));
    }

    buckets
}

/// Compute every breakdown of one dataset.
pub fn summarize<R: DemographicRecord>(records: &[R], gazetteer: &Gazetteer) -> DemographicSummary {
    let sex = sex_totals(records);

    DemographicSummary {
        total_records: records.len() as u64,
        excluded_from_sex_totals: sex.unrecognized,
        excluded_from_age: records
            .iter()
            .filter(|r| Sex::parse(r.sex()) != Sex::Unrecognized)
            .filter(|r| AgeBand::from_age(r.age()).is_none())
            .count() as u64,
        sex,
        by_age: age_sex_breakdown(records),
        by_ethnicity: ethnicity_breakdown(records),
        by_province: province_breakdown(records, gazetteer),
    }
}

fn group_by<R, F>(records: &[R], key: F) -> Vec<DemographicBucket>
where
    R: DemographicRecord,
    F: Fn(&R) -> Option<String>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<DemographicBucket> = Vec::new();

    for record in records {
        let sex = Sex::parse(record.sex());
        if sex == Sex::Unrecognized {
            continue;
        }
        let Some(label) = key(record) else { continue };
        let slot = *index.entry(label.to_lowercase()).or_insert_with(|| {
            buckets.push(DemographicBucket::new(label));
            buckets.len() - 1
        });
        buckets[slot].add(sex);
    }

    buckets.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gazetteer::default_gazetteer;

    #[derive(Default)]
    struct Person {
        sex: Option<&'static str>,
        age: Option<i32>,
        ethnic_group: Option<&'static str>,
        other: Option<&'static str>,
        address: Option<&'static str>,
    }

    impl DemographicRecord for Person {
        fn sex(&self) -> Option<&str> {
            self.sex
        }
        fn age(&self) -> Option<i32> {
            self.age
        }
        fn ethnic_group(&self) -> Option<&str> {
            self.ethnic_group
        }
        fn other_ethnic_group(&self) -> Option<&str> {
            self.other
        }
        fn address(&self) -> Option<&str> {
            self.address
        }
    }

    fn person(sex: &'static str, age: i32) -> Person {
        Person {
            sex: Some(sex),
            age: Some(age),
            ..Default::default()
        }
    }

    fn bucket<'a>(rows: &'a [DemographicBucket], category: &str) -> &'a DemographicBucket {
        rows.iter()
            .find(|b| b.category == category)
            .unwrap_or_else(|| panic!("missing bucket {category}"))
    }

    #[test]
    fn test_mixed_sex_example() {
        let people = [person("Male", 20), person("female", 45), person("other", 30)];

        let ages = age_sex_breakdown(&people);
        assert_eq!(bucket(&ages, "18-24").total, 1);
        assert_eq!(bucket(&ages, "18-24").male, 1);
        assert_eq!(bucket(&ages, "45-54").total, 1);
        assert_eq!(bucket(&ages, "45-54").female, 1);
        assert_eq!(bucket(&ages, "25-34").total, 0);

        let sex = sex_totals(&people);
        assert_eq!(sex.male, 1);
        assert_eq!(sex.female, 1);
        assert_eq!(sex.unrecognized, 1);
        assert_eq!(sex.total_recognized, 2);
    }

    #[test]
    fn test_sex_matching_is_case_insensitive() {
        let people = [person("MALE", 30), person("male", 30), person(" Male ", 30)];
        assert_eq!(sex_totals(&people).male, 3);
        assert_eq!(Sex::parse(Some("FeMaLe")), Sex::Female);
        assert_eq!(Sex::parse(None), Sex::Unrecognized);
        assert_eq!(Sex::parse(Some("M")), Sex::Unrecognized);
    }

    #[test]
    fn test_age_breakdown_keeps_all_bands_in_order() {
        let ages = age_sex_breakdown::<Person>(&[]);
        let labels: Vec<_> = ages.iter().map(|b| b.category.as_str()).collect();
        assert_eq!(labels, ["Under 18", "18-24", "25-34", "35-44", "45-54", "55+"]);
    }

    #[test]
    fn test_age_band_edges() {
        assert_eq!(AgeBand::from_age(Some(17)), Some(AgeBand::Under18));
        assert_eq!(AgeBand::from_age(Some(18)), Some(AgeBand::From18To24));
        assert_eq!(AgeBand::from_age(Some(54)), Some(AgeBand::From45To54));
        assert_eq!(AgeBand::from_age(Some(55)), Some(AgeBand::Over55));
        assert_eq!(AgeBand::from_age(Some(-1)), None);
        assert_eq!(AgeBand::from_age(None), None);
    }

    #[test]
    fn test_age_breakdown_sum_matches_countable_records() {
        let people = [
            person("male", 16),
            person("female", 70),
            person("Female", 33),
            person("unknown", 40),
            Person {
                sex: Some("male"),
                age: None,
                ..Default::default()
            },
            person("male", -4),
        ];

        let countable = people
            .iter()
            .filter(|p| {
                AgeBand::from_age(p.age).is_some() && Sex::parse(p.sex) != Sex::Unrecognized
            })
            .count() as u64;
        let sum: u64 = age_sex_breakdown(&people).iter().map(|b| b.total).sum();

        assert_eq!(sum, countable);
        assert_eq!(sum, 3);
    }

    #[test]
    fn test_ethnicity_fallbacks() {
        assert_eq!(ethnicity_label(Some("Higaonon"), None), "Higaonon");
        assert_eq!(ethnicity_label(Some("Others"), Some("Talaandig")), "Talaandig");
        assert_eq!(ethnicity_label(Some("other"), Some("  ")), "Other");
        assert_eq!(ethnicity_label(None, Some("Manobo")), "Manobo");
        assert_eq!(ethnicity_label(Some(" "), None), "Unspecified");
    }

    #[test]
    fn test_ethnicity_breakdown_sorted_by_total() {
        let make = |sex, group| Person {
            sex: Some(sex),
            ethnic_group: Some(group),
            ..Default::default()
        };
        let people = [
            make("male", "Cebuano"),
            make("female", "Higaonon"),
            make("female", "higaonon"),
            make("male", "Bisaya"),
            make("other", "Higaonon"),
        ];

        let rows = ethnicity_breakdown(&people);
        assert_eq!(rows[0].category, "Higaonon");
        assert_eq!(rows[0].female, 2);
        assert_eq!(rows[0].total, 2);
        assert_eq!(rows[1].category, "Bisaya");
        assert_eq!(rows[2].category, "Cebuano");
    }

    #[test]
    fn test_education_classification() {
        assert_eq!(
            EducationLevel::classify(Some("Doctor of Philosophy")),
            EducationLevel::Doctorate
        );
        assert_eq!(
            EducationLevel::classify(Some("Master's Degree")),
            EducationLevel::Masters
        );
        assert_eq!(
            EducationLevel::classify(Some("College Graduate")),
            EducationLevel::College
        );
        assert_eq!(
            EducationLevel::classify(Some("TESDA NC II")),
            EducationLevel::Vocational
        );
        assert_eq!(
            EducationLevel::classify(Some("Senior High School")),
            EducationLevel::HighSchool
        );
        assert_eq!(
            EducationLevel::classify(Some("elementary")),
            EducationLevel::Elementary
        );
        assert_eq!(EducationLevel::classify(None), EducationLevel::Unspecified);
    }

    #[test]
    fn test_summary_totals_agree() {
        let people = [
            Person {
                sex: Some("Male"),
                age: Some(21),
                ethnic_group: Some("Higaonon"),
                address: Some("Malaybalay City, Bukidnon"),
                ..Default::default()
            },
            Person {
                sex: Some("Female"),
                age: Some(29),
                address: Some("Somewhere abroad"),
                ..Default::default()
            },
            Person {
                sex: Some("N/A"),
                age: Some(29),
                ..Default::default()
            },
        ];

        let summary = summarize(&people, default_gazetteer());

        assert_eq!(summary.total_records, 3);
        assert_eq!(summary.excluded_from_sex_totals, 1);
        assert_eq!(summary.excluded_from_age, 0);
        let age_total: u64 = summary.by_age.iter().map(|b| b.total).sum();
        let ethnic_total: u64 = summary.by_ethnicity.iter().map(|b| b.total).sum();
        let province_total: u64 = summary.by_province.iter().map(|b| b.total).sum();
        assert_eq!(age_total, summary.sex.total_recognized);
        assert_eq!(ethnic_total, summary.sex.total_recognized);
        assert_eq!(province_total, summary.sex.total_recognized);
        assert_eq!(summary.by_province[0].category, "Bukidnon");
        assert_eq!(summary.by_province[1].category, "Other Locations");
    }

    #[test]
    fn test_summary_reports_records_without_age() {
        let people = [
            Person {
                sex: Some("Male"),
                age: Some(20),
                ..Default::default()
            },
            Person {
                sex: Some("Female"),
                ..Default::default()
            },
            Person {
                sex: Some("unknown"),
                ..Default::default()
            },
        ];

        let summary = summarize(&people, default_gazetteer());

        let age_total: u64 = summary.by_age.iter().map(|b| b.total).sum();
        let ethnic_total: u64 = summary.by_ethnicity.iter().map(|b| b.total).sum();
        assert_eq!(summary.sex.total_recognized, 2);
        assert_eq!(summary.excluded_from_age, 1);
        assert_eq!(summary.excluded_from_sex_totals, 1);
        assert_eq!(age_total, 1);
        assert_eq!(ethnic_total, summary.sex.total_recognized);
        assert_eq!(age_total + summary.excluded_from_age, summary.sex.total_recognized);
    }
}
