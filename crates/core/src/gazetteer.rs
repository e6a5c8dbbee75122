//! Geographic categorization of free-text addresses.
//!
//! Addresses are matched against a static province → municipality list by
//! case-insensitive substring search. The first municipality found, scanning
//! provinces and municipalities in list order, wins. When no municipality
//! matches but a province name does, the address lands in that province's
//! "Other" bucket; otherwise it goes to "Other Locations".

use once_cell::sync::Lazy;
use serde::Serialize;

/// Bucket for addresses outside the gazetteer.
pub const OTHER_LOCATIONS: &str = "Other Locations";

/// A province and its municipalities/cities, in match order.
#[derive(Debug, Clone)]
pub struct Province {
    pub name: String,
    pub municipalities: Vec<String>,
    name_lower: String,
    municipalities_lower: Vec<String>,
}

impl Province {
    #[must_use]
    pub fn new(name: &str, municipalities: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            municipalities: municipalities.iter().map(ToString::to_string).collect(),
            name_lower: name.to_lowercase(),
            municipalities_lower: municipalities.iter().map(|m| m.to_lowercase()).collect(),
        }
    }
}

/// Position of an address in the gazetteer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Province index, `None` for "Other Locations".
    pub province: Option<usize>,
    /// Municipality index within the province, `None` for the province's
    /// "Other" bucket.
    pub municipality: Option<usize>,
}

/// Province/municipality pair assigned to an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub province: String,
    pub municipality: String,
}

/// Node of the sunburst hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationNode {
    pub name: String,
    pub value: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<LocationNode>,
}

impl LocationNode {
    fn leaf(name: String, value: u64) -> Self {
        Self {
            name,
            value,
            children: Vec::new(),
        }
    }
}

/// Static lookup table of provinces.
#[derive(Debug, Clone)]
pub struct Gazetteer {
    provinces: Vec<Province>,
}

impl Gazetteer {
    #[must_use]
    pub const fn new(provinces: Vec<Province>) -> Self {
        Self { provinces }
    }

    /// Province names in match order.
    pub fn province_names(&self) -> impl Iterator<Item = &str> {
        self.provinces.iter().map(|p| p.name.as_str())
    }

    /// Locate an address. Deterministic: linear scan in list order.
    #[must_use]
    pub fn locate(&self, address: &str) -> Placement {
        let haystack = address.trim().to_lowercase();
        if haystack.is_empty() {
            return Placement {
                province: None,
                municipality: None,
            };
        }

        for (pi, province) in self.provinces.iter().enumerate() {
            if let Some(mi) = province
                .municipalities_lower
                .iter()
                .position(|m| haystack.contains(m.as_str()))
            {
                return Placement {
                    province: Some(pi),
                    municipality: Some(mi),
                };
            }
        }

        let province = self
            .provinces
            .iter()
            .position(|p| haystack.contains(p.name_lower.as_str()));

        Placement {
            province,
            municipality: None,
        }
    }

    /// Province and municipality names for an address.
    #[must_use]
    pub fn categorize(&self, address: &str) -> Location {
        self.name_of(self.locate(address))
    }

    fn name_of(&self, placement: Placement) -> Location {
        match placement.province {
            Some(pi) => {
                let province = &self.provinces[pi];
                let municipality = placement.municipality.map_or_else(
                    || format!("Other {}", province.name),
                    |mi| province.municipalities[mi].clone(),
                );
                Location {
                    province: province.name.clone(),
                    municipality,
                }
            }
            None => Location {
                province: OTHER_LOCATIONS.to_string(),
                municipality: OTHER_LOCATIONS.to_string(),
            },
        }
    }

    /// Build the two-level sunburst tree for a set of addresses.
    ///
    /// Provinces keep gazetteer order with "Other Locations" last; within a
    /// province, municipalities keep gazetteer order with the province's
    /// "Other" bucket last. Empty branches are omitted.
    pub fn sunburst<'a, I>(&self, addresses: I) -> LocationNode
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        // counts[province][municipality]; the extra trailing slot in each
        // dimension holds the "Other" bucket.
        let mut counts: Vec<Vec<u64>> = self
            .provinces
            .iter()
            .map(|p| vec![0; p.municipalities.len() + 1])
            .collect();
        let mut other_locations = 0u64;

        for address in addresses {
            let placement = self.locate(address.unwrap_or_default());
            match placement.province {
                Some(pi) => {
                    let slot = placement
                        .municipality
                        .unwrap_or(self.provinces[pi].municipalities.len());
                    counts[pi][slot] += 1;
                }
                None => other_locations += 1,
            }
        }

        let mut children: Vec<LocationNode> = self
            .provinces
            .iter()
            .zip(&counts)
            .filter_map(|(province, row)| {
                let value: u64 = row.iter().sum();
                if value == 0 {
                    return None;
                }
                let leaves = row
                    .iter()
                    .enumerate()
                    .filter(|(_, count)| **count > 0)
                    .map(|(mi, count)| {
                        let name = province
                            .municipalities
                            .get(mi)
                            .cloned()
                            .unwrap_or_else(|| format!("Other {}", province.name));
                        LocationNode::leaf(name, *count)
                    })
                    .collect();
                Some(LocationNode {
                    name: province.name.clone(),
                    value,
                    children: leaves,
                })
            })
            .collect();

        if other_locations > 0 {
            children.push(LocationNode {
                name: OTHER_LOCATIONS.to_string(),
                value: other_locations,
                children: vec![LocationNode::leaf(
                    OTHER_LOCATIONS.to_string(),
                    other_locations,
                )],
            });
        }

        LocationNode {
            name: "All Locations".to_string(),
            value: children.iter().map(|c| c.value).sum(),
            children,
        }
    }
}

static DEFAULT_GAZETTEER: Lazy<Gazetteer> = Lazy::new(|| {
    Gazetteer::new(vec![
        Province::new(
            "Bukidnon",
            &[
                "Malaybalay",
                "Valencia",
                "Manolo Fortich",
                "Maramag",
                "Quezon",
                "Don Carlos",
                "Lantapan",
                "Impasugong",
                "Sumilao",
                "Talakag",
                "Baungon",
                "Libona",
                "Kalilangan",
                "Pangantucan",
                "Dangcagan",
                "Kibawe",
                "Kadingilan",
                "Damulog",
                "Kitaotao",
                "San Fernando",
                "Cabanglasan",
                "Malitbog",
            ],
        ),
        Province::new(
            "Misamis Oriental",
            &[
                "Cagayan de Oro",
                "Gingoog",
                "El Salvador",
                "Opol",
                "Tagoloan",
                "Villanueva",
                "Jasaan",
                "Balingasag",
                "Claveria",
                "Alubijid",
                "Laguindingan",
                "Initao",
                "Manticao",
                "Naawan",
                "Lugait",
                "Libertad",
                "Medina",
                "Talisayan",
                "Balingoan",
                "Magsaysay",
                "Kinoguitan",
                "Lagonglong",
                "Salay",
                "Gitagum",
            ],
        ),
        Province::new(
            "Misamis Occidental",
            &[
                "Oroquieta",
                "Ozamiz",
                "Tangub",
                "Clarin",
                "Jimenez",
                "Aloran",
                "Baliangao",
                "Bonifacio",
                "Calamba",
                "Lopez Jaena",
                "Panaon",
                "Plaridel",
                "Sapang Dalaga",
                "Sinacaban",
                "Tudela",
            ],
        ),
        Province::new(
            "Lanao del Norte",
            &[
                "Iligan",
                "Tubod",
                "Kapatagan",
                "Kolambugan",
                "Maigo",
                "Bacolod",
                "Linamon",
                "Kauswagan",
                "Lala",
                "Baroy",
                "Sultan Naga Dimaporo",
            ],
        ),
        Province::new(
            "Camiguin",
            &["Mambajao", "Catarman", "Guinsiliban", "Mahinog", "Sagay"],
        ),
    ])
});

/// The gazetteer shipped with the portal.
#[must_use]
pub fn default_gazetteer() -> &'static Gazetteer {
    &DEFAULT_GAZETTEER
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> Gazetteer {
        Gazetteer::new(vec![
            Province::new("Bukidnon", &["Malaybalay", "Valencia"]),
            Province::new("Misamis Oriental", &["Cagayan de Oro", "Opol"]),
        ])
    }

    #[test]
    fn test_categorize_municipality_match() {
        let g = small();
        let loc = g.categorize("Purok 4, Brgy. Poblacion, VALENCIA CITY, Bukidnon");
        assert_eq!(loc.province, "Bukidnon");
        assert_eq!(loc.municipality, "Valencia");
    }

    #[test]
    fn test_categorize_province_only() {
        let g = small();
        let loc = g.categorize("Brgy. Lumbia, Misamis Oriental");
        assert_eq!(loc.province, "Misamis Oriental");
        assert_eq!(loc.municipality, "Other Misamis Oriental");
    }

    #[test]
    fn test_categorize_unknown() {
        let g = small();
        let loc = g.categorize("Davao City");
        assert_eq!(loc.province, OTHER_LOCATIONS);
        assert_eq!(loc.municipality, OTHER_LOCATIONS);
        assert_eq!(g.categorize("   ").province, OTHER_LOCATIONS);
    }

    #[test]
    fn test_first_match_wins() {
        let g = small();
        // Mentions municipalities of both provinces; Bukidnon is scanned first.
        let loc = g.categorize("Opol, formerly of Malaybalay");
        assert_eq!(loc.municipality, "Malaybalay");
    }

    #[test]
    fn test_categorize_is_deterministic() {
        let g = default_gazetteer();
        let address = "Zone 2, Cagayan de Oro City";
        let first = g.categorize(address);
        for _ in 0..10 {
            assert_eq!(g.categorize(address), first);
        }
        assert_eq!(first.province, "Misamis Oriental");
    }

    #[test]
    fn test_sunburst_structure() {
        let g = small();
        let tree = g.sunburst([
            Some("Opol"),
            Some("Valencia City"),
            Some("Malaybalay"),
            Some("valencia"),
            Some("Bukidnon"),
            None,
            Some("Manila"),
        ]);

        assert_eq!(tree.value, 7);
        let names: Vec<_> = tree.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Bukidnon", "Misamis Oriental", "Other Locations"]);

        let bukidnon = &tree.children[0];
        assert_eq!(bukidnon.value, 4);
        let leaves: Vec<_> = bukidnon
            .children
            .iter()
            .map(|c| (c.name.as_str(), c.value))
            .collect();
        assert_eq!(
            leaves,
            [("Malaybalay", 1), ("Valencia", 2), ("Other Bukidnon", 1)]
        );

        assert_eq!(tree.children[2].value, 2);
    }
}
