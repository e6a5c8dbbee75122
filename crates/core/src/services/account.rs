//! Account service: registration, sign-in and approval.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use gad_common::{AppError, AppResult, IdGenerator, config::BootstrapConfig};
use gad_db::{
    entities::{
        notification::NotificationKind,
        user::{self, ApprovalStatus, UserRole},
    },
    repositories::UserRepository,
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::services::{
    activity_log::{ActivityEntry, ActivityLogService},
    notification::NotificationService,
};

/// Account service for business logic.
#[derive(Clone)]
pub struct AccountService {
    user_repo: UserRepository,
    notification_service: NotificationService,
    activity_log: ActivityLogService,
    id_gen: IdGenerator,
}

/// Input for self-registration.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupInput {
    #[validate(length(min = 3, max = 64))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1, max = 256))]
    pub name: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Input for signing in with a username or email.
#[derive(Debug, Deserialize, Validate)]
pub struct SigninInput {
    #[validate(length(min = 1))]
    pub login: String,

    #[validate(length(min = 1))]
    pub password: String,
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        notification_service: NotificationService,
        activity_log: ActivityLogService,
    ) -> Self {
        Self {
            user_repo,
            notification_service,
            activity_log,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new account awaiting administrator approval.
    pub async fn signup(&self, input: SignupInput) -> AppResult<user::Model> {
        input.validate()?;

        let username = input.username.trim().to_string();
        let email = input.email.trim().to_lowercase();

        if self.user_repo.exists(&username, &email).await? {
            return Err(AppError::Conflict(
                "Username or email already registered".to_string(),
            ));
        }

        let password_hash = hash_password(&input.password)?;

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(username),
            email: Set(email),
            name: Set(input.name.trim().to_string()),
            password: Set(password_hash),
            token: Set(None),
            role: Set(UserRole::User),
            approval_status: Set(ApprovalStatus::Pending),
            is_verified: Set(false),
            reviewed_by: Set(None),
            reviewed_at: Set(None),
            last_login_at: Set(None),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };

        let user = self.user_repo.create(model).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "New registration pending approval");

        if let Err(e) = self
            .notification_service
            .notify_admins(
                NotificationKind::RegistrationPending,
                "New registration",
                &format!("{} ({}) is waiting for approval.", user.name, user.username),
            )
            .await
        {
            tracing::warn!(error = %e, "Failed to notify administrators of registration");
        }

        Ok(user)
    }

    /// Sign in and return the user with a valid access token.
    pub async fn signin(&self, input: SigninInput) -> AppResult<(user::Model, String)> {
        input.validate()?;

        let user = self
            .user_repo
            .find_by_login(input.login.trim())
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(&input.password, &user.password)? {
            tracing::debug!(user_id = %user.id, "Sign-in rejected: wrong password");
            return Err(AppError::Unauthorized);
        }

        match user.approval_status {
            ApprovalStatus::Approved => {}
            ApprovalStatus::Pending => {
                return Err(AppError::Forbidden(
                    "Account is pending approval".to_string(),
                ));
            }
            ApprovalStatus::Rejected => {
                return Err(AppError::Forbidden(
                    "Account registration was rejected".to_string(),
                ));
            }
        }

        let token = user
            .token
            .clone()
            .unwrap_or_else(|| self.id_gen.generate_token());

        let mut active: user::ActiveModel = user.into();
        active.token = Set(Some(token.clone()));
        active.last_login_at = Set(Some(chrono::Utc::now().into()));
        let user = self.user_repo.update(active).await?;

        tracing::info!(user_id = %user.id, "User signed in");
        Ok((user, token))
    }

    /// Resolve an access token to an approved user.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .filter(|u| u.approval_status == ApprovalStatus::Approved)
            .ok_or(AppError::Unauthorized)
    }

    /// Invalidate the current token by rotating it.
    pub async fn signout(&self, user_id: &str) -> AppResult<()> {
        let user = self.user_repo.get_by_id(user_id).await?;
        let mut active: user::ActiveModel = user.into();
        active.token = Set(Some(self.id_gen.generate_token()));
        active.updated_at = Set(Some(chrono::Utc::now().into()));
        self.user_repo.update(active).await?;
        Ok(())
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// List users, optionally filtered by approval status.
    pub async fn list(
        &self,
        status: Option<ApprovalStatus>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<user::Model>> {
        self.user_repo.find_by_status(status, limit, offset).await
    }

    /// Count registrations awaiting review.
    pub async fn count_pending(&self) -> AppResult<u64> {
        self.user_repo.count_by_status(ApprovalStatus::Pending).await
    }

    /// Approve a pending registration.
    pub async fn approve(&self, reviewer_id: &str, user_id: &str) -> AppResult<user::Model> {
        let user = self.review(reviewer_id, user_id, ApprovalStatus::Approved).await?;

        if let Err(e) = self
            .notification_service
            .notify(
                &user.id,
                NotificationKind::AccountApproved,
                "Account approved",
                "Your account has been approved. You can now sign in.",
            )
            .await
        {
            tracing::warn!(error = %e, user_id = %user.id, "Failed to send approval notification");
        }

        Ok(user)
    }

    /// Reject a pending registration.
    pub async fn reject(&self, reviewer_id: &str, user_id: &str) -> AppResult<user::Model> {
        let user = self.review(reviewer_id, user_id, ApprovalStatus::Rejected).await?;

        if let Err(e) = self
            .notification_service
            .notify(
                &user.id,
                NotificationKind::AccountRejected,
                "Account rejected",
                "Your registration was not approved.",
            )
            .await
        {
            tracing::warn!(error = %e, user_id = %user.id, "Failed to send rejection notification");
        }

        Ok(user)
    }

    async fn review(
        &self,
        reviewer_id: &str,
        user_id: &str,
        decision: ApprovalStatus,
    ) -> AppResult<user::Model> {
        let user = self.user_repo.get_by_id(user_id).await?;

        if user.approval_status != ApprovalStatus::Pending {
            return Err(AppError::BadRequest(
                "Registration already reviewed".to_string(),
            ));
        }

        let now = chrono::Utc::now();
        let mut active: user::ActiveModel = user.into();
        active.approval_status = Set(decision);
        active.is_verified = Set(decision == ApprovalStatus::Approved);
        active.reviewed_by = Set(Some(reviewer_id.to_string()));
        active.reviewed_at = Set(Some(now.into()));
        active.updated_at = Set(Some(now.into()));

        let user = self.user_repo.update(active).await?;

        let action = match decision {
            ApprovalStatus::Approved => "user.approve",
            _ => "user.reject",
        };
        self.activity_log
            .record(
                ActivityEntry::success(Some(reviewer_id), action, "user")
                    .entity(&user.id)
                    .details(user.username.clone()),
            )
            .await;

        tracing::info!(user_id = %user.id, reviewer_id = %reviewer_id, action, "Registration reviewed");
        Ok(user)
    }

    /// Change the role of another user.
    pub async fn set_role(
        &self,
        actor_id: &str,
        user_id: &str,
        role: UserRole,
    ) -> AppResult<user::Model> {
        if actor_id == user_id {
            return Err(AppError::BadRequest(
                "You cannot change your own role".to_string(),
            ));
        }

        let user = self.user_repo.get_by_id(user_id).await?;
        let mut active: user::ActiveModel = user.into();
        active.role = Set(role);
        active.updated_at = Set(Some(chrono::Utc::now().into()));
        let user = self.user_repo.update(active).await?;

        self.activity_log
            .record(
                ActivityEntry::success(Some(actor_id), "user.role", "user")
                    .entity(&user.id)
                    .details(format!("{role:?}")),
            )
            .await;

        Ok(user)
    }

    /// Create the configured administrator when no administrator exists yet.
    pub async fn ensure_bootstrap_admin(
        &self,
        bootstrap: &BootstrapConfig,
    ) -> AppResult<Option<user::Model>> {
        if !self.user_repo.find_admins().await?.is_empty() {
            return Ok(None);
        }

        let now = chrono::Utc::now();
        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(bootstrap.username.clone()),
            email: Set(bootstrap.email.to_lowercase()),
            name: Set(bootstrap.username.clone()),
            password: Set(hash_password(&bootstrap.password)?),
            token: Set(None),
            role: Set(UserRole::Admin),
            approval_status: Set(ApprovalStatus::Approved),
            is_verified: Set(true),
            reviewed_by: Set(None),
            reviewed_at: Set(Some(now.into())),
            last_login_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };

        let admin = self.user_repo.create(model).await?;
        tracing::info!(username = %admin.username, "Created bootstrap administrator");
        Ok(Some(admin))
    }
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gad_db::repositories::{ActivityLogRepository, NotificationRepository};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;

    fn service(db: DatabaseConnection) -> AccountService {
        let db = Arc::new(db);
        let user_repo = UserRepository::new(Arc::clone(&db));
        AccountService::new(
            user_repo.clone(),
            NotificationService::new(NotificationRepository::new(Arc::clone(&db)), user_repo),
            ActivityLogService::new(ActivityLogRepository::new(db)),
        )
    }

    fn create_test_user(status: ApprovalStatus, password: &str) -> user::Model {
        user::Model {
            id: "user1".to_string(),
            username: "maria".to_string(),
            email: "maria@example.edu".to_string(),
            name: "Maria Clara".to_string(),
            password: hash_password(password).unwrap(),
            token: None,
            role: UserRole::User,
            approval_status: status,
            is_verified: status == ApprovalStatus::Approved,
            reviewed_by: None,
            reviewed_at: None,
            last_login_at: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_hash_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }

    #[test]
    fn test_signup_validation() {
        let input = SignupInput {
            username: "ma".to_string(),
            email: "not-an-email".to_string(),
            name: "Maria".to_string(),
            password: "short".to_string(),
        };
        assert!(input.validate().is_err());
    }

    #[tokio::test]
    async fn test_signup_conflict() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(1))
            }]])
            .into_connection();

        let result = service(db)
            .signup(SignupInput {
                username: "maria".to_string(),
                email: "maria@example.edu".to_string(),
                name: "Maria Clara".to_string(),
                password: "longenough".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_signin_pending_is_forbidden() {
        let user = create_test_user(ApprovalStatus::Pending, "longenough");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user]])
            .into_connection();

        let result = service(db)
            .signin(SigninInput {
                login: "maria".to_string(),
                password: "longenough".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_signin_wrong_password() {
        let user = create_test_user(ApprovalStatus::Approved, "longenough");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user]])
            .into_connection();

        let result = service(db)
            .signin(SigninInput {
                login: "maria".to_string(),
                password: "incorrect".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_signin_approved_issues_token() {
        let user = create_test_user(ApprovalStatus::Approved, "longenough");
        let mut updated = user.clone();
        updated.token = Some("issued".to_string());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user]])
            .append_query_results([[updated]])
            .into_connection();

        let (user, token) = service(db)
            .signin(SigninInput {
                login: "maria".to_string(),
                password: "longenough".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(user.id, "user1");
        assert_eq!(token.len(), 32);
    }

    #[tokio::test]
    async fn test_token_of_pending_user_is_rejected() {
        let mut user = create_test_user(ApprovalStatus::Pending, "longenough");
        user.token = Some("tok".to_string());
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user]])
            .into_connection();

        let result = service(db).authenticate_by_token("tok").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_review_twice_is_bad_request() {
        let user = create_test_user(ApprovalStatus::Approved, "longenough");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user]])
            .into_connection();

        let result = service(db).approve("admin1", "user1").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_cannot_change_own_role() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let result = service(db).set_role("admin1", "admin1", UserRole::User).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
