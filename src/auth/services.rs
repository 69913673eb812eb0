use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        password::{hash_password, verify_password},
        repo_types::{NewUser, User},
    },
    error::{ApiError, FieldErrors},
    store::UserRepository,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex compiles");
    }
    EMAIL_RE.is_match(email)
}

/// Lower-cases the domain part of an address; the local part is kept verbatim.
pub fn normalize_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Non-credential columns for a new user.
#[derive(Debug, Clone)]
pub struct UserFields {
    pub name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl Default for UserFields {
    fn default() -> Self {
        Self {
            name: String::new(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
        }
    }
}

impl UserFields {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

pub async fn create_user(
    users: &dyn UserRepository,
    email: &str,
    password: &str,
    fields: UserFields,
) -> Result<User, ApiError> {
    if email.is_empty() {
        return Err(ApiError::Validation(FieldErrors::single(
            "email",
            "Users must have an email address.",
        )));
    }

    let new_user = NewUser {
        email: normalize_email(email),
        name: fields.name,
        password_hash: hash_password(password)?,
        is_active: fields.is_active,
        is_staff: fields.is_staff,
        is_superuser: fields.is_superuser,
    };
    let user = users.insert_user(new_user).await?;
    info!(user_id = %user.id, email = %user.email, "user created");
    Ok(user)
}

pub async fn create_superuser(
    users: &dyn UserRepository,
    email: &str,
    password: &str,
    name: &str,
) -> Result<User, ApiError> {
    let fields = UserFields {
        name: name.to_string(),
        is_staff: true,
        is_superuser: true,
        ..UserFields::default()
    };
    create_user(users, email, password, fields).await
}

/// Returns the active user whose password matches, if any.
pub async fn authenticate(
    users: &dyn UserRepository,
    email: &str,
    password: &str,
) -> Result<Option<User>, ApiError> {
    let email = normalize_email(email);
    let Some(user) = users.find_user_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Ok(None);
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Ok(None);
    }
    if !user.is_active {
        warn!(user_id = %user.id, "login inactive user");
        return Ok(None);
    }
    Ok(Some(user))
}

/// Stamps `last_login`; every other column is left as stored.
pub async fn record_login(users: &dyn UserRepository, user_id: Uuid) -> Result<User, ApiError> {
    users
        .touch_last_login(user_id)
        .await?
        .ok_or(ApiError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::{password::verify_password, repo_types::UserUpdate},
        store::MemoryStore,
    };

    fn deactivate() -> UserUpdate {
        UserUpdate {
            is_active: Some(false),
            ..UserUpdate::default()
        }
    }

    #[test]
    fn normalize_email_lowercases_domain_only() {
        let samples = [
            ("test1@EXAMPLE.com", "test1@example.com"),
            ("Test2@Example.com", "Test2@example.com"),
            ("TEST3@EXAMPLE.COM", "TEST3@example.com"),
            ("test4@example.com", "test4@example.com"),
            ("no-at-sign", "no-at-sign"),
        ];
        for (input, expected) in samples {
            assert_eq!(normalize_email(input), expected);
        }
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("test@example.com"));
        assert!(!is_valid_email("test@example"));
        assert!(!is_valid_email("not an email"));
        assert!(!is_valid_email(""));
    }

    #[tokio::test]
    async fn create_user_with_email_successful() {
        let store = MemoryStore::new();
        let user = create_user(
            &store,
            "test@example.com",
            "testingPassword@123",
            UserFields::default(),
        )
        .await
        .unwrap();
        assert_eq!(user.email, "test@example.com");
        assert_ne!(user.password_hash, "testingPassword@123");
        assert!(verify_password("testingPassword@123", &user.password_hash).unwrap());
        assert!(user.is_active);
        assert!(!user.is_staff);
        assert!(!user.is_superuser);
    }

    #[tokio::test]
    async fn create_user_normalizes_email() {
        let store = MemoryStore::new();
        let user = create_user(&store, "Test2@Example.com", "sample123", UserFields::default())
            .await
            .unwrap();
        assert_eq!(user.email, "Test2@example.com");
    }

    #[tokio::test]
    async fn create_user_without_email_fails() {
        let store = MemoryStore::new();
        let err = create_user(&store, "", "test123", UserFields::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(store.list_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_superuser_sets_flags() {
        let store = MemoryStore::new();
        let user = create_superuser(&store, "test1@example.com", "test1@123", "")
            .await
            .unwrap();
        assert!(user.is_staff);
        assert!(user.is_superuser);
        assert!(user.is_active);
    }

    #[tokio::test]
    async fn authenticate_checks_password_and_activity() {
        let store = MemoryStore::new();
        let user = create_user(&store, "a@example.com", "secret1", UserFields::default())
            .await
            .unwrap();

        assert!(authenticate(&store, "a@example.com", "secret1")
            .await
            .unwrap()
            .is_some());
        assert!(authenticate(&store, "a@EXAMPLE.com", "secret1")
            .await
            .unwrap()
            .is_some());
        assert!(authenticate(&store, "a@example.com", "wrong")
            .await
            .unwrap()
            .is_none());
        assert!(authenticate(&store, "b@example.com", "secret1")
            .await
            .unwrap()
            .is_none());

        store.update_user(user.id, &deactivate()).await.unwrap();
        assert!(authenticate(&store, "a@example.com", "secret1")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn record_login_sets_timestamp() {
        let store = MemoryStore::new();
        let user = create_user(&store, "a@example.com", "secret1", UserFields::default())
            .await
            .unwrap();
        assert!(user.last_login.is_none());
        let user = record_login(&store, user.id).await.unwrap();
        assert!(user.last_login.is_some());
    }

    #[tokio::test]
    async fn record_login_does_not_undo_concurrent_edits() {
        let store = MemoryStore::new();
        create_user(&store, "a@example.com", "secret1", UserFields::default())
            .await
            .unwrap();
        let authed = authenticate(&store, "a@example.com", "secret1")
            .await
            .unwrap()
            .unwrap();

        // operator deactivates and the password changes before the login is stamped
        store.update_user(authed.id, &deactivate()).await.unwrap();
        let rehash = UserUpdate {
            password_hash: Some(hash_password("changed1").unwrap()),
            ..UserUpdate::default()
        };
        store.update_user(authed.id, &rehash).await.unwrap();

        let stored = record_login(&store, authed.id).await.unwrap();
        assert!(stored.last_login.is_some());
        assert!(!stored.is_active);
        assert!(verify_password("changed1", &stored.password_hash).unwrap());
        assert!(!verify_password("secret1", &stored.password_hash).unwrap());
    }
}
