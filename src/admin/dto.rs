use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::{
        dto::{validate_email, validate_password, MAX_LEN},
        repo_types::User,
    },
    error::{non_blank_text, ApiError, FieldErrors, REQUIRED},
    fields,
};

/// Operator view of a user row.
#[derive(Debug, Serialize)]
pub struct AdminUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login: Option<OffsetDateTime>,
}

impl From<User> for AdminUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            is_active: u.is_active,
            is_staff: u.is_staff,
            is_superuser: u.is_superuser,
            last_login: u.last_login,
        }
    }
}

/// Add/edit form. `last_login` is not accepted.
#[derive(Debug, Default, Deserialize)]
pub struct AdminUserPayload {
    pub email: Option<Value>,
    pub password: Option<Value>,
    pub name: Option<Value>,
    pub is_active: Option<Value>,
    pub is_staff: Option<Value>,
    pub is_superuser: Option<Value>,
}

#[derive(Debug, Default)]
pub struct AdminUserChanges {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
}

impl AdminUserPayload {
    /// Adding requires email and password; `name` may be blank here.
    pub fn validate(self, adding: bool) -> Result<AdminUserChanges, ApiError> {
        let mut errors = FieldErrors::default();

        let email = match self.email {
            Some(v) => fields::text(&mut errors, "email", v)
                .and_then(|e| validate_email(&mut errors, e)),
            None if adding => {
                errors.add("email", REQUIRED);
                None
            }
            None => None,
        };
        let password = match self.password {
            Some(v) => fields::text(&mut errors, "password", v)
                .and_then(|p| validate_password(&mut errors, p)),
            None if adding => {
                errors.add("password", REQUIRED);
                None
            }
            None => None,
        };
        let name = match self.name.and_then(|v| fields::text(&mut errors, "name", v)) {
            Some(n) if adding && n.trim().is_empty() => Some(String::new()),
            Some(n) => non_blank_text(&mut errors, "name", n, MAX_LEN),
            None => None,
        };
        let is_active = self
            .is_active
            .and_then(|v| fields::boolean(&mut errors, "is_active", v));
        let is_staff = self
            .is_staff
            .and_then(|v| fields::boolean(&mut errors, "is_staff", v));
        let is_superuser = self
            .is_superuser
            .and_then(|v| fields::boolean(&mut errors, "is_superuser", v));

        errors.into_result()?;
        Ok(AdminUserChanges {
            email,
            password,
            name,
            is_active,
            is_staff,
            is_superuser,
        })
    }
}
