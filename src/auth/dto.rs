use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    auth::{repo_types::User, services::is_valid_email},
    error::{
        non_blank_text, ApiError, FieldErrors, BLANK, INVALID_EMAIL, REQUIRED, TOO_LONG,
    },
    fields,
};

pub const MAX_LEN: usize = 255;
pub const MIN_PASSWORD_LEN: usize = 5;
pub const SHORT_PASSWORD: &str = "Ensure this field has at least 5 characters.";
pub const BAD_CREDENTIALS: &str = "Unable to authenticate with provided credentials.";

/// Body for user creation and profile updates. Every field is an optional raw
/// value so that missing or mistyped fields surface as field-level messages.
#[derive(Debug, Default, Deserialize)]
pub struct UserPayload {
    pub email: Option<Value>,
    pub password: Option<Value>,
    pub name: Option<Value>,
}

/// Validated subset of `UserPayload`; `None` means "leave unchanged".
#[derive(Debug, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

impl UserPayload {
    /// With `partial == false` every field is required.
    pub fn validate(self, partial: bool) -> Result<UserChanges, ApiError> {
        let mut errors = FieldErrors::default();

        let email = match self.email {
            Some(v) => fields::text(&mut errors, "email", v)
                .and_then(|e| validate_email(&mut errors, e)),
            None if !partial => {
                errors.add("email", REQUIRED);
                None
            }
            None => None,
        };
        let password = match self.password {
            Some(v) => fields::text(&mut errors, "password", v)
                .and_then(|p| validate_password(&mut errors, p)),
            None if !partial => {
                errors.add("password", REQUIRED);
                None
            }
            None => None,
        };
        let name = match self.name {
            Some(v) => fields::text(&mut errors, "name", v)
                .and_then(|n| non_blank_text(&mut errors, "name", n, MAX_LEN)),
            None if !partial => {
                errors.add("name", REQUIRED);
                None
            }
            None => None,
        };

        errors.into_result()?;
        Ok(UserChanges {
            email,
            password,
            name,
        })
    }
}

pub fn validate_email(errors: &mut FieldErrors, value: String) -> Option<String> {
    let v = value.trim();
    if v.is_empty() {
        errors.add("email", BLANK);
        None
    } else if v.chars().count() > MAX_LEN {
        errors.add("email", TOO_LONG);
        None
    } else if !is_valid_email(v) {
        errors.add("email", INVALID_EMAIL);
        None
    } else {
        Some(v.to_string())
    }
}

/// Trims before the length check; only the token endpoint keeps passwords verbatim.
pub fn validate_password(errors: &mut FieldErrors, value: String) -> Option<String> {
    let v = value.trim();
    if v.is_empty() {
        errors.add("password", BLANK);
        None
    } else if v.chars().count() < MIN_PASSWORD_LEN {
        errors.add("password", SHORT_PASSWORD);
        None
    } else {
        Some(v.to_string())
    }
}

/// Email and password checks for accounts created outside the HTTP API.
pub fn validate_credentials(email: String, password: String) -> Result<(String, String), ApiError> {
    let mut errors = FieldErrors::default();
    let email = validate_email(&mut errors, email);
    let password = validate_password(&mut errors, password);
    errors.into_result()?;
    Ok((email.unwrap_or_default(), password.unwrap_or_default()))
}

/// Request body for `POST /user/token/`.
#[derive(Debug, Default, Deserialize)]
pub struct TokenRequest {
    pub email: Option<Value>,
    pub password: Option<Value>,
}

impl TokenRequest {
    /// Shape checks only; credentials are checked by `authenticate`.
    pub fn validate(self) -> Result<(String, String), ApiError> {
        let mut errors = FieldErrors::default();
        let email = match self.email {
            Some(v) => fields::text(&mut errors, "email", v)
                .and_then(|e| validate_email(&mut errors, e)),
            None => {
                errors.add("email", REQUIRED);
                None
            }
        };
        // no trimming here: the password is compared as sent
        let password = match self.password {
            Some(v) => match fields::text(&mut errors, "password", v) {
                Some(p) if p.is_empty() => {
                    errors.add("password", BLANK);
                    None
                }
                p => p,
            },
            None => {
                errors.add("password", REQUIRED);
                None
            }
        };
        errors.into_result()?;
        Ok((email.unwrap_or_default(), password.unwrap_or_default()))
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub email: String,
    pub name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            name: user.name,
        }
    }
}
