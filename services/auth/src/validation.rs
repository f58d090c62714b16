//! Input validation
//!
//! Raw forms are checked field by field and turned into typed inputs. The
//! credential store and session authority only accept the typed values, so
//! anything that reaches them already satisfies the field rules.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// A single field that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every field error found in one form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience for a form with exactly one bad field
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// Record the outcome of a field check
    pub fn check(&mut self, field: &'static str, result: Result<(), String>) {
        if let Err(message) = result {
            self.add(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", messages.join("; "))
    }
}

/// Validate username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    let length = username.chars().count();
    if !(2..=20).contains(&length) {
        return Err("Username must be between 2 and 20 characters long".to_string());
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 120 {
        return Err("Email must be at most 120 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email address".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    Ok(())
}

/// Validate that the confirmation repeats the password
pub fn validate_confirmation(password: &str, confirmation: &str) -> Result<(), String> {
    if confirmation.is_empty() {
        return Err("Please confirm the password".to_string());
    }

    if password != confirmation {
        return Err("Field must be equal to password".to_string());
    }

    Ok(())
}

/// Validate an uploaded picture filename; only jpg and png are accepted
pub fn validate_picture_filename(filename: &str) -> Result<(), String> {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("jpg") | Some("png") => Ok(()),
        _ => Err("Only jpg and png images are allowed".to_string()),
    }
}

/// Registration form as submitted
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// Validated registration input
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegistrationForm {
    pub fn validate(self) -> Result<Registration, ValidationErrors> {
        let username = self.username.trim().to_string();
        let email = self.email.trim().to_string();

        let mut errors = ValidationErrors::new();
        errors.check("username", validate_username(&username));
        errors.check("email", validate_email(&email));
        errors.check("password", validate_password(&self.password));
        errors.check(
            "confirm_password",
            validate_confirmation(&self.password, &self.confirm_password),
        );

        errors.into_result(Registration {
            username,
            email,
            password: self.password,
        })
    }
}

/// Login form as submitted
#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, deserialize_with = "checkbox")]
    pub remember: bool,
}

/// A present checkbox is checked unless its value is empty or `false`
fn checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();
    Ok(!(raw.is_empty() || raw.eq_ignore_ascii_case("false")))
}

/// Validated login input
#[derive(Debug, Clone)]
pub struct Login {
    pub email: String,
    pub password: String,
    pub remember: bool,
}

impl LoginForm {
    pub fn validate(self) -> Result<Login, ValidationErrors> {
        let email = self.email.trim().to_string();

        let mut errors = ValidationErrors::new();
        errors.check("email", validate_email(&email));
        errors.check("password", validate_password(&self.password));

        errors.into_result(Login {
            email,
            password: self.password,
            remember: self.remember,
        })
    }
}

/// Uploaded picture as received from the client
#[derive(Debug, Clone)]
pub struct PictureUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Account update form as submitted
#[derive(Debug, Clone, Default)]
pub struct AccountForm {
    pub username: String,
    pub email: String,
    pub picture: Option<PictureUpload>,
}

/// Validated account update
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub username: String,
    pub email: String,
    pub picture: Option<PictureUpload>,
}

impl AccountForm {
    pub fn validate(self) -> Result<ProfileUpdate, ValidationErrors> {
        let username = self.username.trim().to_string();
        let email = self.email.trim().to_string();

        let mut errors = ValidationErrors::new();
        errors.check("username", validate_username(&username));
        errors.check("email", validate_email(&email));

        // an empty file input means "keep the current picture"
        let picture = self.picture.filter(|p| !p.bytes.is_empty());
        if let Some(picture) = &picture {
            errors.check("picture", validate_picture_filename(&picture.filename));
        }

        errors.into_result(ProfileUpdate {
            username,
            email,
            picture,
        })
    }
}

/// Password reset request form
#[derive(Debug, Clone, Deserialize)]
pub struct ResetRequestForm {
    #[serde(default)]
    pub email: String,
}

/// Validated reset request
#[derive(Debug, Clone)]
pub struct ResetRequest {
    pub email: String,
}

impl ResetRequestForm {
    pub fn validate(self) -> Result<ResetRequest, ValidationErrors> {
        let email = self.email.trim().to_string();

        let mut errors = ValidationErrors::new();
        errors.check("email", validate_email(&email));

        errors.into_result(ResetRequest { email })
    }
}

/// New password form used with a reset token
#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordForm {
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// Validated replacement password
#[derive(Debug, Clone)]
pub struct NewPassword(pub String);

impl ResetPasswordForm {
    pub fn validate(self) -> Result<NewPassword, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("password", validate_password(&self.password));
        errors.check(
            "confirm_password",
            validate_confirmation(&self.password, &self.confirm_password),
        );

        errors.into_result(NewPassword(self.password))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_length_bounds() {
        assert!(validate_username("").is_err());
        assert!(validate_username("a").is_err());
        assert!(validate_username("ab").is_ok());
        assert!(validate_username(&"x".repeat(20)).is_ok());
        assert!(validate_username(&"x".repeat(21)).is_err());
        // counted in characters, not bytes
        assert!(validate_username("éé").is_ok());
    }

    #[test]
    fn checkbox_accepts_usual_checked_values() {
        use serde::de::IntoDeserializer;
        use serde::de::value::{Error, StrDeserializer};

        let checked = |raw: &str| {
            let deserializer: StrDeserializer<'_, Error> = raw.into_deserializer();
            checkbox(deserializer).unwrap()
        };

        assert!(checked("y"));
        assert!(checked("on"));
        assert!(checked("1"));
        assert!(checked("true"));
        assert!(!checked("false"));
        assert!(!checked("FALSE"));
        assert!(!checked(""));
    }

    #[test]
    fn email_format() {
        assert!(validate_email("corey@example.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("a@b").is_err());
    }

    #[test]
    fn registration_reports_every_bad_field() {
        let form = RegistrationForm {
            username: "x".to_string(),
            email: "nope".to_string(),
            password: "secret".to_string(),
            confirm_password: "other".to_string(),
        };

        let errors = form.validate().unwrap_err();
        assert!(errors.has_field("username"));
        assert!(errors.has_field("email"));
        assert!(errors.has_field("confirm_password"));
        assert!(!errors.has_field("password"));
    }

    #[test]
    fn registration_trims_identity_fields() {
        let registration = RegistrationForm {
            username: "  corey ".to_string(),
            email: " corey@example.com".to_string(),
            password: " pass ".to_string(),
            confirm_password: " pass ".to_string(),
        }
        .validate()
        .unwrap();

        assert_eq!(registration.username, "corey");
        assert_eq!(registration.email, "corey@example.com");
        // passwords are taken verbatim
        assert_eq!(registration.password, " pass ");
    }

    #[test]
    fn account_picture_must_be_jpg_or_png() {
        let form = AccountForm {
            username: "corey".to_string(),
            email: "corey@example.com".to_string(),
            picture: Some(PictureUpload {
                filename: "me.gif".to_string(),
                bytes: vec![1, 2, 3],
            }),
        };
        assert!(form.validate().unwrap_err().has_field("picture"));

        let form = AccountForm {
            username: "corey".to_string(),
            email: "corey@example.com".to_string(),
            picture: Some(PictureUpload {
                filename: "ME.PNG".to_string(),
                bytes: vec![1, 2, 3],
            }),
        };
        assert!(form.validate().unwrap().picture.is_some());
    }

    #[test]
    fn empty_picture_is_ignored() {
        let update = AccountForm {
            username: "corey".to_string(),
            email: "corey@example.com".to_string(),
            picture: Some(PictureUpload {
                filename: String::new(),
                bytes: Vec::new(),
            }),
        }
        .validate()
        .unwrap();

        assert!(update.picture.is_none());
    }

    #[test]
    fn reset_password_needs_matching_confirmation() {
        let form = ResetPasswordForm {
            password: "new-pass".to_string(),
            confirm_password: "new-pas".to_string(),
        };
        assert!(form.validate().unwrap_err().has_field("confirm_password"));

        let form = ResetPasswordForm {
            password: "new-pass".to_string(),
            confirm_password: "new-pass".to_string(),
        };
        assert_eq!(form.validate().unwrap().0, "new-pass");
    }
}
