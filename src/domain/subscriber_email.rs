use once_cell::sync::Lazy;
use regex::Regex;

use super::ValidationError;

/// `local@domain.tld`: no whitespace, exactly one `@`, and at least one `.`
/// after it. Deliberately loose; the upstream API does the real checking.
static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// An address that has passed the shape check. Expected to be normalised
/// (trimmed, lower-cased) before parsing; see `SubmissionFields`.
#[derive(Debug, Clone)]
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    pub fn parse(email: String) -> Result<Self, ValidationError> {
        match !email.is_empty() && EMAIL_SHAPE.is_match(&email) {
            true => Ok(Self(email)),
            false => Err(ValidationError::InvalidEmail),
        }
    }
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str { &self.0 }
}
