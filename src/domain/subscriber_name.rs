use unicode_segmentation::UnicodeSegmentation;

use super::ValidationError;

/// A visitor-supplied display name. Lengths are counted in graphemes, so
/// "José" is 4 long regardless of how the accent is encoded.
///
/// Must be instantiated with `SubscriberName::parse` (required, contact form)
/// or `SubscriberName::parse_optional` (newsletter form). The field is left
/// private, to prevent bypassing of either.
#[derive(Debug, Clone)]
pub struct SubscriberName(String);

impl SubscriberName {
    pub const MIN_LENGTH: usize = 2;
    pub const MAX_LENGTH: usize = 80;

    /// Only the lower bound; lets a form check every required field before
    /// any upper bound.
    pub fn ensure_present(name: &str) -> Result<(), ValidationError> {
        match name.graphemes(true).count() < Self::MIN_LENGTH {
            true => Err(ValidationError::NameRequired),
            false => Ok(()),
        }
    }

    pub fn parse(name: String) -> Result<Self, ValidationError> {
        Self::ensure_present(&name)?;
        Self::within_bounds(name)
    }

    /// An empty name is simply absent; anything else must fit.
    pub fn parse_optional(name: String) -> Result<Option<Self>, ValidationError> {
        match name.is_empty() {
            true => Ok(None),
            false => Self::within_bounds(name).map(Some),
        }
    }

    fn within_bounds(name: String) -> Result<Self, ValidationError> {
        match name.graphemes(true).count() > Self::MAX_LENGTH {
            true => Err(ValidationError::NameTooLong),
            false => Ok(Self(name)),
        }
    }
}

impl AsRef<str> for SubscriberName {
    fn as_ref(&self) -> &str { &self.0 }
}
