use unicode_segmentation::UnicodeSegmentation;

use super::ValidationError;

/// Subject line of a contact submission, 3 to 200 graphemes.
#[derive(Debug, Clone)]
pub struct MessageSubject(String);

impl MessageSubject {
    pub const MIN_LENGTH: usize = 3;
    pub const MAX_LENGTH: usize = 200;

    pub fn ensure_present(subject: &str) -> Result<(), ValidationError> {
        match subject.graphemes(true).count() < Self::MIN_LENGTH {
            true => Err(ValidationError::SubjectRequired),
            false => Ok(()),
        }
    }

    pub fn parse(subject: String) -> Result<Self, ValidationError> {
        Self::ensure_present(&subject)?;
        match subject.graphemes(true).count() > Self::MAX_LENGTH {
            true => Err(ValidationError::SubjectTooLong),
            false => Ok(Self(subject)),
        }
    }
}

impl AsRef<str> for MessageSubject {
    fn as_ref(&self) -> &str { &self.0 }
}

/// Free-form body of a contact submission, 10 to 2000 graphemes.
#[derive(Debug, Clone)]
pub struct MessageBody(String);

impl MessageBody {
    pub const MIN_LENGTH: usize = 10;
    pub const MAX_LENGTH: usize = 2000;

    pub fn ensure_present(body: &str) -> Result<(), ValidationError> {
        match body.graphemes(true).count() < Self::MIN_LENGTH {
            true => Err(ValidationError::MessageTooShort),
            false => Ok(()),
        }
    }

    pub fn parse(body: String) -> Result<Self, ValidationError> {
        Self::ensure_present(&body)?;
        match body.graphemes(true).count() > Self::MAX_LENGTH {
            true => Err(ValidationError::MessageTooLong),
            false => Ok(Self(body)),
        }
    }
}

impl AsRef<str> for MessageBody {
    fn as_ref(&self) -> &str { &self.0 }
}

#[derive(Debug)]
pub struct ContactMessage {
    pub subject: MessageSubject,
    pub body: MessageBody,
}
