/// Caller-induced validation failures. The `Display` text is safe to show to
/// the visitor; `code` is what the browser scripts branch on.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a valid email address.")]
    InvalidEmail,
    #[error("Please enter your name.")]
    NameRequired,
    #[error("Name must be 80 characters or fewer.")]
    NameTooLong,
    #[error("Please enter a subject.")]
    SubjectRequired,
    #[error("Subject must be 200 characters or fewer.")]
    SubjectTooLong,
    #[error("Message must be at least 10 characters.")]
    MessageTooShort,
    #[error("Message must be 2000 characters or fewer.")]
    MessageTooLong,
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidEmail => "invalid_email",
            Self::NameRequired => "name_required",
            Self::NameTooLong => "name_too_long",
            Self::SubjectRequired => "subject_required",
            Self::SubjectTooLong => "subject_too_long",
            Self::MessageTooShort => "message_too_short",
            Self::MessageTooLong => "message_too_long",
        }
    }
}
