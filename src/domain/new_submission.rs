use super::ContactMessage;
use super::FormKind;
use super::MessageBody;
use super::MessageSubject;
use super::SubmissionFields;
use super::SubscriberEmail;
use super::SubscriberName;
use super::ValidationError;

/// A submission that passed every rule for its form. Nothing is forwarded
/// upstream until one of these exists.
#[derive(Debug)]
pub struct NewSubmission {
    pub email: SubscriberEmail,
    pub name: Option<SubscriberName>,
    /// Only ever `Some` for `FormKind::Contact`
    pub message: Option<ContactMessage>,
}

impl NewSubmission {
    /// The first failing rule wins. The email comes first, then every lower
    /// bound, then every upper bound, so a visitor who left fields blank is
    /// told about those before being told something else is too long.
    pub fn parse(
        kind: FormKind,
        fields: SubmissionFields,
    ) -> Result<Self, ValidationError> {
        let email = SubscriberEmail::parse(fields.email)?;

        if !kind.collects_message() {
            let name = match kind.requires_name() {
                true => Some(SubscriberName::parse(fields.name)?),
                false => SubscriberName::parse_optional(fields.name)?,
            };
            return Ok(Self {
                email,
                name,
                message: None,
            });
        }

        SubscriberName::ensure_present(&fields.name)?;
        MessageSubject::ensure_present(&fields.subject)?;
        MessageBody::ensure_present(&fields.message)?;

        let name = SubscriberName::parse(fields.name)?;
        let subject = MessageSubject::parse(fields.subject)?;
        let body = MessageBody::parse(fields.message)?;

        Ok(Self {
            email,
            name: Some(name),
            message: Some(ContactMessage { subject, body }),
        })
    }
}
