mod contact_message;
mod form_kind;
mod new_submission;
mod submission_fields;
mod subscriber_email;
mod subscriber_name;
mod validation_error;
// allow external `use` statements to skip `new_submission` etc
pub use contact_message::ContactMessage;
pub use contact_message::MessageBody;
pub use contact_message::MessageSubject;
pub use form_kind::FormKind;
pub use new_submission::NewSubmission;
pub use submission_fields::SubmissionFields;
pub use subscriber_email::SubscriberEmail;
pub use subscriber_name::SubscriberName;
pub use validation_error::ValidationError;
