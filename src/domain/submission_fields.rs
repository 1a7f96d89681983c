use serde_json::Value;

/// Every field a form may send, coerced to trimmed strings. Missing fields
/// are empty, never absent, so downstream code has one case to handle.
///
/// Wire names follow the browser scripts: the honeypot is `hp` and the
/// challenge token is `turnstileToken`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionFields {
    pub email: String,
    pub name: String,
    pub subject: String,
    pub message: String,
    pub honeypot: String,
    pub challenge_token: String,
}

impl SubmissionFields {
    /// A body that is valid JSON but not an object yields all-empty fields.
    pub fn from_json(body: &Value) -> Self {
        let field = |key: &str| coerce(body.get(key)).trim().to_string();
        Self {
            email: normalize_email(&field("email")),
            name: field("name"),
            subject: field("subject"),
            message: field("message"),
            honeypot: field("hp"),
            challenge_token: field("turnstileToken"),
        }
    }
}

/// Idempotent: normalising an already normalised address is a no-op.
pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

// falsy values (null, false, "") and structured values count as missing
fn coerce(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(true)) => "true".to_string(),
        _ => String::new(),
    }
}
