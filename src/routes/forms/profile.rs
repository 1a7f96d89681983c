use std::time::Duration;

use crate::configuration::FormSettings;
use crate::configuration::FormsSettings;
use crate::domain::FormKind;

/// Everything the shared pipeline needs to know about one form: quota,
/// segmentation and the wording of its responses.
#[derive(Debug, Clone)]
pub struct FormProfile {
    pub kind: FormKind,
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
    pub group_id: Option<u64>,
}

impl FormProfile {
    pub fn new(
        kind: FormKind,
        settings: &FormSettings,
    ) -> Self {
        Self {
            kind,
            rate_limit_max: settings.rate_limit_max,
            rate_limit_window: settings.rate_limit_window(),
            group_id: settings.group_id,
        }
    }

    /// Namespaced per form, so the same client has separate quotas for each.
    pub fn rate_limit_key(
        &self,
        client_ip: &str,
    ) -> String {
        format!("{}:{client_ip}", self.kind)
    }

    pub fn success_message(&self) -> &'static str {
        match self.kind {
            FormKind::Newsletter => "Successfully subscribed to newsletter!",
            FormKind::Contact => "Thank you for your message! We'll get back to you soon.",
        }
    }

    /// Key under which the created upstream record is echoed back
    pub fn echo_key(&self) -> &'static str {
        match self.kind {
            FormKind::Newsletter => "subscriber",
            FormKind::Contact => "contact",
        }
    }

    /// Whether an address already known upstream is a failure. For contact
    /// messages it isn't: the message was still delivered.
    pub fn rejects_existing_email(&self) -> bool { matches!(self.kind, FormKind::Newsletter) }
}

/// Both profiles, shared with every worker via `web::Data`
#[derive(Debug, Clone)]
pub struct FormProfiles {
    pub newsletter: FormProfile,
    pub contact: FormProfile,
}

impl FormProfiles {
    pub fn from_settings(settings: &FormsSettings) -> Self {
        Self {
            newsletter: FormProfile::new(FormKind::Newsletter, &settings.newsletter),
            contact: FormProfile::new(FormKind::Contact, &settings.contact),
        }
    }
}
