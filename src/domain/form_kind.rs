use std::fmt::Display;

/// The two public forms. Everything that differs between them (rules,
/// quotas, messages) hangs off this enum rather than off a second handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormKind {
    Newsletter,
    Contact,
}

impl FormKind {
    /// Contact submissions carry a subject and message; newsletter signups
    /// don't.
    pub fn collects_message(&self) -> bool { matches!(self, Self::Contact) }

    pub fn requires_name(&self) -> bool { matches!(self, Self::Contact) }
}

impl Display for FormKind {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                FormKind::Newsletter => "newsletter",
                FormKind::Contact => "contact",
            }
        )
    }
}
