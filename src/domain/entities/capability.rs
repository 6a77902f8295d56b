use std::fmt;

/// Granted to suspended members
pub const BANNED: &str = "banned";

/// Baseline capability for every member with a record
pub const SIGNED_UP: &str = "signed-up";

/// Honors enrichment capability
pub const HONORS: &str = "ib";

/// Suffix of standard-level course capabilities
pub const STANDARD_LEVEL: &str = "-sl";

/// Suffix of higher-level course capabilities
pub const HIGHER_LEVEL: &str = "-hl";

/// Resolved reference to a capability (role) inside one scope
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CapabilityHandle {
    pub id: String,
    pub name: String,
}

impl CapabilityHandle {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Whether the suspend path revokes this capability.
    ///
    /// Covers every course capability the member holds, not only the ones
    /// listed in their record, plus the honors and baseline capabilities.
    pub fn is_stripped_on_suspend(&self) -> bool {
        is_course_capability(&self.name) || self.name == HONORS || self.name == SIGNED_UP
    }
}

impl fmt::Display for CapabilityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

pub fn is_course_capability(name: &str) -> bool {
    name.ends_with(STANDARD_LEVEL) || name.ends_with(HIGHER_LEVEL)
}

/// Capability names for a course offered at both levels
pub fn course_levels(course: &str) -> [String; 2] {
    [
        format!("{}{}", course, STANDARD_LEVEL),
        format!("{}{}", course, HIGHER_LEVEL),
    ]
}
