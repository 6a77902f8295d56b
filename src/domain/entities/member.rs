use std::fmt;

/// A current member of a scope, as reported by the membership service
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Member {
    pub id: String,
    pub scope: String,
    pub display_name: Option<String>,
}

impl Member {
    pub fn new(scope: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            scope: scope.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.display_name {
            Some(name) => write!(f, "{} ({})", name, self.id),
            None => write!(f, "{}", self.id),
        }
    }
}
