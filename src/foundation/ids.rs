use std::fmt;

/// Opaque subject identifier; ordering is plain lexicographic string order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct CaseId(String);

impl CaseId {
    /// Wrap a case identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Why this id cannot name a file directly inside the output directory,
    /// or `None` if it can.
    pub fn file_stem_problem(&self) -> Option<&'static str> {
        let id = self.0.as_str();
        if id.is_empty() {
            Some("is empty")
        } else if id.contains(['/', '\\']) {
            Some("contains a path separator")
        } else if id.starts_with('.') {
            Some("starts with '.'")
        } else if id.contains('\0') {
            Some("contains a NUL byte")
        } else {
            None
        }
    }

    /// File name of this case's rendered artifact (`<id>.png`).
    pub fn artifact_file_name(&self) -> String {
        format!("{}.png", self.0)
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CaseId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CaseId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for CaseId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/ids.rs"]
mod tests;
