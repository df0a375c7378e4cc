#![forbid(unsafe_code)]

//! Errors reported by the binding graph.

/// Reasons a binding request is refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// Following accessors from the target leads back to the key being
    /// bound, so get/set/notify would never terminate.
    Cycle { key: String, target_key: String },
}

impl std::fmt::Display for BindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cycle { key, target_key } => write!(
                f,
                "binding '{key}' to '{target_key}' would create a binding cycle"
            ),
        }
    }
}

impl std::error::Error for BindError {}
