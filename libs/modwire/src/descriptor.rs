//! Declarative module description records.

use serde::{Deserialize, Serialize};

/// Declarative description of a module before resolution.
///
/// Produced by the configuration collaborator or built by caller code, and
/// discarded once registration completes; only the resolved module instance
/// persists in the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    /// Logical module identity; compared case-insensitively.
    pub name: String,
    /// Simple name of the code unit defining the module's implementation.
    pub code_unit: String,
    /// Gate for all downstream processing; disabled descriptors are skipped
    /// silently.
    #[serde(default)]
    pub enabled: bool,
}

impl ModuleDescriptor {
    /// Shorthand for an enabled descriptor.
    #[must_use]
    pub fn enabled(name: impl Into<String>, code_unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code_unit: code_unit.into(),
            enabled: true,
        }
    }

    /// Case-insensitive name match against a resolved module instance.
    #[must_use]
    pub fn matches_name(&self, candidate: &str) -> bool {
        self.name.eq_ignore_ascii_case(candidate)
    }
}
