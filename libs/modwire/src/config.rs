//! Configuration collaborator: materializing descriptors from named sections.
//!
//! Two mechanisms are provided:
//!
//! 1. [`FigmentSource`] — over a [`figment::Figment`] provider stack (YAML,
//!    JSON, env), for applications with a real configuration file.
//! 2. [`JsonSource`] — over a raw `serde_json::Value` document, for callers
//!    that already hold their configuration as JSON sections.
//!
//! In both, an absent section is the empty case (zero descriptors), never an
//! error; a present-but-malformed section is.

use figment::Figment;

use crate::descriptor::ModuleDescriptor;

/// Configuration extraction failure.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The section exists but does not extract into module descriptors.
    #[error("invalid module descriptors in section '{section}'")]
    Extract {
        section: String,
        #[source]
        source: Box<figment::Error>,
    },

    /// The JSON section does not deserialize into module descriptors.
    #[error("section '{section}' does not deserialize into module descriptors")]
    Deserialize {
        section: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Source of declarative module descriptions.
pub trait DescriptorSource: Send + Sync {
    /// Materialize the ordered descriptor sequence at `section`.
    ///
    /// # Errors
    /// Only when the section is present but malformed; absence yields an
    /// empty vector.
    fn descriptors(&self, section: &str) -> Result<Vec<ModuleDescriptor>, ConfigError>;

    /// Materialize a single descriptor at `section`.
    ///
    /// # Errors
    /// Only when the section is present but malformed; absence yields
    /// `None`.
    fn descriptor(&self, section: &str) -> Result<Option<ModuleDescriptor>, ConfigError>;
}

/// Descriptor source over a figment provider stack.
pub struct FigmentSource {
    figment: Figment,
}

impl FigmentSource {
    #[must_use]
    pub fn new(figment: Figment) -> Self {
        Self { figment }
    }
}

impl DescriptorSource for FigmentSource {
    fn descriptors(&self, section: &str) -> Result<Vec<ModuleDescriptor>, ConfigError> {
        match self.figment.extract_inner::<Vec<ModuleDescriptor>>(section) {
            Ok(descriptors) => Ok(descriptors),
            Err(error) if is_missing(&error) => Ok(Vec::new()),
            Err(error) => Err(ConfigError::Extract {
                section: section.to_owned(),
                source: Box::new(error),
            }),
        }
    }

    fn descriptor(&self, section: &str) -> Result<Option<ModuleDescriptor>, ConfigError> {
        match self.figment.extract_inner::<ModuleDescriptor>(section) {
            Ok(descriptor) => Ok(Some(descriptor)),
            Err(error) if is_missing(&error) => Ok(None),
            Err(error) => Err(ConfigError::Extract {
                section: section.to_owned(),
                source: Box::new(error),
            }),
        }
    }
}

fn is_missing(error: &figment::Error) -> bool {
    matches!(error.kind, figment::error::Kind::MissingField(_))
}

/// Descriptor source over a raw JSON document.
pub struct JsonSource {
    root: serde_json::Value,
}

impl JsonSource {
    #[must_use]
    pub fn new(root: serde_json::Value) -> Self {
        Self { root }
    }
}

impl DescriptorSource for JsonSource {
    fn descriptors(&self, section: &str) -> Result<Vec<ModuleDescriptor>, ConfigError> {
        match self.root.get(section) {
            None | Some(serde_json::Value::Null) => Ok(Vec::new()),
            Some(value) => {
                serde_json::from_value(value.clone()).map_err(|source| ConfigError::Deserialize {
                    section: section.to_owned(),
                    source,
                })
            }
        }
    }

    fn descriptor(&self, section: &str) -> Result<Option<ModuleDescriptor>, ConfigError> {
        match self.root.get(section) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|source| ConfigError::Deserialize {
                    section: section.to_owned(),
                    source,
                }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use figment::providers::Serialized;
    use serde_json::json;

    fn figment_source(value: serde_json::Value) -> FigmentSource {
        FigmentSource::new(Figment::from(Serialized::defaults(value)))
    }

    #[test]
    fn figment_extracts_descriptor_sequences() {
        let source = figment_source(json!({
            "modules": [
                {"name": "Billing", "code_unit": "billing", "enabled": true},
                {"name": "Shipping", "code_unit": "shipping"},
            ]
        }));

        let descriptors = source.descriptors("modules").unwrap();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0], ModuleDescriptor::enabled("Billing", "billing"));
        assert!(!descriptors[1].enabled);
    }

    #[test]
    fn figment_treats_missing_section_as_empty() {
        let source = figment_source(json!({}));
        assert!(source.descriptors("modules").unwrap().is_empty());
        assert!(source.descriptor("module").unwrap().is_none());
    }

    #[test]
    fn figment_surfaces_malformed_sections() {
        let source = figment_source(json!({"modules": {"not": "an array"}}));
        let err = source.descriptors("modules").unwrap_err();
        assert!(matches!(err, ConfigError::Extract { ref section, .. } if section == "modules"));
    }

    #[test]
    fn figment_extracts_single_descriptors() {
        let source = figment_source(json!({
            "module": {"name": "Billing", "code_unit": "billing", "enabled": true}
        }));
        let descriptor = source.descriptor("module").unwrap().unwrap();
        assert_eq!(descriptor, ModuleDescriptor::enabled("Billing", "billing"));
    }

    #[test]
    fn json_source_mirrors_the_same_semantics() {
        let source = JsonSource::new(json!({
            "modules": [{"name": "Billing", "code_unit": "billing", "enabled": true}],
            "broken": 42,
        }));

        assert_eq!(
            source.descriptors("modules").unwrap(),
            vec![ModuleDescriptor::enabled("Billing", "billing")]
        );
        assert!(source.descriptors("absent").unwrap().is_empty());
        assert!(source.descriptor("absent").unwrap().is_none());
        assert!(source.descriptors("broken").is_err());
    }
}
