//! Lowering options
//!
//! Loaded from the `[lowering]` table of `garnet.toml` or built in code.
//! Every field has a default, so an empty document is a valid configuration.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur while loading options
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read lowering options: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse lowering options: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid lowering options: {0}")]
    ValidationError(String),
}

/// Call that marks a method body as backed by a runtime primitive.
///
/// A body whose first statement is `Receiver.method :name` is lowered to the
/// primitive `name`; the remaining statements become its fallback.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PrimitiveMarker {
    /// Constant the marker call is sent to
    pub receiver: String,
    /// Name of the marker call
    pub method: String,
}

impl Default for PrimitiveMarker {
    fn default() -> Self {
        Self {
            receiver: "Primitive".to_string(),
            method: "invoke".to_string(),
        }
    }
}

/// Options threaded through every lowering call
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LowerOptions {
    /// Defer method body lowering until the first invocation
    pub lazy_lowering: bool,
    /// Wrap lowered bodies in the instrumentation node
    pub instrument: bool,
    /// Primitive-backed body marker
    pub primitive: PrimitiveMarker,
    /// Name of the call whose block body becomes a dynamically defined method
    pub dynamic_method_definition: String,
}

impl Default for LowerOptions {
    fn default() -> Self {
        Self {
            lazy_lowering: false,
            instrument: false,
            primitive: PrimitiveMarker::default(),
            dynamic_method_definition: "define_method".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    lowering: LowerOptions,
}

impl LowerOptions {
    /// Default options with lazy lowering switched on
    pub fn lazy() -> Self {
        Self {
            lazy_lowering: true,
            ..Self::default()
        }
    }

    /// Parse options from the `[lowering]` table of a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        file.lowering.validate()?;
        Ok(file.lowering)
    }

    /// Parse options from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate the options
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.primitive.receiver.is_empty() || self.primitive.method.is_empty() {
            return Err(ConfigError::ValidationError(
                "primitive marker receiver and method cannot be empty".to_string(),
            ));
        }
        if self.dynamic_method_definition.is_empty() {
            return Err(ConfigError::ValidationError(
                "dynamic_method_definition cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
