//! Board configuration.
//!
//! # Responsibility
//! - Parse the JSON board configuration.
//! - Validate raw values into the typed settings the controller consumes.
//!
//! # Invariants
//! - Missing fields fall back to defaults: no persona, all capabilities,
//!   `reject` drag conflicts, build-mode log level.
//! - Validation never partially applies; it yields settings or an error.

use crate::capability::{supported_capability_strings, CapabilityError, CapabilitySet};
use crate::logging::{default_log_level, normalize_level};
use crate::ordering::drag::DragConflictPolicy;
use crate::persona::{find_preset, PersonaPreset};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Raw configuration as written by the host application.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoardConfig {
    /// Persona preset kind used to seed an empty board.
    pub persona: Option<String>,
    /// Capability declarations for the primary board view.
    pub capabilities: Vec<String>,
    pub drag_conflict: DragConflictPolicy,
    pub log_level: Option<String>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            persona: None,
            capabilities: supported_capability_strings()
                .iter()
                .map(|value| value.to_string())
                .collect(),
            drag_conflict: DragConflictPolicy::default(),
            log_level: None,
        }
    }
}

/// Validated settings handed to [`crate::board::BoardController::open`].
#[derive(Debug, Clone)]
pub struct BoardSettings {
    pub persona: Option<&'static PersonaPreset>,
    pub capabilities: CapabilitySet,
    pub drag_conflict: DragConflictPolicy,
    pub log_level: &'static str,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            persona: None,
            capabilities: CapabilitySet::board(),
            drag_conflict: DragConflictPolicy::default(),
            log_level: default_log_level(),
        }
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    InvalidJson(serde_json::Error),
    UnknownPersona(String),
    Capability(CapabilityError),
    InvalidLogLevel(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidJson(err) => write!(f, "invalid board config: {err}"),
            Self::UnknownPersona(kind) => write!(f, "unknown persona preset: {kind}"),
            Self::Capability(err) => write!(f, "{err}"),
            Self::InvalidLogLevel(message) => write!(f, "{message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidJson(err) => Some(err),
            Self::Capability(err) => Some(err),
            Self::UnknownPersona(_) | Self::InvalidLogLevel(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidJson(value)
    }
}

impl From<CapabilityError> for ConfigError {
    fn from(value: CapabilityError) -> Self {
        Self::Capability(value)
    }
}

impl BoardConfig {
    /// Parses a JSON document. Unknown fields are rejected.
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Resolves raw values into typed settings.
    pub fn validate(&self) -> Result<BoardSettings, ConfigError> {
        let persona = match self.persona.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(kind) => Some(
                find_preset(kind).ok_or_else(|| ConfigError::UnknownPersona(kind.to_string()))?,
            ),
        };
        let capabilities = CapabilitySet::parse(&self.capabilities)?;
        let log_level = match self.log_level.as_deref() {
            Some(level) => normalize_level(level).map_err(ConfigError::InvalidLogLevel)?,
            None => default_log_level(),
        };

        Ok(BoardSettings {
            persona,
            capabilities,
            drag_conflict: self.drag_conflict,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{BoardConfig, ConfigError};
    use crate::capability::{BoardCapability, CapabilitySet};
    use crate::ordering::drag::DragConflictPolicy;

    #[test]
    fn empty_document_uses_defaults() {
        let settings = BoardConfig::from_json("{}")
            .expect("parse")
            .validate()
            .expect("validate");
        assert!(settings.persona.is_none());
        assert_eq!(settings.capabilities, CapabilitySet::board());
        assert_eq!(settings.drag_conflict, DragConflictPolicy::Reject);
    }

    #[test]
    fn parses_full_document() {
        let config = BoardConfig::from_json(
            r#"{
                "persona": "Writer",
                "capabilities": ["archive", "delete"],
                "drag_conflict": "cancel_previous",
                "log_level": "WARNING"
            }"#,
        )
        .expect("parse");
        let settings = config.validate().expect("validate");

        assert_eq!(settings.persona.map(|preset| preset.kind), Some("writer"));
        assert!(!settings.capabilities.allows(BoardCapability::Pin));
        assert_eq!(settings.drag_conflict, DragConflictPolicy::CancelPrevious);
        assert_eq!(settings.log_level, "warn");
    }

    #[test]
    fn rejects_unknown_values() {
        assert!(matches!(
            BoardConfig::from_json(r#"{"colour": "red"}"#),
            Err(ConfigError::InvalidJson(_))
        ));
        assert!(matches!(
            BoardConfig::from_json(r#"{"drag_conflict": "queue"}"#),
            Err(ConfigError::InvalidJson(_))
        ));

        let unknown_persona = BoardConfig {
            persona: Some("astronaut".to_string()),
            ..BoardConfig::default()
        };
        assert!(matches!(
            unknown_persona.validate(),
            Err(ConfigError::UnknownPersona(kind)) if kind == "astronaut"
        ));

        let bad_capability = BoardConfig {
            capabilities: vec!["share".to_string()],
            ..BoardConfig::default()
        };
        assert!(matches!(
            bad_capability.validate(),
            Err(ConfigError::Capability(_))
        ));

        let bad_level = BoardConfig {
            log_level: Some("verbose".to_string()),
            ..BoardConfig::default()
        };
        assert!(matches!(
            bad_level.validate(),
            Err(ConfigError::InvalidLogLevel(_))
        ));
    }
}
