use serde::{Deserialize, Serialize};

pub const DEFAULT_EVENT_PREFIX: &str = "edx.course.student_notes";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigErrorKind {
    Parse,
    Invalid,
}

#[derive(Clone, Debug)]
pub struct ConfigError {
    pub kind: ConfigErrorKind,
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ConfigError {}

impl ConfigError {
    fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ConfigErrorKind::Parse,
            message: format!("invalid plugin options: {e}"),
        }
    }

    fn invalid(message: &str) -> Self {
        Self {
            kind: ConfigErrorKind::Invalid,
            message: message.to_string(),
        }
    }
}

/// Options handed to the plugins by the host page.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PluginOptions {
    /// Maximum length of text fields in analytics payloads. `None` disables truncation.
    #[serde(default, alias = "stringLimit")]
    pub string_limit: Option<usize>,

    #[serde(default = "default_event_prefix", alias = "eventPrefix")]
    pub event_prefix: String,
}

fn default_event_prefix() -> String {
    DEFAULT_EVENT_PREFIX.to_string()
}

impl Default for PluginOptions {
    fn default() -> Self {
        Self {
            string_limit: None,
            event_prefix: default_event_prefix(),
        }
    }
}

impl PluginOptions {
    pub fn with_string_limit(limit: usize) -> Self {
        Self {
            string_limit: Some(limit),
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let opts: Self = serde_json::from_str(json).map_err(ConfigError::parse)?;
        opts.validate()?;
        Ok(opts)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.event_prefix.trim().is_empty() {
            return Err(ConfigError::invalid("event prefix must not be empty"));
        }
        Ok(())
    }
}
