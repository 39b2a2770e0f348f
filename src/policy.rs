//! Configuration policy and validation
//!
//! The host hands every invocation a [`ConfigMap`] of option name to typed
//! [`ConfigValue`]. [`ConfigPolicy`] declares which options the processor
//! understands and [`ConfigPolicy::validate`] turns a map into a
//! [`FilterConfig`], reporting every offending option at once.
//!
//! | key          | type   | required | default      |
//! |--------------|--------|----------|--------------|
//! | `expression` | string | yes      |              |
//! | `tag`        | string | yes      |              |
//! | `scan_mode`  | string | no       | `exhaustive` |

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, OptionProblem};
use crate::transformer::ScanMode;

/// Option holding the segment pattern
pub const OPTION_EXPRESSION: &str = "expression";

/// Option holding the destination tag key
pub const OPTION_TAG: &str = "tag";

/// Option selecting the scan mode
pub const OPTION_SCAN_MODE: &str = "scan_mode";

/// Scope all options live under
pub const ROOT_SCOPE: &str = "/";

/// Typed configuration value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// String
    Str(String),
}

impl ConfigValue {
    /// Kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            ConfigValue::Bool(_) => ValueKind::Bool,
            ConfigValue::Int(_) => ValueKind::Integer,
            ConfigValue::Float(_) => ValueKind::Float,
            ConfigValue::Str(_) => ValueKind::String,
        }
    }

    /// String content, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Str(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::Str(value)
    }
}

/// Option name to value mapping supplied per invocation
pub type ConfigMap = HashMap<String, ConfigValue>;

/// Value type accepted by a policy rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Boolean
    Bool,
    /// Integer
    Integer,
    /// Float
    Float,
    /// String
    String,
}

impl ValueKind {
    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::String => "string",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declaration of a single option
#[derive(Debug, Clone, Serialize)]
pub struct PolicyRule {
    /// Option name
    pub key: &'static str,
    /// Accepted value type
    #[serde(rename = "type")]
    pub kind: ValueKind,
    /// Whether the option must be present
    pub required: bool,
    /// Value used when the option is absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<&'static str>,
    /// Accepted values, empty if unrestricted
    pub allowed: &'static [&'static str],
    /// Whether an empty string is rejected
    pub non_empty: bool,
    /// Human readable description
    pub description: &'static str,
}

impl PolicyRule {
    fn check(&self, config: &ConfigMap, problems: &mut Vec<OptionProblem>) {
        let Some(value) = config.get(self.key) else {
            if self.required {
                problems.push(OptionProblem::Missing {
                    key: self.key.to_string(),
                });
            }
            return;
        };

        if value.kind() != self.kind {
            problems.push(OptionProblem::WrongType {
                key: self.key.to_string(),
                expected: self.kind.as_str(),
                found: value.kind().as_str(),
            });
            return;
        }

        let Some(s) = value.as_str() else {
            return;
        };

        if self.non_empty && s.is_empty() {
            problems.push(OptionProblem::Empty {
                key: self.key.to_string(),
            });
        } else if !self.allowed.is_empty()
            && !self.allowed.iter().any(|a| a.eq_ignore_ascii_case(s))
        {
            problems.push(OptionProblem::InvalidValue {
                key: self.key.to_string(),
                value: s.to_string(),
                allowed: self.allowed.join(", "),
            });
        }
    }
}

/// Set of option declarations under one scope
#[derive(Debug, Clone, Serialize)]
pub struct ConfigPolicy {
    /// Configuration scope
    pub scope: &'static str,
    /// Declared options
    pub rules: Vec<PolicyRule>,
}

impl ConfigPolicy {
    /// Policy of the namespace filter processor
    pub fn namespace_filter() -> Self {
        Self {
            scope: ROOT_SCOPE,
            rules: vec![
                PolicyRule {
                    key: OPTION_EXPRESSION,
                    kind: ValueKind::String,
                    required: true,
                    default: None,
                    allowed: &[],
                    non_empty: false,
                    description: "Regular expression matched against whole namespace segments",
                },
                PolicyRule {
                    key: OPTION_TAG,
                    kind: ValueKind::String,
                    required: true,
                    default: None,
                    allowed: &[],
                    non_empty: true,
                    description: "Tag key that receives the relocated segment",
                },
                PolicyRule {
                    key: OPTION_SCAN_MODE,
                    kind: ValueKind::String,
                    required: false,
                    default: Some("exhaustive"),
                    allowed: ScanMode::VARIANTS,
                    non_empty: false,
                    description: "Index semantics after a removal: exhaustive or legacy",
                },
            ],
        }
    }

    /// Look up a rule by key
    pub fn rule(&self, key: &str) -> Option<&PolicyRule> {
        self.rules.iter().find(|r| r.key == key)
    }

    /// Check `config` against every rule
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] listing all problems found.
    pub fn check(&self, config: &ConfigMap) -> Result<(), ConfigurationError> {
        let mut problems = Vec::new();
        for rule in &self.rules {
            rule.check(config, &mut problems);
        }

        for key in config.keys() {
            if self.rule(key).is_none() {
                tracing::debug!(option = %key, "Ignoring unknown configuration option");
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigurationError { problems })
        }
    }

    /// Validate `config` and extract the filter settings
    ///
    /// Does not compile the expression.
    pub fn validate(&self, config: &ConfigMap) -> Result<FilterConfig, ConfigurationError> {
        self.check(config)?;

        let string = |key: &str| -> Option<String> {
            config
                .get(key)
                .and_then(ConfigValue::as_str)
                .map(str::to_string)
        };

        let scan_mode = string(OPTION_SCAN_MODE)
            .map(|s| s.parse::<ScanMode>())
            .transpose()
            .map_err(|_| ConfigurationError {
                problems: vec![OptionProblem::InvalidValue {
                    key: OPTION_SCAN_MODE.to_string(),
                    value: string(OPTION_SCAN_MODE).unwrap_or_default(),
                    allowed: ScanMode::VARIANTS.join(", "),
                }],
            })?
            .unwrap_or_default();

        Ok(FilterConfig {
            expression: string(OPTION_EXPRESSION).unwrap_or_default(),
            tag: string(OPTION_TAG).unwrap_or_default(),
            scan_mode,
        })
    }
}

impl Default for ConfigPolicy {
    fn default() -> Self {
        Self::namespace_filter()
    }
}

/// Validated filter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterConfig {
    /// Pattern text, not yet compiled
    pub expression: String,
    /// Destination tag key
    pub tag: String,
    /// Scan mode
    pub scan_mode: ScanMode,
}
