// crates/sentinel-gate-config/src/loader.rs
// ============================================================================
// Module: Sentinel Gate Policy Loader
// Description: Parse and compile YAML policy files into rule-set snapshots.
// Purpose: Guarantee that only fully valid policies become active.
// Dependencies: crate::model, sentinel-gate-core, serde_yaml, thiserror
// ============================================================================

//! ## Overview
//! Loading is all-or-nothing: every rule, glob, and regex in the file must
//! compile, and every rule id must be unique, or the whole load fails with a
//! [`PolicyLoadError`]. A failed load never produces a partial
//! [`RuleSet`], so hot-reload can always keep the previous snapshot on error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use sentinel_gate_core::Action;
use sentinel_gate_core::ArgumentPath;
use sentinel_gate_core::Condition;
use sentinel_gate_core::ConditionError;
use sentinel_gate_core::ConditionKind;
use sentinel_gate_core::Rule;
use sentinel_gate_core::RuleId;
use sentinel_gate_core::RuleSet;
use sentinel_gate_core::ToolPattern;
use sentinel_gate_core::ToolPatternError;

use crate::model::RawAction;
use crate::model::RawCondition;
use crate::model::RawOperator;
use crate::model::RawPolicyFile;
use crate::model::RawRule;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Approval wait applied when a rule omits `timeout_secs`.
pub const DEFAULT_APPROVAL_TIMEOUT: Duration = Duration::from_secs(300);

// ============================================================================
// SECTION: Load Errors
// ============================================================================

/// Errors raised while loading a policy file.
///
/// # Invariants
/// - Any variant rejects the whole file; no partial rule set is ever built.
#[derive(Debug, Error)]
pub enum PolicyLoadError {
    /// Policy file could not be read.
    #[error("failed to read policy file '{path}': {source}")]
    Io {
        /// Path of the policy file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Policy file is not valid YAML or violates the document model.
    #[error("failed to parse policy: {source}")]
    Parse {
        /// Underlying deserialization error.
        #[source]
        source: Box<serde_yaml::Error>,
    },
    /// A regex condition failed to compile.
    #[error("rule '{rule}': {source}")]
    InvalidRegex {
        /// Identifier of the offending rule.
        rule: String,
        /// Underlying compile error.
        #[source]
        source: ConditionError,
    },
    /// A tool pattern failed to compile.
    #[error("rule '{rule}': {source}")]
    InvalidToolPattern {
        /// Identifier of the offending rule.
        rule: String,
        /// Underlying glob compile error.
        #[source]
        source: ToolPatternError,
    },
    /// Two rules share the same identifier.
    #[error("duplicate rule id '{id}'")]
    DuplicateRuleId {
        /// The repeated identifier.
        id: String,
    },
    /// A condition's value does not fit its operator.
    #[error("rule '{rule}': operator '{operator}' {detail}")]
    InvalidCondition {
        /// Identifier of the offending rule.
        rule: String,
        /// Operator name as written in the file.
        operator: &'static str,
        /// What was expected.
        detail: String,
    },
}

// ============================================================================
// SECTION: Policy Loader
// ============================================================================

/// Compiles policy documents into engine rule sets.
#[derive(Debug, Clone)]
pub struct PolicyLoader {
    /// Approval wait used when a rule omits `timeout_secs`.
    default_approval_timeout: Duration,
}

impl PolicyLoader {
    /// Creates a loader with the given default approval timeout.
    #[must_use]
    pub const fn new(default_approval_timeout: Duration) -> Self {
        Self {
            default_approval_timeout,
        }
    }

    /// Reads, parses, and compiles a policy file.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyLoadError`] when the file cannot be read, parsed, or
    /// compiled.
    pub fn load_file(&self, path: &Path) -> Result<RuleSet, PolicyLoadError> {
        let text = fs::read_to_string(path).map_err(|source| PolicyLoadError::Io {
            path: path.to_owned(),
            source,
        })?;
        self.parse(&text)
    }

    /// Parses and compiles a policy document from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyLoadError`] when the text cannot be parsed or compiled.
    pub fn parse(&self, text: &str) -> Result<RuleSet, PolicyLoadError> {
        let raw: RawPolicyFile =
            serde_yaml::from_str(text).map_err(|source| PolicyLoadError::Parse {
                source: Box::new(source),
            })?;
        self.compile(raw)
    }

    /// Compiles a parsed policy document into a rule set.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyLoadError`] when any rule fails validation.
    pub fn compile(&self, raw: RawPolicyFile) -> Result<RuleSet, PolicyLoadError> {
        let mut seen: HashSet<String> = HashSet::with_capacity(raw.rules.len());
        let mut rules = Vec::with_capacity(raw.rules.len());
        for raw_rule in raw.rules {
            if !seen.insert(raw_rule.id.clone()) {
                return Err(PolicyLoadError::DuplicateRuleId {
                    id: raw_rule.id,
                });
            }
            rules.push(self.compile_rule(raw_rule)?);
        }
        Ok(RuleSet::new(rules))
    }

    /// Compiles one rule, validating its pattern, conditions, and action.
    fn compile_rule(&self, raw: RawRule) -> Result<Rule, PolicyLoadError> {
        let tool =
            ToolPattern::new(&raw.target_tool).map_err(|source| {
                PolicyLoadError::InvalidToolPattern {
                    rule: raw.id.clone(),
                    source,
                }
            })?;
        let mut conditions = Vec::with_capacity(raw.conditions.len());
        for condition in raw.conditions {
            conditions.push(compile_condition(&raw.id, condition)?);
        }
        Ok(Rule {
            id: RuleId::new(raw.id),
            description: raw.description,
            tool,
            argument: ArgumentPath::parse(&raw.target_argument),
            match_mode: raw.match_mode,
            conditions,
            action: self.compile_action(raw.action),
        })
    }

    /// Translates a raw action, filling in the default approval timeout.
    fn compile_action(&self, raw: RawAction) -> Action {
        match raw {
            RawAction::Allow => Action::Allow,
            RawAction::Log => Action::Log,
            RawAction::Block {
                reason,
            } => Action::Block {
                reason,
            },
            RawAction::AllowWithApproval {
                timeout_secs,
                approvers,
            } => Action::AllowWithApproval {
                timeout: timeout_secs
                    .map_or(self.default_approval_timeout, Duration::from_secs),
                approvers,
            },
        }
    }
}

impl Default for PolicyLoader {
    fn default() -> Self {
        Self::new(DEFAULT_APPROVAL_TIMEOUT)
    }
}

// ============================================================================
// SECTION: Condition Compilation
// ============================================================================

/// Compiles one condition, enforcing operator-specific value requirements.
fn compile_condition(rule: &str, raw: RawCondition) -> Result<Condition, PolicyLoadError> {
    let kind = match raw.operator {
        RawOperator::Equals => ConditionKind::Equals {
            value: require_string(rule, raw.operator, raw.value.as_ref())?,
            ignore_case: raw.ignore_case,
        },
        RawOperator::NotEquals => ConditionKind::NotEquals {
            value: require_string(rule, raw.operator, raw.value.as_ref())?,
            ignore_case: raw.ignore_case,
        },
        RawOperator::Contains => ConditionKind::Contains {
            value: require_string(rule, raw.operator, raw.value.as_ref())?,
            ignore_case: raw.ignore_case,
        },
        RawOperator::NotContains => ConditionKind::NotContains {
            value: require_string(rule, raw.operator, raw.value.as_ref())?,
            ignore_case: raw.ignore_case,
        },
        RawOperator::Regex => {
            let pattern = require_string(rule, raw.operator, raw.value.as_ref())?;
            ConditionKind::regex(&pattern, raw.ignore_case).map_err(|source| {
                PolicyLoadError::InvalidRegex {
                    rule: rule.to_owned(),
                    source,
                }
            })?
        }
        RawOperator::MissingLimit => {
            if raw.value.is_some() {
                return Err(PolicyLoadError::InvalidCondition {
                    rule: rule.to_owned(),
                    operator: raw.operator.label(),
                    detail: "takes no value".to_owned(),
                });
            }
            ConditionKind::MissingLimit
        }
        RawOperator::GreaterThan => ConditionKind::GreaterThan {
            value: require_number(rule, raw.operator, raw.value.as_ref())?,
        },
        RawOperator::GreaterThanOrEqual => ConditionKind::GreaterThanOrEqual {
            value: require_number(rule, raw.operator, raw.value.as_ref())?,
        },
        RawOperator::LessThan => ConditionKind::LessThan {
            value: require_number(rule, raw.operator, raw.value.as_ref())?,
        },
        RawOperator::LessThanOrEqual => ConditionKind::LessThanOrEqual {
            value: require_number(rule, raw.operator, raw.value.as_ref())?,
        },
    };
    Ok(match raw.field {
        Some(field) => Condition::on_field(ArgumentPath::parse(&field), kind),
        None => Condition::on_value(kind),
    })
}

/// Extracts the string value a string operator requires.
fn require_string(
    rule: &str,
    operator: RawOperator,
    value: Option<&serde_yaml::Value>,
) -> Result<String, PolicyLoadError> {
    match value {
        Some(serde_yaml::Value::String(text)) => Ok(text.clone()),
        _ => Err(PolicyLoadError::InvalidCondition {
            rule: rule.to_owned(),
            operator: operator.label(),
            detail: "requires a string value".to_owned(),
        }),
    }
}

/// Extracts the numeric bound a comparison operator requires.
fn require_number(
    rule: &str,
    operator: RawOperator,
    value: Option<&serde_yaml::Value>,
) -> Result<f64, PolicyLoadError> {
    match value {
        Some(serde_yaml::Value::Number(number)) => {
            number.as_f64().ok_or_else(|| PolicyLoadError::InvalidCondition {
                rule: rule.to_owned(),
                operator: operator.label(),
                detail: "requires a finite numeric value".to_owned(),
            })
        }
        _ => Err(PolicyLoadError::InvalidCondition {
            rule: rule.to_owned(),
            operator: operator.label(),
            detail: "requires a numeric value".to_owned(),
        }),
    }
}
