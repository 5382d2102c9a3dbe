//! Declarative field validation.
//!
//! Rule tables keyed by `(domain, step, field)` live in [`rules`]; this module
//! is the single interpreter that evaluates a submitted field-value mapping
//! against them. Evaluation is deterministic and side-effect free, and every
//! violation is collected so the caller can report all problems in one
//! response.

pub mod rules;

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use super::domain::{FieldValue, FilingDomain};
use rules::{FieldRule, RuleKind, StepRules};

/// One rejected field/claim/file check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub field: String,
    pub rule: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Violation {
    pub(crate) fn new(
        field: impl Into<String>,
        rule: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            rule,
            message: message.into(),
            value: None,
        }
    }

    pub(crate) fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }
}

/// Whether `required` rules are enforced for absent fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Full step submission: required fields must be present.
    Submit,
    /// PATCH-style partial update: absent fields are skipped, present fields
    /// still face type/format/length rules.
    Patch,
}

impl Default for ValidationMode {
    fn default() -> Self {
        ValidationMode::Submit
    }
}

/// Result of interpreting one field-value mapping.
#[derive(Debug, Default)]
pub struct FieldOutcome {
    pub accepted: BTreeMap<String, FieldValue>,
    pub violations: Vec<Violation>,
}

/// Raised when the rule/policy tables cannot answer for a request. This is an
/// operator fault, never silently ignored.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationFault {
    #[error("no rule table registered for {} step {step}", domain.label())]
    MissingRuleTable { domain: FilingDomain, step: u8 },
    #[error("rule pattern for field '{field}' does not compile")]
    InvalidPattern { field: &'static str },
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
            .expect("email pattern compiles")
    })
}

/// Evaluate every present field against the `(domain, step)` rule table,
/// collecting all violations rather than failing on the first.
pub fn validate_fields(
    domain: FilingDomain,
    step: u8,
    mode: ValidationMode,
    fields: &serde_json::Map<String, Value>,
    now: DateTime<Utc>,
) -> Result<FieldOutcome, ConfigurationFault> {
    let table = rules::step_rules(domain, step)
        .ok_or(ConfigurationFault::MissingRuleTable { domain, step })?;

    let mut outcome = FieldOutcome::default();

    for rule in table.fields {
        match fields.get(rule.name) {
            None | Some(Value::Null) => {
                if rule.required && mode == ValidationMode::Submit {
                    outcome.violations.push(Violation::new(
                        rule.name,
                        "required",
                        format!("{} is required", rule.name),
                    ));
                }
            }
            Some(value) => match evaluate(rule, value)? {
                Ok(accepted) => {
                    outcome.accepted.insert(rule.name.to_string(), accepted);
                }
                Err(violation) => outcome.violations.push(violation),
            },
        }
    }

    for key in fields.keys() {
        if !table.fields.iter().any(|rule| rule.name == key) {
            outcome.violations.push(Violation::new(
                key.clone(),
                "unknown_field",
                format!("{key} is not accepted at this step"),
            ));
        }
    }

    check_date_ranges(table, &outcome.accepted, now, &mut outcome.violations);

    Ok(outcome)
}

fn evaluate(
    rule: &FieldRule,
    value: &Value,
) -> Result<Result<FieldValue, Violation>, ConfigurationFault> {
    let name = rule.name;
    let checked = match &rule.kind {
        RuleKind::Text {
            min_len,
            max_len,
            pattern,
        } => match value.as_str() {
            Some(raw) => {
                let trimmed = raw.trim();
                let length = trimmed.chars().count();
                if length < *min_len {
                    Err(Violation::new(
                        name,
                        "min_length",
                        format!("{name} must be at least {min_len} characters"),
                    )
                    .with_value(value.clone()))
                } else if length > *max_len {
                    Err(Violation::new(
                        name,
                        "max_length",
                        format!("{name} must be at most {max_len} characters"),
                    )
                    .with_value(value.clone()))
                } else if let Some(pattern) = pattern {
                    let regex = Regex::new(pattern)
                        .map_err(|_| ConfigurationFault::InvalidPattern { field: name })?;
                    if regex.is_match(trimmed) {
                        Ok(FieldValue::Text(trimmed.to_string()))
                    } else {
                        Err(Violation::new(
                            name,
                            "pattern",
                            format!("{name} contains characters outside the allowed set"),
                        )
                        .with_value(value.clone()))
                    }
                } else {
                    Ok(FieldValue::Text(trimmed.to_string()))
                }
            }
            None => Err(type_violation(name, "a string", value)),
        },
        RuleKind::Email => match value.as_str() {
            Some(raw) => {
                let normalized = raw.trim().to_ascii_lowercase();
                if email_pattern().is_match(&normalized) {
                    Ok(FieldValue::Text(normalized))
                } else {
                    Err(Violation::new(
                        name,
                        "email",
                        format!("{name} must be a valid email address"),
                    )
                    .with_value(value.clone()))
                }
            }
            None => Err(type_violation(name, "a string", value)),
        },
        RuleKind::Integer { min, max } => match value.as_i64() {
            Some(number) if number < *min => Err(Violation::new(
                name,
                "min",
                format!("{name} must be at least {min}"),
            )
            .with_value(value.clone())),
            Some(number) if number > *max => Err(Violation::new(
                name,
                "max",
                format!("{name} must be at most {max}"),
            )
            .with_value(value.clone())),
            Some(number) => Ok(FieldValue::Integer(number)),
            None => Err(type_violation(name, "an integer", value)),
        },
        RuleKind::Flag => match value.as_bool() {
            Some(flag) => Ok(FieldValue::Flag(flag)),
            None => Err(type_violation(name, "a boolean", value)),
        },
        RuleKind::List { max_items } => match value.as_array() {
            Some(items) if items.len() > *max_items => Err(Violation::new(
                name,
                "max_items",
                format!("{name} must contain at most {max_items} entries"),
            )
            .with_value(value.clone())),
            Some(items) => {
                let mut entries = Vec::with_capacity(items.len());
                let mut bad_entry = None;
                for item in items {
                    match item.as_str().map(str::trim) {
                        Some(text) if !text.is_empty() => entries.push(text.to_string()),
                        _ => {
                            bad_entry = Some(type_violation(
                                name,
                                "an array of non-empty strings",
                                value,
                            ));
                            break;
                        }
                    }
                }
                match bad_entry {
                    Some(violation) => Err(violation),
                    None => Ok(FieldValue::List(entries)),
                }
            }
            None => Err(type_violation(name, "an array", value)),
        },
        RuleKind::Date => match value.as_str() {
            Some(raw) => match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
                Ok(date) => Ok(FieldValue::Date(date)),
                Err(_) => Err(type_violation(name, "a YYYY-MM-DD date", value)),
            },
            None => Err(type_violation(name, "a YYYY-MM-DD date", value)),
        },
        RuleKind::Enumerated(allowed) => match value.as_str() {
            Some(raw) => {
                let trimmed = raw.trim();
                if allowed.contains(&trimmed) {
                    Ok(FieldValue::Text(trimmed.to_string()))
                } else {
                    Err(Violation::new(
                        name,
                        "enum",
                        format!("{name} must be one of: {}", allowed.join(", ")),
                    )
                    .with_value(value.clone()))
                }
            }
            None => Err(type_violation(name, "a string", value)),
        },
    };

    Ok(checked)
}

fn type_violation(name: &str, expected: &str, value: &Value) -> Violation {
    Violation::new(name, "type", format!("{name} must be {expected}")).with_value(value.clone())
}

fn check_date_ranges(
    table: &StepRules,
    accepted: &BTreeMap<String, FieldValue>,
    now: DateTime<Utc>,
    violations: &mut Vec<Violation>,
) {
    let today = now.date_naive();
    for (from_name, to_name) in table.date_ranges {
        let from = match accepted.get(*from_name) {
            Some(FieldValue::Date(date)) => Some(*date),
            _ => None,
        };
        let to = match accepted.get(*to_name) {
            Some(FieldValue::Date(date)) => Some(*date),
            _ => None,
        };

        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                violations.push(Violation::new(
                    *to_name,
                    "date_order",
                    format!("{to_name} must not precede {from_name}"),
                ));
            }
        }
        if let Some(to) = to {
            if to > today {
                violations.push(Violation::new(
                    *to_name,
                    "future_date",
                    format!("{to_name} must not be in the future"),
                ));
            }
        }
    }
}
