//! Schema contracts for pipeline boundaries.
//!
//! A [`Contract`] is a structural description of a value exchanged between
//! pipeline stages: field names, their semantic kinds, and whether they are
//! required. Contracts are pure data — the only behavior is [`validate`],
//! a pure function that checks a `serde_json::Value` against a contract and
//! returns every field-level violation it finds.
//!
//! Validation failures are data, not control flow: `validate` never panics
//! and never returns an error, so the pipeline runner can decide what a
//! violation means (for PageLens, a halted run).

use serde_json::Value;

// ---------------------------------------------------------------------------
// Contract description
// ---------------------------------------------------------------------------

/// Structural description of a value at a pipeline boundary.
#[derive(Debug, Clone)]
pub struct Contract {
    /// Name used in diagnostics (e.g. `"page-content"`).
    pub name: String,
    /// Field specifications, checked in order.
    pub fields: Vec<FieldSpec>,
}

/// One field in a contract.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Field name as it appears in the JSON object.
    pub name: String,
    /// Semantic kind the value must match.
    pub kind: FieldKind,
    /// Whether the field must be present.
    pub required: bool,
}

/// Semantic kind of a contract field.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Any JSON string.
    Str,
    /// A JSON boolean.
    Bool,
    /// A non-negative JSON integer.
    UInt,
    /// A string that must parse as a well-formed URL.
    Url,
    /// A JSON array whose elements all match the inner kind.
    List(Box<FieldKind>),
    /// A JSON object matching the nested field specs.
    Record(Vec<FieldSpec>),
}

impl Contract {
    /// Start an empty contract with the given diagnostic name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a required field.
    #[must_use]
    pub fn require(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            kind,
            required: true,
        });
        self
    }

    /// Add an optional field (validated only when present).
    #[must_use]
    pub fn optional(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            kind,
            required: false,
        });
        self
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A single field-level contract violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Dotted path to the offending field (e.g. `wordList[2].reading`).
    pub field: String,
    /// What went wrong.
    pub kind: ViolationKind,
}

/// The kinds of violation [`validate`] can report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViolationKind {
    /// A required field is absent.
    #[error("required field is missing")]
    Missing,
    /// The value is present but has the wrong JSON type.
    #[error("expected {expected}")]
    WrongType {
        /// Human-readable expected type.
        expected: &'static str,
    },
    /// The value is a string but not a well-formed URL.
    #[error("not a well-formed URL")]
    InvalidUrl,
    /// The top-level value is not a JSON object.
    #[error("expected a JSON object")]
    NotAnObject,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.kind)
    }
}

/// Outcome of validating one value against one contract.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// All violations found; empty means the value conforms.
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Whether the value conformed to the contract.
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }

    /// Render the violations as one diagnostic string.
    pub fn describe(&self) -> String {
        self.violations
            .iter()
            .map(Violation::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Validate `value` against `contract`. Pure; never panics or errors.
pub fn validate(value: &Value, contract: &Contract) -> ValidationReport {
    let mut report = ValidationReport::default();

    let Some(object) = value.as_object() else {
        report.violations.push(Violation {
            field: contract.name.clone(),
            kind: ViolationKind::NotAnObject,
        });
        return report;
    };

    for spec in &contract.fields {
        match object.get(&spec.name) {
            None | Some(Value::Null) => {
                if spec.required {
                    report.violations.push(Violation {
                        field: spec.name.clone(),
                        kind: ViolationKind::Missing,
                    });
                }
            }
            Some(found) => check_kind(&spec.name, found, &spec.kind, &mut report),
        }
    }

    report
}

/// Check one value against one kind, appending violations under `path`.
fn check_kind(path: &str, value: &Value, kind: &FieldKind, report: &mut ValidationReport) {
    match kind {
        FieldKind::Str => {
            if !value.is_string() {
                push_wrong_type(path, "string", report);
            }
        }
        FieldKind::Bool => {
            if !value.is_boolean() {
                push_wrong_type(path, "boolean", report);
            }
        }
        FieldKind::UInt => {
            if value.as_u64().is_none() {
                push_wrong_type(path, "non-negative integer", report);
            }
        }
        FieldKind::Url => match value.as_str() {
            Some(s) => {
                if url::Url::parse(s).is_err() {
                    report.violations.push(Violation {
                        field: path.to_string(),
                        kind: ViolationKind::InvalidUrl,
                    });
                }
            }
            None => push_wrong_type(path, "URL string", report),
        },
        FieldKind::List(inner) => match value.as_array() {
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    check_kind(&format!("{path}[{i}]"), item, inner, report);
                }
            }
            None => push_wrong_type(path, "array", report),
        },
        FieldKind::Record(fields) => match value.as_object() {
            Some(object) => {
                for spec in fields {
                    let nested = format!("{path}.{}", spec.name);
                    match object.get(&spec.name) {
                        None | Some(Value::Null) => {
                            if spec.required {
                                report.violations.push(Violation {
                                    field: nested,
                                    kind: ViolationKind::Missing,
                                });
                            }
                        }
                        Some(found) => check_kind(&nested, found, &spec.kind, report),
                    }
                }
            }
            None => push_wrong_type(path, "object", report),
        },
    }
}

fn push_wrong_type(path: &str, expected: &'static str, report: &mut ValidationReport) {
    report.violations.push(Violation {
        field: path.to_string(),
        kind: ViolationKind::WrongType { expected },
    });
}
