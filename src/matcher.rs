//! Comparison of expected partial records against ordered search results.

use std::borrow::Cow;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::TesterError;

/// A partial record from a test file: every field present must match.
pub type Expectation = Map<String, Value>;

/// Ordered mapping from a result category to its ordered records.
///
/// Keeps the order the categories had in the source document so diagnostics
/// come out in a stable, readable order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Categories<R> {
    entries: Vec<(String, Vec<R>)>,
}

impl<R> Categories<R> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, records: Vec<R>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, existing)) => *existing = records,
            None => self.entries.push((key, records)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&[R]> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, records)| records.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[R])> {
        self.entries
            .iter()
            .map(|(key, records)| (key.as_str(), records.as_slice()))
    }
}

impl Categories<Expectation> {
    /// Reads the `EXPECTED` object of a test file. Every category must hold
    /// an array of objects.
    pub fn expected_from_json(value: Value) -> Result<Self, TesterError> {
        let Value::Object(object) = value else {
            return Err(TesterError::InvalidTestCase {
                message: format!("EXPECTED must be an object, got {}", json_type(&value)),
            });
        };

        let mut categories = Self::new();
        for (key, list) in object {
            let Value::Array(items) = list else {
                return Err(TesterError::InvalidTestCase {
                    message: format!("EXPECTED.{key} must be an array"),
                });
            };
            let records = items
                .into_iter()
                .enumerate()
                .map(|(index, item)| match item {
                    Value::Object(record) => Ok(record),
                    other => Err(TesterError::InvalidTestCase {
                        message: format!(
                            "EXPECTED.{key}[{index}] must be an object, got {}",
                            json_type(&other)
                        ),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()?;
            categories.insert(key, records);
        }

        Ok(categories)
    }
}

impl Categories<Value> {
    /// Reads the object returned by the search engine. Non-array members are
    /// not result lists and are skipped.
    pub fn actual_from_json(value: Value) -> Result<Self, TesterError> {
        let Value::Object(object) = value else {
            return Err(TesterError::Sandbox {
                message: format!(
                    "search results must be an object, got {}",
                    json_type(&value)
                ),
            });
        };

        let mut categories = Self::new();
        for (key, list) in object {
            if let Value::Array(records) = list {
                categories.insert(key, records);
            } else {
                tracing::debug!(key = %key, "ignoring non-list search result member");
            }
        }

        Ok(categories)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The three comparison switches a test file can turn on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Policy {
    pub ignore_order: bool,
    pub exact_check: bool,
    pub should_fail: bool,
}

/// Reads `key` from a result record. `path` folds in the parent's name when
/// the record has a parent.
pub fn resolve_field<'a>(record: &'a Value, key: &str) -> Option<Cow<'a, Value>> {
    let value = record.get(key);

    if key == "path"
        && let Some(parent_name) = record
            .get("parent")
            .and_then(|parent| parent.get("name"))
            .and_then(Value::as_str)
    {
        let path = value.and_then(Value::as_str).unwrap_or_default();
        let folded = if path.is_empty() {
            parent_name.to_string()
        } else {
            format!("{path}::{parent_name}")
        };
        return Some(Cow::Owned(Value::String(folded)));
    }

    value.map(Cow::Borrowed)
}

/// Index of the first candidate matching every field of `expectation`.
pub fn find_entry(expectation: &Expectation, candidates: &[Value]) -> Option<usize> {
    candidates.iter().position(|candidate| {
        expectation.iter().all(|(key, expected)| {
            resolve_field(candidate, key).is_some_and(|actual| actual.as_ref() == expected)
        })
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Diagnostic {
    UnknownKey {
        key: String,
    },
    NotFound {
        key: String,
        expected: Expectation,
    },
    ExactCheckFailed {
        position: usize,
        expected: Expectation,
        found: Option<Value>,
    },
    /// Printed with two spaces before `before`, as rustdoc's historical
    /// tester does.
    OutOfOrder {
        expected: Expectation,
        found: Value,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKey { key } => write!(f, "==> Unknown key \"{key}\""),
            Self::NotFound { key, expected } => {
                write!(
                    f,
                    "==> Result not found in '{key}': '{}'",
                    render_record(expected)
                )
            }
            Self::ExactCheckFailed {
                position,
                expected,
                found,
            } => {
                let found = found
                    .as_ref()
                    .map_or_else(|| "undefined".to_string(), render);
                write!(
                    f,
                    "==> Exact check failed at position {position}: expected '{}' but found '{found}'",
                    render_record(expected)
                )
            }
            Self::OutOfOrder { expected, found } => write!(
                f,
                "==> '{}' was supposed to be  before '{}'",
                render_record(expected),
                render(found)
            ),
        }
    }
}

fn render(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "<unprintable>".to_string())
}

fn render_record(record: &Expectation) -> String {
    serde_json::to_string(record).unwrap_or_else(|_| "<unprintable>".to_string())
}

/// Compares every expected category against the actual results.
pub fn verify(
    expected: &Categories<Expectation>,
    actual: &Categories<Value>,
    policy: Policy,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for (key, entries) in expected.iter() {
        let Some(results) = actual.get(key) else {
            diagnostics.push(Diagnostic::UnknownKey {
                key: key.to_string(),
            });
            continue;
        };

        // Position of the last correctly placed entry; -1 before the first.
        let mut prev_pos: isize = -1;
        for (index, entry) in entries.iter().enumerate() {
            let Some(found) = find_entry(entry, results) else {
                diagnostics.push(Diagnostic::NotFound {
                    key: key.to_string(),
                    expected: entry.clone(),
                });
                continue;
            };
            let found_pos = found as isize;

            if policy.exact_check && found_pos != prev_pos + 1 {
                diagnostics.push(Diagnostic::ExactCheckFailed {
                    position: (prev_pos + 1) as usize,
                    expected: entry.clone(),
                    found: results.get(index).cloned(),
                });
            } else if !policy.ignore_order && found_pos < prev_pos {
                diagnostics.push(Diagnostic::OutOfOrder {
                    expected: entry.clone(),
                    found: results[found].clone(),
                });
            } else {
                prev_pos = found_pos;
            }
        }
    }

    diagnostics
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    /// Expected to fail, yet every entry was found in place.
    UnexpectedPass,
    Failed { diagnostics: Vec<Diagnostic> },
}

impl Outcome {
    pub fn error_count(&self) -> usize {
        match self {
            Self::Passed => 0,
            Self::UnexpectedPass | Self::Failed { .. } => 1,
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Passed)
    }

    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Passed => Vec::new(),
            Self::UnexpectedPass => {
                vec!["==> Test was supposed to fail but all items were found...".to_string()]
            }
            Self::Failed { diagnostics } => diagnostics.iter().map(ToString::to_string).collect(),
        }
    }
}

pub fn judge(diagnostics: Vec<Diagnostic>, policy: Policy) -> Outcome {
    match (diagnostics.is_empty(), policy.should_fail) {
        (true, true) => Outcome::UnexpectedPass,
        (false, false) => Outcome::Failed { diagnostics },
        _ => Outcome::Passed,
    }
}
