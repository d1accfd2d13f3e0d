use std::path::Path;

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::extract::ExtractError;

#[derive(Debug, Error, Diagnostic)]
pub enum TesterError {
    #[error("Failed to read file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{source} in '{file}'")]
    Extraction {
        file: String,
        #[source]
        source: ExtractError,
    },

    #[error("Search index '{path}' is malformed: {message}")]
    InvalidSearchIndex { path: String, message: String },

    #[error("Invalid test case: {message}")]
    InvalidTestCase { message: String },

    #[error("Failed to start sandbox process '{program}': {source}")]
    SandboxSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Sandbox failed: {message}")]
    Sandbox { message: String },

    #[error("Sandbox pipe failed: {source}")]
    SandboxIo {
        #[source]
        source: std::io::Error,
    },

    #[error("Sandbox sent an unreadable message: {source}")]
    SandboxProtocol {
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize report JSON: {source}")]
    ReportSerialization {
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write report: {source}")]
    ReportWrite {
        #[source]
        source: std::io::Error,
    },
}

impl TesterError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub fn extraction(file: &Path, source: ExtractError) -> Self {
        Self::Extraction {
            file: file.display().to_string(),
            source,
        }
    }

    pub fn sandbox(message: impl Into<String>) -> Self {
        Self::Sandbox {
            message: message.into(),
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        let (r#type, suggestion) = match self {
            Self::Io { .. } => ("io_error", None),
            Self::Extraction { source, .. } => (
                "fragment_missing",
                Some(format!(
                    "Check that the doc bundle still declares {} '{}'",
                    source.kind(),
                    source.name()
                )),
            ),
            Self::InvalidSearchIndex { .. } => ("invalid_search_index", None),
            Self::InvalidTestCase { .. } => (
                "invalid_test_case",
                Some("Test files must define QUERY and EXPECTED".to_string()),
            ),
            Self::SandboxSpawn { .. } => (
                "sandbox_unavailable",
                Some("Install node or pass --node <PATH>".to_string()),
            ),
            Self::Sandbox { .. } | Self::SandboxIo { .. } | Self::SandboxProtocol { .. } => {
                ("sandbox_error", None)
            }
            Self::ReportSerialization { .. } => ("serialization_error", None),
            Self::ReportWrite { .. } => ("report_error", None),
        };

        ErrorResponse {
            error: ErrorBody {
                r#type: r#type.to_string(),
                message: self.to_string(),
                suggestion,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub r#type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::TesterError;
    use crate::extract::{ExtractError, FragmentKind};

    fn assert_error_type(
        error: TesterError,
        expected_type: &str,
        expected_suggestion_substring: Option<&str>,
    ) {
        let response = error.to_error_response();
        assert_eq!(response.error.r#type, expected_type);

        match (
            response.error.suggestion.as_deref(),
            expected_suggestion_substring,
        ) {
            (Some(actual), Some(expected_substring)) => {
                assert!(
                    actual.contains(expected_substring),
                    "suggestion should contain '{expected_substring}', got '{actual}'"
                );
            }
            (None, None) => {}
            (actual, expected) => {
                panic!("suggestion mismatch; actual={actual:?}, expected_contains={expected:?}")
            }
        }
    }

    #[test]
    fn extraction_errors_name_the_missing_fragment() {
        let error = TesterError::extraction(
            Path::new("doc/main.js"),
            ExtractError::AnchorNotFound {
                kind: FragmentKind::Function,
                name: "execSearch".to_string(),
            },
        );
        assert_eq!(
            error.to_string(),
            "unable to find function \"execSearch\" in 'doc/main.js'"
        );
        assert_error_type(error, "fragment_missing", Some("function 'execSearch'"));
    }

    #[test]
    fn io_errors_carry_the_path_without_suggestion() {
        let error = TesterError::io(Path::new("tests/vec.js"), std::io::Error::other("boom"));
        assert!(error.to_string().contains("tests/vec.js"));
        assert_error_type(error, "io_error", None);
    }

    #[test]
    fn sandbox_errors_share_one_response_type() {
        assert_error_type(TesterError::sandbox("exited"), "sandbox_error", None);
        assert_error_type(
            TesterError::SandboxIo {
                source: std::io::Error::other("broken pipe"),
            },
            "sandbox_error",
            None,
        );
        assert_error_type(
            TesterError::SandboxSpawn {
                program: "node".to_string(),
                source: std::io::Error::other("not found"),
            },
            "sandbox_unavailable",
            Some("--node"),
        );
    }

    #[test]
    fn invalid_test_case_suggests_required_bindings() {
        assert_error_type(
            TesterError::InvalidTestCase {
                message: "QUERY must be a string".to_string(),
            },
            "invalid_test_case",
            Some("QUERY and EXPECTED"),
        );
    }
}
