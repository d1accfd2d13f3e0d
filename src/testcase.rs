use std::path::Path;

use serde_json::Value;

use crate::error::TesterError;
use crate::matcher::{Categories, Expectation, Policy};
use crate::sandbox::{CompilationUnit, Module, Sandbox};

const IGNORE_ORDER: &str = "// ignore-order";
const EXACT_CHECK: &str = "// exact-check";
const SHOULD_FAIL: &str = "// should-fail";

#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    pub name: String,
    pub query: String,
    pub expected: Categories<Expectation>,
    pub filter_crate: Option<String>,
    pub policy: Policy,
}

impl Policy {
    /// Reads the marker comments of a test file. A marker must be the whole
    /// line and the line must be terminated.
    pub fn from_source(source: &str) -> Self {
        let mut policy = Self::default();
        for line in source.split_inclusive('\n') {
            let Some(line) = line.strip_suffix('\n') else {
                continue;
            };
            match line.strip_suffix('\r').unwrap_or(line) {
                IGNORE_ORDER => policy.ignore_order = true,
                EXACT_CHECK => policy.exact_check = true,
                SHOULD_FAIL => policy.should_fail = true,
                _ => {}
            }
        }
        policy
    }
}

/// The test name is the file stem (`vec.js` is test `vec`, checked against
/// crate `vec`).
pub fn test_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn load_test_case<S: Sandbox>(
    sandbox: &S,
    path: &Path,
    source: &str,
) -> Result<TestCase, TesterError> {
    let mut unit = CompilationUnit::new(path.display().to_string());
    unit.push_source(source);
    unit.push_source("\n");
    unit.export("QUERY");
    unit.export("EXPECTED");
    unit.export_optional("FILTER_CRATE");

    let module = sandbox.compile(&unit)?;

    let query = match module.get_json("QUERY")? {
        Value::String(query) => query,
        other => {
            return Err(TesterError::InvalidTestCase {
                message: format!("QUERY must be a string, got {other}"),
            });
        }
    };
    let expected = Categories::expected_from_json(module.get_json("EXPECTED")?)?;
    let filter_crate = match module.get_json("FILTER_CRATE")? {
        Value::Null => None,
        Value::String(name) => Some(name),
        other => {
            return Err(TesterError::InvalidTestCase {
                message: format!("FILTER_CRATE must be a string, got {other}"),
            });
        }
    };

    Ok(TestCase {
        name: test_name(path),
        query,
        expected,
        filter_crate,
        policy: Policy::from_source(source),
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::test_name;
    use crate::matcher::Policy;

    #[test]
    fn markers_are_detected_on_first_line_and_later_lines() {
        let policy = Policy::from_source("// exact-check\n\nconst QUERY = 'vec';\n// should-fail\n");
        assert!(policy.exact_check);
        assert!(policy.should_fail);
        assert!(!policy.ignore_order);
    }

    #[test]
    fn markers_must_fill_the_whole_line() {
        let policy = Policy::from_source("const QUERY = 'a'; // ignore-order\n  // exact-check\n");
        assert_eq!(policy, Policy::default());
    }

    #[test]
    fn markers_accept_crlf_line_endings() {
        let policy = Policy::from_source("// ignore-order\r\nconst QUERY = 'a';\r\n");
        assert!(policy.ignore_order);
    }

    #[test]
    fn marker_on_unterminated_last_line_is_ignored() {
        let policy = Policy::from_source("const QUERY = 'a';\n// should-fail");
        assert!(!policy.should_fail);

        let policy = Policy::from_source("// should-fail\n");
        assert!(policy.should_fail);
    }

    #[test]
    fn test_name_uses_file_stem() {
        assert_eq!(test_name(Path::new("tests/js-std/vec-new.js")), "vec-new");
    }
}
