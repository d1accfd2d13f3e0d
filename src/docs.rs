//! Loading a generated documentation bundle and turning it into compilation
//! units for the sandbox.

use std::path::{Path, PathBuf};

use serde_json::json;
use tracing::debug;

use crate::error::TesterError;
use crate::execution_context::ExecutionContext;
use crate::extract::{FragmentKind, extract};
use crate::sandbox::{CompilationUnit, Sandbox};

pub const ROOT_PATH: &str = "../";

/// Which declarations of the search script the engine needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineManifest {
    pub arrays: Vec<String>,
    pub variables: Vec<String>,
    pub functions: Vec<String>,
}

impl Default for EngineManifest {
    fn default() -> Self {
        fn owned(names: &[&str]) -> Vec<String> {
            names.iter().map(ToString::to_string).collect()
        }

        Self {
            arrays: owned(&["itemTypes"]),
            variables: owned(&[
                "MAX_LEV_DISTANCE",
                "MAX_RESULTS",
                "NO_TYPE_FILTER",
                "GENERICS_DATA",
                "NAME",
                "INPUTS_DATA",
                "OUTPUT_DATA",
                "TY_PRIMITIVE",
                "TY_KEYWORD",
                "levenshtein_row2",
            ]),
            // buildIndex feeds execSearch; getQuery parses the raw query.
            functions: owned(&[
                "buildHrefAndPath",
                "pathSplitter",
                "levenshtein",
                "validateResult",
                "getQuery",
                "buildIndex",
                "execQuery",
                "execSearch",
            ]),
        }
    }
}

impl EngineManifest {
    fn entries(&self) -> impl Iterator<Item = (FragmentKind, &str)> {
        let arrays = self
            .arrays
            .iter()
            .map(|name| (FragmentKind::Array, name.as_str()));
        let variables = self
            .variables
            .iter()
            .map(|name| (FragmentKind::Variable, name.as_str()));
        let functions = self
            .functions
            .iter()
            .map(|name| (FragmentKind::Function, name.as_str()));
        arrays.chain(variables).chain(functions)
    }
}

/// The three script files rustdoc generates for one crate.
#[derive(Debug, Clone)]
pub struct DocBundle {
    pub crate_name: String,
    pub main_js_path: PathBuf,
    pub main_js: String,
    pub aliases: String,
    pub search_index_path: PathBuf,
    pub search_index: String,
}

impl DocBundle {
    /// Reads `main{version}.js`, `aliases{version}.js` and
    /// `search-index{version}.js` from `folder`.
    pub fn load<S: Sandbox>(
        context: &ExecutionContext<S>,
        folder: &Path,
        version: &str,
        crate_name: &str,
    ) -> Result<Self, TesterError> {
        let main_js_path = folder.join(format!("main{version}.js"));
        let aliases_path = folder.join(format!("aliases{version}.js"));
        let search_index_path = folder.join(format!("search-index{version}.js"));

        Ok(Self {
            crate_name: crate_name.to_string(),
            main_js: context.read_file_utf8(&main_js_path)?,
            aliases: context.read_file_utf8(&aliases_path)?,
            search_index: context.read_file_utf8(&search_index_path)?,
            main_js_path,
            search_index_path,
        })
    }

    pub fn engine_unit(&self, manifest: &EngineManifest) -> Result<CompilationUnit, TesterError> {
        engine_unit(
            &self.main_js,
            &self.main_js_path,
            &self.aliases,
            &self.crate_name,
            manifest,
        )
    }

    pub fn search_index_unit(&self) -> Result<CompilationUnit, TesterError> {
        search_index_unit(&self.search_index, &self.search_index_path)
    }
}

/// Builds the unit exposing the search functions.
///
/// The aliases script comes first, then every manifest entry followed by its
/// re-export.
pub fn engine_unit(
    main_js: &str,
    main_js_path: &Path,
    aliases: &str,
    crate_name: &str,
    manifest: &EngineManifest,
) -> Result<CompilationUnit, TesterError> {
    let mut unit = CompilationUnit::new(main_js_path.display().to_string())
        .bind("window", json!({ "currentCrate": crate_name }))
        .bind("rootPath", json!(ROOT_PATH));
    unit.push_source(aliases);

    for (kind, name) in manifest.entries() {
        let fragment = extract(main_js, kind, name)
            .map_err(|source| TesterError::extraction(main_js_path, source))?;
        debug!(%kind, name, span = %fragment.span, "extracted fragment");
        unit.push_source(fragment.text(main_js));
        unit.export(name);
    }

    Ok(unit)
}

/// Builds the unit exposing `searchIndex`.
///
/// The generated file ends with a call that wires the index into the page;
/// that last line is dropped (after one trailing empty line, if any).
pub fn search_index_unit(raw: &str, path: &Path) -> Result<CompilationUnit, TesterError> {
    let mut lines: Vec<&str> = raw.split('\n').collect();
    if lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    if lines.pop().is_none() || lines.is_empty() {
        return Err(TesterError::InvalidSearchIndex {
            path: path.display().to_string(),
            message: "expected the index declaration followed by an init call".to_string(),
        });
    }

    let mut unit = CompilationUnit::new(path.display().to_string());
    unit.push_source(&lines.join("\n"));
    unit.push_source("\n");
    unit.export("searchIndex");
    Ok(unit)
}
