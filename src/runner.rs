//! Runs test files against the search engine of a doc bundle.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::docs::{DocBundle, EngineManifest};
use crate::error::{ErrorBody, TesterError};
use crate::execution_context::ExecutionContext;
use crate::matcher::{Outcome, judge, verify};
use crate::sandbox::{Binding, Module, Sandbox};
use crate::search::{ModuleSearchEngine, SearchEngine};
use crate::testcase::{TestCase, load_test_case, test_name};

pub const STD_CRATE: &str = "std";
pub const SEARCH_INDEX: &str = "searchIndex";

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub doc_folder: PathBuf,
    pub test_file: Option<PathBuf>,
    pub test_folder: Option<PathBuf>,
    /// Suffix of the generated script names (`main{version}.js`).
    pub version: String,
    /// Load the bundle in `doc_folder` once, as crate `std`, for every file.
    pub std: bool,
    pub manifest: EngineManifest,
    pub node: PathBuf,
}

/// A compiled search engine together with the index it was built from.
pub struct CrateEngine<M> {
    engine: ModuleSearchEngine<M>,
    index: Binding,
}

impl<M: Module> CrateEngine<M> {
    pub fn load<S: Sandbox<Module = M>>(
        context: &ExecutionContext<S>,
        folder: &Path,
        version: &str,
        crate_name: &str,
        manifest: &EngineManifest,
    ) -> Result<Self, TesterError> {
        let bundle = DocBundle::load(context, folder, version, crate_name)?;
        let engine = ModuleSearchEngine::new(context.sandbox().compile(&bundle.engine_unit(manifest)?)?);
        let index_module = context.sandbox().compile(&bundle.search_index_unit()?)?;
        let raw_index = index_module.get(SEARCH_INDEX)?;
        let index = engine.build_index(&raw_index)?;
        // Dropping `index_module` releases the raw index slot.
        debug!(crate_name, folder = %folder.display(), "search engine loaded");

        Ok(Self { engine, index })
    }

    /// Runs one test case. The parsed query is released once the search is
    /// done; the index lives as long as the engine.
    pub fn check(&self, case: &TestCase) -> Result<Outcome, TesterError> {
        let query = self.engine.get_query(&case.query)?;
        let results = self
            .engine
            .exec_search(&query, &self.index, case.filter_crate.as_deref());
        self.engine.module().release(std::slice::from_ref(&query))?;
        let results = results?;
        let diagnostics = verify(&case.expected, &results, case.policy);
        Ok(judge(diagnostics, case.policy))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Ok,
    Failed,
    /// The file could not be checked at all.
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub name: String,
    pub path: String,
    pub status: FileStatus,
    pub messages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl FileReport {
    pub fn from_outcome(name: String, path: &Path, outcome: &Outcome) -> Self {
        Self {
            name,
            path: path.display().to_string(),
            status: if outcome.is_pass() {
                FileStatus::Ok
            } else {
                FileStatus::Failed
            },
            messages: outcome.messages(),
            error: None,
        }
    }

    pub fn from_error(name: String, path: &Path, error: &TesterError) -> Self {
        Self {
            name,
            path: path.display().to_string(),
            status: FileStatus::Error,
            messages: vec![format!("==> {error}")],
            error: Some(error.to_error_response().error),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status != FileStatus::Ok
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub files: Vec<FileReport>,
    pub failures: usize,
}

impl RunSummary {
    pub fn push(&mut self, report: FileReport) {
        if report.is_failure() {
            self.failures += 1;
        }
        self.files.push(report);
    }

    pub fn is_success(&self) -> bool {
        self.failures == 0
    }
}

/// Receives progress while files are checked.
pub trait ReportSink {
    fn started(&mut self, name: &str) -> Result<(), TesterError>;

    fn finished(&mut self, report: &FileReport) -> Result<(), TesterError>;
}

/// Checks the single test file first, then the folder's files in name order.
///
/// Failing to load the shared std bundle aborts the run; any other problem
/// only fails the file it belongs to.
pub fn run<S: Sandbox>(
    context: &ExecutionContext<S>,
    config: &RunConfig,
    sink: &mut impl ReportSink,
) -> Result<RunSummary, TesterError> {
    let std_engine = if config.std {
        Some(CrateEngine::load(
            context,
            &config.doc_folder,
            &config.version,
            STD_CRATE,
            &config.manifest,
        )?)
    } else {
        None
    };

    let mut files = Vec::new();
    if let Some(test_file) = &config.test_file {
        files.push(test_file.clone());
    }
    if let Some(test_folder) = &config.test_folder {
        files.extend(context.list_test_files(test_folder)?);
    }

    let mut summary = RunSummary::default();
    for path in files {
        let name = test_name(&path);
        sink.started(&name)?;

        let report = match check_file(context, config, std_engine.as_ref(), &path, &name) {
            Ok(outcome) => {
                debug!(
                    test = name.as_str(),
                    errors = outcome.error_count(),
                    "test checked"
                );
                FileReport::from_outcome(name, &path, &outcome)
            }
            Err(error) => {
                warn!(test = name.as_str(), %error, "test could not be checked");
                FileReport::from_error(name, &path, &error)
            }
        };

        sink.finished(&report)?;
        summary.push(report);
    }

    Ok(summary)
}

fn check_file<S: Sandbox>(
    context: &ExecutionContext<S>,
    config: &RunConfig,
    std_engine: Option<&CrateEngine<S::Module>>,
    path: &Path,
    name: &str,
) -> Result<Outcome, TesterError> {
    let crate_engine;
    let engine = match std_engine {
        Some(engine) => engine,
        None => {
            crate_engine = CrateEngine::load(
                context,
                &config.doc_folder.join(name),
                &config.version,
                name,
                &config.manifest,
            )?;
            &crate_engine
        }
    };

    let source = context.read_file_utf8(path)?;
    let case = load_test_case(context.sandbox(), path, &source)?;
    engine.check(&case)
}
