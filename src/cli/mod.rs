use std::path::PathBuf;

use clap::{ArgGroup, Parser};

use crate::docs::EngineManifest;
use crate::error::TesterError;
use crate::execution_context::ExecutionContext;
use crate::runner::{self, RunConfig, RunSummary};
use crate::sandbox::NodeSandbox;

pub mod report;

use report::{SilentSink, TextReporter};

#[derive(Debug, Parser)]
#[command(name = "rustdoc-js")]
#[command(about = "Check rustdoc search results against expected results")]
#[command(
    long_about = "Loads the search script generated by rustdoc, runs every test query through it and compares the results with the test's EXPECTED lists."
)]
#[command(group(
    ArgGroup::new("tests")
        .required(true)
        .multiple(true)
        .args(["test_file", "test_folder"])
))]
pub struct Cli {
    #[arg(long, value_name = "PATH", help = "Location of the generated doc folder")]
    pub doc_folder: PathBuf,

    #[arg(
        long,
        value_name = "PATH",
        conflicts_with = "std",
        help = "Location of the JS test file"
    )]
    pub test_file: Option<PathBuf>,

    #[arg(long, value_name = "PATH", help = "Location of the JS tests folder")]
    pub test_folder: Option<PathBuf>,

    #[arg(
        long,
        value_name = "STRING",
        help = "Version used when generating docs (used to get js files)"
    )]
    pub version: Option<String>,

    #[arg(long, help = "Run std tests against the bundle in --doc-folder")]
    pub std: bool,

    #[arg(
        long,
        value_name = "PATH",
        env = "RUSTDOC_JS_NODE",
        default_value = "node",
        help = "Node binary used to evaluate the search script"
    )]
    pub node: PathBuf,

    #[arg(long, help = "Print a JSON summary instead of progress lines")]
    pub json: bool,
}

impl Cli {
    pub fn into_config(self) -> RunConfig {
        RunConfig {
            doc_folder: self.doc_folder,
            test_file: self.test_file,
            test_folder: self.test_folder,
            version: self.version.unwrap_or_default(),
            std: self.std,
            manifest: EngineManifest::default(),
            node: self.node,
        }
    }
}

/// Runs every requested test file, printing progress or a JSON summary.
pub fn run_cli(config: &RunConfig, json: bool) -> Result<RunSummary, TesterError> {
    let context = ExecutionContext::new(NodeSandbox::spawn(&config.node)?);

    if json {
        let summary = runner::run(&context, config, &mut SilentSink)?;
        println!("{}", report::render_json(&summary)?);
        Ok(summary)
    } else {
        runner::run(&context, config, &mut TextReporter::stdio())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;
    use clap::error::ErrorKind;

    use super::Cli;

    #[test]
    fn parses_folder_run_with_version_suffix() {
        let cli = Cli::try_parse_from([
            "rustdoc-js",
            "--doc-folder",
            "build/doc",
            "--test-folder",
            "tests/js-std",
            "--version",
            "1.50.0",
            "--std",
        ])
        .expect("arguments should parse");

        let config = cli.into_config();
        assert_eq!(config.doc_folder, PathBuf::from("build/doc"));
        assert_eq!(config.test_folder, Some(PathBuf::from("tests/js-std")));
        assert_eq!(config.version, "1.50.0");
        assert!(config.std);
        assert!(config.test_file.is_none());
    }

    #[test]
    fn version_defaults_to_empty_suffix() {
        let cli = Cli::try_parse_from(["rustdoc-js", "--doc-folder", "doc", "--test-file", "a.js"])
            .expect("arguments should parse");
        assert_eq!(cli.into_config().version, "");
    }

    #[test]
    fn test_file_and_folder_may_be_combined() {
        let cli = Cli::try_parse_from([
            "rustdoc-js",
            "--doc-folder",
            "doc",
            "--test-file",
            "a.js",
            "--test-folder",
            "tests",
        ])
        .expect("both test sources should be accepted");
        assert!(cli.test_file.is_some());
        assert!(cli.test_folder.is_some());
    }

    #[test]
    fn requires_some_test_source() {
        let error = Cli::try_parse_from(["rustdoc-js", "--doc-folder", "doc"])
            .expect_err("missing test source should fail");
        assert_eq!(error.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn std_conflicts_with_single_test_file() {
        let error = Cli::try_parse_from([
            "rustdoc-js",
            "--doc-folder",
            "doc",
            "--test-file",
            "a.js",
            "--std",
        ])
        .expect_err("--std with --test-file should fail");
        assert_eq!(error.kind(), ErrorKind::ArgumentConflict);
    }
}
