pub mod cli;
pub mod docs;
pub mod error;
pub mod execution_context;
pub mod extract;
pub mod matcher;
pub mod runner;
pub mod sandbox;
pub mod search;
pub mod span;
pub mod telemetry;
pub mod testcase;
