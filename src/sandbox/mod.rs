//! The "compile this text, expose named symbols" capability.
//!
//! Extracted fragments are stitched into a [`CompilationUnit`] and handed to a
//! [`Sandbox`]. Values produced inside the sandbox stay there as
//! [`Binding::Handle`]s until [`Module::to_json`] is asked for them, so opaque
//! engine state (a built search index, a parsed query) never has to survive a
//! JSON round trip. Values are released explicitly with [`Module::release`],
//! or all at once when their module goes away.

use serde_json::Value;

use crate::error::TesterError;

mod node;

pub use node::{LiveValues, NodeModule, NodeSandbox};

/// Opaque reference to a value that lives inside a sandbox session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Json(Value),
    Handle(Handle),
}

impl From<Value> for Binding {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

/// Source text plus the named values it is compiled against.
///
/// `bindings` are declared ahead of `source`, which keeps configuration such
/// as the current crate explicit instead of mutating shared globals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompilationUnit {
    pub filename: String,
    pub bindings: Vec<(String, Value)>,
    pub source: String,
}

impl CompilationUnit {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            ..Self::default()
        }
    }

    pub fn bind(mut self, name: impl Into<String>, value: Value) -> Self {
        self.bindings.push((name.into(), value));
        self
    }

    pub fn push_source(&mut self, text: &str) {
        self.source.push_str(text);
    }

    /// Appends `exports.NAME = NAME;`.
    pub fn export(&mut self, name: &str) {
        self.source.push_str("exports.");
        self.source.push_str(name);
        self.source.push_str(" = ");
        self.source.push_str(name);
        self.source.push(';');
    }

    /// Appends an export that yields `null` when `name` is not declared.
    pub fn export_optional(&mut self, name: &str) {
        self.source.push_str(&format!(
            "exports.{name} = typeof {name} === 'undefined' ? null : {name};"
        ));
    }
}

pub trait Sandbox {
    type Module: Module;

    fn compile(&self, unit: &CompilationUnit) -> Result<Self::Module, TesterError>;
}

pub trait Module {
    /// Looks up an exported symbol. Missing exports resolve to `null`.
    fn get(&self, name: &str) -> Result<Binding, TesterError>;

    /// Calls an exported function.
    fn call(&self, name: &str, args: &[Binding]) -> Result<Binding, TesterError>;

    fn to_json(&self, binding: &Binding) -> Result<Value, TesterError>;

    fn get_json(&self, name: &str) -> Result<Value, TesterError> {
        let binding = self.get(name)?;
        let value = self.to_json(&binding);
        self.release(std::slice::from_ref(&binding))?;
        value
    }

    /// Lets the sandbox drop values it holds for these bindings. Plain JSON
    /// bindings hold nothing.
    fn release(&self, _bindings: &[Binding]) -> Result<(), TesterError> {
        Ok(())
    }
}
