use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use super::{Binding, CompilationUnit, Handle, Module, Sandbox};
use crate::error::TesterError;

const DRIVER: &str = include_str!("driver.js");

/// Sandbox backed by one long-lived `node` process running the request loop
/// in `driver.js`.
pub struct NodeSandbox {
    session: Arc<Session>,
}

pub struct NodeModule {
    session: Arc<Session>,
    id: u64,
}

struct Session {
    process: Mutex<Process>,
}

struct Process {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl Drop for Process {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Request<'a> {
    Compile {
        filename: &'a str,
        source: &'a str,
        bindings: &'a [(String, Value)],
    },
    Get {
        module: u64,
        name: &'a str,
    },
    Call {
        module: u64,
        name: &'a str,
        args: Vec<WireArg<'a>>,
    },
    Resolve {
        slot: u64,
    },
    Release {
        #[serde(skip_serializing_if = "Option::is_none")]
        module: Option<u64>,
        slots: Vec<u64>,
    },
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WireArg<'a> {
    Slot { slot: u64 },
    Value { value: &'a Value },
}

impl<'a> From<&'a Binding> for WireArg<'a> {
    fn from(binding: &'a Binding) -> Self {
        match binding {
            Binding::Json(value) => Self::Value { value },
            Binding::Handle(Handle(slot)) => Self::Slot { slot: *slot },
        }
    }
}

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    ok: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModuleReply {
    module: u64,
}

#[derive(Debug, Deserialize)]
struct SlotReply {
    slot: u64,
}

#[derive(Debug, Deserialize)]
struct ValueReply {
    #[serde(default)]
    value: Value,
}

/// What the session still holds after a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LiveValues {
    pub released: usize,
    #[serde(rename = "live")]
    pub slots: usize,
    pub modules: usize,
}

impl NodeSandbox {
    pub fn spawn(program: &Path) -> Result<Self, TesterError> {
        let spawn_error = |source| TesterError::SandboxSpawn {
            program: program.display().to_string(),
            source,
        };

        let mut child = Command::new(program)
            .arg("-e")
            .arg(DRIVER)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(spawn_error)?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            return Err(TesterError::sandbox("sandbox process has no stdio pipes"));
        };
        debug!(program = %program.display(), pid = child.id(), "sandbox started");

        Ok(Self {
            session: Arc::new(Session {
                process: Mutex::new(Process {
                    child,
                    stdin,
                    stdout: BufReader::new(stdout),
                }),
            }),
        })
    }
}

impl NodeSandbox {
    /// Counts the modules and values the child still keeps alive.
    pub fn live_values(&self) -> Result<LiveValues, TesterError> {
        self.session.release(None, Vec::new())
    }
}

impl Session {
    fn release(&self, module: Option<u64>, slots: Vec<u64>) -> Result<LiveValues, TesterError> {
        self.request(&Request::Release { module, slots })
    }

    fn request<T: DeserializeOwned>(&self, request: &Request<'_>) -> Result<T, TesterError> {
        let mut line = serde_json::to_string(request)
            .map_err(|source| TesterError::SandboxProtocol { source })?;
        line.push('\n');

        let mut process = self
            .process
            .lock()
            .map_err(|_| TesterError::sandbox("sandbox session lock poisoned"))?;

        process
            .stdin
            .write_all(line.as_bytes())
            .and_then(|()| process.stdin.flush())
            .map_err(|source| TesterError::SandboxIo { source })?;

        let mut reply = String::new();
        let read = process
            .stdout
            .read_line(&mut reply)
            .map_err(|source| TesterError::SandboxIo { source })?;
        if read == 0 {
            return Err(TesterError::sandbox("sandbox process exited before replying"));
        }
        trace!(bytes = read, "sandbox replied");

        let response: Response = serde_json::from_str(&reply)
            .map_err(|source| TesterError::SandboxProtocol { source })?;
        match response {
            Response {
                error: Some(message),
                ..
            } => Err(TesterError::Sandbox { message }),
            Response { ok: Some(ok), .. } => {
                serde_json::from_value(ok).map_err(|source| TesterError::SandboxProtocol { source })
            }
            Response { .. } => Err(TesterError::sandbox("sandbox reply carried no result")),
        }
    }
}

impl Sandbox for NodeSandbox {
    type Module = NodeModule;

    fn compile(&self, unit: &CompilationUnit) -> Result<NodeModule, TesterError> {
        debug!(
            filename = unit.filename.as_str(),
            bytes = unit.source.len(),
            bindings = unit.bindings.len(),
            "compiling unit"
        );
        let reply: ModuleReply = self.session.request(&Request::Compile {
            filename: &unit.filename,
            source: &unit.source,
            bindings: &unit.bindings,
        })?;

        Ok(NodeModule {
            session: Arc::clone(&self.session),
            id: reply.module,
        })
    }
}

impl Module for NodeModule {
    fn get(&self, name: &str) -> Result<Binding, TesterError> {
        let reply: SlotReply = self.session.request(&Request::Get {
            module: self.id,
            name,
        })?;
        Ok(Binding::Handle(Handle(reply.slot)))
    }

    fn call(&self, name: &str, args: &[Binding]) -> Result<Binding, TesterError> {
        trace!(module = self.id, name, arity = args.len(), "calling export");
        let reply: SlotReply = self.session.request(&Request::Call {
            module: self.id,
            name,
            args: args.iter().map(WireArg::from).collect(),
        })?;
        Ok(Binding::Handle(Handle(reply.slot)))
    }

    fn to_json(&self, binding: &Binding) -> Result<Value, TesterError> {
        match binding {
            Binding::Json(value) => Ok(value.clone()),
            Binding::Handle(Handle(slot)) => {
                let reply: ValueReply = self.session.request(&Request::Resolve { slot: *slot })?;
                Ok(reply.value)
            }
        }
    }

    fn release(&self, bindings: &[Binding]) -> Result<(), TesterError> {
        let slots: Vec<u64> = bindings
            .iter()
            .filter_map(|binding| match binding {
                Binding::Handle(Handle(slot)) => Some(*slot),
                Binding::Json(_) => None,
            })
            .collect();
        if slots.is_empty() {
            return Ok(());
        }

        let live = self.session.release(None, slots)?;
        trace!(module = self.id, released = live.released, live = live.slots, "values released");
        Ok(())
    }
}

impl Drop for NodeModule {
    fn drop(&mut self) {
        match self.session.release(Some(self.id), Vec::new()) {
            Ok(live) => debug!(
                module = self.id,
                released = live.released,
                live = live.slots,
                modules = live.modules,
                "module released"
            ),
            Err(error) => debug!(module = self.id, %error, "module release failed"),
        }
    }
}
