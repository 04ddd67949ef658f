use std::collections::HashSet;
use std::path::PathBuf;

use crate::bootstrap::runner::{CommandOutput, CommandRunner, Invocation};
use crate::manager::BinaryLookup;

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Pretends that the given binaries are installed in `/usr/bin`.
pub struct FakeLookup {
    binaries: HashSet<String>,
}

impl FakeLookup {
    pub fn new(binaries: &[&str]) -> Self {
        Self {
            binaries: binaries.iter().map(|b| b.to_string()).collect(),
        }
    }
}

impl BinaryLookup for FakeLookup {
    fn find(&self, name: &str) -> Option<PathBuf> {
        self.binaries
            .contains(name)
            .then(|| PathBuf::from("/usr/bin").join(name))
    }
}

#[derive(Clone)]
pub enum FakeResponse {
    Exit(i32, &'static str),
    SpawnError,
}

/// Records executed commands instead of running them.
/// Commands succeed unless their command line contains a pattern registered with `respond`.
#[derive(Default)]
pub struct FakeRunner {
    responses: Vec<(String, FakeResponse)>,
    executed: Vec<Invocation>,
}

impl FakeRunner {
    pub fn respond(mut self, pattern: &str, response: FakeResponse) -> Self {
        self.responses.push((pattern.to_string(), response));
        self
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.executed
            .iter()
            .map(|invocation| invocation.command_line())
            .collect()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&mut self, invocation: &Invocation) -> std::io::Result<CommandOutput> {
        self.executed.push(invocation.clone());
        let command_line = invocation.command_line();
        let response = self
            .responses
            .iter()
            .find(|(pattern, _)| command_line.contains(pattern.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or(FakeResponse::Exit(0, ""));

        match response {
            FakeResponse::Exit(code, stderr) => Ok(CommandOutput {
                code: Some(code),
                signal: None,
                stderr: stderr.to_string(),
            }),
            FakeResponse::SpawnError => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No such file or directory",
            )),
        }
    }
}
