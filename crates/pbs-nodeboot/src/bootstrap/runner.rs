use std::process::{Command, Output, Stdio};

use bstr::ByteSlice;
use serde::Serialize;

use crate::common::utils::str::shell_join;

/// Exit code reported by shells for a command that cannot be executed.
pub const SPAWN_FAILURE_CODE: i32 = 127;

/// A fully resolved external command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Environment variables set in addition to the inherited environment.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<(String, String)>,
}

impl Invocation {
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
            args: vec![],
            env: vec![],
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Shell-like rendering, used for logs and for printing plans.
    pub fn command_line(&self) -> String {
        let mut parts: Vec<String> = self.env.iter().map(|(k, v)| format!("{k}={v}")).collect();
        parts.push(self.program.clone());
        parts.extend(self.args.iter().cloned());
        shell_join(&parts)
    }
}

/// How a finished command ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code of the process, `None` if it was terminated by a signal.
    pub code: Option<i32>,
    pub signal: Option<i32>,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Exit status in the form a shell would report it.
    pub fn shell_code(&self) -> i32 {
        match (self.code, self.signal) {
            (Some(code), _) => code,
            (None, Some(signal)) => 128 + signal,
            (None, None) => 1,
        }
    }
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        #[cfg(unix)]
        let signal = std::os::unix::process::ExitStatusExt::signal(&output.status);
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: output.status.code(),
            signal,
            stderr: output.stderr.to_str_lossy().trim().to_string(),
        }
    }
}

/// Executes external commands on behalf of the bootstrap.
pub trait CommandRunner {
    /// Runs the command to completion.
    /// An error means that the process could not be started at all.
    fn run(&mut self, invocation: &Invocation) -> std::io::Result<CommandOutput>;
}

/// Runs commands as child processes of the current process.
///
/// The standard output of a command is forwarded to the standard error of this process,
/// stdout is reserved for the printed report. Only stderr is captured.
#[derive(Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, invocation: &Invocation) -> std::io::Result<CommandOutput> {
        log::debug!("Running command `{}`", invocation.command_line());

        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        command.envs(invocation.env.iter().map(|(k, v)| (k, v)));
        command.stdout(Stdio::from(std::io::stderr()));
        command.stderr(Stdio::piped());

        let output = CommandOutput::from(command.output()?);
        log::trace!("Command `{}` stderr\n{}", invocation.program, output.stderr);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use crate::bootstrap::runner::{CommandOutput, CommandRunner, Invocation, SystemRunner};

    #[test]
    fn test_command_line_rendering() {
        let invocation = Invocation::new("apt-get")
            .args(["install", "-y", "python3"])
            .env("DEBIAN_FRONTEND", "noninteractive");
        assert_eq!(
            invocation.command_line(),
            "DEBIAN_FRONTEND=noninteractive apt-get install -y python3"
        );
    }

    #[test]
    fn test_shell_code() {
        let output = |code, signal| CommandOutput {
            code,
            signal,
            stderr: String::new(),
        };
        assert_eq!(output(Some(0), None).shell_code(), 0);
        assert_eq!(output(Some(3), None).shell_code(), 3);
        assert_eq!(output(None, Some(9)).shell_code(), 137);
        assert_eq!(output(None, None).shell_code(), 1);
        assert!(output(Some(0), None).success());
        assert!(!output(None, Some(15)).success());
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_captures_exit_code() {
        let mut runner = SystemRunner;
        let output = runner
            .run(&Invocation::new("sh").args(["-c", "echo out; echo err >&2; exit 3"]))
            .unwrap();
        assert_eq!(output.code, Some(3));
        // Stdout is forwarded, not captured
        assert_eq!(output.stderr, "err");
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_passes_env() {
        let mut runner = SystemRunner;
        let output = runner
            .run(
                &Invocation::new("sh")
                    .args(["-c", "echo $NODEBOOT_TEST_VAR >&2"])
                    .env("NODEBOOT_TEST_VAR", "hello"),
            )
            .unwrap();
        assert!(output.success());
        assert_eq!(output.stderr, "hello");
    }

    #[test]
    fn test_system_runner_missing_program() {
        let mut runner = SystemRunner;
        assert!(
            runner
                .run(&Invocation::new("/nonexistent/pbs-nodeboot-test-binary"))
                .is_err()
        );
    }
}
