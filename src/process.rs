//! External command execution with captured output.
//!
//! A non-zero exit is turned into [`Error::PackagingTool`] carrying the
//! command's diagnostic output verbatim: stderr, or stdout when stderr is
//! empty.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use tracing::debug;

use crate::error::{Error, Result};

/// Result of a command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Exit code, or -1 if terminated by signal.
    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }

    /// The output a user needs to see when the command failed.
    pub fn diagnostic(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }
}

/// Builder for configuring command execution.
pub struct Cmd {
    program: PathBuf,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    allow_fail: bool,
}

impl Cmd {
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            current_dir: None,
            allow_fail: false,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.args.push(arg.as_ref().to_string());
        }
        self
    }

    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    pub fn dir(mut self, dir: &Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }

    /// Return the result instead of failing on a non-zero exit.
    pub fn allow_fail(mut self) -> Self {
        self.allow_fail = true;
        self
    }

    /// The command line as it would be typed, for logging.
    pub fn display(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Run the command to completion and capture its output.
    pub fn run(self) -> Result<CommandResult> {
        debug!("Execute: {}", self.display());
        let tool = self.program.display().to_string();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().map_err(|e| Error::PackagingTool {
            tool: tool.clone(),
            message: format!("cannot execute '{tool}': {e}"),
        })?;

        let result = CommandResult {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !self.allow_fail && !result.success() {
            let diagnostic = result.diagnostic();
            let message = if diagnostic.is_empty() {
                format!("exit code {}", result.code())
            } else {
                format!("exit code {}:\n{}", result.code(), diagnostic)
            };
            return Err(Error::PackagingTool { tool, message });
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_success_captures_stdout() {
        let result = Cmd::new("echo").args(["hello", "world"]).run().unwrap();
        assert!(result.success());
        assert_eq!(result.stdout.trim(), "hello world");
    }

    #[test]
    fn test_failure_carries_stderr_verbatim() {
        let err = Cmd::new("sh")
            .args(["-c", "echo 'error: line 3: bad tag' >&2; exit 1"])
            .run()
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("exit code 1"));
        assert!(msg.contains("error: line 3: bad tag"));
    }

    #[test]
    fn test_failure_falls_back_to_stdout() {
        let err = Cmd::new("sh")
            .args(["-c", "echo only-stdout; exit 2"])
            .run()
            .unwrap_err();
        assert!(err.to_string().contains("only-stdout"));
    }

    #[test]
    fn test_missing_program_is_packaging_error() {
        let err = Cmd::new("definitely_not_a_real_command_12345").run().unwrap_err();
        assert!(matches!(err, Error::PackagingTool { .. }));
    }

    #[test]
    fn test_allow_fail() {
        let result = Cmd::new("false").allow_fail().run().unwrap();
        assert!(!result.success());
        assert_eq!(result.code(), 1);
    }

    #[test]
    fn test_run_in_directory() {
        let result = Cmd::new("pwd").dir(Path::new("/tmp")).run().unwrap();
        assert!(result.stdout.contains("tmp"));
    }

    #[test]
    fn test_display() {
        let cmd = Cmd::new("rpmbuild")
            .arg("-bb")
            .arg_path(Path::new("/tmp/x.spec"));
        assert_eq!(cmd.display(), "rpmbuild -bb /tmp/x.spec");
    }
}
