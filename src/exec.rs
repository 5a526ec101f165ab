//! blocking invocation of external tools (git, conan)

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tracing::debug;

use crate::error::{Error, Result};

/// outcome of a command whose failure means "not there (yet)"
///
/// a tool that cannot be spawned is still an `Err`, so a missing branch is
/// never confused with a missing executable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Probe<T = ()> {
    Found(T),
    NotFound,
}

impl<T> Probe<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Probe::Found(_))
    }
}

/// an external executable plus the environment it always runs with
#[derive(Clone, Debug)]
pub struct Tool {
    program: OsString,
    env: Vec<(OsString, OsString)>,
}

impl Tool {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            env: vec![],
        }
    }

    /// set an environment variable for every invocation
    pub fn with_env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// run in `dir`, inheriting stdout, failing on non-zero exit
    pub fn run<I, S>(&self, dir: &Path, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let args = collect_args(args);
        let output = self.spawn(dir, &args, false)?;
        self.check(&args, &output)?;
        Ok(())
    }

    /// run in `dir` and return trimmed stdout, failing on non-zero exit
    pub fn output<I, S>(&self, dir: &Path, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let args = collect_args(args);
        let output = self.spawn(dir, &args, true)?;
        self.check(&args, &output)?;
        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }

    /// run in `dir`; exit code zero is `Found(stdout)`, any listed code is
    /// `NotFound`, everything else is an error
    pub fn probe<I, S>(&self, dir: &Path, args: I, not_found_codes: &[i32]) -> Result<Probe<String>>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let args = collect_args(args);
        let output = self.spawn(dir, &args, true)?;

        if output.status.success() {
            return Ok(Probe::Found(
                String::from_utf8_lossy(&output.stdout).trim_end().to_string(),
            ));
        }

        match output.status.code() {
            Some(code) if not_found_codes.contains(&code) => Ok(Probe::NotFound),
            _ => Err(self.failure(&args, &output)),
        }
    }

    fn spawn(&self, dir: &Path, args: &[OsString], capture_stdout: bool) -> Result<Output> {
        debug!("{} (in {})", self.command_line(args), dir.display());

        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stderr(Stdio::piped());
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        if capture_stdout {
            cmd.stdout(Stdio::piped());
        } else {
            cmd.stdout(Stdio::inherit());
        }

        cmd.output().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                Error::ToolNotFound(self.program.to_string_lossy().into_owned())
            } else {
                Error::Io {
                    path: PathBuf::from(&self.program),
                    source: e,
                }
            }
        })
    }

    fn check(&self, args: &[OsString], output: &Output) -> Result<()> {
        if output.status.success() {
            Ok(())
        } else {
            Err(self.failure(args, output))
        }
    }

    fn failure(&self, args: &[OsString], output: &Output) -> Error {
        Error::CommandFailed {
            command: self.command_line(args),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }

    fn command_line(&self, args: &[OsString]) -> String {
        let mut line = self.program.to_string_lossy().into_owned();
        for arg in args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

fn collect_args<I, S>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    args.into_iter().map(Into::into).collect()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_output_trims_trailing_newline() {
        let dir = tempdir().unwrap();
        let out = Tool::new("sh")
            .output(dir.path(), ["-c", "echo hello"])
            .unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn test_env_is_passed() {
        let dir = tempdir().unwrap();
        let out = Tool::new("sh")
            .with_env("BARBARIAN_TEST_VAR", "value")
            .output(dir.path(), ["-c", "echo $BARBARIAN_TEST_VAR"])
            .unwrap();
        assert_eq!(out, "value");
    }

    #[test]
    fn test_run_failure_carries_stderr() {
        let dir = tempdir().unwrap();
        let err = Tool::new("sh")
            .run(dir.path(), ["-c", "echo broken >&2; exit 3"])
            .unwrap_err();
        match err {
            Error::CommandFailed { stderr, .. } => assert_eq!(stderr, "broken"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_probe_tristate() {
        let dir = tempdir().unwrap();
        let sh = Tool::new("sh");

        let found = sh.probe(dir.path(), ["-c", "echo yes"], &[2]).unwrap();
        assert_eq!(found, Probe::Found("yes".to_string()));

        let missing = sh.probe(dir.path(), ["-c", "exit 2"], &[2]).unwrap();
        assert_eq!(missing, Probe::NotFound);

        let broken = sh.probe(dir.path(), ["-c", "exit 128"], &[2]);
        assert!(matches!(broken, Err(Error::CommandFailed { .. })));
    }

    #[test]
    fn test_missing_tool() {
        let dir = tempdir().unwrap();
        let err = Tool::new("barbarian-no-such-tool")
            .run(dir.path(), ["--version"])
            .unwrap_err();
        assert!(matches!(err, Error::ToolNotFound(_)));
    }
}
