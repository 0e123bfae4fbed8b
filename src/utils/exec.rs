//! Subprocess plumbing for the compiler and runtime collaborators.
//!
//! ```ignore
//! // configured command array, cwd and $TRELLIS_* variables
//! let output = Cmd::from_slice(&compiler.command).cwd(root).envs(&vars).output()?;
//!
//! // long-lived runtime: stdin, stdout and stderr all piped
//! let child = Cmd::from_slice(&runtime.command).cwd(root).spawn()?;
//! ```

use anyhow::{Context, Result};
use regex::Regex;
use std::{
    ffi::{OsStr, OsString},
    io::Write,
    path::{Path, PathBuf},
    process::{Child, Command, Output, Stdio},
    sync::OnceLock,
};

#[derive(Default, Debug)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    envs: Vec<(String, String)>,
    stdin_data: Option<Vec<u8>>,
}

impl Cmd {
    /// First element is the program, the rest are arguments
    /// (`["node", "runtime.mjs"]`). Empty arguments are dropped.
    pub fn from_slice<S: AsRef<OsStr>>(cmd: &[S]) -> Self {
        let (program, args) = match cmd.split_first() {
            Some((program, args)) => (
                program.as_ref().to_owned(),
                args.iter()
                    .map(|a| a.as_ref().to_owned())
                    .filter(|a| !a.is_empty())
                    .collect(),
            ),
            None => (OsString::new(), Vec::new()),
        };
        Self {
            program,
            args,
            ..Default::default()
        }
    }

    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    pub fn envs<K, V, I>(mut self, vars: I) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.envs.extend(
            vars.into_iter()
                .map(|(k, v)| (k.as_ref().to_owned(), v.as_ref().to_owned())),
        );
        self
    }

    /// Bytes piped to the child's stdin. Without this stdin is `/dev/null`.
    pub fn stdin<D: AsRef<[u8]>>(mut self, data: D) -> Self {
        self.stdin_data = Some(data.as_ref().to_vec());
        self
    }

    fn command(&self) -> Result<(Command, String)> {
        if self.program.is_empty() {
            anyhow::bail!("empty command");
        }
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k, v)))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        Ok((cmd, self.program.to_string_lossy().into_owned()))
    }

    /// Run to completion and capture stdout/stderr.
    ///
    /// A non-zero exit status is not an error here; the caller decides what
    /// a failed compile or render means in its build mode.
    pub fn output(self) -> Result<Output> {
        let (mut cmd, name) = self.command()?;
        cmd.stdin(match self.stdin_data {
            Some(_) => Stdio::piped(),
            None => Stdio::null(),
        });

        let mut child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn `{name}`"))?;

        if let Some(data) = &self.stdin_data
            && let Some(mut stdin) = child.stdin.take()
        {
            stdin
                .write_all(data)
                .with_context(|| format!("failed to write stdin of `{name}`"))?;
        }

        child
            .wait_with_output()
            .with_context(|| format!("failed to wait for `{name}`"))
    }

    /// Start without waiting; every stream is piped to the caller.
    pub fn spawn(self) -> Result<Child> {
        let (mut cmd, name) = self.command()?;
        cmd.stdin(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn `{name}`"))
    }
}

pub fn strip_ansi(s: &str) -> std::borrow::Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").unwrap());
    re.replace_all(s, "")
}

/// Non-empty, ANSI-stripped lines of a process stream.
pub fn output_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(|line| strip_ansi(line).trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}
