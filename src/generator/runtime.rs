//! `[build.runtime]` command as module host and renderer.
//!
//! Each worker keeps one runtime process alive. A request is one JSON line
//! on stdin and its reply is the next stdout line that parses as a reply;
//! other stdout lines are module logs. A process that exits after replying
//! is started again on the next request. `ModuleHost::reload` retires every
//! process so recompiled modules are loaded fresh.
//!
//! ```text
//! → {"op":"describe","module":"/abs/.trellis/src/index.page.js"}
//! ← {"ok":{"default_export":"function","props":"missing","title":"Home"}}
//!
//! → {"op":"props","module":"…","context":{"route":"/","url":"…"}}
//! ← {"ok":{"items":[1,2]}}
//!
//! → {"op":"render","request":{"element":{…},"meta":{…},"layouts":[…],"location":{…}}}
//! ← {"ok":{"head":"<title>Home</title>","body":"<main>…</main>","styles":[]}}
//!
//! ← {"error":"TypeError: x is not a function"}
//! ```

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::host::{HostError, ModuleHost, ModuleShape, PropsContext, RenderOutput, RenderRequest, Renderer};
use crate::debug;
use crate::utils::exec::{Cmd, strip_ansi};

/// Stderr lines kept for the error of a crashed process.
const STDERR_TAIL: usize = 40;

#[derive(Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum Request<'a> {
    Describe { module: &'a Path },
    Props { module: &'a Path, context: &'a PropsContext },
    Render { request: &'a RenderRequest },
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum Reply {
    Ok(Value),
    Error(String),
}

/// One running runtime process.
struct Session {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    stderr: Option<JoinHandle<VecDeque<String>>>,
    epoch: u64,
}

impl Session {
    fn start(command: &[String], cwd: &Path, epoch: u64) -> Result<Self, HostError> {
        let mut child = Cmd::from_slice(command)
            .cwd(cwd)
            .spawn()
            .map_err(|e| HostError::Spawn(format!("{e:#}")))?;
        let (Some(stdin), Some(stdout), Some(stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            child.kill().ok();
            return Err(HostError::Spawn("runtime streams are not piped".into()));
        };
        debug!("runtime"; "started pid {}", child.id());
        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            stderr: Some(std::thread::spawn(move || stderr_tail(stderr))),
            epoch,
        })
    }

    /// Send one request line and wait for its reply.
    ///
    /// `None` means the process closed its streams first.
    fn exchange(&mut self, line: &[u8]) -> Option<Reply> {
        self.stdin.write_all(line).ok()?;
        self.stdin.flush().ok()?;

        let mut buf = String::new();
        loop {
            buf.clear();
            if self.stdout.read_line(&mut buf).ok()? == 0 {
                return None;
            }
            match parse_reply(&buf) {
                Some(reply) => return Some(reply),
                None if !buf.trim().is_empty() => debug!("runtime"; "{}", buf.trim_end()),
                None => {}
            }
        }
    }

    /// Error for a process that ended without replying.
    fn exit_error(&mut self) -> HostError {
        let status = match self.child.wait() {
            Ok(status) => status,
            Err(e) => return HostError::Spawn(e.to_string()),
        };
        let stderr = self
            .stderr
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();
        if status.success() && stderr.is_empty() {
            return HostError::Reply("runtime exited without replying".into());
        }
        HostError::Exit {
            status: status.to_string(),
            stderr: Vec::from(stderr).join("\n"),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.child.kill().ok();
        self.child.wait().ok();
    }
}

fn stderr_tail(stream: impl Read) -> VecDeque<String> {
    let mut tail = VecDeque::with_capacity(STDERR_TAIL);
    for line in BufReader::new(stream).lines().map_while(Result::ok) {
        let line = strip_ansi(&line).trim().to_string();
        if line.is_empty() {
            continue;
        }
        debug!("runtime"; "{}", line);
        if tail.len() == STDERR_TAIL {
            tail.pop_front();
        }
        tail.push_back(line);
    }
    tail
}

pub struct CommandRuntime {
    command: Vec<String>,
    cwd: PathBuf,
    idle: Mutex<Vec<Session>>,
    epoch: AtomicU64,
}

impl CommandRuntime {
    pub fn new(command: Vec<String>, cwd: &Path) -> Self {
        Self {
            command,
            cwd: cwd.to_path_buf(),
            idle: Mutex::new(Vec::new()),
            epoch: AtomicU64::new(0),
        }
    }

    fn call<T: DeserializeOwned>(&self, request: &Request<'_>) -> Result<T, HostError> {
        if self.command.is_empty() {
            return Err(HostError::NotConfigured);
        }
        let mut line = serde_json::to_vec(request).map_err(|e| HostError::Reply(e.to_string()))?;
        line.push(b'\n');

        let reply = match self.checkout() {
            // an idle process may have exited since its last reply
            Some(mut session) => match session.exchange(&line) {
                Some(reply) => {
                    self.checkin(session);
                    reply
                }
                None => {
                    drop(session);
                    self.call_fresh(&line)?
                }
            },
            None => self.call_fresh(&line)?,
        };
        decode(reply)
    }

    fn call_fresh(&self, line: &[u8]) -> Result<Reply, HostError> {
        let epoch = self.epoch.load(Ordering::Acquire);
        let mut session = Session::start(&self.command, &self.cwd, epoch)?;
        match session.exchange(line) {
            Some(reply) => {
                self.checkin(session);
                Ok(reply)
            }
            None => Err(session.exit_error()),
        }
    }

    fn checkout(&self) -> Option<Session> {
        self.idle.lock().pop()
    }

    /// Sessions from before the last `reload` are dropped instead.
    fn checkin(&self, session: Session) {
        if session.epoch == self.epoch.load(Ordering::Acquire) {
            self.idle.lock().push(session);
        }
    }
}

/// A stdout line that is a reply envelope, as opposed to module output.
fn parse_reply(line: &str) -> Option<Reply> {
    serde_json::from_str(line.trim()).ok()
}

fn decode<T: DeserializeOwned>(reply: Reply) -> Result<T, HostError> {
    match reply {
        Reply::Ok(value) => serde_json::from_value(value).map_err(|e| HostError::Reply(e.to_string())),
        Reply::Error(message) => Err(HostError::Thrown(message)),
    }
}

impl ModuleHost for CommandRuntime {
    fn describe(&self, module: &Path) -> Result<ModuleShape, HostError> {
        self.call(&Request::Describe { module })
    }

    fn call_props(&self, module: &Path, context: &PropsContext) -> Result<Value, HostError> {
        self.call(&Request::Props { module, context })
    }

    /// Stop every idle process; busy ones stop when their call returns.
    fn reload(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        let retired = std::mem::take(&mut *self.idle.lock());
        if !retired.is_empty() {
            debug!("runtime"; "stopping {} processes", retired.len());
        }
    }
}

impl Renderer for CommandRuntime {
    fn render(&self, request: &RenderRequest) -> Result<RenderOutput, HostError> {
        self.call(&Request::Render { request })
    }
}
