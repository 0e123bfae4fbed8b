//! Terminal output.
//!
//! - `log!` / `debug!` / `debug_do!`: `[module] message` lines
//! - [`ProgressLine`]: in-place `routes(12/40)` counter for one-shot builds
//! - `status_*`: watch-mode status block, overwritten in place
//!
//! ```ignore
//! log!("vendor"; "{} packages", count);
//! status_success("regenerated /about/");
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{Write, stdout},
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set by `--verbose`.
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Log a message with a colored module prefix.
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Like `log!`, only with `--verbose`.
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

/// Run a block only with `--verbose`, for debug output that is costly to build.
#[macro_export]
macro_rules! debug_do {
    ($($body:tt)*) => {{
        if $crate::logger::is_verbose() {
            $($body)*
        }
    }};
}

pub fn log(module: &str, message: &str) {
    let prefix = prefix(module);
    let mut stdout = stdout().lock();

    // an active progress line is overwritten and redrawn on its next tick
    execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

fn prefix(module: &str) -> String {
    let prefix = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "routes" | "api" | "vendor" => prefix.bright_blue().bold().to_string(),
        "watch" => prefix.bright_green().bold().to_string(),
        "error" | "conflict" | "boundary" => prefix.bright_red().bold().to_string(),
        "warning" => prefix.bright_magenta().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Watch status
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusKind {
    Success,
    Warning,
    Error,
}

impl StatusKind {
    fn symbol(self) -> String {
        match self {
            Self::Success => "✓".green().to_string(),
            Self::Warning => "⚠".yellow().to_string(),
            Self::Error => "✗".red().to_string(),
        }
    }
}

/// Lines printed by the last status call.
static STATUS_LINES: Mutex<usize> = parking_lot::const_mutex(0);

/// Wall clock `HH:MM:SS` (UTC).
fn clock() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format_clock(secs)
}

fn format_clock(secs: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        (secs / 3600) % 24,
        (secs / 60) % 60,
        secs % 60
    )
}

fn status_text(summary: &str, detail: &str) -> String {
    if detail.is_empty() {
        summary.to_string()
    } else {
        format!("{summary}\n{detail}")
    }
}

/// Overwrite the previous status block. Error blocks are never overwritten.
fn status(kind: StatusKind, text: &str) {
    let mut last = STATUS_LINES.lock();
    let mut stdout = stdout().lock();

    if *last > 0 {
        #[allow(clippy::cast_possible_truncation)]
        let up = (*last).min(u16::MAX as usize) as u16;
        execute!(stdout, cursor::MoveUp(up), Clear(ClearType::FromCursorDown)).ok();
    }

    let stamp = format!("[{}]", clock()).dimmed().to_string();
    writeln!(stdout, "{stamp} {} {text}", kind.symbol()).ok();
    stdout.flush().ok();

    *last = if kind == StatusKind::Error {
        0
    } else {
        text.lines().count().max(1)
    };
}

pub fn status_success(message: &str) {
    status(StatusKind::Success, message);
}

pub fn status_warning(message: &str) {
    status(StatusKind::Warning, message);
}

pub fn status_error(summary: &str, detail: &str) {
    status(StatusKind::Error, &status_text(summary, detail));
}

// ============================================================================
// Progress line
// ============================================================================

/// `[build] routes(12/40)`, redrawn in place by worker threads.
///
/// Redraws use `try_lock`; a worker never waits on the terminal.
pub struct ProgressLine {
    label: &'static str,
    total: usize,
    done: AtomicUsize,
    failed: AtomicUsize,
    draw: Mutex<()>,
}

impl ProgressLine {
    pub fn new(label: &'static str, total: usize) -> Self {
        let progress = Self {
            label,
            total,
            done: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            draw: Mutex::new(()),
        };
        progress.redraw(false);
        progress
    }

    /// Count one finished job.
    pub fn inc(&self, ok: bool) {
        self.done.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        if let Some(_guard) = self.draw.try_lock() {
            self.redraw(false);
        }
    }

    fn line(&self) -> String {
        let done = self.done.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        let mut line = format!("{}({}/{})", self.label, done, self.total);
        if failed > 0 {
            line.push_str(&format!(" {}", format!("{failed} failed").red()));
        }
        line
    }

    fn redraw(&self, newline: bool) {
        let mut stdout = stdout().lock();
        execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        if newline {
            writeln!(stdout, "{} {}", prefix("build"), self.line()).ok();
        } else {
            write!(stdout, "{} {}", prefix("build"), self.line()).ok();
        }
        stdout.flush().ok();
    }

    /// Leave the final counts on screen.
    pub fn finish(self) {
        {
            let _guard = self.draw.lock();
            self.redraw(true);
        }
        std::mem::forget(self);
    }
}

impl Drop for ProgressLine {
    fn drop(&mut self) {
        let mut stdout = stdout().lock();
        execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        stdout.flush().ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00:00");
        assert_eq!(format_clock(3600 * 25 + 61), "01:01:01");
    }

    #[test]
    fn test_prefix_contains_module() {
        assert!(prefix("routes").contains("[routes]"));
    }

    #[test]
    fn test_status_text_joins_detail() {
        assert_eq!(status_text("/about/ failed", ""), "/about/ failed");
        assert_eq!(
            status_text("/about/ failed", "props export returned an array"),
            "/about/ failed\nprops export returned an array"
        );
    }

    #[test]
    fn test_progress_counts_failures() {
        let progress = ProgressLine::new("routes", 3);
        progress.inc(true);
        progress.inc(false);
        assert_eq!(progress.done.load(Ordering::Relaxed), 2);
        assert_eq!(progress.failed.load(Ordering::Relaxed), 1);
        assert!(progress.line().starts_with("routes(2/3)"));
        progress.finish();
    }
}
