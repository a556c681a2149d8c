//! External command execution utilities.
//!
//! Provides a Builder-based API for running commands with proper
//! output handling and optional PTY support.
//!
//! # Examples
//!
//! ```ignore
//! use crate::utils::exec::Cmd;
//!
//! // Simple command
//! Cmd::new("git").args(["status", "-s"]).run()?;
//!
//! // With working directory and PTY (credential prompts during push)
//! Cmd::new("git")
//!     .args(["push", "origin", "HEAD:main"])
//!     .cwd(root)
//!     .pty(true)
//!     .run()?;
//!
//! // Inspect the exit status yourself instead of getting an error
//! let output = Cmd::new("git")
//!     .args(["diff", "--cached", "--quiet"])
//!     .allow_failure(true)
//!     .run()?;
//! ```

use crate::log;
use anyhow::{Context, Result};
use crossterm::terminal;
use portable_pty::{CommandBuilder, NativePtySystem, PtySize, PtySystem};
use regex::Regex;
use std::{
    ffi::{OsStr, OsString},
    io::{IsTerminal, Read, Write},
    path::{Path, PathBuf},
    process::{Command, Output},
    sync::{
        Mutex, OnceLock, PoisonError,
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, RecvTimeoutError},
    },
    time::Duration,
};

// ============================================================================
// Builder API
// ============================================================================

/// Command builder for external process execution.
#[derive(Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    envs: Vec<(String, String)>,
    use_pty: bool,
    allow_failure: bool,
    filter: Option<&'static FilterRule>,
    input: Option<Box<dyn Read + Send>>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// Add a single argument.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        let arg = arg.as_ref();
        if !arg.is_empty() {
            self.args.push(arg.to_owned());
        }
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            let arg = arg.as_ref();
            if !arg.is_empty() {
                self.args.push(arg.to_owned());
            }
        }
        self
    }

    /// Set working directory.
    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    /// Set environment variables for the subprocess.
    pub fn envs<K, V, I>(mut self, vars: I) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (k, v) in vars {
            self.envs.push((k.as_ref().to_owned(), v.as_ref().to_owned()));
        }
        self
    }

    /// Enable PTY (pseudo-terminal) mode.
    ///
    /// PTY allows commands to behave as if running in a real terminal,
    /// enabling credential prompts and progress output. Output is echoed to
    /// stdout as it arrives and our stdin is forwarded to the terminal.
    /// Stdout and stderr are merged into `Output::stdout`.
    pub fn pty(mut self, enable: bool) -> Self {
        self.use_pty = enable;
        self
    }

    /// Feed the PTY from `input` instead of our stdin.
    ///
    /// The terminal receives end-of-file once `input` is exhausted.
    pub fn input<R: Read + Send + 'static>(mut self, input: R) -> Self {
        self.input = Some(Box::new(input));
        self
    }

    /// Return the output of a non-zero exit instead of an error.
    pub fn allow_failure(mut self, allow: bool) -> Self {
        self.allow_failure = allow;
        self
    }

    /// Set output filter for logging.
    pub fn filter(mut self, filter: &'static FilterRule) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Execute the command and return output.
    pub fn run(self) -> Result<Output> {
        let filter = self.filter.unwrap_or(&EMPTY_FILTER);

        if self.use_pty {
            self.run_with_pty()
        } else {
            self.run_simple(filter)
        }
    }
}

/// Create a command from a single program name.
///
/// This is a helper for the `exec!` macro.
#[inline]
pub fn cmd<S: AsRef<OsStr>>(program: S) -> Cmd {
    Cmd::new(program)
}

impl Cmd {
    /// Get the program name for error messages.
    fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    /// Simple execution without PTY.
    fn run_simple(self, filter: &'static FilterRule) -> Result<Output> {
        let name = self.program_name();
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).envs(self.envs.iter().cloned());

        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let output = cmd
            .output()
            .with_context(|| format!("Failed to execute `{name}`"))?;

        if self.allow_failure {
            return Ok(output);
        }

        log_output(&name, &output, filter)?;
        Ok(output)
    }

    /// Execution with PTY support.
    fn run_with_pty(self) -> Result<Output> {
        let name = self.program_name();

        let mut cmd_builder = CommandBuilder::new(&self.program);
        cmd_builder.args(&self.args);

        for (k, v) in &self.envs {
            cmd_builder.env(k, v);
        }

        if let Some(dir) = &self.cwd {
            cmd_builder.cwd(dir);
        }

        let pty_system = NativePtySystem::default();
        let pair = pty_system.openpty(PtySize {
            rows: 24,
            cols: 80,
            pixel_width: 0,
            pixel_height: 0,
        })?;

        let mut child = pair.slave.spawn_command(cmd_builder)?;
        drop(pair.slave);

        let reader = pair.master.try_clone_reader()?;
        let writer = pair.master.take_writer()?;
        let master = pair.master;

        // Raw mode only when a person is typing into our terminal
        let interactive = self.input.is_none() && std::io::stdin().is_terminal();
        let local_input;
        let input = match self.input {
            Some(source) => {
                local_input = Mutex::new(pump(source));
                &local_input
            }
            None => stdin_chunks(),
        };

        let finished = AtomicBool::new(false);
        let done = &finished;
        let (status, captured) = std::thread::scope(|s| -> Result<_> {
            let _raw = RawMode::enable(interactive);
            s.spawn(move || forward_input(input, writer, done));
            // PTY read blocks until EOF
            let output = s.spawn(move || stream_output(reader));

            let status = child.wait();
            done.store(true, Ordering::Release);
            drop(master);

            let captured = output
                .join()
                .map_err(|_| anyhow::anyhow!("Failed to join output reader thread"))?;
            Ok((status?, captured))
        })?;

        let output_str = String::from_utf8_lossy(&captured).into_owned();
        if !status.success() && !self.allow_failure {
            anyhow::bail!("Command `{name}` failed: {status:?}\n{output_str}");
        }

        // Convert to std::process::Output
        #[cfg(unix)]
        #[allow(clippy::cast_possible_wrap)]
        let std_status = {
            use std::os::unix::process::ExitStatusExt;
            std::process::ExitStatus::from_raw((status.exit_code() as i32) << 8)
        };
        #[cfg(windows)]
        let std_status = {
            use std::os::windows::process::ExitStatusExt;
            std::process::ExitStatus::from_raw(status.exit_code())
        };

        Ok(Output {
            status: std_status,
            stdout: captured,
            stderr: Vec::new(),
        })
    }
}

// ============================================================================
// PTY plumbing
// ============================================================================

/// Ctrl+D: end-of-file for a terminal in canonical mode.
const EOT: u8 = 0x04;

/// Read `source` on a background thread, one chunk per message.
///
/// The channel disconnects when `source` reaches end-of-file.
fn pump<R: Read + Send + 'static>(mut source: R) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut buf = [0u8; 1024];
        while let Ok(n) = source.read(&mut buf) {
            if n == 0 || tx.send(buf[..n].to_vec()).is_err() {
                break;
            }
        }
    });
    rx
}

/// Process-wide stdin reader shared by every PTY run.
///
/// A blocked read on stdin cannot be cancelled, so a single reader outlives
/// each child instead of one leaked reader per run.
fn stdin_chunks() -> &'static Mutex<Receiver<Vec<u8>>> {
    static STDIN: OnceLock<Mutex<Receiver<Vec<u8>>>> = OnceLock::new();
    STDIN.get_or_init(|| Mutex::new(pump(std::io::stdin())))
}

/// Copy input chunks into the PTY until the child exits.
fn forward_input(
    input: &Mutex<Receiver<Vec<u8>>>,
    mut writer: Box<dyn Write + Send>,
    done: &AtomicBool,
) {
    let input = input.lock().unwrap_or_else(PoisonError::into_inner);
    while !done.load(Ordering::Acquire) {
        match input.recv_timeout(Duration::from_millis(50)) {
            Ok(chunk) => {
                if writer.write_all(&chunk).and_then(|()| writer.flush()).is_err() {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                writer.write_all(&[EOT]).and_then(|()| writer.flush()).ok();
                break;
            }
        }
    }
}

/// Echo PTY output to stdout as it arrives, returning everything read.
fn stream_output(mut reader: Box<dyn Read + Send>) -> Vec<u8> {
    let mut captured = Vec::new();
    let mut buf = [0u8; 4096];
    let mut stdout = std::io::stdout();
    while let Ok(n) = reader.read(&mut buf) {
        if n == 0 {
            break;
        }
        stdout.write_all(&buf[..n]).and_then(|()| stdout.flush()).ok();
        captured.extend_from_slice(&buf[..n]);
    }
    captured
}

/// Raw mode on our terminal for the lifetime of a PTY run.
///
/// Keystrokes go to the child unprocessed; the PTY does its own echo.
struct RawMode(bool);

impl RawMode {
    fn enable(interactive: bool) -> Self {
        Self(interactive && terminal::enable_raw_mode().is_ok())
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if self.0 {
            terminal::disable_raw_mode().ok();
        }
    }
}

// ============================================================================
// Macro (syntax sugar for simple cases)
// ============================================================================

/// Run an external command with arguments.
///
/// # Syntax
///
/// ```ignore
/// // Simple: command and args
/// exec!("git"; "status", "-s")?;
///
/// // With working directory
/// exec!(root; "git"; "status")?;
///
/// // With output filter
/// exec!(filter=&F; root; "git"; "add", file)?;
/// ```
#[macro_export]
macro_rules! exec {
    // filter + root + cmd
    (filter=$filter:expr; $root:expr; $cmd:expr; $($arg:expr),* $(,)?) => {
        $crate::utils::exec::cmd($cmd)
            $(.arg($arg))*
            .cwd($root)
            .filter($filter)
            .run()
    };
    // root + cmd
    ($root:expr; $cmd:expr; $($arg:expr),* $(,)?) => {
        $crate::utils::exec::cmd($cmd)
            $(.arg($arg))*
            .cwd($root)
            .run()
    };
    // cmd only
    ($cmd:expr; $($arg:expr),* $(,)?) => {
        $crate::utils::exec::cmd($cmd)
            $(.arg($arg))*
            .run()
    };
}

// ============================================================================
// Output Filtering
// ============================================================================

/// Filter rule for command output logging.
///
/// Used to reduce noise by skipping known warnings or irrelevant messages.
pub struct FilterRule {
    /// Prefixes to skip when logging output.
    pub skip_prefixes: &'static [&'static str],
}

impl FilterRule {
    /// Create a new filter rule.
    pub const fn new(skip_prefixes: &'static [&'static str]) -> Self {
        Self { skip_prefixes }
    }

    /// Check if a line should be skipped.
    fn should_skip(&self, line: &str) -> bool {
        line.is_empty() || self.skip_prefixes.iter().any(|p| line.starts_with(p))
    }

    /// Keep only the lines that pass the filter.
    pub fn apply(&self, output: &str) -> Vec<String> {
        output
            .lines()
            .filter_map(|line| {
                let plain = strip_ansi(line);
                let trimmed = plain.trim();
                (!trimmed.is_empty() && !self.should_skip(trimmed)).then(|| trimmed.to_string())
            })
            .collect()
    }

    /// Log output lines that pass the filter.
    ///
    /// Command chatter is only interesting in verbose mode.
    pub fn log(&self, name: &str, output: &str) {
        if !crate::logger::is_verbose() {
            return;
        }
        let lines = self.apply(output);
        if !lines.is_empty() {
            log!(name; "{}", lines.join("\n"));
        }
    }
}

/// Empty filter (no skipping).
pub const EMPTY_FILTER: FilterRule = FilterRule::new(&[]);

/// Silent filter (skip all output).
pub const SILENT_FILTER: FilterRule = FilterRule::new(&[""]);

// ============================================================================
// Helpers
// ============================================================================

/// Strip ANSI escape codes from string.
pub fn strip_ansi(s: &str) -> std::borrow::Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").unwrap());
    re.replace_all(s, "")
}

/// Log command output, returning error on failure.
fn log_output(name: &str, output: &Output, filter: &'static FilterRule) -> Result<()> {
    if !output.status.success() {
        anyhow::bail!(format_error(name, output, filter));
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    filter.log(name, stderr.trim());
    Ok(())
}

/// Format error message for failed command.
pub fn format_error(name: &str, output: &Output, filter: &'static FilterRule) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);

    let error_msg = filter
        .skip_prefixes
        .iter()
        .fold(stderr.trim(), |s, p| s.trim_start_matches(p).trim_start());

    let mut msg = format!("Command `{name}` failed with {}\n", output.status);
    if !error_msg.is_empty() {
        msg.push_str(error_msg);
    }

    let stdout_trimmed = stdout.trim();
    if !stdout_trimmed.is_empty() {
        msg.push_str("\nStdout:\n");
        msg.push_str(stdout_trimmed);
    }
    msg
}

// ============================================================================
// Tests
// ============================================================================
