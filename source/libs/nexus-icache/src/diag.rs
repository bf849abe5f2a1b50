// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Minimal structured logging with severity levels
//! OWNERS: @runtime
//! PUBLIC API: Level, Sink, set_sink, emit, fatal, log_* macros
//! DEPENDS_ON: spin::Once (sink slot)
//! INVARIANTS: Debug/Trace only in debug builds; single-line emission; no allocation

use core::fmt::{self, Arguments, Write};

use spin::Once;

/// Logging severity used by the crate.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Level {
    /// Unrecoverable or contract-breaking conditions.
    Error,
    /// Suspicious but survivable conditions.
    Warn,
    /// One-time lifecycle events.
    Info,
    /// Verbose diagnostics, debug builds only.
    Debug,
    /// Per-call tracing, debug builds only.
    Trace,
}

impl Level {
    const fn tag(self) -> &'static str {
        match self {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        }
    }

    const fn enabled(self) -> bool {
        match self {
            Level::Debug | Level::Trace => cfg!(debug_assertions),
            _ => true,
        }
    }
}

/// Sink receiving fully formatted single log lines.
///
/// The embedding runtime decides where lines go (UART, logd, stderr); this
/// crate only formats them.
pub type Sink = fn(&str);

static SINK: Once<Sink> = Once::new();

/// Installs the process-wide log sink. The first caller wins; later calls
/// are ignored. Lines emitted before a sink is installed are dropped.
pub fn set_sink(sink: Sink) {
    SINK.call_once(|| sink);
}

const LINE_CAP: usize = 256;

/// Fixed-size line buffer; overlong lines are truncated at a char boundary.
struct LineBuf {
    buf: [u8; LINE_CAP],
    len: usize,
}

impl LineBuf {
    const fn new() -> Self {
        Self { buf: [0; LINE_CAP], len: 0 }
    }

    fn as_str(&self) -> &str {
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }
}

impl Write for LineBuf {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let avail = LINE_CAP - self.len;
        let take = if s.len() <= avail {
            s.len()
        } else {
            let mut n = avail;
            while n > 0 && !s.is_char_boundary(n) {
                n -= 1;
            }
            n
        };
        self.buf[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        Ok(())
    }
}

/// Emits a structured log line if the level is enabled for the current build.
pub fn emit(level: Level, target: &str, args: Arguments<'_>) {
    if !level.enabled() {
        return;
    }
    let Some(sink) = SINK.get() else {
        return;
    };
    let mut line = LineBuf::new();
    let _ = write!(line, "[{} {}] ", level.tag(), target);
    let _ = line.write_fmt(args);
    sink(line.as_str());
}

/// Emits the failure and panics.
///
/// Everything routed here is an unrecoverable defect (ordering violation,
/// privileged-call failure, corrupted self-test token); there is no soft
/// error path in this crate.
#[cold]
pub fn fatal(args: Arguments<'_>) -> ! {
    emit(Level::Error, "icache", args);
    panic!("{}", args);
}

/// Logs at ERROR level through the process-wide sink.
#[macro_export]
macro_rules! log_error {
    (target: $target:expr, $($arg:tt)+) => {{
        $crate::diag::emit($crate::diag::Level::Error, $target, format_args!($($arg)+));
    }};
    ($($arg:tt)+) => {{
        $crate::diag::emit($crate::diag::Level::Error, module_path!(), format_args!($($arg)+));
    }};
}

/// Logs at WARN level through the process-wide sink.
#[macro_export]
macro_rules! log_warn {
    (target: $target:expr, $($arg:tt)+) => {{
        $crate::diag::emit($crate::diag::Level::Warn, $target, format_args!($($arg)+));
    }};
    ($($arg:tt)+) => {{
        $crate::diag::emit($crate::diag::Level::Warn, module_path!(), format_args!($($arg)+));
    }};
}

/// Logs at INFO level through the process-wide sink.
#[macro_export]
macro_rules! log_info {
    (target: $target:expr, $($arg:tt)+) => {{
        $crate::diag::emit($crate::diag::Level::Info, $target, format_args!($($arg)+));
    }};
    ($($arg:tt)+) => {{
        $crate::diag::emit($crate::diag::Level::Info, module_path!(), format_args!($($arg)+));
    }};
}

/// Logs at DEBUG level through the process-wide sink (debug builds only).
#[macro_export]
macro_rules! log_debug {
    (target: $target:expr, $($arg:tt)+) => {{
        $crate::diag::emit($crate::diag::Level::Debug, $target, format_args!($($arg)+));
    }};
    ($($arg:tt)+) => {{
        $crate::diag::emit($crate::diag::Level::Debug, module_path!(), format_args!($($arg)+));
    }};
}
