//! Per-instance logger construction.
//!
//! Every middleware owns its own [`Dispatch`] bound to the writer it was built with,
//! so several instances (or several tests) never share a process-wide sink.

use std::{
    fmt, io,
    sync::{Arc, Mutex},
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{Dispatch, Level};
use tracing_subscriber::{FmtSubscriber, fmt::MakeWriter};

/// Log verbosity. Ordered from most to least verbose.
///
/// Encoded in configuration either as its numeric code (`1`) or its name (`"debug"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub const fn code(self) -> u8 {
        match self {
            LogLevel::Trace => 0,
            LogLevel::Debug => 1,
            LogLevel::Info => 2,
            LogLevel::Warn => 3,
            LogLevel::Error => 4,
        }
    }

    pub fn from_code(code: u64) -> Option<Self> {
        Some(match code {
            0 => LogLevel::Trace,
            1 => LogLevel::Debug,
            2 => LogLevel::Info,
            3 => LogLevel::Warn,
            4 => LogLevel::Error,
            _ => return None,
        })
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.trim().to_ascii_lowercase().as_str() {
            "trace" => LogLevel::Trace,
            "debug" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => return None,
        })
    }

    pub const fn as_tracing(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<u64>() {
            Ok(code) => Self::from_code(code),
            Err(_) => Self::from_name(s),
        }
        .ok_or_else(|| format!("unknown log level: {s}"))
    }
}

impl Serialize for LogLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Code(u64),
            Name(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Code(code) => Self::from_code(code)
                .ok_or_else(|| serde::de::Error::custom(format!("unknown log level: {code}"))),
            Repr::Name(name) => name.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Builds a logger writing to `writer` and filtering below `level`.
///
/// Colors are only worth it on a terminal, so they are left to the caller.
pub fn dispatch<W>(level: LogLevel, writer: W, ansi: bool) -> Dispatch
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level.as_tracing())
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(false)
        .with_level(true)
        .finish();

    Dispatch::new(subscriber)
}

/// Logger writing to standard output, the default sink.
pub fn stdout_dispatch(level: LogLevel) -> Dispatch {
    dispatch(level, io::stdout, true)
}

/// In-memory log sink that can be cloned and read back.
///
/// Mostly useful for capturing the output of a middleware in tests.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        let buffer = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut buffer = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for SharedBuffer {
    type Writer = SharedBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
