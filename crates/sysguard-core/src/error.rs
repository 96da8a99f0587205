//! Shared error type across SysGuard crates.

use thiserror::Error;

/// Coarse error classes. Each class has exactly one resolution strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Plugin load, config or bind failure. Aborts the process.
    StartupFatal,
    /// Malformed, oversized or unroutable request. Resolved on the connection.
    Request,
    /// The metrics source produced no usable data.
    Fetch,
    /// Send/receive failure. Aborts the current connection only.
    Io,
}

impl ErrorClass {
    /// String representation used in structured logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorClass::StartupFatal => "STARTUP_FATAL",
            ErrorClass::Request => "REQUEST",
            ErrorClass::Fetch => "FETCH",
            ErrorClass::Io => "IO",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, SysGuardError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum SysGuardError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("request headers exceed {0} bytes")]
    RequestTooLarge(usize),
    #[error("connection closed before a request was read")]
    ConnectionClosed,
    #[error("metrics fetch failed: {0}")]
    Fetch(String),
    #[error("plugin load failed: {0}")]
    PluginLoad(String),
    #[error("config: {0}")]
    Config(String),
    #[error("bind failed: {0}")]
    Bind(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl SysGuardError {
    /// Map an error to its handling class.
    pub fn class(&self) -> ErrorClass {
        match self {
            SysGuardError::PluginLoad(_) | SysGuardError::Config(_) | SysGuardError::Bind(_) => {
                ErrorClass::StartupFatal
            }
            SysGuardError::BadRequest(_)
            | SysGuardError::RequestTooLarge(_)
            | SysGuardError::ConnectionClosed => ErrorClass::Request,
            SysGuardError::Fetch(_) => ErrorClass::Fetch,
            SysGuardError::Io(_) => ErrorClass::Io,
        }
    }
}
