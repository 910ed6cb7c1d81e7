// Error modeling shared by the cache, the C ABI, and the CLI.
use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

/// Status returned by the query when the destination is null or has no room at all.
pub const STATUS_INVALID_ARGUMENT: u32 = 22;
/// Status returned by the query when the destination is too small for the path.
pub const STATUS_RANGE: u32 = 34;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    Resolve,
    InvalidDestination,
    BufferTooSmall,
    Io,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    path: Option<PathBuf>,
    os_code: Option<u32>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            path: None,
            os_code: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn path(&self) -> Option<&std::path::Path> {
        self.path.as_deref()
    }

    pub fn os_code(&self) -> Option<u32> {
        self.os_code
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Zero is "no error" on every platform we target, so it is never stored.
    pub fn with_os_code(mut self, code: u32) -> Self {
        self.os_code = (code != 0).then_some(code);
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }
        if let Some(code) = self.os_code {
            write!(f, " (os code: {code})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

/// Status code an ABI caller sees for `err`. Never zero.
pub fn to_status_code(err: &Error) -> u32 {
    match err.kind() {
        ErrorKind::InvalidDestination => STATUS_INVALID_ARGUMENT,
        ErrorKind::BufferTooSmall => STATUS_RANGE,
        _ => err.os_code().unwrap_or(crate::platform::UNRESOLVED_STATUS),
    }
}

/// Classify a raw status code returned across the ABI. Zero is not an error
/// and classifies as `Internal` only if a caller asks anyway.
pub fn kind_for_status(status: u32) -> ErrorKind {
    match status {
        0 => ErrorKind::Internal,
        STATUS_INVALID_ARGUMENT => ErrorKind::InvalidDestination,
        STATUS_RANGE => ErrorKind::BufferTooSmall,
        _ => ErrorKind::Resolve,
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::Resolve => 3,
        ErrorKind::InvalidDestination => 4,
        ErrorKind::BufferTooSmall => 5,
        ErrorKind::Io => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Error, ErrorKind, STATUS_INVALID_ARGUMENT, STATUS_RANGE, kind_for_status, to_exit_code,
        to_status_code,
    };

    #[test]
    fn exit_code_mapping_is_stable() {
        let cases = [
            (ErrorKind::Internal, 1),
            (ErrorKind::Usage, 2),
            (ErrorKind::Resolve, 3),
            (ErrorKind::InvalidDestination, 4),
            (ErrorKind::BufferTooSmall, 5),
            (ErrorKind::Io, 6),
        ];

        for (kind, code) in cases {
            assert_eq!(to_exit_code(kind), code);
        }
    }

    #[test]
    fn copy_failures_use_crt_codes() {
        let invalid = Error::new(ErrorKind::InvalidDestination);
        let small = Error::new(ErrorKind::BufferTooSmall);
        assert_eq!(to_status_code(&invalid), STATUS_INVALID_ARGUMENT);
        assert_eq!(to_status_code(&small), STATUS_RANGE);
        assert_eq!(
            kind_for_status(STATUS_INVALID_ARGUMENT),
            ErrorKind::InvalidDestination
        );
        assert_eq!(kind_for_status(STATUS_RANGE), ErrorKind::BufferTooSmall);
    }

    #[test]
    fn resolve_error_reports_os_code() {
        let err = Error::new(ErrorKind::Resolve).with_os_code(126);
        assert_eq!(to_status_code(&err), 126);
        assert_eq!(kind_for_status(126), ErrorKind::Resolve);
    }

    #[test]
    fn resolve_error_without_code_is_never_success() {
        let err = Error::new(ErrorKind::Resolve).with_os_code(0);
        assert_eq!(err.os_code(), None);
        assert_ne!(to_status_code(&err), 0);
    }

    #[test]
    fn display_includes_context() {
        let err = Error::new(ErrorKind::Resolve)
            .with_message("module path unavailable")
            .with_path("/apps/tool/plugin.so")
            .with_os_code(2);
        let text = err.to_string();
        assert!(text.starts_with("Resolve: module path unavailable"));
        assert!(text.contains("(path: /apps/tool/plugin.so)"));
        assert!(text.contains("(os code: 2)"));
    }
}
