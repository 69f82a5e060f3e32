use std::fmt;
use std::io;

use playerlink_peer::PeerError;
use playerlink_transport::TransportError;
use playerlink_wire::WireError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => USAGE,
        io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => DATA_INVALID,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
}

pub fn wire_error(context: &str, err: WireError) -> CliError {
    match err {
        WireError::InvalidNamespace(_) => CliError::new(USAGE, format!("{context}: {err}")),
        WireError::InvalidJson(_)
        | WireError::InvalidName
        | WireError::InvalidParams { .. }
        | WireError::UnknownEvent(_) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
    }
}

pub fn peer_error(context: &str, err: PeerError) -> CliError {
    match err {
        PeerError::Wire(err) => wire_error(context, err),
        PeerError::Transport(err) => transport_error(context, err),
        PeerError::InvalidSnapshot(_) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        PeerError::NotFound(_) => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_errors_map_to_data_invalid_or_usage() {
        let err = wire_error("decode", WireError::InvalidName);
        assert_eq!(err.code, DATA_INVALID);
        assert!(err.message.starts_with("decode: "));

        let err = peer_error(
            "host",
            PeerError::Wire(WireError::InvalidNamespace(String::new())),
        );
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn missing_peer_is_a_plain_failure() {
        let err = peer_error("replay", PeerError::NotFound("e1".to_string()));
        assert_eq!(err.code, FAILURE);
        assert_eq!(err.to_string(), "replay: experience \"e1\" not found");
    }

    #[test]
    fn io_errors_by_kind() {
        let err = io_error("read", io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.code, USAGE);
        let err = io_error("read", io::Error::new(io::ErrorKind::PermissionDenied, "no"));
        assert_eq!(err.code, PERMISSION_DENIED);
    }
}
