//! RPC error types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    /// The request never reached the daemon (connection refused, bad URL).
    #[error("could not reach wallet daemon: {0}")]
    Transport(String),

    #[error("wallet daemon returned HTTP {status}")]
    Http { status: u16 },

    /// The daemon processed the request and answered with a JSON-RPC error.
    #[error("wallet daemon error {code}: {message}")]
    Daemon { code: i64, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The request was sent but no complete response was read back.
    #[error("response lost after the request was sent: {0}")]
    ResponseLost(String),
}

impl RpcError {
    /// Whether the daemon may have acted on the request despite the error.
    ///
    /// Only a transport failure before sending, an explicit JSON-RPC error, or a
    /// client-side HTTP status proves the call had no effect.
    pub fn may_have_executed(&self) -> bool {
        match self {
            RpcError::Transport(_) | RpcError::Daemon { .. } => false,
            RpcError::Http { status } => *status >= 500,
            RpcError::InvalidResponse(_) | RpcError::ResponseLost(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_are_known_not_to_have_executed() {
        assert!(!RpcError::Transport("refused".into()).may_have_executed());
        assert!(!RpcError::Http { status: 401 }.may_have_executed());
        assert!(!RpcError::Daemon {
            code: -26,
            message: "min relay fee not met".into()
        }
        .may_have_executed());
    }

    #[test]
    fn lost_or_garbled_responses_are_ambiguous() {
        assert!(RpcError::ResponseLost("timed out".into()).may_have_executed());
        assert!(RpcError::InvalidResponse("eof".into()).may_have_executed());
        assert!(RpcError::Http { status: 503 }.may_have_executed());
    }
}
