//! Playground error taxonomy

use std::path::PathBuf;
use thiserror::Error;

use crate::errors::CcxtError;

/// 플레이그라운드 에러
///
/// 드라이버는 모든 변형을 사용자 메시지로 바꾸고 메뉴 루프로 돌아간다.
#[derive(Error, Debug)]
pub enum PlaygroundError {
    /// Identifier not in the known exchange set
    #[error("Exchange '{id}' not found")]
    UnknownExchange { id: String },

    /// Coercion or validation failure while resolving a parameter
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },

    /// The exchange client failed during a call
    #[error("{endpoint} failed with {kind} ({code}): {message}")]
    InvocationError {
        endpoint: String,
        kind: &'static str,
        code: &'static str,
        message: String,
    },

    /// Filesystem write failure while exporting
    #[error("Could not write {}: {message}", .path.display())]
    ExportError { path: PathBuf, message: String },

    /// Ctrl-C or end of input at a prompt
    #[error("Operation cancelled by user")]
    Interrupted,

    /// Terminal I/O failure outside of a prompt
    #[error("Terminal error: {0}")]
    Terminal(#[from] std::io::Error),
}

impl PlaygroundError {
    /// 클라이언트 에러를 엔드포인트 호출 실패로 감싼다
    pub fn invocation(endpoint: impl Into<String>, err: &CcxtError) -> Self {
        PlaygroundError::InvocationError {
            endpoint: endpoint.into(),
            kind: err.kind(),
            code: err.code(),
            message: err.to_string(),
        }
    }

    pub fn invalid(name: impl Into<String>, message: impl Into<String>) -> Self {
        PlaygroundError::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// 짧은 분류명 (출력용)
    pub fn kind(&self) -> &'static str {
        match self {
            PlaygroundError::UnknownExchange { .. } => "UnknownExchange",
            PlaygroundError::InvalidParameter { .. } => "InvalidParameter",
            PlaygroundError::InvocationError { kind, .. } => *kind,
            PlaygroundError::ExportError { .. } => "ExportError",
            PlaygroundError::Interrupted => "Interrupted",
            PlaygroundError::Terminal(_) => "Terminal",
        }
    }
}

pub type PlaygroundResult<T> = Result<T, PlaygroundError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_wraps_library_error() {
        let err = CcxtError::AuthenticationError {
            message: "fetchBalance requires apiKey credential".into(),
        };
        let wrapped = PlaygroundError::invocation("fetch_balance", &err);

        assert_eq!(wrapped.kind(), "AuthenticationError");
        match &wrapped {
            PlaygroundError::InvocationError { code, endpoint, .. } => {
                assert_eq!(*code, "AUTHENTICATION_ERROR");
                assert_eq!(endpoint, "fetch_balance");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(wrapped.to_string().contains("requires apiKey"));
    }

    #[test]
    fn test_messages() {
        let err = PlaygroundError::UnknownExchange { id: "mtgox".into() };
        assert_eq!(err.to_string(), "Exchange 'mtgox' not found");

        let err = PlaygroundError::invalid("limit", "expected a whole number, got 'ten'");
        assert_eq!(
            err.to_string(),
            "Invalid parameter 'limit': expected a whole number, got 'ten'"
        );
    }
}
