// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use async_graphql::Error;
use async_graphql::ErrorExtensions;
use paging_engine::ArgumentError;
use paging_engine::PagingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Paging(#[from] PagingError),
}

impl From<ArgumentError> for ApiError {
    fn from(err: ArgumentError) -> Self {
        ApiError::Paging(err.into())
    }
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Paging(err) if err.is_argument_error() => "BAD_USER_INPUT",
            ApiError::Paging(err) if err.is_cursor_error() => "INVALID_CURSOR",
            ApiError::Paging(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> Error {
        let code = self.code();
        let message = if code == "INTERNAL_SERVER_ERROR" {
            tracing::error!(target: "gql_server", "{self:?}");
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        Error::new(message).extend_with(|_, e| e.set("code", code))
    }
}

/// Converts anything the paging layer fails with into a GraphQL error.
pub fn api_error(err: impl Into<ApiError>) -> Error {
    err.into().extend()
}

#[cfg(test)]
mod tests {
    use paging_engine::CursorDecodeError;

    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ApiError::from(ArgumentError::BothFirstAndLast).code(), "BAD_USER_INPUT");
        assert_eq!(
            ApiError::from(PagingError::from(CursorDecodeError::InvalidBase64)).code(),
            "INVALID_CURSOR"
        );
        assert_eq!(
            ApiError::from(PagingError::Execution(anyhow::anyhow!("disk I/O error"))).code(),
            "INTERNAL_SERVER_ERROR"
        );
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = api_error(PagingError::Execution(anyhow::anyhow!("disk I/O error")));
        assert_eq!(err.message, "internal server error");
        let err = api_error(ArgumentError::InvalidPageSize(0));
        assert_eq!(err.message, "invalid paging arguments: page size must be positive, got 0");
    }
}
