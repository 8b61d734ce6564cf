// HTTP error responses
// Every failure is returned as `{code, message}`; upstream (LLM or tool
// server) failures map to 502, everything else to 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use planflow_lib::{PneError, ToolGatewayError};

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<PneError> for ApiError {
    fn from(err: PneError) -> Self {
        let status = if err.is_upstream() {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            code: err.code().as_str(),
            message: err.to_string(),
        }
    }
}

impl From<ToolGatewayError> for ApiError {
    fn from(err: ToolGatewayError) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            code: err.code().as_str(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        log::warn!("[server] {} {}: {}", self.status, self.code, self.message);
        (
            self.status,
            Json(ErrorBody {
                code: self.code,
                message: self.message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planflow_lib::LlmError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(PneError::Llm(LlmError::RateLimited)).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(PneError::UnknownStepKind("dance".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(ToolGatewayError::Discovery("down".to_string())).status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
