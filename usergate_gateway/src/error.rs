use ::core::fmt::Display;

use ::axum::{
    response::{IntoResponse, Response},
    Json,
};
use ::http::StatusCode;
use ::serde::Serialize;
use ::tonic::Status;
use ::usergate_common::error::{UsergateError, UsergateErrorType::*};

/// [GatewayError] is a wrapper for [UsergateError] to convert it into Axum response
pub struct GatewayError(UsergateError);

impl GatewayError {
    fn get_status_code(&self) -> StatusCode {
        match self.0.get_error_type() {
            IllegalArgument => StatusCode::BAD_REQUEST,
            NotFound => StatusCode::NOT_FOUND,
            RpcFailed => StatusCode::INTERNAL_SERVER_ERROR,
            FailToConnectBackend => StatusCode::INTERNAL_SERVER_ERROR,
            FailToStartServer => StatusCode::INTERNAL_SERVER_ERROR,
            FailToLoadConfig => StatusCode::INTERNAL_SERVER_ERROR,
            Other => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON body of every error the gateway reports.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub(crate) struct ErrorBody {
    pub(crate) error: String,
}

impl From<&GatewayError> for ErrorBody {
    fn from(error: &GatewayError) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}

impl From<UsergateError> for GatewayError {
    fn from(error: UsergateError) -> Self {
        Self(error)
    }
}

impl From<Status> for GatewayError {
    fn from(status: Status) -> Self {
        Self(status.into())
    }
}

/// [GatewayError] displays in the same way as [UsergateError]
impl Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.get_status_code();
        (status, Json(ErrorBody::from(&self))).into_response()
    }
}
