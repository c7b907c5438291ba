use ::core::fmt::Display;

use ::anyhow::anyhow;
use ::tonic::Status;

pub type Result<T> = std::result::Result<T, UsergateError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsergateErrorType {
    IllegalArgument,
    NotFound,
    RpcFailed,
    FailToConnectBackend,
    FailToStartServer,
    FailToLoadConfig,
    Other,
}

impl Display for UsergateErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::IllegalArgument => "Illegal argument",
            Self::NotFound => "Not found",
            Self::RpcFailed => "RPC failed",
            Self::FailToConnectBackend => "Fail to connect backend",
            Self::FailToStartServer => "Fail to start server",
            Self::FailToLoadConfig => "Fail to load config",
            Self::Other => "Other error",
        };
        write!(f, "{}", name)
    }
}

/// Error shared by the gateway and the backend.
/// It carries the kind of failure and the error that caused it.
#[derive(Debug)]
pub struct UsergateError {
    error_type: UsergateErrorType,
    source: anyhow::Error,
}

macro_rules! define_error_constructor {
    ($name: ident, $error_type: ident) => {
        pub fn $name<E: Into<anyhow::Error>>(error: E) -> Self {
            Self::new(UsergateErrorType::$error_type, error)
        }
    };
}

impl UsergateError {
    fn new<E: Into<anyhow::Error>>(error_type: UsergateErrorType, error: E) -> Self {
        Self {
            error_type,
            source: error.into(),
        }
    }

    define_error_constructor!(illegal_argument, IllegalArgument);
    define_error_constructor!(not_found, NotFound);
    define_error_constructor!(rpc_failed, RpcFailed);
    define_error_constructor!(fail_to_connect_backend, FailToConnectBackend);
    define_error_constructor!(fail_to_start_server, FailToStartServer);
    define_error_constructor!(fail_to_load_config, FailToLoadConfig);
    define_error_constructor!(other, Other);

    pub fn get_error_type(&self) -> UsergateErrorType {
        self.error_type
    }
}

impl Display for UsergateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_type, self.source)
    }
}

impl std::error::Error for UsergateError {}

/// Only the code and the message of a status are kept,
/// the details and metadata are of no use to the HTTP side.
impl From<Status> for UsergateError {
    fn from(status: Status) -> Self {
        Self::rpc_failed(anyhow!("{:?}, {}", status.code(), status.message()))
    }
}

macro_rules! convert_to_usergate_error {
    ($err_ty: ty, $constructor: expr) => {
        impl From<$err_ty> for UsergateError {
            fn from(value: $err_ty) -> Self {
                $constructor(value)
            }
        }
    };
}

convert_to_usergate_error!(std::io::Error, UsergateError::other);
convert_to_usergate_error!(anyhow::Error, UsergateError::other);
