//! Common types and utilities for the usergate gateway and backend.

pub mod config;
pub mod error;
pub mod shutdown;

/// Generated code of the `user` protobuf package.
pub mod user_grpc {
    tonic::include_proto!("user");
}

pub use ::anyhow;
pub use ::serde;
pub use ::serde_json;
pub use ::tokio;
pub use ::tonic;
pub use ::tracing;
