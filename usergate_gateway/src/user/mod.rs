//! Restful API forwarding user operations to the backend.

mod chat;
pub(crate) mod router;
