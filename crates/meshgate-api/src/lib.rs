//! MeshGate REST API
//!
//! Endpoints for the overlay substrate: subnet pool management, service
//! overlay create/delete/reset, domain key rotation, and machine-to-machine
//! tokens. OpenAPI documentation is served at `/openapi.json`.

pub mod error;
pub mod handlers;
pub mod openapi;
pub mod router;
pub mod state;

pub use error::{ApiError, ErrorResponse};
pub use router::build_router;
pub use state::ApiState;
