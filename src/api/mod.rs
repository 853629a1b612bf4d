//! HTTP API: `/ask`, `/health`, `/schema`

pub mod handlers;
pub mod routes;

pub use routes::create_router;
