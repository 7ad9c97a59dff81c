//! HTTP front end: query page, JSON API, reference viewer

pub mod handlers;
pub mod render;
pub mod routes;

pub use handlers::{ApiError, AppState};
pub use routes::build_router;
