//! HTTP surface: availability query and booking submission.

pub mod error;
pub mod form;
pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
