pub mod config;
pub mod routes;
pub mod server;
pub mod session;
pub mod templates;

pub use server::{create_router, serve, AppState};
