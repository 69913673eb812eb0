//! Recipe-management HTTP backend: user accounts, bearer tokens, an operator
//! console, and owner-scoped recipe CRUD.

pub mod admin;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod fields;
pub mod recipes;
pub mod state;
pub mod store;

pub use app::build_app;
pub use state::AppState;
