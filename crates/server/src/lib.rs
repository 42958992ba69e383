//! # Cashout Server
//!
//! HTTP surface of the withdrawal service.
//!
//! ## Routes
//! - `GET /` and `GET /health`: open
//! - `POST /login`: issue a bearer token for a `userId`
//! - `POST /retiros`, `GET /retiros`, `POST /procesar-retiro`: token required

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::{AppConfig, ConfigError};
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
