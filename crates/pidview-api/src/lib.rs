//! PIDView API Library
//!
//! HTTP surface of the P&ID comparison dashboard: pages, JSON endpoints,
//! single sign-on and application setup.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;
pub mod views;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
