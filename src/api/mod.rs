//! HTTP API for the intake gate
//!
//! Provides:
//! - `POST /submit` for feedback and stories
//! - `GET /summary` and `GET /report` for organisers
//! - `POST /redeem` for vendors
//! - `GET /health`

pub mod server;

pub use server::{ApiServer, ApiServerConfig};
