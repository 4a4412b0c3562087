//! CLI command handlers
//!
//! Each subcommand of the storygate binary is implemented in its own module
//! and exposes a `handle` function.

pub mod config;
pub mod export;
pub mod helpers;
pub mod redeem;
pub mod serve;
pub mod submit;
pub mod summary;
