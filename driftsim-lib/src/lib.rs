//! Library for driftsim containing the drift model and its HTTP transport.
//!
//! The binary crate only adds the CLI, the bench client and its reporters.

#![cfg_attr(
    not(test),
    warn(clippy::print_stdout, clippy::dbg_macro),
    deny(clippy::unwrap_used, clippy::expect_used)
)]

pub mod drift;
pub mod http;
pub mod server;
pub mod utils;
