//! Core taksi client library (auth lifecycle, config).

pub mod auth;
pub mod config;
