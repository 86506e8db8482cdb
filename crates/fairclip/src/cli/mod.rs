//! Command handlers.

pub mod classify;
pub mod config;
pub mod models;
pub mod run;
pub mod types;
