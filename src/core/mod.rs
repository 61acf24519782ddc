//! Core modules shared by every lotgen subsystem.
//!
//! Errors, configuration, the store root layout, SQLite plumbing,
//! the mutation journal and time helpers live here.

pub mod broker;
pub mod config;
pub mod db;
pub mod error;
pub mod output;
pub mod schemas;
pub mod store;
pub mod time;
