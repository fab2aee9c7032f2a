//! Lambda handlers and platform adapters for the mentor chat functions.
//!
//! This crate owns runtime integration details (Lambda handlers, Firestore
//! and FCM adapters, credentials and configuration). Domain rules live in
//! `chat_functions_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod runtime;
