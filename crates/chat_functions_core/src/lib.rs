//! Shared domain primitives for the mentor chat functions.
//!
//! This crate owns the document codec, query description, notification
//! building and retention rules. It intentionally excludes HTTP, Lambda
//! runtime and credential concerns.

pub mod collections;
pub mod contract;
pub mod document;
pub mod notification;
pub mod query;
pub mod retention;
