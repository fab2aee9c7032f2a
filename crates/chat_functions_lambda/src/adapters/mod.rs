pub mod auth;
pub mod document_store;
pub mod fcm;
pub mod firestore;
#[cfg(any(test, feature = "test-helpers"))]
pub mod memory;
pub mod push;
