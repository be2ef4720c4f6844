//! API request handlers.

/// Question answering.
pub mod chat;
/// Document upload.
pub mod documents;
/// Liveness check.
pub mod health;
