//! Credential models: redacted secrets, token kinds, and the lifecycle-aware record.

pub mod credentials;
pub mod record;
pub mod secret;
