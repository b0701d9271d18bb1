//! Public extension contracts.
//!
//! [`RequestSignerExt`] describes how broker credentials are attached to an outbound request;
//! [`BrokerHeaderSigner`] is the implementation the SDK itself uses for proxied calls, exposed
//! so callers driving their own HTTP stack sign requests the same way.

pub mod request_signer;

pub use request_signer::*;
