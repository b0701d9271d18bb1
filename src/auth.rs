//! Auth-domain identifiers, secrets, and the credential record returned by the broker.

pub mod id;
pub mod token;

pub use id::*;
pub use token::{credentials::*, record::*, secret::*};
