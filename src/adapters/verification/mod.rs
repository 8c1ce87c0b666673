//! Transaction verifiers.
//!
//! - `HmacTransactionVerifier` - shared-secret signatures over the canonical payload
//! - `StaticVerifier` - fixed verdicts for development and tests

mod hmac_verifier;
mod static_verifier;

pub use hmac_verifier::HmacTransactionVerifier;
pub use static_verifier::StaticVerifier;
