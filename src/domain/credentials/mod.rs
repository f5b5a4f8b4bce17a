//! Credential domain - secrets and their cache-safe fingerprints

mod credential;
mod fingerprint;

pub use credential::Credential;
pub use fingerprint::CredentialFingerprint;
