use std::fmt;

use super::CredentialFingerprint;

/// A secret API credential supplied by the caller
///
/// The raw key is only ever handed to external factories (embedding provider,
/// vector index). Anything that ends up in a cache key goes through
/// [`Credential::fingerprint`].
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    api_key: String,
}

impl Credential {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn is_empty(&self) -> bool {
        self.api_key.trim().is_empty()
    }

    pub fn fingerprint(&self) -> CredentialFingerprint {
        CredentialFingerprint::of(self)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("api_key", &"<redacted>")
            .field("fingerprint", &self.fingerprint().as_str())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_never_prints_secret() {
        let credential = Credential::new("sk-very-secret");
        let debug = format!("{:?}", credential);

        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_is_empty() {
        assert!(Credential::new("  ").is_empty());
        assert!(!Credential::new("sk-1").is_empty());
    }
}
