//! Credential providers for the Sheets client.
//!
//! The client asks for a bearer token on every call. Token refresh is
//! somebody else's job; a provider only hands out what it currently has.

use std::{fmt::Debug, fs, path::PathBuf};

/// Source of the bearer token sent with every Sheets call.
pub trait CredentialProvider: Send + Sync + Debug {
    /// Current token, or `None` when there is nothing to send.
    fn bearer_token(&self) -> Option<String>;
}

/// A fixed token.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl CredentialProvider for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        Some(self.0.trim().to_string()).filter(|t| !t.is_empty())
    }
}

/// A token read from a file on every call.
#[derive(Debug, Clone)]
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialProvider for TokenFile {
    fn bearer_token(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Some(contents.trim().to_string()).filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Cannot read token file: {}", e);
                None
            }
        }
    }
}

/// No credential configured; every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredential;

impl CredentialProvider for NoCredential {
    fn bearer_token(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_token_is_trimmed() {
        assert_eq!(StaticToken::new(" abc \n").bearer_token(), Some("abc".into()));
        assert_eq!(StaticToken::new("  ").bearer_token(), None);
    }

    #[test]
    fn token_file_is_reread() {
        let path = std::env::temp_dir().join(format!("humidor-token-{}", uuid::Uuid::new_v4()));
        let provider = TokenFile::new(&path);
        assert_eq!(provider.bearer_token(), None);

        fs::write(&path, "first\n").unwrap();
        assert_eq!(provider.bearer_token(), Some("first".into()));

        fs::write(&path, "second").unwrap();
        assert_eq!(provider.bearer_token(), Some("second".into()));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn no_credential() {
        assert_eq!(NoCredential.bearer_token(), None);
    }
}
