//! Credential access.
//!
//! Session issuance and refresh belong to the host application's auth
//! service; this crate only asks it for the current bearer token.

/// Yields the caller's bearer credential, or `None` when no session is
/// active.
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// A fixed token, for tools and tests.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl TokenProvider for StaticToken {
    fn token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Always unauthenticated.
#[derive(Debug, Clone, Copy)]
pub struct NoToken;

impl TokenProvider for NoToken {
    fn token(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn providers() {
        assert_eq!(
            StaticToken("session-1".into()).token(),
            Some("session-1".to_string())
        );
        assert_eq!(NoToken.token(), None);
    }
}
