//! Session boundary: who is signed in and how outbound requests
//! authenticate. The identity provider itself is external; the core only
//! consumes a current-user accessor and a bearer-token accessor.

use async_trait::async_trait;

#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Identifier of the signed-in user, if any.
    fn current_user(&self) -> Option<String>;

    /// Token attached as `Authorization: Bearer ...` on outbound requests.
    /// `None` means the request goes out unauthenticated.
    async fn bearer_token(&self) -> anyhow::Result<Option<String>>;
}

/// Fixed-credential session built from config at startup. Stands in for the
/// external identity provider; an absent token means anonymous access.
#[derive(Debug)]
pub struct StaticSession {
    user: Option<String>,
    token: Option<String>,
}

impl StaticSession {
    pub fn new(user: Option<String>, token: Option<String>) -> Self {
        Self { user, token }
    }
}

#[async_trait]
impl SessionProvider for StaticSession {
    fn current_user(&self) -> Option<String> {
        self.user.clone()
    }

    async fn bearer_token(&self) -> anyhow::Result<Option<String>> {
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_session_exposes_token_and_user() {
        let session = StaticSession::new(Some("ada".to_string()), Some("tok-1".to_string()));
        assert_eq!(session.current_user().as_deref(), Some("ada"));
        assert_eq!(session.bearer_token().await.unwrap().as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn test_anonymous_session_has_no_token() {
        let session = StaticSession::new(None, None);
        assert_eq!(session.current_user(), None);
        assert_eq!(session.bearer_token().await.unwrap(), None);
    }
}
