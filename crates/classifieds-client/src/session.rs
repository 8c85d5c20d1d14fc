use std::sync::{Arc, PoisonError, RwLock};

/// Bearer token shared between the auth flow and every API call.
///
/// Cloning is cheap and all clones observe the same token, so a login that
/// stores a token is picked up by the next request of any component.
#[derive(Clone, Default)]
pub struct SessionToken {
    inner: Arc<RwLock<Option<String>>>,
}

impl SessionToken {
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(token)),
        }
    }

    pub fn set(&self, token: impl Into<String>) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }

    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    #[must_use]
    pub fn get(&self) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.get().is_some()
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionToken")
            .field("token", &self.get().map(|_| "[redacted]"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_token() {
        let a = SessionToken::default();
        let b = a.clone();
        assert!(!b.is_authenticated());
        a.set("abc");
        assert_eq!(b.get().as_deref(), Some("abc"));
        b.clear();
        assert!(a.get().is_none());
    }

    #[test]
    fn debug_redacts_token() {
        let token = SessionToken::new(Some("very-secret".into()));
        let rendered = format!("{token:?}");
        assert!(!rendered.contains("very-secret"));
    }
}
