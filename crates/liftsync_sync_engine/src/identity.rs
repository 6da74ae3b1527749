//! The signed-in user as seen by the sync engine.

use parking_lot::RwLock;

/// Credentials for backend calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Backend user id.
    pub user_id: String,
    /// Bearer token.
    pub access_token: String,
}

impl Identity {
    /// Creates an identity.
    pub fn new(user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: access_token.into(),
        }
    }
}

/// Source of the current identity.
pub trait IdentityProvider: Send + Sync {
    /// The signed-in identity, or `None` when signed out.
    fn current(&self) -> Option<Identity>;
}

/// An identity that is set and cleared explicitly.
#[derive(Debug, Default)]
pub struct StaticIdentity {
    identity: RwLock<Option<Identity>>,
}

impl StaticIdentity {
    /// Starts signed in.
    pub fn signed_in(identity: Identity) -> Self {
        Self {
            identity: RwLock::new(Some(identity)),
        }
    }

    /// Starts signed out.
    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Replaces the identity.
    pub fn sign_in(&self, identity: Identity) {
        *self.identity.write() = Some(identity);
    }

    /// Clears the identity.
    pub fn sign_out(&self) {
        *self.identity.write() = None;
    }
}

impl IdentityProvider for StaticIdentity {
    fn current(&self) -> Option<Identity> {
        self.identity.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_and_out() {
        let provider = StaticIdentity::signed_out();
        assert!(provider.current().is_none());

        provider.sign_in(Identity::new("u1", "t1"));
        assert_eq!(provider.current().map(|i| i.user_id), Some("u1".into()));

        provider.sign_out();
        assert!(provider.current().is_none());
    }
}
