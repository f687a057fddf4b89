//! Caller identity
//!
//! The identity collaborator is external; operations receive a [`Caller`]
//! that either wraps an opaque user id or is anonymous. Every operation
//! begins by requiring the id, turning anonymity into `unauthenticated`
//! before any work happens.

use crate::errors::ServiceError;
use crate::ids::UserId;

/// The identity (or lack of one) attached to an incoming call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(Option<UserId>);

impl Caller {
    pub fn authenticated(uid: impl Into<UserId>) -> Self {
        Self(Some(uid.into()))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }

    /// The authenticated id, or `unauthenticated`
    pub fn require(&self) -> Result<&UserId, ServiceError> {
        self.0.as_ref().ok_or(ServiceError::Unauthenticated)
    }
}

impl From<UserId> for Caller {
    fn from(uid: UserId) -> Self {
        Self(Some(uid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authenticated_caller() {
        let caller = Caller::authenticated(UserId::new("u-1"));
        assert_eq!(caller.require().unwrap().as_str(), "u-1");
    }

    #[test]
    fn test_anonymous_caller_rejected() {
        let caller = Caller::anonymous();
        assert_eq!(caller.require(), Err(ServiceError::Unauthenticated));
    }
}
