//! The actor behind a request

use uuid::Uuid;

use crate::models::User;

/// Either a signed-in user or an anonymous visitor
///
/// Resolved once per request and handed to handlers explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Identity {
    Authenticated(User),
    #[default]
    Anonymous,
}

impl Identity {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::Authenticated(_))
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Identity::Authenticated(user) => Some(user),
            Identity::Anonymous => None,
        }
    }

    pub fn into_user(self) -> Option<User> {
        match self {
            Identity::Authenticated(user) => Some(user),
            Identity::Anonymous => None,
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user().map(|u| u.id)
    }
}

impl From<Option<User>> for Identity {
    fn from(user: Option<User>) -> Self {
        user.map_or(Identity::Anonymous, Identity::Authenticated)
    }
}
