use agrostore_core::UserId;

/// Authenticated identity for a request.
///
/// Session handling is owned by the surrounding deployment (reverse proxy /
/// gateway); by the time a request reaches this service it carries a resolved
/// user id and role. Must be present for all storefront routes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    user_id: UserId,
    admin: bool,
}

impl PrincipalContext {
    pub fn new(user_id: UserId, admin: bool) -> Self {
        Self { user_id, admin }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn is_admin(&self) -> bool {
        self.admin
    }
}
