//! Access policy.
//!
//! Pure functions of [`Session`]: two booleans and the role derived from
//! them. This is boolean capability gating, not a policy engine - the role
//! gates profile/orders views (authenticated-only), admin affordances, and
//! the raw-identifier diagnostic on catalog rows (admin-only).

use green_mango_core::{ProfileId, Role};

use crate::session::Session;

/// Whether the session carries a token.
#[must_use]
pub const fn is_authenticated(session: &Session) -> bool {
    session.is_authenticated()
}

/// Whether the session belongs to the designated admin profile.
#[must_use]
pub fn is_admin(session: &Session, admin_profile_id: &ProfileId) -> bool {
    session.profile_id() == Some(admin_profile_id)
}

/// Derive the role once; view code matches on the enum instead of
/// re-comparing profile ids.
#[must_use]
pub fn role_for(session: &Session, admin_profile_id: &ProfileId) -> Role {
    if !session.is_authenticated() {
        return Role::Guest;
    }
    if is_admin(session, admin_profile_id) {
        Role::Admin
    } else {
        Role::Authenticated
    }
}

/// Profile and order views require a session.
#[must_use]
pub fn can_view_profile(role: Role) -> bool {
    role >= Role::Authenticated
}

/// Admin routes and affordances.
#[must_use]
pub fn can_view_admin(role: Role) -> bool {
    role == Role::Admin
}

/// Whether catalog rows show their raw identifier (admin diagnostic).
#[must_use]
pub fn shows_raw_ids(role: Role) -> bool {
    role == Role::Admin
}
