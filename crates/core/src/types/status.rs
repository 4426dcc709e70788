//! Status and role enums.

use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
///
/// The variant names match the wire values the order service uses, so the
/// enum serializes without renames. The server is authoritative for the
/// stored status; the transition predicates below decide which actions are
/// offerable locally before a remote call is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Initial status, set at placement.
    #[default]
    PendingConfirmation,
    /// Confirmed and being processed.
    Processing,
    /// Terminal status, no further transitions.
    OrderCancelled,
}

impl OrderStatus {
    /// `confirm` moves an order into [`Self::Processing`] and is only
    /// reachable from [`Self::PendingConfirmation`].
    #[must_use]
    pub const fn can_confirm(self) -> bool {
        matches!(self, Self::PendingConfirmation)
    }

    /// `cancel` is reachable until the order is already cancelled.
    #[must_use]
    pub const fn can_cancel(self) -> bool {
        matches!(self, Self::PendingConfirmation | Self::Processing)
    }

    /// An order actively being processed cannot be deleted, only cancelled.
    #[must_use]
    pub const fn can_remove(self) -> bool {
        !matches!(self, Self::Processing)
    }

    /// Whether no further status transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::OrderCancelled)
    }

    /// Human-readable label for display next to an order row.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PendingConfirmation => "awaiting confirmation",
            Self::Processing => "confirmed",
            Self::OrderCancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PendingConfirmation => write!(f, "PendingConfirmation"),
            Self::Processing => write!(f, "Processing"),
            Self::OrderCancelled => write!(f, "OrderCancelled"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PendingConfirmation" => Ok(Self::PendingConfirmation),
            "Processing" => Ok(Self::Processing),
            "OrderCancelled" => Ok(Self::OrderCancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Capability level of the current session.
///
/// Roles are ordered: every admin capability implies the authenticated ones.
/// Deriving the role once (see the client crate's policy module) avoids
/// scattering raw profile-id comparisons through view code, where a typo
/// would silently match no one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// No session token.
    Guest,
    /// Valid session token.
    Authenticated,
    /// Authenticated as the designated admin profile.
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Guest => write!(f, "guest"),
            Self::Authenticated => write!(f, "authenticated"),
            Self::Admin => write!(f, "admin"),
        }
    }
}
