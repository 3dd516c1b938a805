//! Membership Role Value Object
//!
//! Per-project permission tier, distinct from the account-wide
//! [`AccountRole`](super::account_role::AccountRole).

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum MembershipRole {
    Viewer = 0,
    Member = 1,
    Admin = 2,
}

impl MembershipRole {
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            MembershipRole::Viewer => "viewer",
            MembershipRole::Member => "member",
            MembershipRole::Admin => "admin",
        }
    }

    /// Member-level writes (creating/editing tasks, commenting)
    #[inline]
    pub const fn can_write(&self) -> bool {
        matches!(self, MembershipRole::Member | MembershipRole::Admin)
    }

    /// Admin-only project mutations (removing members, deleting tasks)
    #[inline]
    pub const fn can_manage(&self) -> bool {
        matches!(self, MembershipRole::Admin)
    }

    #[inline]
    pub fn from_id(id: i16) -> Self {
        match id {
            0 => MembershipRole::Viewer,
            1 => MembershipRole::Member,
            2 => MembershipRole::Admin,
            _ => {
                tracing::error!("Invalid MembershipRole id: {}", id);
                unreachable!("Invalid MembershipRole id: {}", id)
            }
        }
    }

    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "viewer" => Some(MembershipRole::Viewer),
            "member" => Some(MembershipRole::Member),
            "admin" => Some(MembershipRole::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for MembershipRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_role_ladder() {
        assert!(!MembershipRole::Viewer.can_write());
        assert!(!MembershipRole::Viewer.can_manage());
        assert!(MembershipRole::Member.can_write());
        assert!(!MembershipRole::Member.can_manage());
        assert!(MembershipRole::Admin.can_write());
        assert!(MembershipRole::Admin.can_manage());
    }

    #[test]
    fn test_membership_role_codes() {
        assert_eq!(MembershipRole::from_code("viewer"), Some(MembershipRole::Viewer));
        assert_eq!(MembershipRole::from_code("member"), Some(MembershipRole::Member));
        assert_eq!(MembershipRole::from_code("admin"), Some(MembershipRole::Admin));
        assert_eq!(MembershipRole::from_code("user"), None);
    }

    #[test]
    fn test_membership_role_round_trip() {
        for role in [
            MembershipRole::Viewer,
            MembershipRole::Member,
            MembershipRole::Admin,
        ] {
            assert_eq!(MembershipRole::from_id(role.id()), role);
        }
    }
}
