//! Authorization Engine
//!
//! Pure allow/deny decisions over (identity, role, resource ownership and
//! membership). No I/O, no side effects; handlers fetch the data and map
//! `Deny` to an HTTP outcome:
//! - read paths where existence itself is sensitive map `Deny` to NotFound,
//!   indistinguishable from a true absence;
//! - write paths on resources the caller already knows exist map `Deny` to
//!   Forbidden.

use kernel::id::AccountId;

use crate::domain::value_object::{AccountRole, MembershipRole};

/// Authorization decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
}

impl Access {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Access::Allow)
    }

    fn allow_if(condition: bool) -> Self {
        if condition { Access::Allow } else { Access::Deny }
    }
}

/// The authenticated identity making a request, as established by the
/// session validator.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub account_id: AccountId,
    pub role: AccountRole,
}

/// One project member and their per-project tier.
#[derive(Debug, Clone)]
pub struct Membership {
    pub account_id: AccountId,
    pub role: MembershipRole,
}

/// Ownership and membership view of a project, as loaded by the domain
/// model that owns projects. The owner is not required to appear in
/// `members`; ownership and membership are independent, OR-ed conditions.
#[derive(Debug, Clone)]
pub struct ProjectAccess {
    pub owner: AccountId,
    pub members: Vec<Membership>,
}

impl ProjectAccess {
    pub fn membership_role(&self, account_id: &AccountId) -> Option<MembershipRole> {
        self.members
            .iter()
            .find(|m| &m.account_id == account_id)
            .map(|m| m.role)
    }
}

/// What the actor wants to do to the project or something inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectAction {
    /// View the project and its tasks
    Read,
    /// Member-level writes: create/edit tasks, comment
    Write,
    /// Admin-only mutations: remove a member, delete a task, project settings
    Manage,
}

/// Account-wide role gate.
///
/// `Admin` requirements pass only for admin accounts; a `User` requirement
/// passes for anyone authenticated.
pub fn require_role(actor: &Actor, required: AccountRole) -> Access {
    match required {
        AccountRole::Admin => Access::allow_if(actor.role.is_admin()),
        AccountRole::User => Access::Allow,
    }
}

/// Resource gate for the project/task family.
///
/// The owner may do anything. Everyone else is judged by their membership
/// tier; non-members are denied outright.
pub fn authorize_project(actor: &Actor, project: &ProjectAccess, action: ProjectAction) -> Access {
    if actor.account_id == project.owner {
        return Access::Allow;
    }

    let Some(role) = project.membership_role(&actor.account_id) else {
        return Access::Deny;
    };

    match action {
        ProjectAction::Read => Access::Allow,
        ProjectAction::Write => Access::allow_if(role.can_write()),
        ProjectAction::Manage => Access::allow_if(role.can_manage()),
    }
}
