//! Value Objects

pub mod account_role;
pub mod display_name;
pub mod email;
pub mod membership_role;

pub use account_role::AccountRole;
pub use display_name::DisplayName;
pub use email::Email;
pub use membership_role::MembershipRole;
