use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;

/// Capability bit set carried by every user and every token.
///
/// `ADMIN` is exactly `CUSTOMER | CHEF`, so an admin satisfies any route
/// gated on either capability. `ANY` is the empty set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Role(u8);

#[derive(Debug, thiserror::Error)]
#[error("unknown role value {0}")]
pub struct InvalidRole(pub u8);

impl Role {
    pub const ANY: Role = Role(0);
    pub const CUSTOMER: Role = Role(1);
    pub const CHEF: Role = Role(2);
    pub const ADMIN: Role = Role(1 | 2);

    const KNOWN_BITS: u8 = Self::ADMIN.0;

    /// Build a role from raw bits, rejecting bits outside the known capabilities.
    pub fn from_bits(bits: u8) -> Option<Role> {
        (bits & !Self::KNOWN_BITS == 0).then_some(Role(bits))
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    /// True when every bit of `required` is present in `self`.
    pub fn has_flag(self, required: Role) -> bool {
        self.0 & required.0 == required.0
    }

    pub fn is_admin(self) -> bool {
        self.has_flag(Role::ADMIN)
    }

    pub fn name(self) -> &'static str {
        match self.0 {
            0 => "any",
            1 => "customer",
            2 => "chef",
            3 => "admin",
            _ => "unknown",
        }
    }
}

impl BitOr for Role {
    type Output = Role;

    fn bitor(self, rhs: Role) -> Role {
        Role(self.0 | rhs.0)
    }
}

impl TryFrom<u8> for Role {
    type Error = InvalidRole;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        Role::from_bits(bits).ok_or(InvalidRole(bits))
    }
}

impl From<Role> for u8 {
    fn from(role: Role) -> u8 {
        role.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
