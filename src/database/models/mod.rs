pub mod item;
pub mod order;
pub mod order_item;
pub mod payment;
pub mod request;
pub mod tag;
pub mod user;

pub use item::Item;
pub use order::{Order, OrderStatus};
pub use order_item::{ItemStatus, OrderItem};
pub use payment::{Payment, PaymentRow, PaymentStatus};
pub use request::{RequestStatus, RoleRequest, SeenStatus};
pub use tag::Tag;
pub use user::{User, UserCredentials};

use thiserror::Error;

use crate::auth::{role::InvalidRole, Role};

#[derive(Debug, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Closed set of lowercase string states, stored as TEXT and decoded with
/// `#[sqlx(try_from = "String")]`.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::database::models::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err($crate::database::models::UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::database::models::UnknownVariant;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

pub(crate) use text_enum;

impl TryFrom<i16> for Role {
    type Error = InvalidRole;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        let bits = u8::try_from(value).map_err(|_| InvalidRole(u8::MAX))?;
        Role::try_from(bits)
    }
}

impl From<Role> for i16 {
    fn from(role: Role) -> i16 {
        i16::from(role.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_states_parse_exactly() {
        assert_eq!("open".parse::<OrderStatus>().unwrap(), OrderStatus::Open);
        assert_eq!("completed".parse::<ItemStatus>().unwrap(), ItemStatus::Completed);
        assert_eq!("accepted".parse::<PaymentStatus>().unwrap(), PaymentStatus::Accepted);
        assert_eq!("granted".parse::<RequestStatus>().unwrap(), RequestStatus::Granted);
        assert_eq!("unseen".parse::<SeenStatus>().unwrap(), SeenStatus::Unseen);
    }

    #[test]
    fn payment_status_space_is_narrow() {
        let err = "refunded".parse::<PaymentStatus>().unwrap_err();
        assert_eq!(err.to_string(), "unknown payment status 'refunded'");
        assert!("failed".parse::<PaymentStatus>().is_err());
        assert!("Accepted".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&ItemStatus::Preparing).unwrap(), "\"preparing\"");
        assert_eq!(
            serde_json::from_str::<OrderStatus>("\"closed\"").unwrap(),
            OrderStatus::Closed
        );
    }

    #[test]
    fn role_round_trips_through_smallint() {
        assert_eq!(Role::try_from(3i16).unwrap(), Role::ADMIN);
        assert!(Role::try_from(-1i16).is_err());
        assert!(Role::try_from(7i16).is_err());
        assert_eq!(i16::from(Role::CHEF), 2);
    }
}
