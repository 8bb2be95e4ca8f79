//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a provisioned account (`clientes.id`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(i32);

/// Identifier of a ledger entry, assigned by the entry store on append.
///
/// Entry ids grow with insertion order, so they double as the tie-break key when
/// two movements carry the same timestamp.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(i64);

macro_rules! impl_int_newtype {
    ($t:ty, $inner:ty, $name:literal) => {
        impl $t {
            pub const fn new(value: $inner) -> Self {
                Self(value)
            }

            pub const fn get(self) -> $inner {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<$inner> for $t {
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }

        impl From<$t> for $inner {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = <$inner>::from_str(s)
                    .map_err(|e| DomainError::validation(format!("{}: {}", $name, e)))?;
                Ok(Self(value))
            }
        }
    };
}

impl_int_newtype!(AccountId, i32, "AccountId");
impl_int_newtype!(EntryId, i64, "EntryId");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_id_parses_from_path_segment() {
        assert_eq!("3".parse::<AccountId>().unwrap(), AccountId::new(3));
        assert!(matches!(
            "abc".parse::<AccountId>(),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&EntryId::new(42)).unwrap();
        assert_eq!(json, "42");
    }
}
