//! Helpers for the GraphQL `BigInt` scalar.
//!
//! The API sends big integers as decimal strings, but small values sometimes arrive as JSON
//! numbers. Both decode to [`U256`].

use alloy::primitives::U256;
use serde::{Deserialize, Deserializer, Serializer, de::Error};

#[derive(Deserialize)]
#[serde(untagged)]
enum BigInt {
    String(String),
    Number(u64),
}

impl BigInt {
    fn into_u256<E: Error>(self) -> Result<U256, E> {
        match self {
            Self::String(s) => U256::from_str_radix(s.trim(), 10).map_err(E::custom),
            Self::Number(n) => Ok(U256::from(n)),
        }
    }
}

/// Serializes [`U256`] as a decimal string.
pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

/// Deserializes a decimal string or a number into [`U256`].
pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    BigInt::deserialize(deserializer)?.into_u256()
}

/// Same as the parent module, for optional values.
pub mod option {
    use super::BigInt;
    use alloy::primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes an optional [`U256`] as a decimal string or `null`.
    pub fn serialize<S>(value: &Option<U256>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => super::serialize(value, serializer),
            None => serializer.serialize_none(),
        }
    }

    /// Deserializes an optional decimal string or number into [`U256`].
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<U256>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<BigInt>::deserialize(deserializer)?.map(BigInt::into_u256).transpose()
    }
}
