use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::MalformedIdentifier;

/// Length of the canonical textual form of an [`Identifier`].
pub const ENCODED_LEN: usize = 26;

/// Crockford base32 alphabet (no `I`, `L`, `O`, `U`).
const ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Last value handed out by [`Identifier::generate`] in this process.
static LAST_ISSUED: Mutex<u128> = Mutex::new(0);

/// A 128-bit, lexicographically sortable identifier.
///
/// The high 48 bits hold a millisecond Unix timestamp and the remaining bits
/// are random, so sorting identifiers (numerically or by their 26-character
/// text form) recovers creation order. Values are generated from a UUIDv7
/// and rendered in Crockford base32.
///
/// # Examples
///
/// ```
/// use vellum_core::Identifier;
///
/// let id = Identifier::generate();
/// let text = id.to_string();
/// assert_eq!(text.len(), 26);
/// assert_eq!(text.parse::<Identifier>().unwrap(), id);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier(u128);

impl Identifier {
    /// Generate a new identifier.
    ///
    /// Within a process, successive calls never go backwards: when the clock
    /// has not advanced (or stepped back) the previous value is incremented
    /// instead.
    pub fn generate() -> Self {
        let candidate = Uuid::now_v7().as_u128();
        let mut last = LAST_ISSUED
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let next = if candidate > *last {
            candidate
        } else {
            last.saturating_add(1)
        };
        *last = next;
        Self(next)
    }

    /// Parse the canonical 26-character form. Lowercase input is accepted.
    pub fn parse(input: &str) -> Result<Self, MalformedIdentifier> {
        let length = input.chars().count();
        if length != ENCODED_LEN {
            return Err(MalformedIdentifier::Length(length));
        }

        let mut value: u128 = 0;
        for (position, symbol) in input.chars().enumerate() {
            let digit = decode_symbol(symbol)
                .ok_or(MalformedIdentifier::InvalidSymbol { symbol, position })?;
            // 26 symbols carry 130 bits; the leading one may only use three.
            if position == 0 && digit > 7 {
                return Err(MalformedIdentifier::Overflow);
            }
            value = (value << 5) | u128::from(digit);
        }
        Ok(Self(value))
    }

    /// Build an identifier from its raw 128-bit value.
    pub const fn from_u128(value: u128) -> Self {
        Self(value)
    }

    /// The raw 128-bit value.
    pub const fn as_u128(self) -> u128 {
        self.0
    }

    /// The creation instant encoded in the high 48 bits.
    pub fn timestamp(self) -> Option<DateTime<Utc>> {
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let millis = (self.0 >> 80) as i64;
        DateTime::from_timestamp_millis(millis)
    }

    fn encode(self) -> [u8; ENCODED_LEN] {
        let mut buf = [b'0'; ENCODED_LEN];
        let mut value = self.0;
        for slot in buf.iter_mut().rev() {
            #[allow(clippy::cast_possible_truncation)]
            let index = (value & 0x1f) as usize;
            *slot = ALPHABET[index];
            value >>= 5;
        }
        buf
    }
}

fn decode_symbol(symbol: char) -> Option<u8> {
    let upper = symbol.to_ascii_uppercase();
    if !upper.is_ascii() {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    ALPHABET
        .iter()
        .position(|&c| char::from(c) == upper)
        .map(|index| index as u8)
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let buf = self.encode();
        // The alphabet is pure ASCII.
        let text = std::str::from_utf8(&buf).map_err(|_| fmt::Error)?;
        f.write_str(text)
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({self})")
    }
}

impl FromStr for Identifier {
    type Err = MalformedIdentifier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn generated_identifiers_have_canonical_length() {
        let id = Identifier::generate();
        assert_eq!(id.to_string().len(), ENCODED_LEN);
    }

    #[test]
    fn parse_round_trips_generated_values() {
        for _ in 0..256 {
            let id = Identifier::generate();
            assert_eq!(Identifier::parse(&id.to_string()), Ok(id));
        }
    }

    #[test]
    fn generation_is_monotonic() {
        let ids: Vec<Identifier> = (0..1_000).map(|_| Identifier::generate()).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn text_order_matches_value_order() {
        let a = Identifier::generate();
        let b = Identifier::generate();
        assert!(a < b);
        assert!(a.to_string() < b.to_string());
    }

    #[test]
    fn extremes_encode_as_expected() {
        assert_eq!(
            Identifier::from_u128(0).to_string(),
            "00000000000000000000000000"
        );
        assert_eq!(
            Identifier::from_u128(u128::MAX).to_string(),
            "7ZZZZZZZZZZZZZZZZZZZZZZZZZ"
        );
    }

    #[test]
    fn parse_accepts_lowercase() {
        let id = Identifier::generate();
        let lower = id.to_string().to_lowercase();
        assert_eq!(Identifier::parse(&lower), Ok(id));
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert_eq!(
            Identifier::parse("01ARZ3NDEKTSV4RRFFQ69G5FA"),
            Err(MalformedIdentifier::Length(25))
        );
        assert_eq!(
            Identifier::parse("01ARZ3NDEKTSV4RRFFQ69G5FAVX"),
            Err(MalformedIdentifier::Length(27))
        );
        assert_eq!(Identifier::parse(""), Err(MalformedIdentifier::Length(0)));
    }

    #[test]
    fn parse_rejects_excluded_symbols() {
        let err = Identifier::parse("01ARZ3NDEKTSV4RRFFQ69G5FAU").unwrap_err();
        assert_eq!(
            err,
            MalformedIdentifier::InvalidSymbol {
                symbol: 'U',
                position: 25
            }
        );
        assert!(Identifier::parse("0IARZ3NDEKTSV4RRFFQ69G5FAV").is_err());
        assert!(Identifier::parse("01ARZ3NDEKTSV4RRFFQ69G5FA-").is_err());
    }

    #[test]
    fn parse_rejects_multibyte_input_of_right_char_count() {
        assert!(Identifier::parse("01ARZ3NDEKTSV4RRFFQ69G5FAé").is_err());
    }

    #[test]
    fn parse_rejects_values_above_128_bits() {
        assert_eq!(
            Identifier::parse("8ZZZZZZZZZZZZZZZZZZZZZZZZZ"),
            Err(MalformedIdentifier::Overflow)
        );
    }

    #[test]
    fn timestamp_is_close_to_now() {
        let before = Utc::now().timestamp_millis();
        let id = Identifier::generate();
        let after = Utc::now().timestamp_millis();
        let ts = id.timestamp().unwrap().timestamp_millis();
        assert!(ts >= before - 1 && ts <= after + 1);
    }

    #[test]
    fn serde_uses_text_form() {
        let id = Identifier::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let back: Identifier = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<Identifier>("\"nope\"").is_err());
    }
}
