/// Planning Poker Kernel: Card Deck
///
/// The deck is fixed. A card is either a numeric estimate drawn from
/// `DECK`, or one of the two sentinels (pause, abstain).
/// Sentinels never contribute to averages.

use std::fmt;

use serde::de::{Deserializer, Error as _};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::GameError;

/// Allowed numeric estimates, in display order.
pub const DECK: [u32; 10] = [0, 1, 2, 3, 5, 8, 13, 20, 40, 100];

pub const PAUSE_TOKEN: &str = "pause";
pub const ABSTAIN_TOKEN: &str = "abstain";

// Literals used by saved files from earlier versions of the tool.
const LEGACY_PAUSE_TOKEN: &str = "cafe";
const LEGACY_ABSTAIN_TOKEN: &str = "interro";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CardValue {
    Estimate(u32),
    Pause,
    Abstain,
}

impl CardValue {
    /// Build a numeric card, rejecting values outside the deck.
    pub fn estimate(value: u32) -> Result<Self, GameError> {
        if DECK.contains(&value) {
            Ok(CardValue::Estimate(value))
        } else {
            Err(GameError::validation(format!(
                "card {value} is not in the deck {DECK:?}"
            )))
        }
    }

    /// Parse a raw card as submitted by a participant.
    pub fn parse(raw: &str) -> Result<Self, GameError> {
        let raw = raw.trim();
        match raw.to_ascii_lowercase().as_str() {
            PAUSE_TOKEN | LEGACY_PAUSE_TOKEN => return Ok(CardValue::Pause),
            ABSTAIN_TOKEN | LEGACY_ABSTAIN_TOKEN => return Ok(CardValue::Abstain),
            _ => {}
        }
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(GameError::validation(format!(
                "unrecognised card {raw:?}"
            )));
        }
        let value: u32 = raw
            .parse()
            .map_err(|_| GameError::validation(format!("card {raw:?} is out of range")))?;
        Self::estimate(value)
    }

    pub fn as_estimate(&self) -> Option<u32> {
        match self {
            CardValue::Estimate(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_pause(&self) -> bool {
        matches!(self, CardValue::Pause)
    }
}

impl fmt::Display for CardValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardValue::Estimate(v) => write!(f, "{v}"),
            CardValue::Pause => f.write_str(PAUSE_TOKEN),
            CardValue::Abstain => f.write_str(ABSTAIN_TOKEN),
        }
    }
}

impl Serialize for CardValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CardValue::Estimate(v) => serializer.serialize_u32(*v),
            CardValue::Pause => serializer.serialize_str(PAUSE_TOKEN),
            CardValue::Abstain => serializer.serialize_str(ABSTAIN_TOKEN),
        }
    }
}

impl<'de> Deserialize<'de> for CardValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawCard {
            Number(u64),
            Text(String),
        }

        match RawCard::deserialize(deserializer)? {
            RawCard::Number(n) => {
                let n = u32::try_from(n)
                    .map_err(|_| D::Error::custom(format!("card {n} is out of range")))?;
                CardValue::estimate(n).map_err(D::Error::custom)
            }
            RawCard::Text(s) => CardValue::parse(&s).map_err(D::Error::custom),
        }
    }
}

/// Arithmetic mean of the numeric cards, rounded to 2 decimals.
/// Sentinels are skipped; the mean of no estimates is 0.
pub fn mean_of<'a, I>(cards: I) -> f64
where
    I: IntoIterator<Item = &'a CardValue>,
{
    let (sum, count) = cards
        .into_iter()
        .filter_map(CardValue::as_estimate)
        .fold((0u64, 0u32), |(sum, count), v| (sum + u64::from(v), count + 1));
    if count == 0 {
        return 0.0;
    }
    round2(sum as f64 / f64::from(count))
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
