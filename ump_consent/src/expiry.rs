//! Detection of outdated TC strings.
//!
//! Characters 2 to 7 of a TC string hold its creation date, as a big-endian Base64 integer
//! counting deciseconds since the Unix epoch. A TC string created more than 365 days ago should be
//! removed from storage so that the CMP asks for consent again.
//!
//! ```
//! use ump_consent::expiry::is_consent_expired;
//!
//! // 2022-04-20T22:00:00Z
//! let tc_string = "CPXxRfAPXxRfAAfKABENB-CgAAAAAAAAAAYgAAAAAAAA";
//! let one_day_later = 1_650_492_000_000 + 24 * 60 * 60 * 1000;
//! let two_years_later = 1_650_492_000_000 + 2 * 365 * 24 * 60 * 60 * 1000;
//!
//! assert!(!is_consent_expired(tc_string, one_day_later));
//! assert!(is_consent_expired(tc_string, two_years_later));
//! ```
//!
//! The decoder uses the standard Base64 alphabet. Characters outside of it are folded into the
//! value as `-1` by default, which is what CMP integrations historically did; see
//! [`UnknownCharPolicy`] to ignore them instead.
use crate::core::base64::standard_value;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::iter::once;
use std::time::{SystemTime, UNIX_EPOCH};
use strum_macros::Display;

/// Age in days after which a TC string is considered outdated.
pub const MAX_CONSENT_AGE_DAYS: i64 = 365;

const MILLIS_PER_DAY: i64 = 1000 * 60 * 60 * 24;

/// How characters outside of the Base64 alphabet contribute to a decoded timestamp.
#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum UnknownCharPolicy {
    /// The character counts as `-1`.
    #[default]
    Fold,
    /// The character counts as `0`.
    Clamp,
}

/// The creation timestamp embedded in a TC string.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct EncodedTimestamp {
    deciseconds: i64,
    unknown_chars: usize,
}

impl EncodedTimestamp {
    /// Extracts and decodes the creation timestamp of a TC string.
    ///
    /// Strings shorter than 7 characters, including the empty string, decode to 0.
    pub fn from_tc_string(tc_string: &str, policy: UnknownCharPolicy) -> Self {
        Self::decode(date_substring(tc_string), policy)
    }

    /// Decodes a big-endian Base64 integer.
    pub fn decode(s: &str, policy: UnknownCharPolicy) -> Self {
        let mut deciseconds: i64 = 0;
        let mut unknown_chars = 0;

        for c in s.chars() {
            let value = match standard_value(c) {
                Some(v) => i64::from(v),
                None => {
                    unknown_chars += 1;
                    match policy {
                        UnknownCharPolicy::Fold => -1,
                        UnknownCharPolicy::Clamp => 0,
                    }
                }
            };
            deciseconds = deciseconds.saturating_mul(64).saturating_add(value);
        }

        if unknown_chars > 0 {
            tracing::warn!(
                encoded = s,
                unknown_chars,
                %policy,
                "timestamp contains characters outside of the base64 alphabet"
            );
        }

        Self {
            deciseconds,
            unknown_chars,
        }
    }

    pub fn deciseconds(&self) -> i64 {
        self.deciseconds
    }

    pub fn millis(&self) -> i64 {
        self.deciseconds.saturating_mul(100)
    }

    /// Number of characters which were not part of the Base64 alphabet.
    pub fn unknown_chars(&self) -> usize {
        self.unknown_chars
    }

    /// Whole days elapsed between this timestamp and `now_millis`, rounded down.
    pub fn days_before(&self, now_millis: i64) -> i64 {
        now_millis
            .saturating_sub(self.millis())
            .div_euclid(MILLIS_PER_DAY)
    }
}

/// Characters 2 to 7 (1-based, inclusive), or an empty string if `s` is too short.
fn date_substring(s: &str) -> &str {
    let mut bounds = s.char_indices().map(|(i, _)| i).chain(once(s.len()));

    match (bounds.nth(1), bounds.nth(5)) {
        (Some(start), Some(end)) => &s[start..end],
        _ => "",
    }
}

/// Expiry rules for stored TC strings.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExpiryPolicy {
    pub max_age_days: i64,
    pub unknown_chars: UnknownCharPolicy,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            max_age_days: MAX_CONSENT_AGE_DAYS,
            unknown_chars: UnknownCharPolicy::default(),
        }
    }
}

impl ExpiryPolicy {
    /// Age of the TC string in whole days at `now_millis`.
    pub fn age_in_days(&self, tc_string: &str, now_millis: i64) -> i64 {
        EncodedTimestamp::from_tc_string(tc_string, self.unknown_chars).days_before(now_millis)
    }

    /// Returns whether the TC string is older than the maximum age and should be deleted.
    pub fn is_expired(&self, tc_string: &str, now_millis: i64) -> bool {
        let timestamp = EncodedTimestamp::from_tc_string(tc_string, self.unknown_chars);
        let days_ago = timestamp.days_before(now_millis);

        tracing::info!(
            timestamp = timestamp.millis(),
            days_ago,
            max_age_days = self.max_age_days,
            "checked TC string age"
        );

        days_ago > self.max_age_days
    }
}

/// Returns whether the TC string is more than 365 days old at `now_millis`.
///
/// An empty string is treated as created at the Unix epoch.
pub fn is_consent_expired(tc_string: &str, now_millis: i64) -> bool {
    ExpiryPolicy::default().is_expired(tc_string, now_millis)
}

/// Current time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
