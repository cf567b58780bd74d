//! Google's Additional Consent string, stored under `IABTCF_AddtlConsent`.
//!
//! Ad technology providers which are not registered with the IAB are identified by Google with
//! their own ids. The string lists the providers the user consented to and, since version 2,
//! the providers which were disclosed to the user:
//!
//! ```text
//! 2~1.35.41.101~dv.9.21.81
//! ```
//!
//! ```
//! use ump_consent::addtl::{AdditionalConsent, is_external_authorized};
//!
//! let ac: AdditionalConsent = "2~1.35.41.101~dv.9.21.81".parse().unwrap();
//! assert!(ac.is_consented(35));
//! assert!(ac.is_disclosed(21));
//!
//! assert!(is_external_authorized(41, "2~1.35.41.101~dv.9.21.81"));
//! assert!(!is_external_authorized(41, "not a valid string"));
//! ```
use crate::tcstring::IdSet;
use num_traits::ToPrimitive;
#[cfg(feature = "serde")]
use serde::Serialize;
use std::str::FromStr;
use thiserror::Error;

const DISCLOSED_PREFIX: &str = "dv";

/// The error type for Additional Consent string parsing.
#[derive(Error, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum AdditionalConsentError {
    #[error("empty additional consent string")]
    Empty,
    #[error("invalid version {0:?}")]
    InvalidVersion(String),
    #[error("invalid provider id {0:?}")]
    InvalidId(String),
    #[error("invalid disclosed providers segment {0:?}")]
    InvalidDisclosedSegment(String),
    #[error("unexpected segment {0:?}")]
    UnexpectedSegment(String),
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct AdditionalConsent {
    pub version: u8,
    pub consented: IdSet,
    pub disclosed: IdSet,
}

impl AdditionalConsent {
    pub fn is_consented<I: ToPrimitive>(&self, id: I) -> bool {
        id.to_u16().is_some_and(|id| self.consented.contains(&id))
    }

    pub fn is_disclosed<I: ToPrimitive>(&self, id: I) -> bool {
        id.to_u16().is_some_and(|id| self.disclosed.contains(&id))
    }
}

impl FromStr for AdditionalConsent {
    type Err = AdditionalConsentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segments = s.split('~');

        let version = segments
            .next()
            .filter(|v| !v.is_empty())
            .ok_or(AdditionalConsentError::Empty)?;
        let version = version
            .parse::<u8>()
            .ok()
            .filter(|&v| v > 0)
            .ok_or_else(|| AdditionalConsentError::InvalidVersion(version.to_string()))?;

        let consented = parse_ids(segments.next().unwrap_or_default())?;

        let disclosed = match segments.next() {
            Some(segment) => {
                let ids = segment
                    .strip_prefix(DISCLOSED_PREFIX)
                    .and_then(|ids| {
                        if ids.is_empty() {
                            Some(ids)
                        } else {
                            ids.strip_prefix('.')
                        }
                    })
                    .ok_or_else(|| {
                        AdditionalConsentError::InvalidDisclosedSegment(segment.to_string())
                    })?;
                parse_ids(ids)?
            }
            None => IdSet::new(),
        };

        if let Some(segment) = segments.next() {
            return Err(AdditionalConsentError::UnexpectedSegment(segment.to_string()));
        }

        Ok(Self {
            version,
            consented,
            disclosed,
        })
    }
}

fn parse_ids(s: &str) -> Result<IdSet, AdditionalConsentError> {
    if s.is_empty() {
        return Ok(IdSet::new());
    }

    s.split('.')
        .map(|id| {
            id.parse::<u16>()
                .map_err(|_| AdditionalConsentError::InvalidId(id.to_string()))
        })
        .collect()
}

/// Returns whether the provider with the given Google ATP id has consent.
///
/// Strings which cannot be parsed grant no consent.
pub fn is_external_authorized<I: ToPrimitive>(external_id: I, addtl_consent: &str) -> bool {
    match addtl_consent.parse::<AdditionalConsent>() {
        Ok(ac) => ac.is_consented(external_id),
        Err(e) => {
            if !addtl_consent.is_empty() {
                tracing::debug!(error = %e, "ignoring invalid additional consent string");
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("2~1.35.41.101~dv.9.21.81" => AdditionalConsent {
        version: 2,
        consented: IdSet::from_iter([1, 35, 41, 101]),
        disclosed: IdSet::from_iter([9, 21, 81]),
    } ; "version 2")]
    #[test_case("1~1.35.41.101" => AdditionalConsent {
        version: 1,
        consented: IdSet::from_iter([1, 35, 41, 101]),
        disclosed: IdSet::new(),
    } ; "version 1")]
    #[test_case("2~~dv.9.21" => AdditionalConsent {
        version: 2,
        consented: IdSet::new(),
        disclosed: IdSet::from_iter([9, 21]),
    } ; "nothing consented")]
    #[test_case("2~7~dv" => AdditionalConsent {
        version: 2,
        consented: IdSet::from_iter([7]),
        disclosed: IdSet::new(),
    } ; "nothing disclosed")]
    #[test_case("1~" => AdditionalConsent {
        version: 1,
        ..Default::default()
    } ; "empty list")]
    #[test_case("1" => AdditionalConsent {
        version: 1,
        ..Default::default()
    } ; "version only")]
    fn parse(s: &str) -> AdditionalConsent {
        AdditionalConsent::from_str(s).unwrap()
    }

    #[test_case("" => AdditionalConsentError::Empty ; "empty string")]
    #[test_case("~1.2" => AdditionalConsentError::Empty ; "missing version")]
    #[test_case("0~1.2" => AdditionalConsentError::InvalidVersion("0".to_string()) ; "zero version")]
    #[test_case("x~1.2" => AdditionalConsentError::InvalidVersion("x".to_string()) ; "invalid version")]
    #[test_case("2~1..2" => AdditionalConsentError::InvalidId("".to_string()) ; "empty id")]
    #[test_case("2~1.a" => AdditionalConsentError::InvalidId("a".to_string()) ; "invalid id")]
    #[test_case("2~1.70000" => AdditionalConsentError::InvalidId("70000".to_string()) ; "id too large")]
    #[test_case("2~1~xx.3" => AdditionalConsentError::InvalidDisclosedSegment("xx.3".to_string()) ; "invalid disclosed prefix")]
    #[test_case("2~1~dv3" => AdditionalConsentError::InvalidDisclosedSegment("dv3".to_string()) ; "missing dot")]
    #[test_case("2~1~dv.3~4" => AdditionalConsentError::UnexpectedSegment("4".to_string()) ; "extra segment")]
    fn error(s: &str) -> AdditionalConsentError {
        AdditionalConsent::from_str(s).unwrap_err()
    }

    #[test_case(35 => true ; "consented")]
    #[test_case(9 => false ; "disclosed only")]
    #[test_case(2 => false ; "absent")]
    #[test_case(-35 => false ; "negative")]
    #[test_case(65571 => false ; "too large")]
    fn external_authorized(id: i64) -> bool {
        is_external_authorized(id, "2~1.35.41.101~dv.9.21.81")
    }

    #[test]
    fn invalid_string_is_not_authorized() {
        assert!(!is_external_authorized(1, ""));
        assert!(!is_external_authorized(1, "garbage"));
    }
}
