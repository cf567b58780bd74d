//! Decoding of the core segment of a TCF v2 TC string.
//!
//! CMPs store the full TC string under `IABTCF_TCString` next to the `IABTCF_*` bitstrings which
//! are derived from it. Decoding the string gives access to its metadata, such as the creation
//! date or the CMP which produced it, and allows deriving the bitstrings again.
//!
//! ```
//! # use std::error::Error;
//! #
//! # fn main() -> Result<(), Box<dyn Error>> {
//! use ump_consent::tcstring::TcHeader;
//!
//! let tc: TcHeader = "CQZCrAAQZF98AEsACBENAwEoAPLAAELAAAqIAFKBAAmAEAAWAA4AEg".parse()?;
//!
//! assert_eq!(tc.cmp_id, 300);
//! assert_eq!(tc.consent_language, "EN");
//! assert_eq!(tc.purpose_consents_bitstring(), "1111001011");
//! # Ok(())
//! # }
//! ```
//!
//! Only the core segment is decoded, optional segments following a `.` are ignored. Publisher
//! restrictions, which come last in the core segment, are not decoded either.
use crate::bitstring::to_bitstring;
use crate::core::{DataRead, base64_bit_reader, ensure_encoded_bits};
use bitstream_io::BitRead;
#[cfg(feature = "serde")]
use serde::Serialize;
use std::collections::BTreeSet;
use std::io;
use std::str::FromStr;
use thiserror::Error;

pub use crate::core::DecodeError;

const TCF_VERSION: u8 = 2;

pub type IdSet = BTreeSet<u16>;

/// The error type for TC string decoding operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TcStringDecodeError {
    /// The string is empty.
    #[error("empty TC string")]
    Empty,
    /// The string is not a version 2 TC string.
    #[error("unsupported TC string version (expected {TCF_VERSION}, found {found})")]
    UnsupportedVersion { found: u8 },
    /// The string ended before all core fields could be read.
    #[error("unexpected end of TC string")]
    UnexpectedEndOfString,
    /// The string contains a character which is not part of the URL-safe Base64 alphabet.
    #[error("unable to decode TC string")]
    Decode(#[from] DecodeError),
    #[error("unable to read TC string: {0}")]
    Read(io::Error),
}

impl From<io::Error> for TcStringDecodeError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => Self::UnexpectedEndOfString,
            io::ErrorKind::InvalidData => {
                match e.into_inner().map(|inner| inner.downcast::<DecodeError>()) {
                    Some(Ok(decode_error)) => Self::Decode(*decode_error),
                    Some(Err(inner)) => Self::Read(io::Error::new(io::ErrorKind::InvalidData, inner)),
                    None => Self::Read(io::ErrorKind::InvalidData.into()),
                }
            }
            _ => Self::Read(e),
        }
    }
}

/// The fields of the core segment of a TC string.
///
/// Timestamps are expressed in deciseconds since the Unix epoch, as they are encoded.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[non_exhaustive]
pub struct TcHeader {
    pub version: u8,
    pub created: u64,
    pub last_updated: u64,
    pub cmp_id: u16,
    pub cmp_version: u16,
    pub consent_screen: u8,
    pub consent_language: String,
    pub vendor_list_version: u16,
    pub policy_version: u8,
    pub is_service_specific: bool,
    pub use_non_standard_texts: bool,
    pub special_feature_optins: IdSet,
    pub purpose_consents: IdSet,
    pub purpose_legitimate_interests: IdSet,
    pub purpose_one_treatment: bool,
    pub publisher_country_code: String,
    pub max_vendor_consent_id: u16,
    pub vendor_consents: IdSet,
    pub max_vendor_legitimate_interest_id: u16,
    pub vendor_legitimate_interests: IdSet,
}

impl TcHeader {
    /// Parses a TC string and returns its core segment if successful.
    ///
    /// # Errors
    ///
    /// Returns a [`TcStringDecodeError`] if the string is not a valid version 2 TC string.
    pub fn parse_str(s: &str) -> Result<Self, TcStringDecodeError> {
        s.parse()
    }

    pub fn created_millis(&self) -> u64 {
        self.created.saturating_mul(100)
    }

    pub fn last_updated_millis(&self) -> u64 {
        self.last_updated.saturating_mul(100)
    }

    /// The `IABTCF_PurposeConsents` value for this TC string.
    pub fn purpose_consents_bitstring(&self) -> String {
        to_bitstring(&self.purpose_consents, highest_id(&self.purpose_consents))
    }

    /// The `IABTCF_PurposeLegitimateInterests` value for this TC string.
    pub fn purpose_legitimate_interests_bitstring(&self) -> String {
        to_bitstring(
            &self.purpose_legitimate_interests,
            highest_id(&self.purpose_legitimate_interests),
        )
    }

    /// The `IABTCF_VendorConsents` value for this TC string.
    pub fn vendor_consents_bitstring(&self) -> String {
        to_bitstring(&self.vendor_consents, self.max_vendor_consent_id as usize)
    }

    /// The `IABTCF_VendorLegitimateInterests` value for this TC string.
    pub fn vendor_legitimate_interests_bitstring(&self) -> String {
        to_bitstring(
            &self.vendor_legitimate_interests,
            self.max_vendor_legitimate_interest_id as usize,
        )
    }
}

fn highest_id(ids: &IdSet) -> usize {
    ids.last().map(|&id| id as usize).unwrap_or(0)
}

impl FromStr for TcHeader {
    type Err = TcStringDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let core = s.split('.').next().unwrap_or_default();
        if core.is_empty() {
            return Err(TcStringDecodeError::Empty);
        }

        let mut r = base64_bit_reader(core)?;

        let version = r.read_unsigned::<6, u8>()?;
        if version != TCF_VERSION {
            return Err(TcStringDecodeError::UnsupportedVersion { found: version });
        }

        let created = r.read_deciseconds()?;
        let last_updated = r.read_deciseconds()?;
        let cmp_id = r.read_unsigned::<12, u16>()?;
        let cmp_version = r.read_unsigned::<12, u16>()?;
        let consent_screen = r.read_unsigned::<6, u8>()?;
        let consent_language = r.read_string(2)?;
        let vendor_list_version = r.read_unsigned::<12, u16>()?;
        let policy_version = r.read_unsigned::<6, u8>()?;
        let is_service_specific = r.read_bit()?;
        let use_non_standard_texts = r.read_bit()?;
        let special_feature_optins = r.read_fixed_bitfield(12)?;
        let purpose_consents = r.read_fixed_bitfield(24)?;
        let purpose_legitimate_interests = r.read_fixed_bitfield(24)?;
        let purpose_one_treatment = r.read_bit()?;
        let publisher_country_code = r.read_string(2)?;
        let (max_vendor_consent_id, vendor_consents) = r.read_optimized_integer_range()?;
        let (max_vendor_legitimate_interest_id, vendor_legitimate_interests) =
            r.read_optimized_integer_range()?;
        ensure_encoded_bits(&mut r, core.len())?;

        Ok(Self {
            version,
            created,
            last_updated,
            cmp_id,
            cmp_version,
            consent_screen,
            consent_language,
            vendor_list_version,
            policy_version,
            is_service_specific,
            use_non_standard_texts,
            special_feature_optins,
            purpose_consents,
            purpose_legitimate_interests,
            purpose_one_treatment,
            publisher_country_code,
            max_vendor_consent_id,
            vendor_consents,
            max_vendor_legitimate_interest_id,
            vendor_legitimate_interests,
        })
    }
}
