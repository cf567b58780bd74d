//! Consent status as reported by the native UMP SDKs.
//!
//! Both SDKs expose the same four states, but with different numeric values:
//!
//! | Status        | Android | iOS |
//! |---------------|---------|-----|
//! | `Unknown`     | 0       | 0   |
//! | `NotRequired` | 1       | 2   |
//! | `Required`    | 2       | 1   |
//! | `Obtained`    | 3       | 3   |
//!
//! ```
//! use ump_consent::status::{ConsentStatus, Platform};
//!
//! assert_eq!(ConsentStatus::from_code(Platform::Android, 2), ConsentStatus::Required);
//! assert_eq!(ConsentStatus::from_code(Platform::Ios, 2), ConsentStatus::NotRequired);
//! assert_eq!(ConsentStatus::Required.code(Platform::Ios), 1);
//! ```
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::Display;
use thiserror::Error;

/// The mobile platform a native bridge runs on.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Hash)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Platform {
    Android,
    Ios,
}

#[derive(Error, Debug, Eq, PartialEq)]
#[error("unknown platform {0:?}")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("android") {
            Ok(Self::Android)
        } else if s.eq_ignore_ascii_case("ios") {
            Ok(Self::Ios)
        } else {
            Err(UnknownPlatform(s.to_string()))
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq, Hash)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ConsentStatus {
    #[default]
    Unknown,
    Required,
    NotRequired,
    Obtained,
}

#[derive(Clone, Copy, FromPrimitive)]
enum AndroidCode {
    Unknown = 0,
    NotRequired = 1,
    Required = 2,
    Obtained = 3,
}

#[derive(Clone, Copy, FromPrimitive)]
enum IosCode {
    Unknown = 0,
    Required = 1,
    NotRequired = 2,
    Obtained = 3,
}

impl ConsentStatus {
    pub const ALL: [ConsentStatus; 4] = [
        ConsentStatus::Unknown,
        ConsentStatus::Required,
        ConsentStatus::NotRequired,
        ConsentStatus::Obtained,
    ];

    /// Maps a status code returned by the native SDK. Unknown codes map to `Unknown`.
    pub fn from_code(platform: Platform, code: i64) -> Self {
        match platform {
            Platform::Android => match AndroidCode::from_i64(code) {
                Some(AndroidCode::NotRequired) => Self::NotRequired,
                Some(AndroidCode::Required) => Self::Required,
                Some(AndroidCode::Obtained) => Self::Obtained,
                Some(AndroidCode::Unknown) | None => Self::Unknown,
            },
            Platform::Ios => match IosCode::from_i64(code) {
                Some(IosCode::Required) => Self::Required,
                Some(IosCode::NotRequired) => Self::NotRequired,
                Some(IosCode::Obtained) => Self::Obtained,
                Some(IosCode::Unknown) | None => Self::Unknown,
            },
        }
    }

    /// The native SDK's code for this status.
    pub fn code(self, platform: Platform) -> i64 {
        match platform {
            Platform::Android => match self {
                Self::Unknown => AndroidCode::Unknown as i64,
                Self::NotRequired => AndroidCode::NotRequired as i64,
                Self::Required => AndroidCode::Required as i64,
                Self::Obtained => AndroidCode::Obtained as i64,
            },
            Platform::Ios => match self {
                Self::Unknown => IosCode::Unknown as i64,
                Self::Required => IosCode::Required as i64,
                Self::NotRequired => IosCode::NotRequired as i64,
                Self::Obtained => IosCode::Obtained as i64,
            },
        }
    }

    pub fn is_form_required(self) -> bool {
        self == Self::Required
    }
}

/// A change of [`ConsentStatus`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct StatusTransition {
    pub from: ConsentStatus,
    pub to: ConsentStatus,
}

impl StatusTransition {
    pub fn is_change(&self) -> bool {
        self.from != self.to
    }
}

/// Notifications published by the consent orchestrator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "event", rename_all = "snake_case"))]
pub enum ConsentEvent {
    /// The status was refreshed and dispatched. `from` and `to` may be equal.
    StatusChanged(StatusTransition),
    /// The consent form was dismissed, could not be shown, or was not needed.
    FormClosed,
}
