//! This crate evaluates the IAB
//! [Transparency & Consent Framework](https://github.com/InteractiveAdvertisingBureau/GDPR-Transparency-and-Consent-Framework)
//! signals published by a CMP, such as Google's User Messaging Platform, on a mobile device.
//!
//! It answers the questions an app has to ask before requesting ads: does GDPR apply, can ads be
//! shown, can they be personalized, and is the stored consent still recent enough.
//!
//! NOTE: This is not an official IAB or Google library.
//!
//! # Evaluating consent signals
//!
//! CMPs publish consent as strings of `0` and `1` under the `IABTCF_*` keys of the platform's
//! key-value store. Position `i` (1-based) of a string holds the flag of purpose or vendor `i`.
//!
//! ```
//! use ump_consent::has_attribute;
//! use ump_consent::policy::{can_show_ads, can_show_personalized_ads};
//!
//! let purpose_consents = "1110111111";
//! let purpose_legitimate_interests = "0000000000";
//!
//! assert!(has_attribute(purpose_consents, 3));
//! assert!(!has_attribute(purpose_consents, 4));
//! assert!(!has_attribute(purpose_consents, 11));
//!
//! assert!(can_show_ads(purpose_consents, purpose_legitimate_interests));
//! assert!(!can_show_personalized_ads(purpose_consents, purpose_legitimate_interests));
//! ```
//!
//! The values are usually read from a [`ConsentStorage`](storage::ConsentStorage) into a
//! [`ConsentSignals`](signals::ConsentSignals) snapshot, which evaluates every decision at once.
//!
//! ```
//! # use std::error::Error;
//! #
//! # fn main() -> Result<(), Box<dyn Error>> {
//! use ump_consent::expiry::ExpiryPolicy;
//! use ump_consent::policy::GOOGLE_VENDOR_ID;
//! use ump_consent::signals::ConsentSignals;
//! use ump_consent::storage::{ConsentStorageMut, GDPR_APPLIES, MemoryStorage, publish_tc_string};
//!
//! let mut storage = MemoryStorage::new();
//! storage.set_int(GDPR_APPLIES, 1);
//! publish_tc_string(
//!     &mut storage,
//!     "CPXuQIAPXuQIAAfKABENB-CgACAAAAAAAAYgF5wAQF5gAAAA.YAAAAAAAAAAA",
//! )?;
//!
//! let signals = ConsentSignals::load(&storage);
//! let decisions = signals.decisions(GOOGLE_VENDOR_ID, &ExpiryPolicy::default(), 1_650_500_000_000);
//!
//! // the vendor has consent, but purpose 1 was refused
//! assert!(decisions.vendor_authorized);
//! assert!(!decisions.can_show_ads);
//! assert!(!decisions.tc_string_expired);
//! # Ok(())
//! # }
//! ```
//!
//! # Consent flow
//!
//! The [`ConsentOrchestrator`](orchestrator::ConsentOrchestrator) drives the native SDK through a
//! [`NativeConsentBridge`](bridge::NativeConsentBridge): it requests consent information, shows
//! the consent form when needed, and publishes [`ConsentEvent`](status::ConsentEvent)s to its
//! subscribers.
//!
//! # Error handling
//!
//! Consent decisions never fail. Missing values, out of range indices and malformed characters
//! all evaluate to "no consent". Decoders of structured strings, such as
//! [`TcHeader`](tcstring::TcHeader), return an error instead.
//!
pub(crate) mod core;
pub mod addtl;
pub mod bitstring;
pub mod bridge;
pub mod config;
pub mod expiry;
pub mod orchestrator;
pub mod policy;
pub mod signals;
pub mod status;
pub mod storage;
pub mod tcstring;

pub use bitstring::has_attribute;
