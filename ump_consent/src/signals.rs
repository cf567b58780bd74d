//! A snapshot of every `IABTCF_*` value, and the decisions derived from it.
//!
//! Signals are read fresh from storage for each evaluation, as CMPs may update them at any time.
//!
//! ```
//! use ump_consent::signals::ConsentSignals;
//! use ump_consent::storage::{GDPR_APPLIES, MemoryStorage, PURPOSE_CONSENTS, StoredValue};
//!
//! let storage = MemoryStorage::from_iter([
//!     (GDPR_APPLIES, StoredValue::Int(1)),
//!     (PURPOSE_CONSENTS, StoredValue::from("1111111111")),
//! ]);
//!
//! let signals = ConsentSignals::load(&storage);
//! assert!(signals.is_gdpr_applicable());
//! assert!(signals.can_show_personalized_ads());
//! ```
use crate::addtl::is_external_authorized;
use crate::expiry::ExpiryPolicy;
use crate::policy::{
    AD_PERSONALIZATION_PURPOSES, AD_STORAGE_PURPOSES, AD_USER_DATA_PURPOSES, Bitstrings,
    can_show_ads, can_show_ads_for_vendor, can_show_personalized_ads,
    can_show_personalized_ads_for_vendor, has_consent_for_purposes, has_vendor_consent,
    is_gdpr_applicable, is_vendor_authorized,
};
use crate::storage::{
    ADDTL_CONSENT, ConsentStorage, GDPR_APPLIES, PURPOSE_CONSENTS, PURPOSE_LEGITIMATE_INTERESTS,
    TC_STRING, VENDOR_CONSENTS, VENDOR_LEGITIMATE_INTERESTS,
};
use num_traits::ToPrimitive;
#[cfg(feature = "serde")]
use serde::Serialize;

/// The consent signals published by a CMP.
///
/// Missing strings are empty, a missing `IABTCF_gdprApplies` is `0`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ConsentSignals {
    pub gdpr_applies: i64,
    pub purpose_consents: String,
    pub purpose_legitimate_interests: String,
    pub vendor_consents: String,
    pub vendor_legitimate_interests: String,
    pub addtl_consent: String,
    pub tc_string: Option<String>,
}

impl ConsentSignals {
    pub fn load<S: ConsentStorage + ?Sized>(storage: &S) -> Self {
        let string = |key| storage.get_string(key).unwrap_or_default();

        let signals = Self {
            gdpr_applies: storage.get_int(GDPR_APPLIES).unwrap_or(0),
            purpose_consents: string(PURPOSE_CONSENTS),
            purpose_legitimate_interests: string(PURPOSE_LEGITIMATE_INTERESTS),
            vendor_consents: string(VENDOR_CONSENTS),
            vendor_legitimate_interests: string(VENDOR_LEGITIMATE_INTERESTS),
            addtl_consent: string(ADDTL_CONSENT),
            tc_string: storage.get_string(TC_STRING),
        };

        tracing::debug!(
            gdpr_applies = signals.gdpr_applies,
            purpose_consents = %signals.purpose_consents,
            purpose_legitimate_interests = %signals.purpose_legitimate_interests,
            "loaded consent signals"
        );

        signals
    }

    pub fn bitstrings(&self) -> Bitstrings<'_> {
        Bitstrings {
            purpose_consents: &self.purpose_consents,
            purpose_legitimate_interests: &self.purpose_legitimate_interests,
            vendor_consents: &self.vendor_consents,
            vendor_legitimate_interests: &self.vendor_legitimate_interests,
        }
    }

    pub fn is_gdpr_applicable(&self) -> bool {
        is_gdpr_applicable(self.gdpr_applies)
    }

    /// Returns `decision` when GDPR applies, `true` otherwise.
    pub fn gdpr_gated(&self, decision: bool) -> bool {
        !self.is_gdpr_applicable() || decision
    }

    pub fn can_show_ads(&self) -> bool {
        can_show_ads(&self.purpose_consents, &self.purpose_legitimate_interests)
    }

    pub fn can_show_personalized_ads(&self) -> bool {
        can_show_personalized_ads(&self.purpose_consents, &self.purpose_legitimate_interests)
    }

    pub fn can_show_ads_for_vendor<I: ToPrimitive + Copy>(&self, vendor_id: I) -> bool {
        can_show_ads_for_vendor(vendor_id, &self.bitstrings())
    }

    pub fn can_show_personalized_ads_for_vendor<I: ToPrimitive + Copy>(&self, vendor_id: I) -> bool {
        can_show_personalized_ads_for_vendor(vendor_id, &self.bitstrings())
    }

    pub fn has_vendor_consent<I: ToPrimitive>(&self, vendor_id: I) -> bool {
        has_vendor_consent(vendor_id, &self.purpose_consents, &self.vendor_consents)
    }

    pub fn is_vendor_authorized<I: ToPrimitive>(&self, vendor_id: I) -> bool {
        is_vendor_authorized(vendor_id, &self.vendor_consents)
    }

    /// Checks a Google ATP id against the Additional Consent string.
    pub fn is_external_authorized<I: ToPrimitive>(&self, external_id: I) -> bool {
        is_external_authorized(external_id, &self.addtl_consent)
    }

    /// Firebase consent mode signals, not gated on GDPR applicability.
    pub fn firebase_consent(&self) -> FirebaseConsent {
        let purposes = |p| has_consent_for_purposes(p, &self.purpose_consents);

        FirebaseConsent {
            ad_storage: purposes(AD_STORAGE_PURPOSES),
            ad_personalization: purposes(AD_PERSONALIZATION_PURPOSES),
            ad_user_data: purposes(AD_USER_DATA_PURPOSES),
        }
    }

    pub fn is_tc_string_expired(&self, expiry: &ExpiryPolicy, now_millis: i64) -> bool {
        expiry.is_expired(self.tc_string.as_deref().unwrap_or_default(), now_millis)
    }

    /// Evaluates every decision for a single vendor.
    ///
    /// Ads and Firebase decisions are granted when GDPR does not apply. Vendor checks are not.
    pub fn decisions(
        &self,
        vendor_id: u16,
        expiry: &ExpiryPolicy,
        now_millis: i64,
    ) -> ConsentDecisions {
        ConsentDecisions {
            vendor_id,
            gdpr_applies: self.is_gdpr_applicable(),
            can_show_ads: self.gdpr_gated(self.can_show_ads()),
            can_show_personalized_ads: self.gdpr_gated(self.can_show_personalized_ads()),
            can_show_ads_for_vendor: self.gdpr_gated(self.can_show_ads_for_vendor(vendor_id)),
            can_show_personalized_ads_for_vendor: self
                .gdpr_gated(self.can_show_personalized_ads_for_vendor(vendor_id)),
            vendor_consent: self.has_vendor_consent(vendor_id),
            vendor_authorized: self.is_vendor_authorized(vendor_id),
            firebase: self.firebase_consent().gated(self.is_gdpr_applicable()),
            tc_string_age_days: self
                .tc_string
                .as_ref()
                .map(|tc| expiry.age_in_days(tc, now_millis)),
            tc_string_expired: self.is_tc_string_expired(expiry, now_millis),
        }
    }
}

/// Firebase Analytics consent mode, derived from TCF purposes.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct FirebaseConsent {
    pub ad_storage: bool,
    pub ad_personalization: bool,
    pub ad_user_data: bool,
}

impl FirebaseConsent {
    /// Grants every consent type when GDPR does not apply.
    pub fn gated(self, gdpr_applies: bool) -> Self {
        if gdpr_applies {
            self
        } else {
            Self {
                ad_storage: true,
                ad_personalization: true,
                ad_user_data: true,
            }
        }
    }
}

/// Every decision derived from one [`ConsentSignals`] snapshot.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ConsentDecisions {
    pub vendor_id: u16,
    pub gdpr_applies: bool,
    pub can_show_ads: bool,
    pub can_show_personalized_ads: bool,
    pub can_show_ads_for_vendor: bool,
    pub can_show_personalized_ads_for_vendor: bool,
    pub vendor_consent: bool,
    pub vendor_authorized: bool,
    pub firebase: FirebaseConsent,
    pub tc_string_age_days: Option<i64>,
    pub tc_string_expired: bool,
}
