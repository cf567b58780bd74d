//! Ad serving decisions derived from TCF purpose and vendor flags.
//!
//! The policies follow Google's guidance for publishers using a TCF v2 CMP:
//!
//! - non-personalized ads require consent for purpose 1 (store and access information on a
//!   device), and consent or legitimate interest for purposes 2, 7, 9 and 10,
//! - personalized ads additionally require consent for purposes 3 and 4.
//!
//! [`can_show_ads`] and [`can_show_personalized_ads`] only look at purpose flags and do not check
//! whether the ad vendor itself was granted consent or legitimate interest. The stricter
//! [`can_show_ads_for_vendor`] and [`can_show_personalized_ads_for_vendor`] variants gate every
//! purpose on the vendor's own flags.
//!
//! ```
//! use ump_consent::policy::{can_show_ads, can_show_personalized_ads};
//!
//! let purpose_consents = "1100000000";
//! let purpose_legitimate_interests = "0100001011";
//!
//! assert!(can_show_ads(purpose_consents, purpose_legitimate_interests));
//! assert!(!can_show_personalized_ads(purpose_consents, purpose_legitimate_interests));
//! ```
use crate::bitstring::has_attribute;

/// Purposes which require consent for any ad to be served.
pub const ADS_PURPOSES: &[u16] = &[1];
/// Purposes which require consent for personalized ads to be served.
pub const PERSONALIZED_ADS_PURPOSES: &[u16] = &[1, 3, 4];
/// Purposes for which either consent or legitimate interest is enough.
pub const LEGITIMATE_INTEREST_PURPOSES: &[u16] = &[2, 7, 9, 10];

/// Purposes mapped to the Firebase `ad_storage` consent type.
pub const AD_STORAGE_PURPOSES: &[u16] = &[1];
/// Purposes mapped to the Firebase `ad_personalization` consent type.
pub const AD_PERSONALIZATION_PURPOSES: &[u16] = &[3, 4];
/// Purposes mapped to the Firebase `ad_user_data` consent type.
pub const AD_USER_DATA_PURPOSES: &[u16] = &[1, 7];

/// Google Advertising Products in the Global Vendor List.
pub const GOOGLE_VENDOR_ID: u16 = 755;

/// Returns whether every purpose of `purposes` has consent.
///
/// An empty set of purposes is always satisfied.
pub fn has_consent_for_purposes(purposes: &[u16], purpose_consents: &str) -> bool {
    purposes
        .iter()
        .all(|&p| has_attribute(purpose_consents, p))
}

/// Returns whether every purpose of `purposes` has either consent or legitimate interest.
pub fn has_consent_or_legitimate_interest_for_purposes(
    purposes: &[u16],
    purpose_consents: &str,
    purpose_legitimate_interests: &str,
) -> bool {
    purposes.iter().all(|&p| {
        has_attribute(purpose_legitimate_interests, p) || has_attribute(purpose_consents, p)
    })
}

/// Same as [`has_consent_for_purposes`], additionally requiring the vendor's consent.
pub fn has_consent_for_purposes_with_vendor(
    purposes: &[u16],
    purpose_consents: &str,
    vendor_has_consent: bool,
) -> bool {
    has_consent_for_purposes(purposes, purpose_consents) && vendor_has_consent
}

/// Vendor-gated form of [`has_consent_or_legitimate_interest_for_purposes`].
///
/// A purpose is satisfied by legitimate interest only if the vendor has legitimate interest, and
/// by consent only if the vendor has consent.
pub fn has_consent_or_legitimate_interest_for_purposes_with_vendor(
    purposes: &[u16],
    purpose_consents: &str,
    purpose_legitimate_interests: &str,
    vendor_has_consent: bool,
    vendor_has_legitimate_interest: bool,
) -> bool {
    purposes.iter().all(|&p| {
        (has_attribute(purpose_legitimate_interests, p) && vendor_has_legitimate_interest)
            || (has_attribute(purpose_consents, p) && vendor_has_consent)
    })
}

/// Minimum requirements to serve non-personalized ads.
pub fn can_show_ads(purpose_consents: &str, purpose_legitimate_interests: &str) -> bool {
    has_consent_for_purposes(ADS_PURPOSES, purpose_consents)
        && has_consent_or_legitimate_interest_for_purposes(
            LEGITIMATE_INTEREST_PURPOSES,
            purpose_consents,
            purpose_legitimate_interests,
        )
}

/// Requirements to serve personalized ads.
pub fn can_show_personalized_ads(
    purpose_consents: &str,
    purpose_legitimate_interests: &str,
) -> bool {
    has_consent_for_purposes(PERSONALIZED_ADS_PURPOSES, purpose_consents)
        && has_consent_or_legitimate_interest_for_purposes(
            LEGITIMATE_INTEREST_PURPOSES,
            purpose_consents,
            purpose_legitimate_interests,
        )
}

/// Returns whether personalized ad purposes have consent and the vendor has consent as well.
pub fn has_vendor_consent<I>(vendor_id: I, purpose_consents: &str, vendor_consents: &str) -> bool
where
    I: num_traits::ToPrimitive,
{
    has_consent_for_purposes(PERSONALIZED_ADS_PURPOSES, purpose_consents)
        && has_attribute(vendor_consents, vendor_id)
}

/// Returns whether the vendor itself has consent, regardless of purposes.
pub fn is_vendor_authorized<I>(vendor_id: I, vendor_consents: &str) -> bool
where
    I: num_traits::ToPrimitive,
{
    has_attribute(vendor_consents, vendor_id)
}

/// Interprets the `IABTCF_gdprApplies` value. Only `1` means GDPR applies.
pub fn is_gdpr_applicable(gdpr_applies: i64) -> bool {
    gdpr_applies == 1
}

/// Borrowed view of the four `IABTCF_*` bitstrings used by the vendor-gated policies.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Bitstrings<'a> {
    pub purpose_consents: &'a str,
    pub purpose_legitimate_interests: &'a str,
    pub vendor_consents: &'a str,
    pub vendor_legitimate_interests: &'a str,
}

impl Bitstrings<'_> {
    fn vendor_flags<I>(&self, vendor_id: I) -> (bool, bool)
    where
        I: num_traits::ToPrimitive + Copy,
    {
        (
            has_attribute(self.vendor_consents, vendor_id),
            has_attribute(self.vendor_legitimate_interests, vendor_id),
        )
    }

    fn vendor_gated<I>(&self, consent_purposes: &[u16], vendor_id: I) -> bool
    where
        I: num_traits::ToPrimitive + Copy,
    {
        let (consent, legitimate_interest) = self.vendor_flags(vendor_id);

        has_consent_for_purposes_with_vendor(consent_purposes, self.purpose_consents, consent)
            && has_consent_or_legitimate_interest_for_purposes_with_vendor(
                LEGITIMATE_INTEREST_PURPOSES,
                self.purpose_consents,
                self.purpose_legitimate_interests,
                consent,
                legitimate_interest,
            )
    }
}

/// Vendor-gated form of [`can_show_ads`].
pub fn can_show_ads_for_vendor<I>(vendor_id: I, bitstrings: &Bitstrings) -> bool
where
    I: num_traits::ToPrimitive + Copy,
{
    bitstrings.vendor_gated(ADS_PURPOSES, vendor_id)
}

/// Vendor-gated form of [`can_show_personalized_ads`].
pub fn can_show_personalized_ads_for_vendor<I>(vendor_id: I, bitstrings: &Bitstrings) -> bool
where
    I: num_traits::ToPrimitive + Copy,
{
    bitstrings.vendor_gated(PERSONALIZED_ADS_PURPOSES, vendor_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(&[], "" => true ; "empty set empty string")]
    #[test_case(&[], "0000" => true ; "empty set")]
    #[test_case(&[1, 3, 4], "1100110011" => false ; "purpose 3 missing")]
    #[test_case(&[1, 3, 4], "1011" => true ; "all present")]
    #[test_case(&[1, 3, 4], "101" => false ; "string too short")]
    #[test_case(&[1], "" => false ; "empty string")]
    fn consent_for_purposes(purposes: &[u16], consents: &str) -> bool {
        has_consent_for_purposes(purposes, consents)
    }

    #[test_case("1110111111", "0000000000" => true ; "consent only")]
    #[test_case("0000000000", "0100001011" => true ; "legitimate interest only")]
    #[test_case("0100000000", "0000001011" => true ; "mixed")]
    #[test_case("0100000000", "0000001010" => false ; "purpose 10 missing")]
    #[test_case("", "" => false ; "empty strings")]
    fn consent_or_li(consents: &str, li: &str) -> bool {
        has_consent_or_legitimate_interest_for_purposes(LEGITIMATE_INTEREST_PURPOSES, consents, li)
    }

    #[test_case("1111111111", "" => true ; "full consent")]
    #[test_case("1000000000", "0100001011" => true ; "baseline with li")]
    #[test_case("1000000000", "0100001010" => false ; "li purpose 10 missing")]
    #[test_case("0111111111", "1111111111" => false ; "purpose 1 missing")]
    fn ads(consents: &str, li: &str) -> bool {
        can_show_ads(consents, li)
    }

    #[test_case("1111111111", "" => true ; "full consent")]
    #[test_case("1011000000", "0100001011" => true ; "personalized with li")]
    #[test_case("1001000000", "0100001011" => false ; "purpose 3 missing")]
    #[test_case("0011111111", "1111111111" => false ; "purpose 1 missing")]
    fn personalized_ads(consents: &str, li: &str) -> bool {
        can_show_personalized_ads(consents, li)
    }

    #[test]
    fn purpose_one_gates_everything() {
        let li = "1111111111";
        let mut consents = ['1'; 10];
        assert!(can_show_ads(&String::from_iter(consents), li));
        assert!(can_show_personalized_ads(&String::from_iter(consents), li));

        consents[0] = '0';
        let consents = String::from_iter(consents);
        assert!(!can_show_ads(&consents, li));
        assert!(!can_show_personalized_ads(&consents, li));
    }

    #[test]
    fn ads_ignore_vendor_flags() {
        // no vendor strings are involved at all
        assert!(can_show_ads("1111111111", ""));
        assert!(can_show_personalized_ads("1111111111", ""));
    }

    #[test]
    fn evaluation_is_idempotent() {
        let (c, li) = ("1011001011", "0100000000");
        assert_eq!(can_show_ads(c, li), can_show_ads(c, li));
        assert_eq!(
            can_show_personalized_ads(c, li),
            can_show_personalized_ads(c, li)
        );
        assert_eq!(
            has_consent_for_purposes(&[1, 3], c),
            has_consent_for_purposes(&[1, 3], c)
        );
    }

    #[test_case(3, "1011", "001" => true ; "vendor consented")]
    #[test_case(3, "1011", "110" => false ; "vendor not consented")]
    #[test_case(3, "1001", "111" => false ; "purpose 3 missing")]
    #[test_case(0, "1011", "111" => false ; "zero vendor id")]
    #[test_case(-3, "1011", "111" => false ; "negative vendor id")]
    fn vendor_consent(vendor_id: i32, consents: &str, vendor_consents: &str) -> bool {
        has_vendor_consent(vendor_id, consents, vendor_consents)
    }

    #[test_case(1 => true)]
    #[test_case(0 => false)]
    #[test_case(2 => false)]
    #[test_case(-1 => false)]
    fn gdpr_applicable(flag: i64) -> bool {
        is_gdpr_applicable(flag)
    }

    #[test_case(&[1], "1", true => true ; "consent and vendor")]
    #[test_case(&[1], "1", false => false ; "no vendor consent")]
    #[test_case(&[], "", false => false ; "vendor required even without purposes")]
    fn consent_with_vendor(purposes: &[u16], consents: &str, vendor: bool) -> bool {
        has_consent_for_purposes_with_vendor(purposes, consents, vendor)
    }

    #[test_case("0100001011", "0000000000", true, true => true ; "li with vendor li")]
    #[test_case("0000000000", "0100001011", true, true => true ; "consent with vendor consent")]
    #[test_case("0100001011", "0000000000", true, false => false ; "li without vendor li")]
    #[test_case("0000000000", "0100001011", false, true => false ; "consent without vendor consent")]
    fn li_with_vendor(li: &str, consents: &str, vc: bool, vli: bool) -> bool {
        has_consent_or_legitimate_interest_for_purposes_with_vendor(
            LEGITIMATE_INTEREST_PURPOSES,
            consents,
            li,
            vc,
            vli,
        )
    }

    fn vendor_bitstrings<'a>(vendor_consents: &'a str, vendor_li: &'a str) -> Bitstrings<'a> {
        Bitstrings {
            purpose_consents: "1011000000",
            purpose_legitimate_interests: "0100001011",
            vendor_consents,
            vendor_legitimate_interests: vendor_li,
        }
    }

    #[test_case("0001", "0001" => (true, true) ; "vendor consent and li")]
    #[test_case("0001", "0000" => (false, false) ; "vendor consent only")]
    #[test_case("0000", "0001" => (false, false) ; "vendor li only")]
    #[test_case("", "" => (false, false) ; "no vendor flags")]
    fn vendor_gated_ads(vc: &str, vli: &str) -> (bool, bool) {
        let b = vendor_bitstrings(vc, vli);
        (
            can_show_ads_for_vendor(4, &b),
            can_show_personalized_ads_for_vendor(4, &b),
        )
    }

    #[test]
    fn vendor_gated_is_stricter() {
        let b = vendor_bitstrings("", "");
        assert!(can_show_ads(b.purpose_consents, b.purpose_legitimate_interests));
        assert!(!can_show_ads_for_vendor(GOOGLE_VENDOR_ID, &b));
    }

    #[test]
    fn vendor_authorization() {
        let mut vendor_consents = "0".repeat(800);
        assert!(!is_vendor_authorized(GOOGLE_VENDOR_ID, &vendor_consents));

        vendor_consents.replace_range(754..755, "1");
        assert!(is_vendor_authorized(GOOGLE_VENDOR_ID, &vendor_consents));
        assert!(!is_vendor_authorized(754, &vendor_consents));
    }
}
