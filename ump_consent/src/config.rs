//! Consent flow configuration.
use crate::expiry::ExpiryPolicy;
use crate::policy::GOOGLE_VENDOR_ID;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConsentConfig {
    /// Vendor whose consent is checked by the vendor-specific decisions.
    pub google_vendor_id: u16,
    pub expiry: ExpiryPolicy,
    /// Remove an outdated TC string from storage when the orchestrator initializes.
    pub delete_outdated_tc_string: bool,
    /// Tag the consent request for users under the age of consent.
    pub tag_for_under_age_of_consent: bool,
    pub debug: Option<DebugSettings>,
}

impl Default for ConsentConfig {
    fn default() -> Self {
        Self {
            google_vendor_id: GOOGLE_VENDOR_ID,
            expiry: ExpiryPolicy::default(),
            delete_outdated_tc_string: false,
            tag_for_under_age_of_consent: false,
            debug: None,
        }
    }
}

/// Settings forwarded to the native SDK to test consent forms outside of the EEA.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DebugSettings {
    pub test_device_hashed_id: Option<String>,
    /// Pretend the device is located in the EEA.
    pub debug_geography_eea: bool,
    /// Reset the native consent state before requesting an update.
    pub force_reset: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ConsentConfig::default();
        assert_eq!(config.google_vendor_id, 755);
        assert_eq!(config.expiry.max_age_days, 365);
        assert!(!config.delete_outdated_tc_string);
        assert!(config.debug.is_none());
    }
}
