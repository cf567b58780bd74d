//! Access to the key-value store where CMPs publish consent signals.
//!
//! On Android the values live in the default `SharedPreferences`, on iOS in
//! `NSUserDefaults.standard`. Both are modelled by the [`ConsentStorage`] trait, which only
//! requires read access. Clearing outdated values is left to callers through
//! [`ConsentStorageMut`].
use crate::tcstring::{TcHeader, TcStringDecodeError};
use fnv::FnvHashMap;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// `1` if GDPR applies to the user, `0` otherwise.
pub const GDPR_APPLIES: &str = "IABTCF_gdprApplies";
/// Per-purpose consent bitstring.
pub const PURPOSE_CONSENTS: &str = "IABTCF_PurposeConsents";
/// Per-purpose legitimate interest bitstring.
pub const PURPOSE_LEGITIMATE_INTERESTS: &str = "IABTCF_PurposeLegitimateInterests";
/// Per-vendor consent bitstring.
pub const VENDOR_CONSENTS: &str = "IABTCF_VendorConsents";
/// Per-vendor legitimate interest bitstring.
pub const VENDOR_LEGITIMATE_INTERESTS: &str = "IABTCF_VendorLegitimateInterests";
/// Google Additional Consent string.
pub const ADDTL_CONSENT: &str = "IABTCF_AddtlConsent";
/// The full TC string.
pub const TC_STRING: &str = "IABTCF_TCString";

/// Read access to consent signals.
pub trait ConsentStorage {
    /// Returns the string stored under `key`, if any.
    fn get_string(&self, key: &str) -> Option<String>;

    /// Returns the integer stored under `key`, if any.
    fn get_int(&self, key: &str) -> Option<i64>;
}

/// Write access to consent signals.
pub trait ConsentStorageMut: ConsentStorage {
    fn set_string(&mut self, key: &str, value: String);

    fn set_int(&mut self, key: &str, value: i64);

    fn remove(&mut self, key: &str);
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum StoredValue {
    Int(i64),
    String(String),
}

/// A [`ConsentStorage`] kept in memory.
///
/// Integers stored as strings are parsed when read with [`ConsentStorage::get_int`], the way
/// `NSUserDefaults` converts them. Integers are never returned as strings.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct MemoryStorage {
    values: FnvHashMap<String, StoredValue>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ConsentStorage for MemoryStorage {
    fn get_string(&self, key: &str) -> Option<String> {
        match self.values.get(key)? {
            StoredValue::String(s) => Some(s.clone()),
            StoredValue::Int(_) => None,
        }
    }

    fn get_int(&self, key: &str) -> Option<i64> {
        match self.values.get(key)? {
            StoredValue::Int(n) => Some(*n),
            StoredValue::String(s) => s.trim().parse().ok(),
        }
    }
}

impl ConsentStorageMut for MemoryStorage {
    fn set_string(&mut self, key: &str, value: String) {
        self.values
            .insert(key.to_string(), StoredValue::String(value));
    }

    fn set_int(&mut self, key: &str, value: i64) {
        self.values.insert(key.to_string(), StoredValue::Int(value));
    }

    fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }
}

impl<K, V> FromIterator<(K, V)> for MemoryStorage
where
    K: Into<String>,
    V: Into<StoredValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<i64> for StoredValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<&str> for StoredValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for StoredValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

/// Decodes a TC string and stores it with the bitstrings derived from it, as a CMP would.
///
/// `IABTCF_gdprApplies` and `IABTCF_AddtlConsent` are left untouched.
///
/// # Errors
///
/// Returns a [`TcStringDecodeError`] and leaves the storage unchanged if the TC string cannot be
/// decoded.
pub fn publish_tc_string<S>(storage: &mut S, tc_string: &str) -> Result<TcHeader, TcStringDecodeError>
where
    S: ConsentStorageMut + ?Sized,
{
    let header = TcHeader::parse_str(tc_string)?;

    storage.set_string(TC_STRING, tc_string.to_string());
    storage.set_string(PURPOSE_CONSENTS, header.purpose_consents_bitstring());
    storage.set_string(
        PURPOSE_LEGITIMATE_INTERESTS,
        header.purpose_legitimate_interests_bitstring(),
    );
    storage.set_string(VENDOR_CONSENTS, header.vendor_consents_bitstring());
    storage.set_string(
        VENDOR_LEGITIMATE_INTERESTS,
        header.vendor_legitimate_interests_bitstring(),
    );

    tracing::debug!(
        cmp_id = header.cmp_id,
        created = header.created_millis(),
        "published TC string"
    );

    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_values() {
        let storage = MemoryStorage::from_iter([
            (GDPR_APPLIES, StoredValue::Int(1)),
            (PURPOSE_CONSENTS, StoredValue::from("1011")),
        ]);

        assert_eq!(storage.get_int(GDPR_APPLIES), Some(1));
        assert_eq!(storage.get_string(PURPOSE_CONSENTS), Some("1011".to_string()));
        assert_eq!(storage.get_string(VENDOR_CONSENTS), None);
        assert_eq!(storage.get_int(VENDOR_CONSENTS), None);
    }

    #[test]
    fn integers_stored_as_strings() {
        let storage = MemoryStorage::from_iter([(GDPR_APPLIES, " 1 ")]);
        assert_eq!(storage.get_int(GDPR_APPLIES), Some(1));

        let storage = MemoryStorage::from_iter([(GDPR_APPLIES, "yes")]);
        assert_eq!(storage.get_int(GDPR_APPLIES), None);
    }

    #[test]
    fn integers_are_not_strings() {
        let storage = MemoryStorage::from_iter([(PURPOSE_CONSENTS, 1i64)]);
        assert_eq!(storage.get_string(PURPOSE_CONSENTS), None);
    }

    #[test]
    fn write_values() {
        let mut storage = MemoryStorage::new();
        storage.set_int(GDPR_APPLIES, 0);
        storage.set_string(TC_STRING, "CAAAAAA".to_string());
        assert_eq!(storage.len(), 2);

        storage.remove(TC_STRING);
        storage.remove(TC_STRING);
        assert_eq!(storage.get_string(TC_STRING), None);
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn publish() {
        let mut storage = MemoryStorage::from_iter([(GDPR_APPLIES, 1i64)]);
        let header =
            publish_tc_string(&mut storage, "CQZCrAAQZF98AEsACBENAwEoAPLAAELAAAqIAFKBAAmAEAAWAA4AEg")
                .unwrap();

        assert_eq!(header.cmp_id, 300);
        assert_eq!(storage.get_int(GDPR_APPLIES), Some(1));
        assert_eq!(
            storage.get_string(PURPOSE_CONSENTS).as_deref(),
            Some("1111001011")
        );
        assert_eq!(
            storage.get_string(PURPOSE_LEGITIMATE_INTERESTS).as_deref(),
            Some("0100001011")
        );
        assert_eq!(
            storage.get_string(VENDOR_CONSENTS).as_deref(),
            Some("1010000001")
        );
        assert_eq!(
            storage.get_string(VENDOR_LEGITIMATE_INTERESTS).as_deref(),
            Some("000010111")
        );
    }

    #[test]
    fn publish_invalid_leaves_storage_unchanged() {
        let mut storage = MemoryStorage::new();
        assert!(publish_tc_string(&mut storage, "BPXxRfAPXxRfA").is_err());
        assert!(storage.is_empty());
    }
}
