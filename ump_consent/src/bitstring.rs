//! Positional flags stored in `IABTCF_*` bitstrings.
//!
//! CMPs publish per-purpose and per-vendor flags as strings of `'0'` and `'1'` characters,
//! where the character at 1-based position *i* describes purpose or vendor *i*.
//!
//! Reading these strings never fails: positions outside the string, as well as characters other
//! than `'1'`, are simply reported as unset.
//!
//! ```
//! use ump_consent::bitstring::has_attribute;
//!
//! let purpose_consents = "1101";
//!
//! assert!(has_attribute(purpose_consents, 1));
//! assert!(!has_attribute(purpose_consents, 3));
//! assert!(!has_attribute(purpose_consents, 5));
//! assert!(!has_attribute(purpose_consents, -1));
//! ```
use num_traits::ToPrimitive;
use std::collections::BTreeSet;

/// Returns whether the character at 1-based position `index` of `input` is `'1'`.
///
/// Indices lower than 1, greater than the number of characters in `input`, or not representable
/// as a `usize` yield `false`.
pub fn has_attribute<I>(input: &str, index: I) -> bool
where
    I: ToPrimitive,
{
    match index.to_usize() {
        Some(i) if i >= 1 => input.chars().nth(i - 1) == Some('1'),
        _ => false,
    }
}

/// Renders a set of ids as a bitstring covering positions `1..=len`.
///
/// Ids greater than `len` are not represented.
pub fn to_bitstring(ids: &BTreeSet<u16>, len: usize) -> String {
    (1..=len)
        .map(|i| {
            if u16::try_from(i).is_ok_and(|i| ids.contains(&i)) {
                '1'
            } else {
                '0'
            }
        })
        .collect()
}
