//! Reference-code derivation and extraction.
//!
//! The payer identifies their transaction by typing a short code into the transfer memo. The code is a pure
//! function of the transaction id (`DH` plus the last eight characters, uppercased), so it can be re-derived at
//! any time and matched against whatever the bank did to the memo text. Two ids sharing the same eight-character
//! tail would collide on the same code; see DESIGN.md for why this is accepted rather than solved.

use crate::db_types::TransactionId;

pub const ORDER_CODE_TAG: &str = "DH";

/// The number of id characters that go into the code.
const CODE_SUFFIX_LEN: usize = 8;

/// `DH` + last 8 chars of the id, uppercased. Ids shorter than 8 characters use the whole id.
pub fn order_code(id: &TransactionId) -> String {
    let chars: Vec<char> = id.as_str().chars().collect();
    let start = chars.len().saturating_sub(CODE_SUFFIX_LEN);
    let suffix: String = chars[start..].iter().collect();
    format!("{ORDER_CODE_TAG}{}", suffix.to_uppercase())
}

/// What the payer is asked to put in the memo. A configured virtual-account prefix goes in front of the code,
/// separated by a space.
pub fn display_reference(virtual_account: Option<&str>, code: &str) -> String {
    match virtual_account {
        Some(va) => format!("{va} {code}"),
        None => code.to_string(),
    }
}

/// Scan free-form transfer content for a reference code. Banks prepend and append their own text to the memo, and
/// sometimes fold it to lower case, so this is a case-insensitive search for the tag followed by exactly eight
/// alphanumerics, anywhere in the string. The match is returned uppercased, ready for an `order_code` lookup.
pub fn extract_order_code(content: &str) -> Option<String> {
    let code = regex::Regex::new(r"(?i)DH[0-9A-Z]{8}").unwrap();
    code.find(content).map(|m| m.as_str().to_uppercase())
}
