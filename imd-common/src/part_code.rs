//! Part number extraction from scanned warehouse QR codes
//!
//! Warehouse labels encode the part number first, followed by lot and
//! quantity data separated by one of a few delimiters. The part number is
//! everything before the earliest delimiter, wherever it falls in the string.
//! The rule must stay byte-identical to the preview done by the scan client.

use thiserror::Error;

/// Characters that terminate the part number inside a warehouse code
pub const PART_CODE_DELIMITERS: [char; 4] = [',', '\'', '_', '-'];

/// Reasons a scanned code yields no part number
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PartCodeError {
    #[error("Scanned code is empty")]
    Empty,

    /// The code starts with a delimiter, so the prefix is empty
    #[error("Scanned code has no part number before '{delimiter}'")]
    MissingPartNumber { delimiter: char },
}

/// Extract the part number from a raw scanned code
///
/// Returns the prefix preceding the earliest occurrence of any delimiter in
/// [`PART_CODE_DELIMITERS`], or the whole input when none is present.
///
/// # Examples
///
/// ```
/// use imd_common::part_code::parse_part_number;
///
/// assert_eq!(parse_part_number("AB-1,2"), Ok("AB"));
/// assert_eq!(parse_part_number("XYZ999"), Ok("XYZ999"));
/// assert!(parse_part_number("").is_err());
/// ```
pub fn parse_part_number(raw: &str) -> Result<&str, PartCodeError> {
    if raw.is_empty() {
        return Err(PartCodeError::Empty);
    }

    match raw.char_indices().find(|(_, c)| PART_CODE_DELIMITERS.contains(c)) {
        Some((0, delimiter)) => Err(PartCodeError::MissingPartNumber { delimiter }),
        Some((idx, _)) => Ok(&raw[..idx]),
        None => Ok(raw),
    }
}
