//! Comparison rules for scanned feeder and polarity values

/// Case-insensitive exact match after trimming both sides
fn same_code(expected: &str, scanned: &str) -> bool {
    expected.trim().to_uppercase() == scanned.trim().to_uppercase()
}

/// Whether a scanned feeder matches the reference feeder
pub fn feeder_matches(expected: &str, scanned: &str) -> bool {
    same_code(expected, scanned)
}

/// Whether a scanned polarity satisfies the reference polarity
///
/// A reference without polarity accepts any scan.
pub fn polarity_matches(expected: Option<&str>, scanned: &str) -> bool {
    match expected {
        None => true,
        Some(expected) => same_code(expected, scanned),
    }
}
