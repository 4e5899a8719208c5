//! Promotional-banner detection for extracted product names.

/// Lowercase substrings that mark site-wide marketing copy rather than a
/// product name.
const PROMO_MARKERS: &[&str] = &[
    "%",
    "outlet",
    "jusqu'à",
    "jusqu’à",
    "up to",
    "clearance",
    "destockage",
    "déstockage",
];

/// Returns `true` when `text` reads like a discount banner or clearance
/// call-to-action.
#[must_use]
pub fn is_promotional_noise(text: &str) -> bool {
    let lower = text.to_lowercase();
    PROMO_MARKERS.iter().any(|marker| lower.contains(marker))
}
