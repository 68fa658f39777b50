//! Snag location lookup.
//!
//! Operators report spreader cylinder faults as `SNAG ... FAULT #1 #3` (or
//! `FAULT #1.#3`). Only SNAG-marked descriptions are considered. Patterns are
//! tried in table order and the first hit wins.

/// One location pattern: any of `patterns` → `label`
#[derive(Debug, Clone, Copy)]
pub struct SnagRule {
    /// Upper-case substrings, any of which selects the location
    pub patterns: &'static [&'static str],
    /// Location label
    pub label: &'static str,
}

const fn rule(patterns: &'static [&'static str], label: &'static str) -> SnagRule {
    SnagRule { patterns, label }
}

/// Marker that must be present before any pattern is tried
pub const SNAG_MARKER: &str = "SNAG";

/// Ordered snag-location table.
///
/// `FAULT #1` is a prefix of `FAULT #1 #3`, and `FAULT #1 #2` of
/// `FAULT #1 #2 #3`, so wider combinations come first and single cylinders
/// last.
pub const SNAG_RULES: &[SnagRule] = &[
    rule(&["FAULT #1 #2 #3 #4", "FAULT #1.#2.#3.#4"], "Cylinder 1234"),
    rule(&["FAULT #1 #2 #3", "FAULT #1.#2.#3"], "Cylinder 123"),
    rule(&["FAULT #1 #2 #4", "FAULT #1.#2.#4"], "Cylinder 124"),
    rule(&["FAULT #1 #3 #4", "FAULT #1.#3.#4"], "Cylinder 134"),
    rule(&["FAULT #2 #3 #4", "FAULT #2.#3.#4"], "Cylinder 234"),
    rule(&["FAULT #1 #2", "FAULT #1.#2"], "Cylinder 12"),
    rule(&["FAULT #1 #3", "FAULT #1.#3"], "Cylinder 13"),
    rule(&["FAULT #1 #4", "FAULT #1.#4"], "Cylinder 14"),
    rule(&["FAULT #2 #3", "FAULT #2.#3"], "Cylinder 23"),
    rule(&["FAULT #2 #4", "FAULT #2.#4"], "Cylinder 24"),
    rule(&["FAULT #3 #4", "FAULT #3.#4"], "Cylinder 34"),
    rule(&["FAULT #0"], "loadCell"),
    rule(&["FAULT #1"], "Cylinder 1"),
    rule(&["FAULT #2"], "Cylinder 2"),
    rule(&["FAULT #3"], "Cylinder 3"),
    rule(&["FAULT #4"], "Cylinder 4"),
];

/// Locate the cylinder a snag report refers to, or `""`.
#[must_use]
pub fn locate(text: &str) -> String {
    let upper = text.to_uppercase();
    if !upper.contains(SNAG_MARKER) {
        return String::new();
    }
    SNAG_RULES
        .iter()
        .find(|rule| rule.patterns.iter().any(|p| upper.contains(p)))
        .map(|rule| rule.label.to_string())
        .unwrap_or_default()
}
