//! Failure-cause classification of free-text fault descriptions.
//!
//! Descriptions are matched against an ordered rule table. A rule fires when
//! any of its trigger substrings occurs in the upper-cased description, and
//! the first rule to fire decides the label. Several triggers overlap
//! ("TELESC" / "TELESCOP", "LIGHT BLINK" / "LIGHT"), so table order is part
//! of the behavior and must not be rearranged.

use unicode_normalization::UnicodeNormalization;

/// One classification rule: any trigger → label
#[derive(Debug, Clone, Copy)]
pub struct FailureRule {
    /// Upper-case substrings, any of which fires the rule
    pub triggers: &'static [&'static str],
    /// Failure category reported when the rule fires
    pub label: &'static str,
}

const fn rule(triggers: &'static [&'static str], label: &'static str) -> FailureRule {
    FailureRule { triggers, label }
}

/// Ordered failure-cause rule table
pub const FAILURE_RULES: &[FailureRule] = &[
    rule(&["TWIN"], "twin"),
    rule(&["TELESC"], "Telescopy"),
    rule(&["NOISE", "DAMAGE", "BRUIT", "ENDOMMA", "VIBRE"], "Mech fail"),
    rule(&["AC FAULT"], "A/C"),
    rule(&["SIÈGE", "SEAT"], "operator seat"),
    rule(&["CRANE OF"], "Crane off"),
    rule(&["DRIVE OF", "CONTROL OF", "CONTROLE OF", "ALM"], "Drive Off"),
    rule(&["POWER"], "Power cut off"),
    rule(&["ROOF", "TTDS", "SPREADER READY"], "spreader ready intrlck"),
    rule(&["DOMMAGE"], "Incident_Dommage"),
    rule(&["HOIST BRAKE", "HOIST SERVICE BRAKE"], "Hoist service brake"),
    rule(&["HOIST EMERG"], "Hoist Emergency brake"),
    rule(&["HDB", "HEADBLOCK"], "Headblock"),
    rule(&["FESTOON"], "Festoon"),
    rule(&["HOIST SLOW"], "Hoist slowdown"),
    rule(&["AFFICHEUR"], "Display"),
    rule(&["GANTRY DRIVE"], "Gantry drive"),
    rule(&["GANTRY POSITION"], "Gantry position"),
    rule(&["GANTRY WHEEL"], "Gantry wheel brake"),
    rule(&["GANTRY BRAKE"], "Gantry brake"),
    rule(&["GANTRY ENCODER"], "Gantry encoder"),
    rule(&["GANTRY MOTOR"], "Gantry motor"),
    rule(&["TROLLEY DRIVE"], "Trolley drive"),
    rule(&["TROLLEY POSITION"], "Trolley position"),
    rule(&["TROLLEY BRAKE"], "Trolley brake"),
    rule(&["TROLLEY GATE"], "Trolley gate"),
    rule(&["TROLLEY ROPE"], "Trolley rope tension"),
    rule(&["HOIST DRIVE"], "hoist drive"),
    rule(&["HOIST POSITION"], "hoist position"),
    rule(&["HOIST WIRE"], "hoist wire rope"),
    rule(&["HOIST ENCODER"], "Hoist encoder"),
    rule(&["HOIST MOTOR"], "Hoist motor"),
    rule(&["GCR"], "GCR"),
    rule(&["SCR", "SPREADER CABLE REEL"], "SCR"),
    rule(
        &["BAD STACK", "COINC", "SPREADER BLOQUÉ", "SPREADER ACCROCHÉ", "STUCK"],
        "Stuck",
    ),
    rule(
        &["BLINK FAULT", "COMMUNICA", "COMUNICA", "LIGHT BLINK"],
        "Communication",
    ),
    rule(&["BOOM ISSUE", "BOOM FAULT", "BOOM INV"], "Boom Drive"),
    rule(
        &["BOOM LEVEL", "BOOM DOWN", "BOOM UP", "NO BOOM"],
        "Boom position",
    ),
    rule(&["TLS"], "TLS fault"),
    rule(&["CHANGE", "CHANGEMENT"], "spreader change"),
    rule(&["JOYSTICK", "JOYSTI"], "Joystick fault"),
    rule(&["CONNECTOR", "PLUG"], "spreader plug"),
    rule(&["FUITE D'HUILE", "OIL LEAK"], "oil leakage"),
    rule(
        &["DÉVÉRROU", "VÉRROU", "LOCK FAULT", "UNLOCK", "UNLOPK", "LOCKING FAULT"],
        "Lock/unlock",
    ),
    rule(&["FLIPPER"], "Flipper"),
    rule(&["TELESCOP", "TELECO", "TELSCO"], "Telescopic"),
    rule(
        &[
            "LIGHTS",
            "LIGHT",
            "LIGHT FAULT",
            "LIGHT ISSUE",
            "LIGHT OFF",
            "LAMPE",
            "FLOODLIGHT",
        ],
        "Light",
    ),
    rule(&["POMPE SPREADER", "SPREADER PUMP", "PUMP"], "spreader pump"),
];

/// Upper-cased, trimmed, NFC-composed form used for matching.
#[must_use]
pub fn normalize_for_matching(text: &str) -> String {
    text.trim().nfc().collect::<String>().to_uppercase()
}

/// First rule in [`FAILURE_RULES`] that fires for `text`, if any.
#[must_use]
pub fn matching_rule(text: &str) -> Option<&'static FailureRule> {
    let normalized = normalize_for_matching(text);
    if normalized.is_empty() {
        return None;
    }
    FAILURE_RULES
        .iter()
        .find(|rule| rule.triggers.iter().any(|t| normalized.contains(t)))
}

/// Classify a fault description.
///
/// Returns the label of the first firing rule, or `text` unchanged (original
/// case and whitespace) when nothing fires.
#[must_use]
pub fn classify(text: &str) -> String {
    matching_rule(text).map_or_else(|| text.to_string(), |rule| rule.label.to_string())
}
