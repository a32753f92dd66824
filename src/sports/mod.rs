use std::fmt;

/// Canonical registry of supported `Event.sport_type` values.
///
/// Upstream sources report sport labels as free text; everything is
/// classified into this closed set before persistence, with unrecognized
/// labels landing in [`SportType::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SportType {
    Football,
    Rugby,
    Cricket,
    Tennis,
    Formula1,
    Boxing,
    Golf,
    Other,
}

impl SportType {
    /// Return the canonical string representation for this sport.
    pub const fn as_str(self) -> &'static str {
        match self {
            SportType::Football => "football",
            SportType::Rugby => "rugby",
            SportType::Cricket => "cricket",
            SportType::Tennis => "tennis",
            SportType::Formula1 => "formula1",
            SportType::Boxing => "boxing",
            SportType::Golf => "golf",
            SportType::Other => "other",
        }
    }
}

impl fmt::Display for SportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete registry of canonical sports.
pub const ALL_SPORT_TYPES: &[SportType] = &[
    SportType::Football,
    SportType::Rugby,
    SportType::Cricket,
    SportType::Tennis,
    SportType::Formula1,
    SportType::Boxing,
    SportType::Golf,
    SportType::Other,
];

/// Return the canonical sport corresponding to the provided string, if any.
pub fn parse_sport_type(sport: &str) -> Option<SportType> {
    ALL_SPORT_TYPES
        .iter()
        .copied()
        .find(|s| s.as_str() == sport)
}

/// Classify a free-text sport label from an upstream source.
///
/// Handles the alias spellings the live sources actually emit ("Soccer"
/// from the per-day schedule API, "Formula 1"/"F1" from listings pages);
/// anything unrecognized classifies as [`SportType::Other`] rather than
/// failing the candidate.
pub fn classify_sport_label(label: &str) -> SportType {
    let normalized = label.trim().to_lowercase();
    match normalized.as_str() {
        "football" | "soccer" => SportType::Football,
        "rugby" | "rugby union" | "rugby league" => SportType::Rugby,
        "cricket" => SportType::Cricket,
        "tennis" => SportType::Tennis,
        "formula1" | "formula 1" | "f1" | "motorsport" | "motor racing" => SportType::Formula1,
        "boxing" | "mma" | "boxing/mma" => SportType::Boxing,
        "golf" => SportType::Golf,
        _ => SportType::Other,
    }
}

/// Keyword table for best-guess sport detection in free page text.
///
/// Multi-word competition names come first so they win over the generic
/// sport words they contain.
const SPORT_TEXT_KEYWORDS: &[(&str, SportType)] = &[
    ("premier league", SportType::Football),
    ("champions league", SportType::Football),
    ("fa cup", SportType::Football),
    ("football", SportType::Football),
    ("soccer", SportType::Football),
    ("six nations", SportType::Rugby),
    ("rugby", SportType::Rugby),
    ("test match", SportType::Cricket),
    ("cricket", SportType::Cricket),
    ("wimbledon", SportType::Tennis),
    ("tennis", SportType::Tennis),
    ("grand prix", SportType::Formula1),
    ("formula 1", SportType::Formula1),
    ("formula one", SportType::Formula1),
    ("heavyweight", SportType::Boxing),
    ("boxing", SportType::Boxing),
    ("ryder cup", SportType::Golf),
    ("golf", SportType::Golf),
];

/// Scan free text (a scraped listing row, a page body) for a sport mention.
pub fn detect_sport_keywords(text: &str) -> Option<SportType> {
    let lowered = text.to_lowercase();
    SPORT_TEXT_KEYWORDS
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, sport)| *sport)
}
