//! Note content types.
//!
//! The content type drives two policies:
//! - Recency: durable knowledge (decisions, hubs) never decays, the rest decays
//!   with a per-type half-life.
//! - Confidence: each type carries a baseline prior blended into the stored
//!   confidence value.
//!
//! Unrecognized values parse to [`ContentType::Note`], so every stored row has a
//! usable policy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Half-life in days applied to decaying types that carry no explicit policy.
pub const DEFAULT_HALF_LIFE_DAYS: f64 = 60.0;

/// Baseline confidence for types without an explicit prior.
pub const DEFAULT_BASELINE: f64 = 0.50;

/// The semantic category of a note.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// A recorded decision and its rationale.
    Decision,
    /// An index page linking related notes.
    Hub,
    /// Research findings.
    Research,
    /// Project description or plan.
    Project,
    /// A session handoff for the next agent.
    Handoff,
    /// A progress log entry.
    Progress,
    /// Anything else.
    #[default]
    #[serde(other)]
    Note,
}

/// Parse error for [`ContentType`].
#[derive(Debug, Clone)]
pub struct ContentTypeParseError {
    value: String,
}

impl ContentTypeParseError {
    /// The raw value that failed parsing.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for ContentTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid content type: {}", self.value)
    }
}

impl std::error::Error for ContentTypeParseError {}

impl ContentType {
    /// All known content types.
    pub const ALL: &'static [Self] = &[
        Self::Decision,
        Self::Hub,
        Self::Research,
        Self::Project,
        Self::Handoff,
        Self::Progress,
        Self::Note,
    ];

    /// Stable storage identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Decision => "decision",
            Self::Hub => "hub",
            Self::Research => "research",
            Self::Project => "project",
            Self::Handoff => "handoff",
            Self::Progress => "progress",
            Self::Note => "note",
        }
    }

    /// Permanent types never lose recency.
    #[must_use]
    pub const fn is_permanent(self) -> bool {
        matches!(self, Self::Decision | Self::Hub)
    }

    /// Types promoted inside the middle ranking tier.
    #[must_use]
    pub const fn is_priority(self) -> bool {
        matches!(
            self,
            Self::Handoff | Self::Decision | Self::Research | Self::Hub
        )
    }

    /// Recency half-life in days, `None` for permanent types.
    #[must_use]
    pub const fn half_life_days(self) -> Option<f64> {
        match self {
            Self::Decision | Self::Hub => None,
            Self::Research | Self::Project => Some(90.0),
            Self::Handoff | Self::Progress => Some(30.0),
            Self::Note => Some(DEFAULT_HALF_LIFE_DAYS),
        }
    }

    /// Baseline confidence prior for this type.
    #[must_use]
    pub const fn baseline_confidence(self) -> f64 {
        match self {
            Self::Decision => 0.90,
            Self::Hub => 0.85,
            Self::Research => 0.70,
            Self::Project => 0.65,
            Self::Handoff => 0.60,
            Self::Progress | Self::Note => DEFAULT_BASELINE,
        }
    }

    /// Lossy parsing: unrecognized values become [`ContentType::Note`].
    #[must_use]
    pub fn parse_lossy(s: &str) -> Self {
        Self::from_str(s).unwrap_or(Self::Note)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = ContentTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().to_ascii_lowercase();
        let kind = match raw.as_str() {
            "decision" | "decisions" | "adr" => Self::Decision,
            "hub" | "hubs" | "moc" => Self::Hub,
            "research" => Self::Research,
            "project" | "projects" => Self::Project,
            "handoff" | "handoffs" => Self::Handoff,
            "progress" => Self::Progress,
            "note" | "notes" => Self::Note,
            _ => {
                return Err(ContentTypeParseError {
                    value: s.trim().to_string(),
                });
            }
        };
        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_identifiers() {
        for kind in ContentType::ALL {
            assert_eq!(ContentType::from_str(kind.as_str()).unwrap(), *kind);
        }
    }

    #[test]
    fn test_unknown_falls_back_to_note() {
        assert!(ContentType::from_str("meeting-minutes").is_err());
        assert_eq!(ContentType::parse_lossy("meeting-minutes"), ContentType::Note);
        assert_eq!(ContentType::parse_lossy("  Decision "), ContentType::Decision);
    }

    #[test]
    fn test_policies() {
        assert!(ContentType::Hub.is_permanent());
        assert!(!ContentType::Research.is_permanent());
        assert_eq!(ContentType::Decision.half_life_days(), None);
        assert_eq!(ContentType::Progress.half_life_days(), Some(30.0));
        assert!(ContentType::Handoff.is_priority());
        assert!(!ContentType::Project.is_priority());
        assert!((ContentType::Note.baseline_confidence() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_serde_unknown_variant() {
        let kind: ContentType = serde_json::from_str("\"scratchpad\"").unwrap();
        assert_eq!(kind, ContentType::Note);
    }
}
