use crate::domain::errors::PredictionError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Categorical columns that can be one-hot encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalField {
    OpponentArchetype,
    EventType,
    DeckVersion,
    MetaShift,
}

impl CategoricalField {
    pub const ALL: [CategoricalField; 4] = [
        CategoricalField::OpponentArchetype,
        CategoricalField::EventType,
        CategoricalField::DeckVersion,
        CategoricalField::MetaShift,
    ];

    /// Column name used in match CSVs and in encoded feature names.
    pub fn column_name(&self) -> &'static str {
        match self {
            CategoricalField::OpponentArchetype => "opponent_archetype",
            CategoricalField::EventType => "event_type",
            CategoricalField::DeckVersion => "deck_version",
            CategoricalField::MetaShift => "meta_shift",
        }
    }

    /// Optional fields may be absent on individual records.
    pub fn is_optional(&self) -> bool {
        matches!(
            self,
            CategoricalField::DeckVersion | CategoricalField::MetaShift
        )
    }
}

impl fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for CategoricalField {
    type Err = PredictionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        CategoricalField::ALL
            .into_iter()
            .find(|field| field.column_name() == normalized)
            .ok_or_else(|| {
                PredictionError::schema(format!(
                    "unknown categorical field '{}'. Must be one of: opponent_archetype, event_type, deck_version, meta_shift",
                    s
                ))
            })
    }
}

/// Categorical and date context of a match, without an observed outcome.
///
/// This is what a caller supplies when asking for a prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchContext {
    pub date: NaiveDate,
    pub opponent_archetype: String,
    pub event_type: String,
    pub deck_version: Option<String>,
    pub meta_shift: Option<String>,
}

impl MatchContext {
    pub fn new(
        date: NaiveDate,
        opponent_archetype: impl Into<String>,
        event_type: impl Into<String>,
    ) -> Self {
        Self {
            date,
            opponent_archetype: opponent_archetype.into(),
            event_type: event_type.into(),
            deck_version: None,
            meta_shift: None,
        }
    }

    pub fn with_deck_version(mut self, deck_version: impl Into<String>) -> Self {
        self.deck_version = Some(deck_version.into());
        self
    }

    pub fn with_meta_shift(mut self, meta_shift: impl Into<String>) -> Self {
        self.meta_shift = Some(meta_shift.into());
        self
    }

    pub fn category(&self, field: CategoricalField) -> Option<&str> {
        match field {
            CategoricalField::OpponentArchetype => Some(self.opponent_archetype.as_str()),
            CategoricalField::EventType => Some(self.event_type.as_str()),
            CategoricalField::DeckVersion => self.deck_version.as_deref(),
            CategoricalField::MetaShift => self.meta_shift.as_deref(),
        }
    }
}

/// One historical match result. Winrate is a percentage in [0, 100].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub date: NaiveDate,
    pub opponent_archetype: String,
    pub event_type: String,
    pub deck_version: Option<String>,
    pub meta_shift: Option<String>,
    pub winrate: f64,
}

impl MatchRecord {
    pub fn new(
        date: NaiveDate,
        opponent_archetype: impl Into<String>,
        event_type: impl Into<String>,
        winrate: f64,
    ) -> Self {
        Self {
            date,
            opponent_archetype: opponent_archetype.into(),
            event_type: event_type.into(),
            deck_version: None,
            meta_shift: None,
            winrate,
        }
    }

    pub fn with_deck_version(mut self, deck_version: impl Into<String>) -> Self {
        self.deck_version = Some(deck_version.into());
        self
    }

    pub fn with_meta_shift(mut self, meta_shift: impl Into<String>) -> Self {
        self.meta_shift = Some(meta_shift.into());
        self
    }

    pub fn category(&self, field: CategoricalField) -> Option<&str> {
        match field {
            CategoricalField::OpponentArchetype => Some(self.opponent_archetype.as_str()),
            CategoricalField::EventType => Some(self.event_type.as_str()),
            CategoricalField::DeckVersion => self.deck_version.as_deref(),
            CategoricalField::MetaShift => self.meta_shift.as_deref(),
        }
    }

    pub fn context(&self) -> MatchContext {
        MatchContext {
            date: self.date,
            opponent_archetype: self.opponent_archetype.clone(),
            event_type: self.event_type.clone(),
            deck_version: self.deck_version.clone(),
            meta_shift: self.meta_shift.clone(),
        }
    }
}

/// A point estimate together with the context that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinratePrediction {
    pub context: MatchContext,
    pub winrate: f64,
}

impl fmt::Display for WinratePrediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} vs {} ({}): {:.2}%",
            self.context.date, self.context.opponent_archetype, self.context.event_type, self.winrate
        )?;
        if let Some(version) = &self.context.deck_version {
            write!(f, " [deck {}]", version)?;
        }
        if let Some(shift) = &self.context.meta_shift {
            write!(f, " [meta {}]", shift)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_round_trips_through_column_name() {
        for field in CategoricalField::ALL {
            let parsed: CategoricalField = field.column_name().parse().unwrap();
            assert_eq!(parsed, field);
        }
        assert_eq!(
            " Event_Type ".parse::<CategoricalField>().unwrap(),
            CategoricalField::EventType
        );
    }

    #[test]
    fn test_unknown_field_is_schema_error() {
        let err = "sideboard".parse::<CategoricalField>().unwrap_err();
        assert!(matches!(err, PredictionError::Schema { .. }));
    }

    #[test]
    fn test_optional_categories() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let record = MatchRecord::new(date, "Control", "League", 55.0).with_meta_shift("MH3");

        assert_eq!(
            record.category(CategoricalField::OpponentArchetype),
            Some("Control")
        );
        assert_eq!(record.category(CategoricalField::DeckVersion), None);
        assert_eq!(record.category(CategoricalField::MetaShift), Some("MH3"));
        assert_eq!(record.context().meta_shift.as_deref(), Some("MH3"));
    }
}
