use crate::domain::errors::{PredictionError, PredictionResult};
use crate::domain::types::CategoricalField;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Name of the leading numeric column in every encoded row.
pub const DAYS_SINCE_START: &str = "days_since_start";

/// Distinct values of one categorical field, in first-seen order.
///
/// The position of a value in this list is its one-hot column offset within
/// the field's block. Any change to the order is a breaking change for
/// models trained against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldVocabulary {
    field: CategoricalField,
    values: Vec<String>,
}

impl FieldVocabulary {
    pub(crate) fn new(field: CategoricalField) -> Self {
        Self {
            field,
            values: Vec::new(),
        }
    }

    pub(crate) fn observe(&mut self, value: &str) {
        if self.position(value).is_none() {
            self.values.push(value.to_string());
        }
    }

    pub fn field(&self) -> CategoricalField {
        self.field
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn position(&self, value: &str) -> Option<usize> {
        self.values.iter().position(|v| v == value)
    }
}

/// Category vocabulary learned at fit time, plus the corpus start date.
///
/// Built once by `FeatureEncoder::fit` and never mutated afterwards. Column
/// layout is `[days_since_start, <field 1 values...>, <field 2 values...>, ...]`
/// following the field order requested at fit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    start_date: NaiveDate,
    fields: Vec<FieldVocabulary>,
}

impl Vocabulary {
    pub(crate) fn new(start_date: NaiveDate, fields: Vec<FieldVocabulary>) -> Self {
        Self { start_date, fields }
    }

    /// Earliest date of the fit corpus; day offsets are measured from here.
    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn fields(&self) -> &[FieldVocabulary] {
        &self.fields
    }

    pub fn encoded_fields(&self) -> Vec<CategoricalField> {
        self.fields.iter().map(|f| f.field()).collect()
    }

    pub fn field(&self, field: CategoricalField) -> Option<&FieldVocabulary> {
        self.fields.iter().find(|f| f.field() == field)
    }

    /// Values learned for `field`, empty if the field is not encoded.
    pub fn values(&self, field: CategoricalField) -> &[String] {
        self.field(field).map(|f| f.values()).unwrap_or(&[])
    }

    /// Number of one-hot indicator columns.
    pub fn indicator_width(&self) -> usize {
        self.fields.iter().map(|f| f.len()).sum()
    }

    /// Total encoded row width including the day offset column.
    pub fn width(&self) -> usize {
        1 + self.indicator_width()
    }

    /// Indicator column offset for `value` of `field`.
    pub fn indicator_column(&self, field: CategoricalField, value: &str) -> PredictionResult<usize> {
        let mut offset = 0;
        for vocab in &self.fields {
            if vocab.field() == field {
                return vocab
                    .position(value)
                    .map(|pos| offset + pos)
                    .ok_or_else(|| PredictionError::UnknownCategory {
                        field,
                        value: value.to_string(),
                    });
            }
            offset += vocab.len();
        }
        Err(PredictionError::schema(format!(
            "field '{}' is not part of this vocabulary",
            field
        )))
    }

    /// Feature names in column order, e.g. `opponent_archetype_Control`.
    pub fn column_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.width());
        names.push(DAYS_SINCE_START.to_string());
        for vocab in &self.fields {
            for value in vocab.values() {
                names.push(format!("{}_{}", vocab.field(), value));
            }
        }
        names
    }
}

/// Encoded form of one record: day offset plus one-hot indicators aligned to
/// a `Vocabulary`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureVector {
    pub days_since_start: u32,
    pub indicators: Vec<u8>,
}

impl FeatureVector {
    pub fn width(&self) -> usize {
        1 + self.indicators.len()
    }

    pub fn indicator_sum(&self) -> usize {
        self.indicators.iter().map(|&b| b as usize).sum()
    }

    /// Dense numeric row as consumed by the regression backends.
    pub fn to_row(&self) -> Vec<f64> {
        let mut row = Vec::with_capacity(self.width());
        row.push(self.days_since_start as f64);
        row.extend(self.indicators.iter().map(|&b| b as f64));
        row
    }
}

/// Converts encoded vectors into the row-major layout expected by `DenseMatrix`.
pub fn to_rows(vectors: &[FeatureVector]) -> Vec<Vec<f64>> {
    vectors.iter().map(FeatureVector::to_row).collect()
}
