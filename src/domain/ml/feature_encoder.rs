use crate::domain::errors::{PredictionError, PredictionResult};
use crate::domain::ml::feature_registry::{FeatureVector, FieldVocabulary, Vocabulary};
use crate::domain::types::{CategoricalField, MatchContext, MatchRecord};
use chrono::NaiveDate;
use tracing::debug;

/// Anything that carries a date and categorical match context.
pub trait EncodableRow {
    fn date(&self) -> NaiveDate;
    fn category(&self, field: CategoricalField) -> Option<&str>;
}

impl EncodableRow for MatchRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn category(&self, field: CategoricalField) -> Option<&str> {
        MatchRecord::category(self, field)
    }
}

impl EncodableRow for MatchContext {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn category(&self, field: CategoricalField) -> Option<&str> {
        MatchContext::category(self, field)
    }
}

/// Stateless date + one-hot encoder.
///
/// `fit` learns a `Vocabulary`; `transform` maps rows onto it. Categories that
/// were not seen at fit time are rejected instead of encoded as all zeros.
pub struct FeatureEncoder;

impl FeatureEncoder {
    /// Learns the start date and per-field value lists from `records`.
    pub fn fit<R: EncodableRow>(
        records: &[R],
        categorical_fields: &[CategoricalField],
    ) -> PredictionResult<Vocabulary> {
        if records.is_empty() {
            return Err(PredictionError::insufficient(
                "cannot fit an encoder on an empty corpus",
            ));
        }

        for (i, field) in categorical_fields.iter().enumerate() {
            if categorical_fields[..i].contains(field) {
                return Err(PredictionError::schema(format!(
                    "categorical field '{}' requested more than once",
                    field
                )));
            }
        }

        let mut start_date = records[0].date();
        let mut fields: Vec<FieldVocabulary> = categorical_fields
            .iter()
            .map(|&f| FieldVocabulary::new(f))
            .collect();

        for (index, record) in records.iter().enumerate() {
            start_date = start_date.min(record.date());
            for vocab in fields.iter_mut() {
                let field = vocab.field();
                let value = record.category(field).ok_or_else(|| {
                    PredictionError::schema(format!(
                        "record {} has no value for categorical field '{}'",
                        index, field
                    ))
                })?;
                vocab.observe(value);
            }
        }

        for vocab in &fields {
            debug!(
                "Vocabulary for {}: {} distinct values",
                vocab.field(),
                vocab.len()
            );
        }

        Ok(Vocabulary::new(start_date, fields))
    }

    /// Encodes every record against `vocabulary`. Fails on the first record
    /// that cannot be encoded; no partial output is returned.
    pub fn transform<R: EncodableRow>(
        records: &[R],
        vocabulary: &Vocabulary,
    ) -> PredictionResult<Vec<FeatureVector>> {
        records
            .iter()
            .enumerate()
            .map(|(index, record)| Self::transform_one(record, index, vocabulary))
            .collect()
    }

    /// Encodes a single row. `index` is only used for error reporting.
    pub fn transform_one<R: EncodableRow>(
        record: &R,
        index: usize,
        vocabulary: &Vocabulary,
    ) -> PredictionResult<FeatureVector> {
        let offset = (record.date() - vocabulary.start_date()).num_days();
        if offset < 0 {
            return Err(PredictionError::Parse {
                index,
                reason: format!(
                    "date {} is before the training start date {}",
                    record.date(),
                    vocabulary.start_date()
                ),
            });
        }
        let days_since_start = u32::try_from(offset).map_err(|_| PredictionError::Parse {
            index,
            reason: format!("date {} is too far from the start date", record.date()),
        })?;

        let mut indicators = vec![0u8; vocabulary.indicator_width()];
        for vocab in vocabulary.fields() {
            let field = vocab.field();
            let value = record.category(field).ok_or_else(|| {
                PredictionError::schema(format!(
                    "record {} has no value for categorical field '{}'",
                    index, field
                ))
            })?;
            let column = vocabulary.indicator_column(field, value)?;
            indicators[column] = 1;
        }

        Ok(FeatureVector {
            days_since_start,
            indicators,
        })
    }

    /// `fit` followed by `transform` on the same corpus.
    pub fn fit_transform<R: EncodableRow>(
        records: &[R],
        categorical_fields: &[CategoricalField],
    ) -> PredictionResult<(Vocabulary, Vec<FeatureVector>)> {
        let vocabulary = Self::fit(records, categorical_fields)?;
        let vectors = Self::transform(records, &vocabulary)?;
        Ok((vocabulary, vectors))
    }
}
