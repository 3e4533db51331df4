use crate::error::RecordError;
use std::str::SplitWhitespace;

/// Pulls named numeric fields off a whitespace-separated line.
pub(crate) struct FieldReader<'a> {
    fields: SplitWhitespace<'a>,
}

impl<'a> FieldReader<'a> {
    pub(crate) fn new(line: &'a str) -> Result<Self, RecordError> {
        if line.trim().is_empty() {
            return Err(RecordError::Empty);
        }
        Ok(Self {
            fields: line.split_whitespace(),
        })
    }

    pub(crate) fn required(&mut self, field: &'static str) -> Result<f64, RecordError> {
        self.optional(field)?.ok_or(RecordError::Missing(field))
    }

    pub(crate) fn optional(&mut self, field: &'static str) -> Result<Option<f64>, RecordError> {
        self.fields
            .next()
            .map(|raw| match raw.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(value),
                Ok(_) => Err(RecordError::NonFinite {
                    field,
                    value: raw.to_string(),
                }),
                Err(_) => Err(RecordError::NotANumber {
                    field,
                    value: raw.to_string(),
                }),
            })
            .transpose()
    }

    pub(crate) fn finish(mut self) -> Result<(), RecordError> {
        match self.fields.next() {
            Some(extra) => Err(RecordError::Trailing(extra.to_string())),
            None => Ok(()),
        }
    }
}
