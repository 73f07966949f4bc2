//! Pre-insert transform pipeline.
//!
//! Every document is passed through each registered [`PreInsert`] step in
//! registration order just before it is written. Steps receive the target
//! collection name and the document (with `_id` already injected) and return
//! the possibly rewritten document. The first failing step aborts the
//! document.
//!
//! [`FieldConversion`] provides the stock steps: parsing text into a
//! timestamp, raw bytes or an object id for one field of one collection.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

use crate::value::{DocumentData, ObjectId, Value};

/// Layout used by [`convert_time`].
pub const DEFAULT_TIME_PATTERN: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("field {field}: cannot parse {value:?} as time: {source}")]
    InvalidTime {
        field: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("field {field}: {value:?} is not a 24-digit hexadecimal object id")]
    InvalidObjectId { field: String, value: String },
    #[error("{0}")]
    Rejected(String),
}

/// A single document rewrite step.
pub trait PreInsert: Send + Sync {
    /// Rewrite `doc` bound for `collection`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransformError`] when the document cannot be converted.
    fn apply(&self, collection: &str, doc: DocumentData) -> Result<DocumentData, TransformError>;
}

impl<F> PreInsert for F
where
    F: Fn(&str, DocumentData) -> Result<DocumentData, TransformError> + Send + Sync,
{
    fn apply(&self, collection: &str, doc: DocumentData) -> Result<DocumentData, TransformError> {
        self(collection, doc)
    }
}

/// Ordered list of [`PreInsert`] steps. Cloning shares the steps.
#[derive(Clone, Default)]
pub struct Pipeline {
    steps: Vec<Arc<dyn PreInsert>>,
}

impl Pipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `step` after every step registered so far.
    #[must_use]
    pub fn with(mut self, step: impl PreInsert + 'static) -> Self {
        self.push(step);
        self
    }

    pub fn push(&mut self, step: impl PreInsert + 'static) {
        self.steps.push(Arc::new(step));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Feed `doc` through every step in order, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first [`TransformError`] raised by a step.
    pub fn run(&self, collection: &str, doc: DocumentData) -> Result<DocumentData, TransformError> {
        self.steps
            .iter()
            .try_fold(doc, |doc, step| step.apply(collection, doc))
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("steps", &self.steps.len())
            .finish()
    }
}

/// Grammar used to read timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeFormat {
    /// A `chrono` strftime pattern. Patterns without an offset are read as UTC.
    Pattern(String),
    Rfc3339,
    Rfc2822,
}

impl TimeFormat {
    fn parse(&self, text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        match self {
            Self::Pattern(pattern) => DateTime::parse_from_str(text, pattern)
                .map(|t| t.with_timezone(&Utc))
                .or_else(|_| NaiveDateTime::parse_from_str(text, pattern).map(|t| t.and_utc())),
            Self::Rfc3339 => DateTime::parse_from_rfc3339(text).map(|t| t.with_timezone(&Utc)),
            Self::Rfc2822 => DateTime::parse_from_rfc2822(text).map(|t| t.with_timezone(&Utc)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Conversion {
    Time(TimeFormat),
    Bytes,
    ObjectId,
}

/// Converts the text of one field in one collection.
///
/// The step is a no-op for other collections and when the field is absent,
/// not a string, or an empty string. Malformed text fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldConversion {
    collection: String,
    field: String,
    conversion: Conversion,
}

impl FieldConversion {
    fn new(collection: impl Into<String>, field: impl Into<String>, conversion: Conversion) -> Self {
        Self {
            collection: collection.into(),
            field: field.into(),
            conversion,
        }
    }

    fn convert(&self, text: &str) -> Result<Value, TransformError> {
        match &self.conversion {
            Conversion::Time(format) => {
                format
                    .parse(text)
                    .map(Value::Timestamp)
                    .map_err(|source| TransformError::InvalidTime {
                        field: self.field.clone(),
                        value: text.to_owned(),
                        source,
                    })
            }
            Conversion::Bytes => Ok(Value::Bytes(text.as_bytes().to_vec())),
            Conversion::ObjectId => text.parse::<ObjectId>().map(Value::ObjectId).map_err(|_| {
                TransformError::InvalidObjectId {
                    field: self.field.clone(),
                    value: text.to_owned(),
                }
            }),
        }
    }
}

impl PreInsert for FieldConversion {
    fn apply(&self, collection: &str, mut doc: DocumentData) -> Result<DocumentData, TransformError> {
        if collection != self.collection {
            return Ok(doc);
        }
        let Some(text) = doc.string_value(&self.field) else {
            return Ok(doc);
        };
        let value = self.convert(text)?;
        doc.insert(self.field.clone(), value);
        Ok(doc)
    }
}

/// Parse `field` of `collection` as a UTC timestamp in
/// [`DEFAULT_TIME_PATTERN`] (`2019-01-02T12:34:56Z`).
///
/// # Examples
///
/// ```
/// use mongofixture::transform::{Pipeline, convert_time};
/// use mongofixture::value::{DocumentData, Value};
///
/// let pipeline = Pipeline::new().with(convert_time("users", "created_at"));
/// let doc: DocumentData = [("created_at", "2019-01-02T12:34:56Z")].into_iter().collect();
/// let out = pipeline.run("users", doc).unwrap();
/// assert!(matches!(out.get("created_at"), Some(Value::Timestamp(_))));
/// ```
#[must_use]
pub fn convert_time(collection: impl Into<String>, field: impl Into<String>) -> FieldConversion {
    convert_time_with_format(
        collection,
        field,
        TimeFormat::Pattern(DEFAULT_TIME_PATTERN.to_owned()),
    )
}

#[must_use]
pub fn convert_time_with_format(
    collection: impl Into<String>,
    field: impl Into<String>,
    format: TimeFormat,
) -> FieldConversion {
    FieldConversion::new(collection, field, Conversion::Time(format))
}

/// Store the UTF-8 bytes of `field` as a binary value.
#[must_use]
pub fn convert_bytes(collection: impl Into<String>, field: impl Into<String>) -> FieldConversion {
    FieldConversion::new(collection, field, Conversion::Bytes)
}

/// Parse `field` as an [`ObjectId`].
#[must_use]
pub fn convert_object_id(
    collection: impl Into<String>,
    field: impl Into<String>,
) -> FieldConversion {
    FieldConversion::new(collection, field, Conversion::ObjectId)
}
