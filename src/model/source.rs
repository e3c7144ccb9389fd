//! Item sources and the mapping from their responses to desired items.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::item::DesiredItem;

/// A header attached to requests for a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Header {
    pub key: String,
    pub value: String,
}

/// Where each field of a desired item lives in a source response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResponseMapping {
    /// Field holding the item array. Empty when the response is the array itself.
    #[serde(default)]
    pub data_field: String,
    /// Field holding the item title
    pub title: String,
    /// Field holding the link back to the item
    #[serde(rename = "URL")]
    pub url: String,
    /// Field holding the item number
    pub number: String,
    /// Field holding an RFC 3339 due date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
}

/// A location items are read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Source {
    /// Source name
    pub name: String,
    /// Where the source lives
    #[serde(rename = "URL")]
    pub url: String,
    /// Request headers
    #[serde(default)]
    pub headers: Vec<Header>,
    /// Query string for the request
    #[serde(default)]
    pub queries: String,
    /// Response field mapping
    pub response: ResponseMapping,
    /// Tags added to every item from this source
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Result type for response parsing.
pub type SourceResult<T> = Result<T, SourceError>;

/// Error types for response parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("response has no `{0}` field")]
    MissingDataField(String),

    #[error("item {index} has no usable `{field}` field")]
    MissingField { index: usize, field: String },

    #[error("item {index} has an invalid date in `{field}`: {value}")]
    InvalidDate { index: usize, field: String, value: String },
}

impl Source {
    /// Turn a raw response body into desired items.
    ///
    /// Items come back without a project; callers match them to one by
    /// their note URL.
    pub fn parse_response(&self, body: &[u8]) -> SourceResult<Vec<DesiredItem>> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| SourceError::Malformed(e.to_string()))?;

        let mapping = &self.response;
        let payload = if mapping.data_field.is_empty() {
            value
        } else {
            match value {
                Value::Object(mut fields) => fields
                    .remove(&mapping.data_field)
                    .ok_or_else(|| SourceError::MissingDataField(mapping.data_field.clone()))?,
                other => {
                    return Err(SourceError::Malformed(format!(
                        "expected an object, found {}",
                        json_kind(&other)
                    )))
                }
            }
        };

        let entries = match payload {
            Value::Array(entries) => entries,
            other => {
                return Err(SourceError::Malformed(format!(
                    "expected an array, found {}",
                    json_kind(&other)
                )))
            }
        };

        entries.iter().enumerate().map(|(index, entry)| self.item_from(index, entry)).collect()
    }

    fn item_from(&self, index: usize, entry: &Value) -> SourceResult<DesiredItem> {
        let mapping = &self.response;
        let missing = |field: &str| SourceError::MissingField { index, field: field.to_string() };

        let number = entry
            .get(&mapping.number)
            .and_then(|n| n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)))
            .ok_or_else(|| missing(&mapping.number))?;
        let title = entry
            .get(&mapping.title)
            .and_then(Value::as_str)
            .ok_or_else(|| missing(&mapping.title))?;
        let url =
            entry.get(&mapping.url).and_then(Value::as_str).ok_or_else(|| missing(&mapping.url))?;

        let mut item = DesiredItem::new(format!("[{}] {}", number, title), url)
            .with_tags(self.tags.clone());

        if let Some(field) = &mapping.due {
            match entry.get(field) {
                None | Some(Value::Null) => {}
                Some(Value::String(raw)) => {
                    let due = DateTime::parse_from_rfc3339(raw).map_err(|_| {
                        SourceError::InvalidDate {
                            index,
                            field: field.clone(),
                            value: raw.clone(),
                        }
                    })?;
                    item = item.with_due_date_ms(due.timestamp_millis());
                }
                Some(other) => {
                    return Err(SourceError::InvalidDate {
                        index,
                        field: field.clone(),
                        value: other.to_string(),
                    })
                }
            }
        }

        Ok(item)
    }
}

/// All tags across the given sources, in source order.
pub fn collect_tags(sources: &[Source]) -> Vec<String> {
    sources.iter().flat_map(|source| source.tags.iter().cloned()).collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
