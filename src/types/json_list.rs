use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::DataIntegrityWarning;

/// An ordered list persisted as JSON text in a single column.
///
/// Missing, empty and `null` payloads decode to an empty list. Anything else
/// that is not a JSON array of `T` is corrupt: [`JsonList::decode`] reports it,
/// [`JsonList::decode_or_default`] logs it and yields an empty list. A stored
/// `[]` and a corrupt payload therefore read back the same way.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JsonList<T>(pub Vec<T>);

impl<T> JsonList<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(items: Vec<T>) -> Self {
        Self(items)
    }

    pub fn encode(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|e| {
            tracing::error!("Failed to encode list column: {e}");
            "[]".to_string()
        })
    }

    pub fn decode(raw: Option<&str>, field: &'static str) -> Result<Self, DataIntegrityWarning> {
        let raw = match raw.map(str::trim) {
            None | Some("") | Some("null") => return Ok(Self(Vec::new())),
            Some(raw) => raw,
        };

        serde_json::from_str::<Vec<T>>(raw)
            .map(Self)
            .map_err(|e| DataIntegrityWarning {
                field,
                detail: e.to_string(),
            })
    }

    /// Lenient decode for read paths: a corrupt payload never fails the caller.
    pub fn decode_or_default(raw: Option<&str>, field: &'static str, owner: &str) -> Self {
        Self::decode(raw, field).unwrap_or_else(|warning| {
            tracing::warn!(owner, "{warning}; using empty list");
            Self(Vec::new())
        })
    }

    pub fn into_inner(self) -> Vec<T> {
        self.0
    }
}
