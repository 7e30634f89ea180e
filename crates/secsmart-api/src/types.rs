// Wire types for the areas endpoints.

use serde::Serialize;
use serde_json::Value;

/// Body of `PUT /devices/{id}/areas/mode`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AreaModeUpdate<'a> {
    pub areaid: u8,
    pub mode: &'a str,
}

/// Response of `GET /devices/{id}/areas`.
///
/// The API usually answers with a JSON object keyed `area1`..`area6`, but
/// has been seen to send other content types. Non-JSON bodies are handed
/// back verbatim so the caller can decide what to do with them.
#[derive(Debug, Clone, PartialEq)]
pub enum AreasPayload {
    Json(Value),
    Text(String),
}

impl AreasPayload {
    /// The JSON object, if the response was one.
    pub fn as_object(&self) -> Option<&serde_json::Map<String, Value>> {
        match self {
            Self::Json(value) => value.as_object(),
            Self::Text(_) => None,
        }
    }
}
