//! Greeting exchange model.

use crate::error::{ProtocolError, ProtocolResult};
use serde::{Deserialize, Serialize};

/// Body returned by `POST /DataReader/Greeting`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GreetingResponse {
    /// Server-issued session token.
    #[serde(rename = "Session", default)]
    pub session: Option<String>,
}

impl GreetingResponse {
    /// Creates a response carrying the given session id.
    pub fn new(session: impl Into<String>) -> Self {
        Self {
            session: Some(session.into()),
        }
    }

    /// Parses a JSON greeting body.
    ///
    /// # Errors
    ///
    /// Returns `InvalidGreeting` if the body is not a JSON object of the
    /// expected shape.
    pub fn from_json(bytes: &[u8]) -> ProtocolResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| ProtocolError::InvalidGreeting(e.to_string()))
    }

    /// Serializes the response to JSON.
    ///
    /// # Errors
    ///
    /// Returns `InvalidGreeting` if serialization fails.
    pub fn to_json(&self) -> ProtocolResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| ProtocolError::InvalidGreeting(e.to_string()))
    }

    /// Returns the session id, rejecting absent or blank values.
    ///
    /// # Errors
    ///
    /// Returns `InvalidGreeting` when no usable session was issued.
    pub fn session_id(&self) -> ProtocolResult<&str> {
        match self.session.as_deref() {
            Some(id) if !id.trim().is_empty() => Ok(id),
            _ => Err(ProtocolError::InvalidGreeting(
                "response carries no session id".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_session() {
        let response = GreetingResponse::from_json(br#"{"Session":"abc-123"}"#).unwrap();
        assert_eq!(response.session_id().unwrap(), "abc-123");
    }

    #[test]
    fn ignores_unknown_fields() {
        let response =
            GreetingResponse::from_json(br#"{"Session":"s1","PingInterval":30}"#).unwrap();
        assert_eq!(response.session_id().unwrap(), "s1");
    }

    #[test]
    fn missing_session_is_rejected() {
        let response = GreetingResponse::from_json(b"{}").unwrap();
        assert!(matches!(
            response.session_id(),
            Err(ProtocolError::InvalidGreeting(_))
        ));

        let response = GreetingResponse::from_json(br#"{"Session":null}"#).unwrap();
        assert!(response.session_id().is_err());

        let response = GreetingResponse::from_json(br#"{"Session":"  "}"#).unwrap();
        assert!(response.session_id().is_err());
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(
            GreetingResponse::from_json(b"not json"),
            Err(ProtocolError::InvalidGreeting(_))
        ));
    }

    #[test]
    fn json_round_trip() {
        let response = GreetingResponse::new("s-42");
        let json = response.to_json().unwrap();
        assert_eq!(json, br#"{"Session":"s-42"}"#);
        assert_eq!(GreetingResponse::from_json(&json).unwrap(), response);
    }
}
