use crate::IndexingError;
use serde::Serialize;

/// Outcome of an indexing entry point
///
/// Serializes as `{"result": true}` or
/// `{"result": false, "error": "Indexing is already running"}`. The error is
/// the top-level message only; no causes or internal identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexingResponse {
    pub result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IndexingResponse {
    pub fn ok() -> Self {
        Self {
            result: true,
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            result: false,
            error: Some(message.into()),
        }
    }

    pub fn from_result<T>(result: &Result<T, IndexingError>) -> Self {
        match result {
            Ok(_) => Self::ok(),
            Err(e) => Self::error(e.to_string()),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{{\"result\":{}}}", self.result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_json() {
        assert_eq!(IndexingResponse::ok().to_json(), r#"{"result":true}"#);
    }

    #[test]
    fn test_error_json() {
        let response = IndexingResponse::from_result::<()>(&Err(IndexingError::AlreadyRunning));
        assert_eq!(
            response.to_json(),
            r#"{"result":false,"error":"Indexing is already running"}"#
        );
    }

    #[test]
    fn test_site_not_found_message() {
        let response = IndexingResponse::from_result::<()>(&Err(IndexingError::SiteNotFound(
            "https://elsewhere.test/".to_string(),
        )));
        assert!(!response.result);
        assert_eq!(
            response.error.as_deref(),
            Some("Page https://elsewhere.test/ does not belong to any indexed site")
        );
    }
}
