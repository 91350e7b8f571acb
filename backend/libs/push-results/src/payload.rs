//! Response payload sent back to the requester
//!
//! Normal completion:
//!
//! ```json
//! {"recipient_results":[{"device_token":"abc","result":"OK"},
//!                       {"device_token":"def","result":"ERROR","error_message":"...","error_code":"..."}]}
//! ```
//!
//! Top-level failure:
//!
//! ```json
//! {"result":"ERROR","error_message":"...","error_code":"..."}
//! ```

use crate::error::ErrorReport;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Ok,
    Error,
}

/// Outcome of a single recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipientResult {
    pub device_token: String,
    pub result: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl RecipientResult {
    pub fn ok(device_token: impl Into<String>) -> Self {
        Self {
            device_token: device_token.into(),
            result: Outcome::Ok,
            error_message: None,
            error_code: None,
        }
    }

    pub fn error(device_token: impl Into<String>, report: &ErrorReport) -> Self {
        Self {
            device_token: device_token.into(),
            result: Outcome::Error,
            error_message: Some(report.message.clone()),
            error_code: Some(report.code.clone()),
        }
    }
}

/// The single payload handed to a [`Responder`](crate::Responder)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResponsePayload {
    /// Every recipient resolved, in the order they were added
    Completed { recipient_results: Vec<RecipientResult> },
    /// Request failed as a whole; no per-recipient results
    Failed {
        result: Outcome,
        error_message: String,
        error_code: String,
    },
}

impl ResponsePayload {
    pub fn failed(report: &ErrorReport) -> Self {
        ResponsePayload::Failed {
            result: Outcome::Error,
            error_message: report.message.clone(),
            error_code: report.code.clone(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ResponsePayload::Failed { .. })
    }

    /// Per-recipient results, absent for a top-level failure
    pub fn recipient_results(&self) -> Option<&[RecipientResult]> {
        match self {
            ResponsePayload::Completed { recipient_results } => Some(recipient_results),
            ResponsePayload::Failed { .. } => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_completed_shape() {
        let payload = ResponsePayload::Completed {
            recipient_results: vec![
                RecipientResult::ok("token-a"),
                RecipientResult::error("token-b", &ErrorReport::new("bad token", "BadDeviceToken")),
            ],
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            json!({
                "recipient_results": [
                    {"device_token": "token-a", "result": "OK"},
                    {
                        "device_token": "token-b",
                        "result": "ERROR",
                        "error_message": "bad token",
                        "error_code": "BadDeviceToken"
                    }
                ]
            })
        );
        assert!(!payload.is_failed());
        assert_eq!(payload.recipient_results().map(<[_]>::len), Some(2));
    }

    #[test]
    fn test_failed_shape() {
        let payload = ResponsePayload::failed(&ErrorReport::new("missing recipients", "InvalidRequest"));

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            json!({
                "result": "ERROR",
                "error_message": "missing recipients",
                "error_code": "InvalidRequest"
            })
        );
        assert!(value.get("recipient_results").is_none());
        assert!(payload.recipient_results().is_none());
    }

    #[test]
    fn test_to_json() {
        let payload = ResponsePayload::Completed {
            recipient_results: vec![RecipientResult::ok("t")],
        };
        assert_eq!(
            payload.to_json().unwrap(),
            r#"{"recipient_results":[{"device_token":"t","result":"OK"}]}"#
        );
    }
}
