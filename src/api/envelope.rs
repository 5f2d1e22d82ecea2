//! Wire envelopes shared by every backend endpoint.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// Paging metadata of a list response.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ListMeta {
    pub page: u32,
    pub size: u32,
    pub total: u64,
    pub sort: Option<String>,
    pub filters: BTreeMap<String, Value>,
}

/// `{data, meta}` wrapper returned by list endpoints.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ListEnvelope<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub meta: ListMeta,
}

#[derive(Debug, Default, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<ErrorDetails>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ErrorDetails {
    #[serde(default)]
    pub errors: Option<Vec<ValidationIssue>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ValidationIssue {
    #[serde(default)]
    pub loc: Option<Vec<Value>>,
    #[serde(default)]
    pub msg: Option<String>,
}

impl ValidationIssue {
    /// Dotted field path without the leading `body` segment.
    fn path(&self) -> String {
        self.loc
            .iter()
            .flatten()
            .filter_map(|part| match part {
                Value::String(s) if s == "body" => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Builds the banner text for a non-2xx response.
///
/// The top-level message is combined with the first field issue when the
/// backend reports one; otherwise `Request failed with status N` is used.
pub fn error_message(status: u16, body: &[u8]) -> String {
    let fallback = format!("Request failed with status {status}");
    let Ok(envelope) = serde_json::from_slice::<ErrorEnvelope>(body) else {
        return fallback;
    };
    let Some(error) = envelope.error else {
        return fallback;
    };

    let base = non_blank(error.message.as_deref());
    let issue = error
        .details
        .as_ref()
        .and_then(|details| details.errors.as_deref())
        .and_then(|errors| errors.first())
        .and_then(|issue| non_blank(issue.msg.as_deref()).map(|msg| (issue, msg)));

    if let Some((issue, msg)) = issue {
        let base = base.unwrap_or("Request validation failed");
        let path = issue.path();
        return if path.is_empty() {
            format!("{base}: {msg}")
        } else {
            format!("{base}: {path} - {msg}")
        };
    }

    base.map(str::to_string).unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn message(status: u16, body: Value) -> String {
        error_message(status, body.to_string().as_bytes())
    }

    #[test]
    fn first_issue_is_appended_with_its_path() {
        let body = json!({"error": {
            "code": "validation_error",
            "message": "Invalid payload",
            "details": {"errors": [
                {"loc": ["body", "client", "full_name"], "msg": "field required"},
                {"loc": ["body", "offer_id"], "msg": "ignored"}
            ]}
        }});
        assert_eq!(message(422, body), "Invalid payload: client.full_name - field required");
    }

    #[test]
    fn partial_meta_falls_back_to_defaults() {
        let body = json!({"data": [1, 2], "meta": {"total": 2}});
        let envelope: ListEnvelope<u32> = serde_json::from_value(body).unwrap();
        assert_eq!(envelope.data, vec![1, 2]);
        assert_eq!(envelope.meta.total, 2);
        assert_eq!(envelope.meta.page, 0);
    }

    #[test]
    fn null_issue_fields_keep_the_backend_message() {
        let body = json!({"error": {
            "message": "Offer is not active",
            "details": {"errors": null}
        }});
        assert_eq!(message(409, body), "Offer is not active");

        let body = json!({"error": {
            "message": "Invalid payload",
            "details": {"errors": [{"loc": null, "msg": "cin is required"}]}
        }});
        assert_eq!(message(422, body), "Invalid payload: cin is required");
    }

    #[test]
    fn numeric_locations_are_kept() {
        let body = json!({"error": {"details": {"errors": [
            {"loc": ["body", "lines", 0, "amount"], "msg": "must be positive"}
        ]}}});
        assert_eq!(
            message(422, body),
            "Request validation failed: lines.0.amount - must be positive"
        );
    }

    #[test]
    fn issue_without_path_keeps_message_only() {
        let body = json!({"error": {"message": "Bad", "details": {"errors": [
            {"loc": ["body"], "msg": "empty body"}
        ]}}});
        assert_eq!(message(400, body), "Bad: empty body");
    }

    #[test]
    fn falls_back_to_status() {
        assert_eq!(error_message(502, b"<html>bad gateway</html>"), "Request failed with status 502");
        assert_eq!(message(404, json!({"detail": "nope"})), "Request failed with status 404");
        assert_eq!(
            message(409, json!({"error": {"message": "Offer is retired"}})),
            "Offer is retired"
        );
    }

    #[test]
    fn list_envelope_tolerates_missing_meta() {
        let envelope: ListEnvelope<Value> = serde_json::from_value(json!({"data": [1, 2]})).unwrap();
        assert_eq!(envelope.data.len(), 2);
        assert_eq!(envelope.meta, ListMeta::default());
    }
}
