//! Raw messages read directly out of a stream.

use crate::error::{JsmError, JsmResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use http::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

const HEADER_VERSION: &str = "NATS/1.0";

/// A message stored in a stream, addressed by sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct RawStreamMsg {
    pub subject: String,
    pub sequence: u64,
    pub headers: HeaderMap,
    pub data: Vec<u8>,
    pub time: DateTime<Utc>,
}

/// Body of get-message and delete-message requests.
#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct SeqRequest {
    pub seq: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StoredMsgResponse {
    message: Option<StoredMsg>,
}

#[derive(Debug, Deserialize)]
struct StoredMsg {
    subject: String,
    seq: u64,
    #[serde(default)]
    hdrs: Option<String>,
    #[serde(default)]
    data: Option<String>,
    time: DateTime<Utc>,
}

impl StoredMsgResponse {
    /// Decode the base64 payload and header block.
    pub(crate) fn into_raw(self) -> JsmResult<RawStreamMsg> {
        let msg = self
            .message
            .ok_or_else(|| JsmError::InvalidMessage("response carries no message".to_string()))?;

        let headers = match msg.hdrs.as_deref() {
            Some(encoded) if !encoded.is_empty() => decode_headers(&decode_base64(encoded)?)?,
            _ => HeaderMap::new(),
        };
        let data = match msg.data.as_deref() {
            Some(encoded) => decode_base64(encoded)?,
            None => Vec::new(),
        };

        Ok(RawStreamMsg {
            subject: msg.subject,
            sequence: msg.seq,
            headers,
            data,
            time: msg.time,
        })
    }
}

fn decode_base64(encoded: &str) -> JsmResult<Vec<u8>> {
    STANDARD
        .decode(encoded)
        .map_err(|e| JsmError::InvalidMessage(e.to_string()))
}

/// Parse a `NATS/1.0` header block into a header map.
pub(crate) fn decode_headers(raw: &[u8]) -> JsmResult<HeaderMap> {
    let text = std::str::from_utf8(raw).map_err(|e| JsmError::InvalidMessage(e.to_string()))?;
    let mut lines = text.split("\r\n");

    let version = lines.next().unwrap_or_default();
    if !version.starts_with(HEADER_VERSION) {
        return Err(JsmError::InvalidMessage(format!(
            "bad header version line: {version:?}"
        )));
    }

    let mut headers = HeaderMap::new();
    for line in lines.take_while(|line| !line.is_empty()) {
        let (key, value) = line
            .split_once(':')
            .ok_or_else(|| JsmError::InvalidMessage(format!("malformed header: {line:?}")))?;
        let name = HeaderName::from_bytes(key.trim().as_bytes())
            .map_err(|e| JsmError::InvalidMessage(e.to_string()))?;
        let value =
            HeaderValue::from_str(value.trim()).map_err(|e| JsmError::InvalidMessage(e.to_string()))?;
        headers.append(name, value);
    }

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_headers() {
        let headers =
            decode_headers(b"NATS/1.0\r\nNats-Msg-Id: abc\r\nTrace: 1\r\nTrace: 2\r\n\r\n").unwrap();
        assert_eq!(headers.get("nats-msg-id").unwrap(), "abc");
        assert_eq!(headers.get_all("trace").iter().count(), 2);
    }

    #[test]
    fn test_decode_headers_rejects_bad_version() {
        let err = decode_headers(b"HTTP/1.1\r\nA: b\r\n\r\n").unwrap_err();
        assert!(matches!(err, JsmError::InvalidMessage(_)));
    }

    #[test]
    fn test_stored_message_conversion() {
        let hdrs = STANDARD.encode("NATS/1.0\r\nNats-Msg-Id: 42\r\n\r\n");
        let data = STANDARD.encode("hello");
        let response: StoredMsgResponse = serde_json::from_value(json!({
            "message": {
                "subject": "orders.new",
                "seq": 7,
                "hdrs": hdrs,
                "data": data,
                "time": "2021-03-01T10:00:00Z"
            }
        }))
        .unwrap();

        let msg = response.into_raw().unwrap();
        assert_eq!(msg.subject, "orders.new");
        assert_eq!(msg.sequence, 7);
        assert_eq!(msg.data, b"hello");
        assert_eq!(msg.headers.get("nats-msg-id").unwrap(), "42");
    }

    #[test]
    fn test_missing_message_is_an_error() {
        let response: StoredMsgResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(
            response.into_raw(),
            Err(JsmError::InvalidMessage(_))
        ));
    }
}
