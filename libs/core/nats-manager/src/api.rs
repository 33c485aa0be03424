//! JetStream JSON API: subjects and the response envelope.

use crate::error::{JsmError, JsmResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Default API prefix.
pub const DEFAULT_API_PREFIX: &str = "$JS.API.";

/// API prefix for a JetStream domain.
pub fn domain_prefix(domain: &str) -> String {
    format!("$JS.{domain}.API.")
}

/// Normalize a custom prefix so subjects can be appended to it.
pub fn normalize_prefix(prefix: &str) -> String {
    if prefix.ends_with('.') {
        prefix.to_string()
    } else {
        format!("{prefix}.")
    }
}

/// Logical API operation bound to its path parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiSubject<'a> {
    AccountInfo,
    StreamCreate(&'a str),
    StreamUpdate(&'a str),
    StreamDelete(&'a str),
    StreamInfo(&'a str),
    StreamPurge(&'a str),
    StreamList,
    StreamNames,
    MsgGet(&'a str),
    MsgDelete(&'a str),
    ConsumerCreate(&'a str),
    DurableCreate(&'a str, &'a str),
    ConsumerDelete(&'a str, &'a str),
    ConsumerInfo(&'a str, &'a str),
    ConsumerList(&'a str),
    ConsumerNames(&'a str),
}

impl ApiSubject<'_> {
    /// Subject relative to the API prefix.
    pub fn path(&self) -> String {
        match self {
            ApiSubject::AccountInfo => "INFO".to_string(),
            ApiSubject::StreamCreate(stream) => format!("STREAM.CREATE.{stream}"),
            ApiSubject::StreamUpdate(stream) => format!("STREAM.UPDATE.{stream}"),
            ApiSubject::StreamDelete(stream) => format!("STREAM.DELETE.{stream}"),
            ApiSubject::StreamInfo(stream) => format!("STREAM.INFO.{stream}"),
            ApiSubject::StreamPurge(stream) => format!("STREAM.PURGE.{stream}"),
            ApiSubject::StreamList => "STREAM.LIST".to_string(),
            ApiSubject::StreamNames => "STREAM.NAMES".to_string(),
            ApiSubject::MsgGet(stream) => format!("STREAM.MSG.GET.{stream}"),
            ApiSubject::MsgDelete(stream) => format!("STREAM.MSG.DELETE.{stream}"),
            ApiSubject::ConsumerCreate(stream) => format!("CONSUMER.CREATE.{stream}"),
            ApiSubject::DurableCreate(stream, durable) => {
                format!("CONSUMER.DURABLE.CREATE.{stream}.{durable}")
            }
            ApiSubject::ConsumerDelete(stream, consumer) => {
                format!("CONSUMER.DELETE.{stream}.{consumer}")
            }
            ApiSubject::ConsumerInfo(stream, consumer) => {
                format!("CONSUMER.INFO.{stream}.{consumer}")
            }
            ApiSubject::ConsumerList(stream) => format!("CONSUMER.LIST.{stream}"),
            ApiSubject::ConsumerNames(stream) => format!("CONSUMER.NAMES.{stream}"),
        }
    }

    /// Full subject under `prefix`.
    pub fn subject(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.path())
    }

    /// Stable label for logs and metrics.
    pub fn operation(&self) -> &'static str {
        match self {
            ApiSubject::AccountInfo => "account_info",
            ApiSubject::StreamCreate(_) => "stream_create",
            ApiSubject::StreamUpdate(_) => "stream_update",
            ApiSubject::StreamDelete(_) => "stream_delete",
            ApiSubject::StreamInfo(_) => "stream_info",
            ApiSubject::StreamPurge(_) => "stream_purge",
            ApiSubject::StreamList => "stream_list",
            ApiSubject::StreamNames => "stream_names",
            ApiSubject::MsgGet(_) => "msg_get",
            ApiSubject::MsgDelete(_) => "msg_delete",
            ApiSubject::ConsumerCreate(_) => "consumer_create",
            ApiSubject::DurableCreate(_, _) => "durable_create",
            ApiSubject::ConsumerDelete(_, _) => "consumer_delete",
            ApiSubject::ConsumerInfo(_, _) => "consumer_info",
            ApiSubject::ConsumerList(_) => "consumer_list",
            ApiSubject::ConsumerNames(_) => "consumer_names",
        }
    }
}

/// Error record embedded in failed API responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: u16,
    #[serde(default)]
    pub description: String,
}

/// Page metadata of a listing response.
///
/// `offset` is the position the page was requested at, not the position after it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiPaged {
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub limit: usize,
}

/// Body of a paged listing request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PagedRequest {
    pub offset: usize,
}

/// Body of a stream names request, optionally filtered by subject.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StreamNamesRequest {
    pub offset: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

/// Acknowledgement body returned by delete-style calls.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuccessResponse {
    #[serde(default)]
    pub success: bool,
}

/// Decode a raw reply.
///
/// A present `error` record short-circuits decoding of the payload, so error
/// replies lacking the payload's required fields still surface the server error.
pub fn decode_response<T: DeserializeOwned>(raw: &[u8]) -> JsmResult<T> {
    let value: serde_json::Value = serde_json::from_slice(raw).map_err(JsmError::Decode)?;

    if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
        let error: ApiError =
            serde_json::from_value(error.clone()).map_err(JsmError::Decode)?;
        return Err(JsmError::from_api(error.code, error.description));
    }

    serde_json::from_value(value).map_err(JsmError::Decode)
}
