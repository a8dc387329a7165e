//! Request and response envelopes.
//!
//! These are the bodies that follow the protocol header. Field names on
//! the wire are single letters shared by every packager:
//!
//! ```text
//! Request  { "i": id, "m": method, "p": [params...] }
//! Response { "i": id, "s": status, "r": retval, "o": output, "e": error }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Status code carried in a response. Zero means success; the other
/// well-known values are bit flags describing where the peer failed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Status(pub u32);

impl Status {
    pub const OK: Self = Self(0);
    pub const PACKAGER: Self = Self(1);
    pub const PROTOCOL: Self = Self(2);
    pub const REQUEST: Self = Self(4);
    pub const OUTPUT: Self = Self(8);
    pub const TRANSPORT: Self = Self(16);
    pub const FORBIDDEN: Self = Self(32);
    pub const EXCEPTION: Self = Self(64);
    pub const EMPTY_RESPONSE: Self = Self(128);

    /// Returns `true` for [`Status::OK`].
    pub fn is_ok(self) -> bool {
        self == Self::OK
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::OK => "ok",
            Self::PACKAGER => "packager",
            Self::PROTOCOL => "protocol",
            Self::REQUEST => "request",
            Self::OUTPUT => "output",
            Self::TRANSPORT => "transport",
            Self::FORBIDDEN => "forbidden",
            Self::EXCEPTION => "exception",
            Self::EMPTY_RESPONSE => "empty response",
            Self(code) => return write!(f, "status {code}"),
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A call: which method to run and with what arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Correlation id, mirrored in the header.
    #[serde(rename = "i")]
    pub id: u32,

    /// Remote procedure name.
    #[serde(rename = "m")]
    pub method: String,

    /// Positional arguments. Always a sequence, even when empty, so an
    /// argument-less call encodes as `[]` rather than a missing field.
    #[serde(rename = "p", default)]
    pub params: Vec<Value>,
}

impl Request {
    /// Creates a request.
    pub fn new(id: u32, method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            id,
            method: method.into(),
            params,
        }
    }

    /// Picks a random correlation id.
    pub fn random_id() -> u32 {
        use rand::Rng;
        rand::rng().random()
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// The peer's answer to a [`Request`].
///
/// `V` is the type of the return value. Peers build responses with the
/// default, a JSON value; a client decodes them with [`Retval`] so the
/// value keeps the data model of the packager that carried it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response<V = Value> {
    /// Correlation id of the request being answered.
    #[serde(rename = "i", default)]
    pub id: u32,

    /// [`Status::OK`] or a failure code.
    #[serde(rename = "s", default)]
    pub status: Status,

    /// Failure message; present when `status` is not OK.
    #[serde(rename = "e", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Return value in whatever shape the remote method produced.
    #[serde(rename = "r", default)]
    pub retval: V,

    /// Anything the remote method printed while running.
    #[serde(rename = "o", default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl Response {
    /// A successful response carrying `retval`.
    pub fn success(id: u32, retval: Value) -> Self {
        Self {
            id,
            status: Status::OK,
            error: None,
            retval,
            output: None,
        }
    }

    /// A failed response with a message.
    pub fn failure(id: u32, status: Status, error: impl Into<String>) -> Self {
        Self {
            id,
            status,
            error: Some(error.into()),
            retval: Value::Null,
            output: None,
        }
    }
}

impl<V> Response<V> {
    /// Replaces the return value, keeping everything else.
    pub fn map_retval<U>(self, f: impl FnOnce(V) -> U) -> Response<U> {
        Response {
            id: self.id,
            status: self.status,
            error: self.error,
            retval: f(self.retval),
            output: self.output,
        }
    }
}

// ---------------------------------------------------------------------------
// Retval
// ---------------------------------------------------------------------------

/// A decoded return value that has not yet been given a concrete type.
///
/// Each packager keeps its own dynamic representation. MessagePack
/// replies may carry maps with integer keys (sparse arrays from PHP
/// peers) or raw binary, neither of which fits a JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum Retval {
    Json(Value),
    #[cfg(feature = "msgpack")]
    MsgPack(rmpv::Value),
}

impl Retval {
    /// Returns `true` for JSON `null` and MessagePack `nil`.
    pub fn is_nil(&self) -> bool {
        match self {
            Self::Json(value) => value.is_null(),
            #[cfg(feature = "msgpack")]
            Self::MsgPack(value) => value.is_nil(),
        }
    }
}

impl Default for Retval {
    fn default() -> Self {
        Self::Json(Value::Null)
    }
}

impl From<Value> for Retval {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

#[cfg(feature = "msgpack")]
impl From<rmpv::Value> for Retval {
    fn from(value: rmpv::Value) -> Self {
        Self::MsgPack(value)
    }
}

impl Serialize for Retval {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Json(value) => value.serialize(serializer),
            #[cfg(feature = "msgpack")]
            Self::MsgPack(value) => value.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_uses_short_keys() {
        let request = Request::new(3, "Add", vec![json!(1), json!(2)]);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, json!({"i": 3, "m": "Add", "p": [1, 2]}));
    }

    #[test]
    fn test_request_empty_params_encode_as_empty_array() {
        let request = Request::new(1, "Ping", Vec::new());
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""p":[]"#), "got {json}");
    }

    #[test]
    fn test_request_missing_params_decode_as_empty() {
        let request: Request =
            serde_json::from_str(r#"{"i":1,"m":"Ping"}"#).unwrap();
        assert!(request.params.is_empty());
    }

    #[test]
    fn test_response_decodes_with_missing_optional_fields() {
        let response: Response =
            serde_json::from_str(r#"{"i":9,"s":0,"r":"hi"}"#).unwrap();
        assert_eq!(response.id, 9);
        assert!(response.status.is_ok());
        assert_eq!(response.retval, json!("hi"));
        assert_eq!(response.error, None);
    }

    #[test]
    fn test_response_accepts_null_error() {
        let response: Response =
            serde_json::from_str(r#"{"i":1,"s":0,"e":null,"r":1}"#).unwrap();
        assert_eq!(response.error, None);
    }

    #[test]
    fn test_failure_response_shape() {
        let response = Response::failure(5, Status::EXCEPTION, "boom");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value, json!({"i": 5, "s": 64, "e": "boom", "r": null}));
    }

    #[test]
    fn test_map_retval_keeps_envelope_fields() {
        let mut response = Response::failure(5, Status::EXCEPTION, "boom");
        response.output = Some("log".into());
        let mapped = response.map_retval(Retval::from);
        assert_eq!(mapped.id, 5);
        assert_eq!(mapped.status, Status::EXCEPTION);
        assert_eq!(mapped.error.as_deref(), Some("boom"));
        assert_eq!(mapped.output.as_deref(), Some("log"));
        assert!(mapped.retval.is_nil());
    }

    #[test]
    fn test_retval_serializes_as_inner_value() {
        let retval = Retval::Json(json!({"a": 1}));
        assert_eq!(serde_json::to_value(&retval).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(Status::OK.to_string(), "ok");
        assert_eq!(Status::FORBIDDEN.to_string(), "forbidden");
        assert_eq!(Status(3).to_string(), "status 3");
    }

    #[test]
    fn test_status_serializes_as_plain_number() {
        assert_eq!(serde_json::to_string(&Status::EXCEPTION).unwrap(), "64");
    }
}
