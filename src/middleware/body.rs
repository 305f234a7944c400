//! Request body parsing.
//!
//! [`BodyParser`] looks at the request's `content-type` and parses the body
//! once, up front, into a [`ParsedBody`] stored on the context:
//!
//! | Content type | Parsed as |
//! |---|---|
//! | `application/json`, `*/*+json` | [`ParsedBody::Json`] |
//! | `application/x-www-form-urlencoded` | [`ParsedBody::Form`] |
//! | anything else | [`ParsedBody::Text`] |
//!
//! Malformed JSON is an error, not a non-match: the chain rejects with
//! [`Error::Json`](crate::Error::Json), whose message is the parser's own.

use serde::de::DeserializeOwned;

use crate::chain::Next;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::handler::{BoxFuture, Handler};
use crate::request::Request;
use crate::response::Response;

/// A request body after parsing.
#[derive(Clone, Debug, PartialEq)]
pub enum ParsedBody {
    Json(serde_json::Value),
    /// Decoded pairs in order of appearance.
    Form(Vec<(String, String)>),
    Text(String),
}

impl ParsedBody {
    /// First value of form field `name`.
    pub fn field(&self, name: &str) -> Option<&str> {
        match self {
            Self::Form(pairs) => pairs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str()),
            Self::Json(value) => value.get(name).and_then(serde_json::Value::as_str),
            Self::Text(_) => None,
        }
    }
}

/// Slot marker: present whenever the parser ran, holding `None` for requests
/// without a body.
#[derive(Clone, Debug)]
struct BodySlot(Option<ParsedBody>);

fn media_type(req: &Request) -> String {
    req.header("content-type")
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .unwrap_or_default()
}

fn parse(content_type: &str, body: &str) -> Result<ParsedBody> {
    if content_type == "application/json" || content_type.ends_with("+json") {
        Ok(ParsedBody::Json(serde_json::from_str(body)?))
    } else if content_type == "application/x-www-form-urlencoded" {
        Ok(ParsedBody::Form(serde_urlencoded::from_str(body)?))
    } else {
        Ok(ParsedBody::Text(body.to_owned()))
    }
}

/// The body parsing middleware.
///
/// A missing or empty body is not parsed: [`BodyContext::parsed_body`] then
/// yields `None`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BodyParser;

impl BodyParser {
    pub fn new() -> Self {
        Self
    }
}

impl Handler for BodyParser {
    fn call(&self, cx: Context, req: Request, next: Next) -> BoxFuture<Result<Response>> {
        let parsed = match req.body().filter(|b| !b.is_empty()) {
            Some(body) => match parse(&media_type(&req), body) {
                Ok(parsed) => Some(parsed),
                Err(e) => return Box::pin(async move { Err(e) }),
            },
            None => None,
        };
        cx.insert(BodySlot(parsed));
        next.run(req)
    }
}

/// Parsed-body access on a [`Context`] travelling behind [`BodyParser`].
pub trait BodyContext {
    fn parsed_body(&self) -> Result<Option<ParsedBody>>;

    /// Deserializes a JSON body into `T`.
    fn json<T: DeserializeOwned>(&self) -> Result<T> {
        match self.parsed_body()? {
            Some(ParsedBody::Json(value)) => Ok(serde_json::from_value(value)?),
            Some(ParsedBody::Text(text)) => Ok(serde_json::from_str(&text)?),
            _ => Err(Error::msg("request body is not JSON")),
        }
    }
}

impl BodyContext for Context {
    fn parsed_body(&self) -> Result<Option<ParsedBody>> {
        self.get::<BodySlot>()
            .map(|slot| slot.0)
            .ok_or(Error::MissingCapability("parsed_body"))
    }
}
