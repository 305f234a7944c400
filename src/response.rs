//! Outgoing response value and the [`IntoResponse`] normalization trait.
//!
//! Whatever a handler produces at the end of the chain, or at the point where
//! it short-circuits, is normalized into one [`Response`]. A bare string
//! becomes `200` with that body and no headers. A `Response` passes through
//! untouched.

use http::StatusCode;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Common content-type values for use with [`ResponseBuilder::bytes`].
pub enum ContentType {
    Html,         // text/html; charset=utf-8
    Json,         // application/json
    OctetStream,  // application/octet-stream
    Text,         // text/plain; charset=utf-8
}

impl ContentType {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Html        => "text/html; charset=utf-8",
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Text        => "text/plain; charset=utf-8",
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// A response travelling back out through the chain.
///
/// Headers are kept as ordered `(name, value)` pairs. A multi-value header such
/// as `set-cookie` is simply several pairs with the same name.
///
/// ```rust
/// use road::{IntoResponse, Response, StatusCode};
///
/// let plain = "hello".into_response();
/// assert_eq!(plain.status(), 200);
/// assert!(plain.headers().is_empty());
///
/// let created = Response::builder()
///     .status(StatusCode::CREATED)
///     .header("location", "/users/42")
///     .json(br#"{"id":42}"#.to_vec());
/// assert_eq!(created.header("Location"), Some("/users/42"));
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Response {
    pub(crate) status: u16,
    pub(crate) body: Vec<u8>,
    pub(crate) headers: Vec<(String, String)>,
}

impl Response {
    /// `200` with `body` and no headers.
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self { status: StatusCode::OK.as_u16(), body: body.into(), headers: Vec::new() }
    }

    /// A response with no body.
    pub fn empty(code: StatusCode) -> Self {
        Self { status: code.as_u16(), body: Vec::new(), headers: Vec::new() }
    }

    /// `200 OK` with an `application/json` content type.
    pub fn json(body: Vec<u8>) -> Self {
        Self::builder().json(body)
    }

    /// Redirect to `location` with an empty body.
    pub fn redirect(code: StatusCode, location: &str) -> Self {
        Self::builder().status(code).header("location", location).no_body()
    }

    /// What the chain resolves to when no middleware produced anything.
    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND.as_u16(),
            body: b"Page not found".to_vec(),
            headers: Vec::new(),
        }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: Vec::new(), status: StatusCode::OK.as_u16() }
    }

    pub fn status(&self) -> u16 { self.status }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }

    /// The body as text, replacing invalid UTF-8.
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// First value of header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every value of header `name`, in insertion order.
    pub fn header_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers.iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_status(&mut self, code: StatusCode) {
        self.status = code.as_u16();
    }

    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = body.into();
    }

    /// Replaces every existing value of `name` with `value`.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.remove_header(name);
        self.headers.push((name.to_owned(), value.into()));
    }

    /// Adds another value for `name`, keeping the existing ones.
    pub fn append_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.push((name.to_owned(), value.into()));
    }

    pub fn remove_header(&mut self, name: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    }
}

impl From<&str> for Response {
    fn from(body: &str) -> Self {
        Self::new(body)
    }
}

impl From<String> for Response {
    fn from(body: String) -> Self {
        Self::new(body)
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200`.
/// Terminated by a body method.
pub struct ResponseBuilder {
    headers: Vec<(String, String)>,
    status: u16,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code.as_u16();
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Terminate with a body and only the headers given so far.
    pub fn body(self, body: impl Into<Vec<u8>>) -> Response {
        Response { body: body.into(), headers: self.headers, status: self.status }
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: Vec<u8>) -> Response {
        self.finish(ContentType::Json, body)
    }

    /// Terminate with a body of the given content type.
    pub fn bytes(self, content_type: ContentType, body: Vec<u8>) -> Response {
        self.finish(content_type, body)
    }

    /// Terminate with no body (e.g. `204`, redirects).
    pub fn no_body(self) -> Response {
        self.body(Vec::new())
    }

    fn finish(self, content_type: ContentType, body: Vec<u8>) -> Response {
        let mut headers = vec![("content-type".to_owned(), content_type.as_str().to_owned())];
        headers.extend(self.headers);
        Response { body, headers, status: self.status }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into a [`Response`].
///
/// Closures passed to [`Road::with`](crate::Road::with) or registered on a
/// [`Router`](crate::Router) may resolve to any `IntoResponse` value; the chain
/// normalizes it before handing it back to the previous middleware.
///
/// Implement it on your own types to return them directly:
///
/// ```rust
/// use road::{IntoResponse, Response};
///
/// struct Greeting(&'static str);
///
/// impl IntoResponse for Greeting {
///     fn into_response(self) -> Response {
///         Response::new(format!("hello, {}", self.0))
///     }
/// }
///
/// assert_eq!(Greeting("road").into_response().text(), "hello, road");
/// ```
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::new(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::new(self) }
}

/// Return a status directly: `Ok(StatusCode::NO_CONTENT)`
impl IntoResponse for StatusCode {
    fn into_response(self) -> Response { Response::empty(self) }
}

impl<S: Into<String>> IntoResponse for (StatusCode, S) {
    fn into_response(self) -> Response {
        let body: String = self.1.into();
        Response::builder().status(self.0).body(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_wrap_as_plain_200() {
        let r = "X".into_response();
        assert_eq!(r, Response { status: 200, body: b"X".to_vec(), headers: vec![] });
        assert_eq!(String::from("X").into_response(), r);
    }

    #[test]
    fn wrapping_a_response_is_a_no_op() {
        let r = Response::redirect(StatusCode::FOUND, "/users");
        assert_eq!(r.clone().into_response().into_response(), r);
    }

    #[test]
    fn not_found_matches_the_chain_default() {
        let r = Response::not_found();
        assert_eq!(r.status(), 404);
        assert_eq!(r.text(), "Page not found");
        assert!(r.headers().is_empty());
    }

    #[test]
    fn set_header_replaces_case_insensitively() {
        let mut r = Response::new("");
        r.append_header("Set-Cookie", "a=1");
        r.append_header("set-cookie", "b=2");
        assert_eq!(r.header_all("SET-COOKIE").collect::<Vec<_>>(), ["a=1", "b=2"]);

        r.set_header("set-cookie", "c=3");
        assert_eq!(r.header_all("set-cookie").collect::<Vec<_>>(), ["c=3"]);
    }

    #[test]
    fn builder_puts_content_type_first() {
        let r = Response::builder()
            .status(StatusCode::CREATED)
            .header("location", "/users/1")
            .bytes(ContentType::Html, b"<p/>".to_vec());
        assert_eq!(r.status(), 201);
        assert_eq!(r.headers()[0], ("content-type".into(), "text/html; charset=utf-8".into()));
        assert_eq!(r.header("location"), Some("/users/1"));
    }

    #[test]
    fn status_tuples_carry_a_body() {
        let r = (StatusCode::IM_A_TEAPOT, "short").into_response();
        assert_eq!(r.status(), 418);
        assert_eq!(r.text(), "short");
    }
}
