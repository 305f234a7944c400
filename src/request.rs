//! The request as seen by the chain, and its parsed URL.

use std::collections::HashMap;
use std::fmt;

use http::Uri;

/// Request or response headers as ordered `(name, value)` pairs.
///
/// A header with several values is several pairs sharing a name.
pub type Headers = Vec<(String, String)>;

/// A value captured from a templated path segment by the
/// [`Router`](crate::Router).
///
/// `#name` segments capture [`Arg::Number`], `$name` segments capture
/// [`Arg::Str`]. A `#name` segment only matches digits that fit a `u64`;
/// longer digit strings fall through like any other non-match.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Arg {
    Number(u64),
    Str(String),
}

impl Arg {
    pub fn as_number(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Number(_) => None,
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

/// A parsed request URL.
///
/// The query map and the router's `args` map are separate: a query parameter
/// never shadows a path capture or the other way round.
#[derive(Clone, Debug, Default)]
pub struct Url {
    raw: String,
    path: String,
    query: Option<String>,
    pairs: Vec<(String, String)>,
    args: HashMap<String, Arg>,
}

impl Url {
    /// Parses an origin-form (`/a/b?x=1`) or absolute URL. Never fails: input
    /// that is not a valid URI is split on `?` and `#` by hand.
    pub fn parse(raw: &str) -> Self {
        let (path, query) = match raw.parse::<Uri>() {
            Ok(uri) => (uri.path().to_owned(), uri.query().map(str::to_owned)),
            Err(_) => {
                let without_fragment = raw.split('#').next().unwrap_or_default();
                match without_fragment.split_once('?') {
                    Some((p, q)) => (p.to_owned(), Some(q.to_owned())),
                    None => (without_fragment.to_owned(), None),
                }
            }
        };
        let path = if path.is_empty() { "/".to_owned() } else { path };
        let pairs = query.as_deref()
            .and_then(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok())
            .unwrap_or_default();

        Self { raw: raw.to_owned(), path, query, pairs, args: HashMap::new() }
    }

    /// The URL exactly as the caller passed it.
    pub fn as_str(&self) -> &str { &self.raw }
    pub fn path(&self) -> &str { &self.path }

    /// The raw query string, without the leading `?`.
    pub fn query_string(&self) -> Option<&str> { self.query.as_deref() }

    /// Decoded query pairs in order of appearance.
    pub fn query_pairs(&self) -> &[(String, String)] { &self.pairs }

    /// First decoded value of query parameter `key`.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Path captures filled in by the router that matched this request.
    pub fn args(&self) -> &HashMap<String, Arg> { &self.args }

    pub fn arg(&self, name: &str) -> Option<&Arg> {
        self.args.get(name)
    }

    pub(crate) fn set_args(&mut self, args: HashMap<String, Arg>) {
        self.args = args;
    }
}

/// An incoming request: `(method, url, body, headers)`.
#[derive(Clone, Debug)]
pub struct Request {
    pub(crate) method: String,
    pub(crate) url: Url,
    pub(crate) body: Option<String>,
    pub(crate) headers: Headers,
}

impl Request {
    pub fn new(method: &str, url: &str, body: Option<String>, headers: Headers) -> Self {
        Self { method: method.to_owned(), url: Url::parse(url), body, headers }
    }

    pub fn method(&self) -> &str { &self.method }
    pub fn url(&self) -> &Url { &self.url }
    pub fn url_mut(&mut self) -> &mut Url { &mut self.url }
    pub fn path(&self) -> &str { self.url.path() }
    pub fn body(&self) -> Option<&str> { self.body.as_deref() }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns a path capture.
    ///
    /// For a route `/users/#id`, `req.param("id")` on `/users/42` returns
    /// `Some(&Arg::Number(42))`.
    pub fn param(&self, name: &str) -> Option<&Arg> {
        self.url.arg(name)
    }
}
