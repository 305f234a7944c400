//! Cookie parsing and `Set-Cookie` serialization.
//!
//! [`Cookies`] reads the request's `cookie` header into a jar stored on the
//! [`Context`]. Anything downstream can then read cookies and buffer new ones
//! through [`CookieContext`]. When the rest of the chain resolves, every
//! buffered cookie becomes its own `set-cookie` header on the response.
//!
//! ```rust
//! use road::middleware::cookie::{CookieContext, CookieOptions, Cookies};
//! use road::{from_fn, Road};
//!
//! let road = Road::new()
//!     .with(Cookies::new())
//!     .with(from_fn(|cx, _req, _next| async move {
//!         cx.set_cookie("session", "abc", CookieOptions::new().path("/").http_only())?;
//!         Ok("logged in")
//!     }));
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::chain::Next;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::handler::{BoxFuture, Handler};
use crate::request::Request;
use crate::response::Response;

/// The `SameSite` attribute.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax    => "Lax",
            Self::None   => "None",
        }
    }
}

/// Attributes of a cookie being set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CookieOptions {
    max_age: Option<i64>,
    domain: Option<String>,
    path: Option<String>,
    expires: Option<DateTime<Utc>>,
    http_only: bool,
    secure: bool,
    same_site: Option<SameSite>,
}

impl CookieOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lifetime in seconds. Zero or negative expires the cookie immediately.
    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn domain(mut self, domain: &str) -> Self {
        self.domain = Some(domain.to_owned());
        self
    }

    pub fn path(mut self, path: &str) -> Self {
        self.path = Some(path.to_owned());
        self
    }

    pub fn expires(mut self, at: DateTime<Utc>) -> Self {
        self.expires = Some(at);
        self
    }

    pub fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }

    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }
}

#[derive(Clone, Debug)]
struct OutgoingCookie {
    name: String,
    value: String,
    options: CookieOptions,
}

impl OutgoingCookie {
    /// `name=value; Max-Age=…; Domain=…; Path=…; Expires=…; HttpOnly; Secure; SameSite=…`
    fn serialize(&self) -> String {
        let mut out = format!("{}={}", self.name, urlencoding::encode(&self.value));
        let o = &self.options;
        if let Some(age) = o.max_age {
            out.push_str(&format!("; Max-Age={age}"));
        }
        if let Some(domain) = &o.domain {
            out.push_str(&format!("; Domain={domain}"));
        }
        if let Some(path) = &o.path {
            out.push_str(&format!("; Path={path}"));
        }
        if let Some(at) = o.expires {
            out.push_str(&format!("; Expires={}", at.format("%a, %d %b %Y %H:%M:%S GMT")));
        }
        if o.http_only {
            out.push_str("; HttpOnly");
        }
        if o.secure {
            out.push_str("; Secure");
        }
        if let Some(same_site) = o.same_site {
            out.push_str("; SameSite=");
            out.push_str(same_site.as_str());
        }
        out
    }
}

/// Per-request cookie state held in the context.
#[derive(Clone, Debug, Default)]
struct CookieJar {
    incoming: HashMap<String, String>,
    outgoing: Vec<OutgoingCookie>,
}

/// Parses every `cookie` header of the request. The first occurrence of a
/// name wins; values are unquoted and percent-decoded.
fn parse_cookie_header(req: &Request) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    let pairs = req.headers().iter()
        .filter(|(k, _)| k.eq_ignore_ascii_case("cookie"))
        .flat_map(|(_, v)| v.split(';'));

    for pair in pairs {
        let Some((name, value)) = pair.split_once('=') else { continue };
        let name = name.trim();
        if name.is_empty() || cookies.contains_key(name) {
            continue;
        }
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        let decoded = urlencoding::decode(value)
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| value.to_owned());
        cookies.insert(name.to_owned(), decoded);
    }
    cookies
}

/// RFC 6265 `token`: visible ASCII minus separators.
fn is_token(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b)
        })
}

/// The cookie middleware.
#[derive(Clone, Copy, Debug, Default)]
pub struct Cookies;

impl Cookies {
    pub fn new() -> Self {
        Self
    }
}

impl Handler for Cookies {
    fn call(&self, cx: Context, req: Request, next: Next) -> BoxFuture<Result<Response>> {
        cx.insert(CookieJar { incoming: parse_cookie_header(&req), outgoing: Vec::new() });

        Box::pin(async move {
            let mut res = next.run(req).await?;
            let outgoing = cx
                .with(|jar: &mut CookieJar| std::mem::take(&mut jar.outgoing))
                .unwrap_or_default();
            for cookie in &outgoing {
                res.append_header("set-cookie", cookie.serialize());
            }
            Ok(res)
        })
    }
}

/// Cookie access on a [`Context`] travelling behind [`Cookies`].
pub trait CookieContext {
    /// Buffers a cookie; it is sent as a `set-cookie` header once the chain
    /// resolves.
    fn set_cookie(&self, name: &str, value: &str, options: CookieOptions) -> Result<()>;

    /// The request's cookies merged with the ones set so far. A buffered cookie
    /// overrides an incoming one of the same name.
    fn cookies(&self) -> Result<HashMap<String, String>>;

    fn cookie(&self, name: &str) -> Result<Option<String>> {
        Ok(self.cookies()?.remove(name))
    }
}

impl CookieContext for Context {
    fn set_cookie(&self, name: &str, value: &str, options: CookieOptions) -> Result<()> {
        if !is_token(name) {
            return Err(Error::InvalidCookie { name: name.to_owned() });
        }
        let cookie = OutgoingCookie { name: name.to_owned(), value: value.to_owned(), options };
        self.with(|jar: &mut CookieJar| jar.outgoing.push(cookie))
            .ok_or(Error::MissingCapability("cookies"))
    }

    fn cookies(&self) -> Result<HashMap<String, String>> {
        self.with(|jar: &mut CookieJar| {
            let mut merged = jar.incoming.clone();
            for cookie in &jar.outgoing {
                merged.insert(cookie.name.clone(), cookie.value.clone());
            }
            merged
        })
        .ok_or(Error::MissingCapability("cookies"))
    }
}
