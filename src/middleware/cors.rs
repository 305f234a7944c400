//! Cross-origin resource sharing.
//!
//! A request without an `origin` header is not a CORS request and passes
//! through untouched. For the rest:
//!
//! - **Preflight** (`OPTIONS` carrying `access-control-request-method`):
//!   answered right here with `200` and the negotiated headers. `next` is never
//!   called.
//! - **Actual request**: `next` runs, then the response is decorated with
//!   `access-control-allow-origin` and friends.
//!
//! An origin that is not allowed gets a response without any CORS headers; the
//! browser then blocks it.

use http::Method;
use tracing::debug;

use crate::chain::Next;
use crate::context::Context;
use crate::error::Result;
use crate::handler::{BoxFuture, Handler};
use crate::request::Request;
use crate::response::Response;

#[derive(Clone, Debug, Eq, PartialEq)]
enum Origins {
    Any,
    List(Vec<String>),
}

impl Origins {
    fn allows(&self, origin: &str) -> bool {
        match self {
            Self::Any => true,
            Self::List(list) => list.iter().any(|o| o == origin),
        }
    }
}

/// The CORS middleware and its configuration.
///
/// ```rust
/// use http::Method;
/// use road::middleware::cors::Cors;
///
/// let cors = Cors::new()
///     .allow_origins(&["https://example.com"])
///     .allow_methods(&[Method::GET, Method::POST])
///     .allow_headers(&["content-type", "authorization"])
///     .expose_headers(&["x-total-count"])
///     .allow_credentials(true)
///     .max_age(3600);
/// ```
#[derive(Clone, Debug)]
pub struct Cors {
    origins: Origins,
    methods: Vec<Method>,
    headers: Vec<String>,
    expose: Vec<String>,
    credentials: bool,
    max_age: Option<u64>,
}

impl Default for Cors {
    fn default() -> Self {
        Self::new()
    }
}

impl Cors {
    /// Any origin; `GET, HEAD, PUT, PATCH, POST, DELETE`; requested headers
    /// echoed back; no credentials.
    pub fn new() -> Self {
        Self {
            origins: Origins::Any,
            methods: vec![
                Method::GET,
                Method::HEAD,
                Method::PUT,
                Method::PATCH,
                Method::POST,
                Method::DELETE,
            ],
            headers: Vec::new(),
            expose: Vec::new(),
            credentials: false,
            max_age: None,
        }
    }

    /// Origins allowed to make requests. A list containing `*` allows any.
    pub fn allow_origins(mut self, origins: &[&str]) -> Self {
        self.origins = if origins.contains(&"*") {
            Origins::Any
        } else {
            Origins::List(origins.iter().map(|o| (*o).to_owned()).collect())
        };
        self
    }

    pub fn allow_methods(mut self, methods: &[Method]) -> Self {
        self.methods = methods.to_vec();
        self
    }

    /// Request headers a preflight may ask for. Left empty, whatever the
    /// preflight asks for is allowed.
    pub fn allow_headers(mut self, headers: &[&str]) -> Self {
        self.headers = headers.iter().map(|h| h.to_ascii_lowercase()).collect();
        self
    }

    /// Response headers the browser may expose to scripts.
    pub fn expose_headers(mut self, headers: &[&str]) -> Self {
        self.expose = headers.iter().map(|h| (*h).to_owned()).collect();
        self
    }

    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.credentials = allow;
        self
    }

    /// How long, in seconds, a browser may cache a preflight answer.
    pub fn max_age(mut self, seconds: u64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// Sets the origin headers shared by preflight and actual responses.
    ///
    /// With credentials on, `*` is not a valid answer, so the origin is echoed.
    fn apply_origin(&self, res: &mut Response, origin: &str) {
        if self.origins == Origins::Any && !self.credentials {
            res.set_header("access-control-allow-origin", "*");
        } else {
            res.set_header("access-control-allow-origin", origin);
            res.append_header("vary", "Origin");
        }
        if self.credentials {
            res.set_header("access-control-allow-credentials", "true");
        }
    }

    fn preflight(&self, req: &Request, origin: &str, requested_method: &str) -> Response {
        let mut res = Response::new("");

        if !self.origins.allows(origin) {
            debug!(origin, "cors preflight from disallowed origin");
            return res;
        }
        if !self.methods.iter().any(|m| m.as_str() == requested_method) {
            debug!(origin, method = requested_method, "cors preflight for disallowed method");
            return res;
        }

        let requested_headers: Vec<String> = req
            .header("access-control-request-headers")
            .map(|h| {
                h.split(',')
                    .map(|s| s.trim().to_ascii_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let allowed_headers = if self.headers.is_empty() {
            requested_headers
        } else {
            if let Some(h) = requested_headers.iter().find(|h| !self.headers.contains(*h)) {
                debug!(origin, header = %h, "cors preflight for disallowed header");
                return res;
            }
            self.headers.clone()
        };

        self.apply_origin(&mut res, origin);
        let methods: Vec<&str> = self.methods.iter().map(Method::as_str).collect();
        res.set_header("access-control-allow-methods", methods.join(", "));
        if !allowed_headers.is_empty() {
            res.set_header("access-control-allow-headers", allowed_headers.join(", "));
        }
        if let Some(age) = self.max_age {
            res.set_header("access-control-max-age", age.to_string());
        }
        res
    }
}

impl Handler for Cors {
    fn call(&self, _cx: Context, req: Request, next: Next) -> BoxFuture<Result<Response>> {
        let Some(origin) = req.header("origin").map(str::to_owned) else {
            return next.run(req);
        };

        if req.method() == Method::OPTIONS.as_str() {
            if let Some(requested) = req.header("access-control-request-method") {
                let res = self.preflight(&req, &origin, requested);
                return Box::pin(async move { Ok(res) });
            }
        }

        let cors = self.clone();
        Box::pin(async move {
            let mut res = next.run(req).await?;
            if cors.origins.allows(&origin) {
                cors.apply_origin(&mut res, &origin);
                if !cors.expose.is_empty() {
                    res.set_header("access-control-expose-headers", cors.expose.join(", "));
                }
            } else {
                debug!(%origin, "cors request from disallowed origin");
            }
            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preflight_req(origin: &str, method: &str, headers: Option<&str>) -> Request {
        let mut h = vec![
            ("origin".to_owned(), origin.to_owned()),
            ("access-control-request-method".to_owned(), method.to_owned()),
        ];
        if let Some(headers) = headers {
            h.push(("access-control-request-headers".to_owned(), headers.to_owned()));
        }
        Request::new("OPTIONS", "/", None, h)
    }

    #[test]
    fn wildcard_answers_star_without_credentials() {
        let cors = Cors::new().max_age(600);
        let res = cors.preflight(&preflight_req("https://a.test", "PUT", Some("X-Token")), "https://a.test", "PUT");
        assert_eq!(res.status(), 200);
        assert_eq!(res.header("access-control-allow-origin"), Some("*"));
        assert_eq!(res.header("access-control-allow-methods"), Some("GET, HEAD, PUT, PATCH, POST, DELETE"));
        assert_eq!(res.header("access-control-allow-headers"), Some("x-token"));
        assert_eq!(res.header("access-control-max-age"), Some("600"));
        assert_eq!(res.header("access-control-allow-credentials"), None);
    }

    #[test]
    fn credentials_echo_the_origin() {
        let cors = Cors::new().allow_credentials(true);
        let res = cors.preflight(&preflight_req("https://a.test", "GET", None), "https://a.test", "GET");
        assert_eq!(res.header("access-control-allow-origin"), Some("https://a.test"));
        assert_eq!(res.header("access-control-allow-credentials"), Some("true"));
        assert_eq!(res.header("vary"), Some("Origin"));
    }

    #[test]
    fn disallowed_preflights_get_no_cors_headers() {
        let cors = Cors::new()
            .allow_origins(&["https://a.test"])
            .allow_methods(&[Method::GET])
            .allow_headers(&["content-type"]);

        let wrong_origin = cors.preflight(&preflight_req("https://b.test", "GET", None), "https://b.test", "GET");
        let wrong_method = cors.preflight(&preflight_req("https://a.test", "DELETE", None), "https://a.test", "DELETE");
        let wrong_header = cors.preflight(&preflight_req("https://a.test", "GET", Some("x-evil")), "https://a.test", "GET");

        for res in [wrong_origin, wrong_method, wrong_header] {
            assert_eq!(res.status(), 200);
            assert!(res.headers().is_empty());
        }
    }

    #[test]
    fn star_in_a_list_means_any() {
        assert_eq!(Cors::new().allow_origins(&["https://a.test", "*"]).origins, Origins::Any);
    }
}
