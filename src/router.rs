//! Templated path router.
//!
//! A [`Router`] is itself one middleware. Installed on a road, it tries its
//! routes in registration order; the first route whose method and template
//! both match gets the request, with the template's captures attached to the
//! request URL. When nothing matches it calls `next`, so several routers (or a
//! router and a fallback) compose on the same road.
//!
//! Template segments:
//!
//! | Segment | Matches | Captured as |
//! |---|---|---|
//! | `users` | exactly `users` | — |
//! | `#id` | decimal digits only | [`Arg::Number`] |
//! | `$name` | any segment | [`Arg::Str`] |
//!
//! Segment counts must be equal: there are no wildcard tails and no prefix
//! matches.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::{Method, StatusCode};
use tracing::trace;

use crate::chain::{Next, Road};
use crate::context::Context;
use crate::error::Result;
use crate::handler::{boxed, BoxFuture, BoxedHandler, Handler};
use crate::request::{Arg, Request};
use crate::response::Response;

// ── Template ──────────────────────────────────────────────────────────────────

#[derive(Debug, Eq, PartialEq)]
enum Segment {
    Literal(String),
    Number(String),
    Str(String),
}

struct Template {
    raw: String,
    segments: Vec<Segment>,
}

impl Template {
    fn parse(raw: &str) -> Self {
        let segments = split(raw)
            .map(|s| {
                if let Some(name) = s.strip_prefix('#') {
                    Segment::Number(name.to_owned())
                } else if let Some(name) = s.strip_prefix('$') {
                    Segment::Str(name.to_owned())
                } else {
                    Segment::Literal(s.to_owned())
                }
            })
            .collect();
        Self { raw: raw.to_owned(), segments }
    }

    /// The captures for `path`, or `None` when it does not fit the template.
    fn captures(&self, path: &str) -> Option<HashMap<String, Arg>> {
        let actual: Vec<&str> = split(path).collect();
        if actual.len() != self.segments.len() {
            return None;
        }

        let mut args = HashMap::new();
        for (segment, value) in self.segments.iter().zip(actual) {
            match segment {
                Segment::Literal(lit) if lit == value => {}
                Segment::Literal(_) => return None,
                Segment::Number(name) => {
                    args.insert(name.clone(), Arg::Number(parse_number(value)?));
                }
                Segment::Str(name) => {
                    args.insert(name.clone(), Arg::Str(value.to_owned()));
                }
            }
        }
        Some(args)
    }
}

/// Splits on `/`, dropping the empty segment a leading slash produces.
fn split(path: &str) -> std::str::Split<'_, char> {
    path.strip_prefix('/').unwrap_or(path).split('/')
}

fn parse_number(segment: &str) -> Option<u64> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// `prefix` + `path`, except that a non-empty prefix on the root path is the
/// prefix alone (`/api` + `/` is `/api`, not `/api/`).
fn join(prefix: &str, path: &str) -> String {
    if !prefix.is_empty() && path == "/" {
        prefix.to_owned()
    } else {
        format!("{prefix}{path}")
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

struct Route {
    method: Method,
    template: Template,
    handler: BoxedHandler,
}

/// The route table.
///
/// Each registration returns `self` so calls chain naturally. Populate it
/// before traffic starts, then install it with
/// [`apply_middleware`](Router::apply_middleware) or [`Road::with`].
///
/// ```rust
/// use road::{from_fn, Road, Router};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> road::Result<()> {
/// let mut road = Road::new();
/// Router::new()
///     .get("/users/#id", from_fn(|_cx, req, _next| async move {
///         Ok(format!("user {}", req.param("id").unwrap()))
///     }))
///     .apply_middleware(&mut road);
///
/// assert_eq!(road.request("GET", "/users/7", None, vec![]).await?.text(), "user 7");
/// assert_eq!(road.request("GET", "/users/x", None, vec![]).await?.status(), 404);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `method` on `path`.
    pub fn on(self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.on_paths(method, &[path], handler)
    }

    /// Registers one handler for `method` under every path in `paths`.
    pub fn on_paths(mut self, method: Method, paths: &[&str], handler: impl Handler) -> Self {
        let handler = boxed(handler);
        for path in paths {
            self.insert(method.clone(), path, Arc::clone(&handler));
        }
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::GET, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::POST, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::PUT, path, handler)
    }

    pub fn patch(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::PATCH, path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::DELETE, path, handler)
    }

    pub fn options(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::OPTIONS, path, handler)
    }

    /// Registers every route of `file`, each path prefixed with `prefix`.
    pub fn add_route_file(mut self, file: RouteFile, prefix: Option<&str>) -> Self {
        let prefix = prefix.unwrap_or_default();
        for (path, methods) in file.entries {
            let path = join(prefix, &path);
            for (method, handler) in methods {
                self.insert(method, &path, handler);
            }
        }
        self
    }

    /// Installs this router as one middleware on `road`.
    pub fn apply_middleware(self, road: &mut Road) {
        road.push(self);
    }

    /// Methods with a route whose template fits `path`, in registration order.
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut methods: Vec<Method> = Vec::new();
        for route in &self.routes {
            if !methods.contains(&route.method) && route.template.captures(path).is_some() {
                methods.push(route.method.clone());
            }
        }
        methods
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    fn insert(&mut self, method: Method, path: &str, handler: BoxedHandler) {
        self.routes.push(Route { method, template: Template::parse(path), handler });
    }
}

impl Handler for Router {
    fn call(&self, cx: Context, mut req: Request, next: Next) -> BoxFuture<Result<Response>> {
        for route in &self.routes {
            // Cheap check first.
            if route.method.as_str() != req.method() {
                continue;
            }
            if let Some(args) = route.template.captures(req.path()) {
                trace!(method = req.method(), template = %route.template.raw, "route matched");
                req.url_mut().set_args(args);
                return route.handler.call(cx, req, next);
            }
        }

        let allowed = self.allowed_methods(req.path());
        if !allowed.is_empty() {
            record_allowed(&cx, allowed);
        }
        next.run(req)
    }
}

/// Merges into what earlier routers on the same road recorded.
fn record_allowed(cx: &Context, allowed: Vec<Method>) {
    let merged = cx.with(|seen: &mut AllowedMethods| {
        for method in &allowed {
            if !seen.0.contains(method) {
                seen.0.push(method.clone());
            }
        }
    });
    if merged.is_none() {
        cx.insert(AllowedMethods(allowed));
    }
}

/// Left on the context by routers that knew the request's path but not its
/// method: the methods they would have accepted, in the order the routers ran.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AllowedMethods(pub Vec<Method>);

/// Terminal fallback answering `405 Method Not Allowed`, with an `allow`
/// header, for paths an earlier router recognized under other methods.
/// Everything else falls through to `404`.
///
/// Install it after every router.
#[derive(Clone, Copy, Debug, Default)]
pub struct MethodNotAllowed;

impl Handler for MethodNotAllowed {
    fn call(&self, cx: Context, req: Request, next: Next) -> BoxFuture<Result<Response>> {
        let Some(AllowedMethods(methods)) = cx.get::<AllowedMethods>() else {
            return next.run(req);
        };
        let allow: Vec<&str> = methods.iter().map(Method::as_str).collect();
        let res = Response::builder()
            .status(StatusCode::METHOD_NOT_ALLOWED)
            .header("allow", &allow.join(", "))
            .no_body();
        Box::pin(async move { Ok(res) })
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.routes.iter().map(|r| format!("{} {}", r.method, r.template.raw)))
            .finish()
    }
}

// ── RouteFile ─────────────────────────────────────────────────────────────────

/// A table of `path → method → handler`, loaded in bulk by
/// [`Router::add_route_file`].
///
/// Lets a module export its routes as one value and leave the mount point to
/// whoever loads it:
///
/// ```rust
/// use http::{Method, StatusCode};
/// use road::{from_fn, RouteFile, Router};
///
/// fn user_routes() -> RouteFile {
///     RouteFile::new()
///         .route("/", Method::GET, from_fn(|_cx, _req, _next| async { Ok("all users") }))
///         .route("/#id", Method::GET, from_fn(|_cx, _req, _next| async { Ok("one user") }))
/// }
///
/// let router = Router::new().add_route_file(user_routes(), Some("/users"));
/// assert_eq!(router.len(), 2);
/// ```
#[derive(Default)]
pub struct RouteFile {
    entries: Vec<(String, Vec<(Method, BoxedHandler)>)>,
}

impl RouteFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `handler` for `method` on `path`. Paths keep the order in which
    /// they were first seen.
    pub fn route(mut self, path: &str, method: Method, handler: impl Handler) -> Self {
        let handler = boxed(handler);
        match self.entries.iter_mut().find(|(p, _)| p == path) {
            Some((_, methods)) => methods.push((method, handler)),
            None => self.entries.push((path.to_owned(), vec![(method, handler)])),
        }
        self
    }
}
