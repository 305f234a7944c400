//! Hyper integration.
//!
//! [`RoadService`] is the seam between a hosting server and a [`Road`]: it
//! turns an [`http::Request`] into a `Road::request` call and the resulting
//! [`Response`] back into an [`http::Response`]. An error nothing in the chain
//! caught becomes `500 Internal Server Error` here, and only here.
//!
//! Accepting connections is the host's job:
//!
//! ```rust,ignore
//! let svc = road.into_service();
//! hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
//!     .serve_connection(io, svc)
//!     .await?;
//! ```

use std::convert::Infallible;

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::service::Service;
use tracing::{error, warn};

use crate::chain::Road;
use crate::handler::BoxFuture;
use crate::request::Headers;
use crate::response::Response;

/// A [`Road`] exposed as a hyper [`Service`].
#[derive(Clone, Debug)]
pub struct RoadService {
    road: Road,
}

impl Road {
    /// Wraps the road for use with a hyper connection.
    pub fn into_service(self) -> RoadService {
        RoadService { road: self }
    }
}

impl<B> Service<http::Request<B>> for RoadService
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: std::fmt::Display,
{
    type Response = http::Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = BoxFuture<Result<Self::Response, Infallible>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let road = self.road.clone();
        Box::pin(async move { Ok(dispatch(road, req).await) })
    }
}

async fn dispatch<B>(road: Road, req: http::Request<B>) -> http::Response<Full<Bytes>>
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: std::fmt::Display,
{
    let (parts, body) = req.into_parts();

    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(error = %e, "failed to read request body");
            return into_http(Response::empty(StatusCode::BAD_REQUEST));
        }
    };
    let body = (!bytes.is_empty()).then(|| String::from_utf8_lossy(&bytes).into_owned());

    let headers = convert_headers(&parts.headers);

    let url = parts.uri.path_and_query()
        .map(|pq| pq.as_str().to_owned())
        .unwrap_or_else(|| parts.uri.to_string());

    match road.request(parts.method.as_str(), &url, body, headers).await {
        Ok(res) => into_http(res),
        Err(e) => {
            error!(method = %parts.method, %url, error = %e, "unhandled error");
            into_http(Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body("Internal Server Error"))
        }
    }
}

/// Values that are not visible ASCII are decoded lossily rather than dropped.
fn convert_headers(map: &http::HeaderMap) -> Headers {
    map.iter()
        .map(|(name, value)| {
            let value = match value.to_str() {
                Ok(v) => v.to_owned(),
                Err(_) => {
                    warn!(%name, "request header is not visible ASCII, decoding lossily");
                    String::from_utf8_lossy(value.as_bytes()).into_owned()
                }
            };
            (name.as_str().to_owned(), value)
        })
        .collect()
}

fn into_http(res: Response) -> http::Response<Full<Bytes>> {
    let mut out = http::Response::new(Full::new(Bytes::from(res.body)));
    *out.status_mut() = StatusCode::from_u16(res.status)
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    for (name, value) in res.headers {
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(&value)) {
            (Ok(name), Ok(value)) => {
                out.headers_mut().append(name, value);
            }
            _ => warn!(%name, "dropping invalid response header"),
        }
    }
    out
}
