//! Per-request tracing span.

use std::time::Instant;

use tracing::{field, info, info_span, Instrument};

use crate::chain::Next;
use crate::context::Context;
use crate::error::Result;
use crate::handler::{BoxFuture, Handler};
use crate::request::Request;
use crate::response::Response;

/// Opens an `info` span named `request` with `method` and `path`, and records
/// `status` and `latency_ms` on it once the rest of the chain resolves.
///
/// Install it first so the span covers every other middleware.
#[derive(Clone, Copy, Debug, Default)]
pub struct Trace;

impl Trace {
    pub fn new() -> Self {
        Self
    }
}

impl Handler for Trace {
    fn call(&self, _cx: Context, req: Request, next: Next) -> BoxFuture<Result<Response>> {
        let span = info_span!(
            "request",
            method = req.method(),
            path = req.path(),
            status = field::Empty,
            latency_ms = field::Empty,
        );
        let started = Instant::now();

        let record = span.clone();
        Box::pin(
            async move {
                let result = next.run(req).await;
                let latency_ms = started.elapsed().as_millis() as u64;
                record.record("latency_ms", latency_ms);
                match &result {
                    Ok(res) => {
                        record.record("status", res.status());
                        info!(status = res.status(), latency_ms, "request finished");
                    }
                    Err(e) => info!(error = %e, latency_ms, "request errored"),
                }
                result
            }
            .instrument(span),
        )
    }
}
