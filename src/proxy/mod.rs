// Proxy module - Pingora service that answers every request itself
//
// Nothing is forwarded upstream: `request_filter` routes the request,
// runs the dispatcher for image paths and writes the full response.

use async_trait::async_trait;
use bytes::Bytes;
use pingora_core::upstreams::peer::HttpPeer;
use pingora_core::Result;
use pingora_proxy::{ProxyHttp, Session};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::Instrument;

pub mod helpers;
pub mod special_endpoints;

use crate::config::Config;
use crate::constants::OVERLOAD_RETRY_AFTER_SECS;
use crate::dispatch::Dispatcher;
use crate::fetcher::{CachingFetcher, FetchError, ImageFetcher};
use crate::image_optimizer::processor::Processor;
use crate::metrics::TransformMetrics;
use crate::pipeline::RequestContext;
use helpers::{decode_request_path, route, write_response, Route};
use special_endpoints::{
    handle_health, handle_method_not_allowed, handle_metrics, handle_overloaded, EndpointResponse,
};

pub struct KagamiProxy {
    dispatcher: Dispatcher,
    request_semaphore: Arc<Semaphore>,
    start_time: Instant,
}

impl KagamiProxy {
    /// Wire the default fetcher and processor from configuration.
    ///
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be built.
    pub fn new(config: &Config) -> std::result::Result<Self, FetchError> {
        let fetcher =
            ImageFetcher::new(&config.fetch)?.with_max_pixels(config.transform.max_source_pixels);
        let overlays = CachingFetcher::new(
            fetcher.clone(),
            config.watermark.cache_entries,
            config.watermark.cache_ttl(),
        );
        let processor = Processor::new(
            config.transform.clone(),
            overlays,
            config.watermark.style(),
        );

        let dispatcher = Dispatcher::new(Arc::new(fetcher), Arc::new(processor));
        Ok(Self::with_dispatcher(
            dispatcher,
            config.server.max_concurrent_requests,
        ))
    }

    pub fn with_dispatcher(dispatcher: Dispatcher, max_concurrent_requests: usize) -> Self {
        Self {
            dispatcher,
            request_semaphore: Arc::new(Semaphore::new(max_concurrent_requests)),
            start_time: Instant::now(),
        }
    }

    pub fn available_permits(&self) -> usize {
        self.request_semaphore.available_permits()
    }

    async fn write_endpoint(
        &self,
        session: &mut Session,
        ctx: &mut RequestContext,
        response: EndpointResponse,
        extra_headers: &[(&'static str, String)],
    ) -> Result<()> {
        ctx.set_status(response.status);
        write_response(
            session,
            response.status,
            response.content_type,
            Bytes::from(response.body),
            extra_headers,
        )
        .await
    }

    async fn serve_image(&self, session: &mut Session, ctx: &mut RequestContext) -> Result<()> {
        let metrics = TransformMetrics::global();

        // Concurrency limit, released when the context is dropped
        match self.request_semaphore.clone().try_acquire_owned() {
            Ok(permit) => ctx.hold_permit(permit),
            Err(_) => {
                tracing::warn!(
                    request_id = %ctx.request_id(),
                    "Rejecting request due to max concurrent requests reached"
                );
                metrics.record_rejection();
                metrics.record_request(503);
                return self
                    .write_endpoint(
                        session,
                        ctx,
                        handle_overloaded(),
                        &[("Retry-After", OVERLOAD_RETRY_AFTER_SECS.to_string())],
                    )
                    .await;
            }
        }

        let path = decode_request_path(ctx.path());
        let span = tracing::info_span!("dispatch", request_id = %ctx.request_id());
        let result = self.dispatcher.dispatch(&path).instrument(span).await;

        match result {
            Ok(response) => {
                metrics.record_request(200);
                ctx.set_status(200);
                write_response(session, 200, response.content_type, response.body, &[]).await
            }
            Err(e) => {
                let status = e.status();
                if status >= 500 {
                    tracing::error!(
                        request_id = %ctx.request_id(),
                        stage = %e.stage,
                        status = status,
                        error = %e,
                        "Image request failed"
                    );
                } else {
                    tracing::warn!(
                        request_id = %ctx.request_id(),
                        stage = %e.stage,
                        status = status,
                        error = %e,
                        "Image request rejected"
                    );
                }

                metrics.record_request(status);
                ctx.set_status(status);
                write_response(
                    session,
                    status,
                    "text/plain; charset=utf-8",
                    Bytes::from(format!("{}\n", e.message)),
                    &[],
                )
                .await
            }
        }
    }
}

#[async_trait]
impl ProxyHttp for KagamiProxy {
    type CTX = RequestContext;

    fn new_ctx(&self) -> Self::CTX {
        RequestContext::new("GET".to_string(), "/".to_string())
    }

    /// Never reached: `request_filter` answers every request.
    async fn upstream_peer(
        &self,
        _session: &mut Session,
        _ctx: &mut Self::CTX,
    ) -> Result<Box<HttpPeer>> {
        Err(pingora_core::Error::explain(
            pingora_core::ErrorType::InternalError,
            "no upstream: all requests are served locally",
        ))
    }

    async fn request_filter(&self, session: &mut Session, ctx: &mut Self::CTX) -> Result<bool> {
        let req = session.req_header();
        let method = req.method.to_string();
        let path = req.uri.path().to_string();
        ctx.set_request_info(method, path);

        match route(ctx.method(), ctx.path()) {
            Route::Health => {
                let response = handle_health(self.start_time, self.available_permits());
                self.write_endpoint(session, ctx, response, &[]).await?
            }
            Route::Metrics => {
                self.write_endpoint(session, ctx, handle_metrics(), &[])
                    .await?
            }
            Route::MethodNotAllowed => {
                let response = handle_method_not_allowed(ctx.method());
                self.write_endpoint(session, ctx, response, &[("Allow", "GET, HEAD".to_string())])
                    .await?
            }
            Route::Image => self.serve_image(session, ctx).await?,
        }

        Ok(true) // Request handled
    }

    async fn logging(
        &self,
        session: &mut Session,
        e: Option<&pingora_core::Error>,
        ctx: &mut Self::CTX,
    ) {
        let status = ctx
            .status()
            .or_else(|| session.response_written().map(|r| r.status.as_u16()))
            .unwrap_or(500);

        if let Some(error) = e {
            tracing::warn!(
                request_id = %ctx.request_id(),
                error = %error,
                "Error while writing response"
            );
        }

        tracing::info!(
            request_id = %ctx.request_id(),
            method = %ctx.method(),
            path = %ctx.path(),
            status = status,
            duration_ms = ctx.elapsed().as_secs_f64() * 1000.0,
            "Request completed"
        );
    }
}
