use axum::{body::Body, http::Request};
use std::time::Duration;
use tower_http::classify::{ServerErrorsAsFailures, ServerErrorsFailureClass, SharedClassifier};
use tower_http::trace::{DefaultOnBodyChunk, DefaultOnEos, DefaultOnResponse, MakeSpan, TraceLayer};
use tracing::{Level, Span, error, info};

const REQUEST_ID_HEADER: &str = "x-request-id";

type EdgeTraceLayer = TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    EdgeMakeSpan,
    fn(&Request<Body>, &Span),
    DefaultOnResponse,
    DefaultOnBodyChunk,
    DefaultOnEos,
    fn(ServerErrorsFailureClass, Duration, &Span),
>;

#[derive(Clone, Default)]
pub(crate) struct EdgeMakeSpan;

impl<B> MakeSpan<B> for EdgeMakeSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("n/a");

        tracing::info_span!(
            "edge_request",
            method = %request.method(),
            path = %request.uri().path(),
            request_id = %request_id,
        )
    }
}

fn on_request(request: &Request<Body>, span: &Span) {
    span.in_scope(|| {
        info!(
            method = %request.method(),
            path = %request.uri().path(),
            "request received"
        );
    });
}

fn on_failure(error: ServerErrorsFailureClass, latency: Duration, span: &Span) {
    span.in_scope(|| {
        error!(error = %error, latency = ?latency, "request failed");
    });
}

/// Request logging for every route the edge serves, redirects included.
pub(crate) fn create_trace_layer() -> EdgeTraceLayer {
    TraceLayer::new_for_http()
        .make_span_with(EdgeMakeSpan)
        .on_request(on_request as fn(&Request<Body>, &Span))
        .on_response(DefaultOnResponse::new().level(Level::INFO))
        .on_failure(on_failure as fn(ServerErrorsFailureClass, Duration, &Span))
}
