//! HTTP exposure of the aggregator's current snapshot and exports.
//!
//! Pure wiring around [`AggregatorState`] — the state itself has no
//! knowledge of HTTP, following the same `hyper` + `service_fn` shape as
//! `simmesh_core::health::HealthServer`.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use simmesh_core::shutdown::ShutdownToken;
use tokio::net::TcpListener;
use tracing::{debug, warn};

use crate::export;
use crate::state::AggregatorState;
use crate::AggregatorError;

fn unix_timestamp() -> f64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs_f64()
}

/// Serves `/health`, `/snapshot` and `/export/{json,csv,stats.csv,convergence.csv}`
/// on `addr` until `shutdown` reports a requested shutdown. `refresh_interval_ms`
/// is echoed back on `/snapshot` so polling clients can pick up the configured
/// cadence instead of hardcoding one.
pub async fn serve(
    addr: SocketAddr,
    state: Arc<AggregatorState>,
    refresh_interval_ms: u64,
    mut shutdown: ShutdownToken,
) -> Result<(), AggregatorError> {
    let listener = TcpListener::bind(addr).await.map_err(|e| AggregatorError::Http(e.to_string()))?;
    debug!(%addr, "aggregator http server listening");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            accepted = listener.accept() => {
                let (stream, _) = accepted.map_err(|e| AggregatorError::Http(e.to_string()))?;
                let io = TokioIo::new(stream);
                let state = Arc::clone(&state);

                tokio::spawn(async move {
                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle(req, state, refresh_interval_ms).await }
                    });
                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        if !err.is_incomplete_message() {
                            warn!(error = %err, "aggregator http connection error");
                        }
                    }
                });
            }
        }
    }
}

async fn handle(req: Request<Incoming>, state: Arc<AggregatorState>, refresh_interval_ms: u64) -> Result<Response<String>, Infallible> {
    let response = match (req.method(), req.uri().path()) {
        (&Method::GET, "/health") => ok_json(r#"{"status":"healthy"}"#.to_string()),
        (&Method::GET, "/snapshot") => {
            let mut body = match serde_json::to_value(state.snapshot()) {
                Ok(value) => value,
                Err(err) => return Ok(internal_error(err.to_string())),
            };
            if let Some(obj) = body.as_object_mut() {
                obj.insert("refresh_interval_ms".to_string(), refresh_interval_ms.into());
            }
            match serde_json::to_string_pretty(&body) {
                Ok(body) => ok_json(body),
                Err(err) => internal_error(err.to_string()),
            }
        }
        (&Method::GET, "/export/json") => {
            match export::to_json(&state.snapshot(), &state.results(), &state.raw_results(), unix_timestamp()) {
                Ok(body) => ok_json(body),
                Err(err) => internal_error(err.to_string()),
            }
        }
        (&Method::GET, "/export/csv") => match export::results_csv(&state.snapshot(), &state.raw_results()) {
            Ok(body) => ok_csv(body),
            Err(err) => internal_error(err.to_string()),
        },
        (&Method::GET, "/export/stats.csv") => match export::stats_csv(&state.snapshot()) {
            Ok(body) => ok_csv(body),
            Err(err) => internal_error(err.to_string()),
        },
        (&Method::GET, "/export/convergence.csv") => match export::convergence_csv(&state.snapshot()) {
            Ok(body) => ok_csv(body),
            Err(err) => internal_error(err.to_string()),
        },
        _ => Response::builder().status(StatusCode::NOT_FOUND).body("Not Found".to_string()).unwrap(),
    };
    Ok(response)
}

fn ok_json(body: String) -> Response<String> {
    Response::builder().status(StatusCode::OK).header("Content-Type", "application/json").body(body).unwrap()
}

fn ok_csv(body: String) -> Response<String> {
    Response::builder().status(StatusCode::OK).header("Content-Type", "text/csv").body(body).unwrap()
}

fn internal_error(message: String) -> Response<String> {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header("Content-Type", "application/json")
        .body(format!(r#"{{"error":{:?}}}"#, message))
        .unwrap()
}
