//! HTTP and WebSocket surface

pub mod rest;
pub mod ws;

use warp::{Filter, Rejection, Reply};

use crate::patients::PatientService;
use crate::realtime::RealtimeCoordinator;

/// Every route the service exposes, with CORS open to any origin.
pub fn routes(
    service: PatientService,
    coordinator: RealtimeCoordinator,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST", "PUT"])
        .allow_header("content-type");

    rest::RestApi::new(service)
        .routes()
        .or(ws::routes(coordinator))
        .with(cors)
}
