use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use warp::http::StatusCode;
use warp::reject;
use warp::reply::{json, Reply};
use warp::Filter;

use super::response::SuccessResponse;
use crate::environment::Environment;

pub fn make_healthz_route(
    environment: Environment,
) -> impl Filter<Extract = (impl Reply,), Error = reject::Rejection> + Clone {
    warp::path("healthz")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(move || {
            let sessions = environment.sessions.clone();

            async move {
                let sessions = sessions.len().await;

                Ok::<_, std::convert::Infallible>(json(&SuccessResponse::Healthz {
                    revision: info::REVISION,
                    timestamp: info::BUILD_TIMESTAMP,
                    version: info::VERSION,
                    sessions,
                }))
            }
        })
}

pub type TerminationFuture = BoxFuture<'static, ()>;

pub type TerminationFunctionWrapper = Arc<dyn Fn() -> TerminationFuture + Send + Sync>;

/// Asks the process to shut down gracefully.
pub fn make_termination_route(
    terminate: TerminationFunctionWrapper,
) -> impl Filter<Extract = (impl Reply,), Error = reject::Rejection> + Clone {
    let handler = move || -> BoxFuture<'static, Result<StatusCode, std::convert::Infallible>> {
        let terminate = terminate.clone();

        async move {
            terminate().await;
            Ok(StatusCode::NO_CONTENT)
        }
        .boxed()
    };

    warp::path("terminate")
        .and(warp::path::end())
        .and(warp::post())
        .and_then(handler)
}
