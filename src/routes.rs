use std::sync::Arc;

use log::{debug, error, Logger};
use warp::http::StatusCode;
use warp::reject;
use warp::reply::{json, with_status, Reply};

use crate::errors::GiftError;

pub mod admin;
mod body;
mod handlers;
mod rejection;
mod response;

pub use internal::*;

/// Request bodies here are a handful of short fields.
const MAX_CONTENT_LENGTH: u64 = 16 * 1024;

pub async fn format_rejection(
    logger: Arc<Logger>,
    rej: reject::Rejection,
) -> Result<Box<dyn Reply>, reject::Rejection> {
    if let Some(r) = rej.find::<rejection::Rejection>() {
        let e = &r.error;
        let status = status_code_for(e);

        if status.is_server_error() {
            error!(logger, "Request failed"; "context" => ?r.context, "error" => ?r.error, "status" => %status, "message" => %r.error);
        } else {
            debug!(logger, "Request refused"; "context" => ?r.context, "status" => %status, "message" => %r.error);
        }

        let flattened = r.flatten();

        return Ok(Box::new(with_status(json(&flattened), status)));
    }

    Err(rej)
}

fn status_code_for(e: &GiftError) -> StatusCode {
    use GiftError::*;

    match e {
        UnknownChoice { .. } | InvalidSessionId { .. } => StatusCode::BAD_REQUEST,
        SessionNotFound | GiftNotFound { .. } => StatusCode::NOT_FOUND,
        TimedOut(..) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

mod internal {
    use warp::body::{content_length_limit, json as json_body};
    use warp::filters::BoxedFilter;
    use warp::path::end;
    use warp::Filter;
    use warp::Reply;
    use warp::{delete, get as g, patch, path as p, path::param as par, post};

    use super::{body as b, format_rejection, handlers, MAX_CONTENT_LENGTH};
    use crate::environment::Environment;
    use crate::intake::FieldUpdate;

    type Route = BoxedFilter<(Box<dyn Reply>,)>;

    macro_rules! route_filter {
        ($route_variable:ident; $first:expr) => (let $route_variable = $route_variable.and($first););
        ($route_variable:ident; $first:expr, $($rest:expr),+) => (
            let $route_variable = $route_variable.and($first);
            route_filter!($route_variable; $($rest),+);
        )
    }

    macro_rules! route {
        ($name:ident => $handler:ident, $route_variable:ident; $($filters:expr),+) => (
            pub fn $name(environment: Environment) -> Route {
                let $route_variable = warp::any().map(move || environment.clone());

                route_filter!($route_variable; $($filters),+);

                $route_variable.and_then(handlers::$handler)
                    .boxed()
            }
        );
    }

    route!(make_options_route => options, rt; p("options"), end(), g());
    route!(make_form_entry_route => options, rt; p("recommend"), end(), g());
    route!(make_start_route => start, rt; p("recommend"), end(), post());
    route!(make_intake_route => intake, rt; p("recommend"), par::<String>(), end(), g());
    route!(make_update_route => update_field, rt; p("recommend"), par::<String>(), end(), patch(), content_length_limit(MAX_CONTENT_LENGTH), json_body::<FieldUpdate>());
    route!(make_interest_route => toggle_interest, rt; p("recommend"), par::<String>(), p("interests"), end(), post(), content_length_limit(MAX_CONTENT_LENGTH), json_body::<b::InterestToggle>());
    route!(make_advance_route => advance, rt; p("recommend"), par::<String>(), p("advance"), end(), post());
    route!(make_retreat_route => retreat, rt; p("recommend"), par::<String>(), p("retreat"), end(), post());
    route!(make_submit_route => submit, rt; p("recommend"), par::<String>(), p("submit"), end(), post());
    route!(make_dismiss_route => dismiss_notice, rt; p("recommend"), par::<String>(), p("dismiss"), end(), post());
    route!(make_abandon_route => abandon, rt; p("recommend"), par::<String>(), end(), delete());
    route!(make_results_route => results, rt; p("results"), par::<String>(), end(), g());
    route!(make_filter_route => filter, rt; p("results"), par::<String>(), p("filter"), end(), post(), content_length_limit(MAX_CONTENT_LENGTH), json_body::<b::FilterChoice>());
    route!(make_favorite_route => toggle_favorite, rt; p("results"), par::<String>(), p("favorites"), par::<u32>(), end(), post());

    /// Every visitor-facing route, with errors turned into JSON responses.
    pub fn make_main_routes(environment: Environment) -> Route {
        let logger = environment.logger.clone();

        make_options_route(environment.clone())
            .or(make_form_entry_route(environment.clone()))
            .unify()
            .or(make_start_route(environment.clone()))
            .unify()
            .or(make_intake_route(environment.clone()))
            .unify()
            .or(make_update_route(environment.clone()))
            .unify()
            .or(make_interest_route(environment.clone()))
            .unify()
            .or(make_advance_route(environment.clone()))
            .unify()
            .or(make_retreat_route(environment.clone()))
            .unify()
            .or(make_submit_route(environment.clone()))
            .unify()
            .or(make_dismiss_route(environment.clone()))
            .unify()
            .or(make_abandon_route(environment.clone()))
            .unify()
            .or(make_results_route(environment.clone()))
            .unify()
            .or(make_filter_route(environment.clone()))
            .unify()
            .or(make_favorite_route(environment))
            .unify()
            .recover(move |r| format_rejection(logger.clone(), r))
            .unify()
            .boxed()
    }
}
