use std::str::FromStr;
use std::time::{Duration, Instant};

use log::{debug, info, o};
use uuid::Uuid;
use warp::http::{StatusCode, Uri};
use warp::reject;
use warp::reply::{json, with_header, with_status, Json, Reply};

use crate::choices::{AgeRange, Budget, Interest, Occasion, Relationship};
use crate::environment::Environment;
use crate::errors::GiftError;
use crate::intake::{FieldUpdate, IntakeSession, SubmitOutcome, INTAKE_PATH};
use crate::results::{ResultsSession, TagFilter};
use crate::routes::{
    body::{FilterChoice, InterestToggle},
    rejection::{Context, Rejection},
    response::{IntakeView, ResultsView, SuccessResponse},
};
use crate::sessions::{parse_session_id, Session, SharedSession};

const SERVER_TIMING_HEADER: &str = "server-timing";
type RouteResult = Result<Box<dyn Reply>, reject::Rejection>;

macro_rules! timed {
    ($($body:tt)+) => {{
        let start = Instant::now();

        let result = { $($body)+ };

        Ok(Box::new(with_header(
            result,
            SERVER_TIMING_HEADER,
            format_server_timing(start.elapsed()),
        )) as Box<dyn Reply>)
    }};
}

pub async fn options(_environment: Environment) -> RouteResult {
    timed! {
        json(&SuccessResponse::Options {
            relationships: Relationship::labels(),
            age_ranges: AgeRange::labels(),
            occasions: Occasion::labels(),
            interests: Interest::labels(),
            budgets: Budget::labels(),
        })
    }
}

pub async fn start(environment: Environment) -> RouteResult {
    timed! {
        let (id, shared) = environment.sessions.create(&environment.logger).await;
        info!(environment.logger, "Starting intake"; "session" => %id);

        let session = shared.lock().await;
        let intake = session
            .intake
            .as_ref()
            .ok_or_else(|| Rejection::new(Context::start(), GiftError::SessionNotFound))?;

        with_status(intake_reply(id, intake, true), StatusCode::CREATED)
    }
}

pub async fn intake(environment: Environment, id: String) -> RouteResult {
    timed! {
        with_intake(&environment, &id, |_| true)
            .await
            .map_err(|e| Rejection::new(Context::intake(&id), e))?
    }
}

pub async fn update_field(environment: Environment, id: String, update: FieldUpdate) -> RouteResult {
    timed! {
        with_intake(&environment, &id, move |intake| intake.update_field(update))
            .await
            .map_err(|e| Rejection::new(Context::intake(&id), e))?
    }
}

pub async fn toggle_interest(
    environment: Environment,
    id: String,
    toggle: InterestToggle,
) -> RouteResult {
    timed! {
        let error_handler = |e: GiftError| Rejection::new(Context::intake(&id), e);

        let interest = Interest::from_str(&toggle.interest).map_err(error_handler)?;

        with_intake(&environment, &id, move |intake| intake.toggle_interest(interest))
            .await
            .map_err(error_handler)?
    }
}

pub async fn advance(environment: Environment, id: String) -> RouteResult {
    timed! {
        with_intake(&environment, &id, IntakeSession::advance)
            .await
            .map_err(|e| Rejection::new(Context::intake(&id), e))?
    }
}

pub async fn retreat(environment: Environment, id: String) -> RouteResult {
    timed! {
        with_intake(&environment, &id, IntakeSession::retreat)
            .await
            .map_err(|e| Rejection::new(Context::intake(&id), e))?
    }
}

pub async fn dismiss_notice(environment: Environment, id: String) -> RouteResult {
    timed! {
        with_intake(&environment, &id, IntakeSession::dismiss_notice)
            .await
            .map_err(|e| Rejection::new(Context::intake(&id), e))?
    }
}

pub async fn submit(environment: Environment, id: String) -> RouteResult {
    timed! {
        submit_intake(&environment, &id)
            .await
            .map_err(|e| Rejection::new(Context::intake(&id), e))?
    }
}

pub async fn abandon(environment: Environment, id: String) -> RouteResult {
    timed! {
        abandon_session(&environment, &id)
            .await
            .map_err(|e| Rejection::new(Context::intake(&id), e))?;

        StatusCode::NO_CONTENT
    }
}

pub async fn results(environment: Environment, id: String) -> RouteResult {
    timed! {
        let view = show_results(&environment, &id)
            .await
            .map_err(|e| Rejection::new(Context::results(&id), e))?;

        or_redirect(view)
    }
}

pub async fn filter(environment: Environment, id: String, choice: FilterChoice) -> RouteResult {
    timed! {
        let view = with_results(&environment, &id, move |view| {
            let filter = TagFilter::from_str(&choice.tag).unwrap_or_default();

            if !view.filter_options().contains(&filter) {
                return Err(GiftError::UnknownChoice {
                    kind: "filter",
                    value: choice.tag,
                });
            }

            view.results_mut().set_filter(filter);
            Ok(true)
        })
        .await
        .map_err(|e| Rejection::new(Context::results(&id), e))?;

        or_redirect(view)
    }
}

pub async fn toggle_favorite(environment: Environment, id: String, gift: u32) -> RouteResult {
    timed! {
        let view = with_results(&environment, &id, move |view| {
            if !view.results().contains(gift) {
                return Err(GiftError::GiftNotFound { id: gift });
            }

            view.results_mut().toggle_favorite(gift);
            Ok(true)
        })
        .await
        .map_err(|e| Rejection::new(Context::favorite(&id, gift), e))?;

        or_redirect(view)
    }
}

fn intake_reply(session: Uuid, intake: &IntakeSession, applied: bool) -> Json {
    json(&SuccessResponse::Intake(IntakeView::new(
        session, intake, applied,
    )))
}

fn results_reply(session: Uuid, view: &ResultsSession, applied: bool) -> Json {
    json(&SuccessResponse::Results(ResultsView::new(
        session, view, applied,
    )))
}

/// Sends visitors without results back to the start of the form.
fn or_redirect(view: Option<Json>) -> Box<dyn Reply> {
    match view {
        Some(view) => Box::new(view),
        None => Box::new(warp::redirect::see_other(Uri::from_static(INTAKE_PATH))),
    }
}

/// Runs one transition against the visitor's form and renders the
/// form afterwards, noting whether the transition was available.
async fn with_intake<F>(environment: &Environment, id: &str, transition: F) -> Result<Json, GiftError>
where
    F: FnOnce(&mut IntakeSession) -> bool,
{
    let session_id = parse_session_id(id)?;
    let shared = environment.sessions.get(&session_id).await?;

    let mut session = shared.lock().await;
    let intake = session.intake.as_mut().ok_or(GiftError::SessionNotFound)?;

    let applied = transition(&mut *intake);

    Ok(intake_reply(session_id, intake, applied))
}

/// Submits the form without holding the session while the request is
/// out, so the visitor can still read or abandon the form meanwhile.
async fn submit_intake(environment: &Environment, id: &str) -> Result<Json, GiftError> {
    let session_id = parse_session_id(id)?;
    let shared = environment.sessions.get(&session_id).await?;

    let pending = {
        let mut session = shared.lock().await;
        let intake = session.intake.as_mut().ok_or(GiftError::SessionNotFound)?;

        match intake.begin_submit() {
            Some(pending) => pending,
            None => return Ok(intake_reply(session_id, intake, false)),
        }
    };

    debug!(environment.logger, "Submitting preferences"; "session" => %session_id, "interests" => pending.profile().interests().len());
    let attempt = pending.attempt();
    let outcome = pending
        .run(environment.recommender.as_ref(), environment.config.timeout())
        .await;

    let mut session = shared.lock().await;
    let Session {
        intake, handoff, ..
    } = &mut *session;
    let intake = intake.as_mut().ok_or(GiftError::SessionNotFound)?;

    let applied = match intake.finish_submit(attempt, outcome) {
        SubmitOutcome::Submitted(profile) => {
            info!(environment.logger, "Handing off preferences"; "session" => %session_id, "interests" => profile.interests().len());
            handoff.deliver(profile);
            true
        }
        SubmitOutcome::Failed(_) => true,
        SubmitOutcome::Unavailable => false,
    };

    Ok(intake_reply(session_id, intake, applied))
}

async fn abandon_session(environment: &Environment, id: &str) -> Result<(), GiftError> {
    let session_id = parse_session_id(id)?;
    let shared = environment.sessions.remove(&session_id).await?;

    let mut session = shared.lock().await;

    if let Some(intake) = session.intake.take() {
        intake.abandon();
    }
    session.results = None;

    info!(environment.logger, "Abandoned session"; "session" => %session_id);

    Ok(())
}

/// Looks up the session behind a results path. Malformed and unknown
/// ids both come back as `None`.
async fn find_session(
    environment: &Environment,
    id: &str,
) -> Result<Option<(Uuid, SharedSession)>, GiftError> {
    let session_id = match parse_session_id(id) {
        Ok(session_id) => session_id,
        Err(_) => return Ok(None),
    };

    match environment.sessions.get(&session_id).await {
        Ok(shared) => Ok(Some((session_id, shared))),
        Err(GiftError::SessionNotFound) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Renders the results, picking the submitted profile up on the first
/// visit. `None` means there is nothing to show.
async fn show_results(environment: &Environment, id: &str) -> Result<Option<Json>, GiftError> {
    let (session_id, shared) = match find_session(environment, id).await? {
        Some(found) => found,
        None => return Ok(None),
    };

    let mut guard = shared.lock().await;
    let session = &mut *guard;

    if session.results.is_none() {
        let logger = environment
            .logger
            .new(o!("session" => session_id.to_string()));

        match ResultsSession::open(
            &mut session.handoff,
            environment.catalog.as_ref(),
            environment.config.timeout(),
            &logger,
        )
        .await
        {
            Ok(opened) => session.results = Some(opened),
            Err(GiftError::MissingProfile) => {
                debug!(logger, "No preferences to show results for");
                return Ok(None);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(session
        .results
        .as_ref()
        .map(|view| results_reply(session_id, view, true)))
}

/// Runs one action against the visitor's results. `None` means there
/// are no results to act on, for the same reasons as in `show_results`.
async fn with_results<F>(environment: &Environment, id: &str, action: F) -> Result<Option<Json>, GiftError>
where
    F: FnOnce(&mut ResultsSession) -> Result<bool, GiftError>,
{
    let (session_id, shared) = match find_session(environment, id).await? {
        Some(found) => found,
        None => return Ok(None),
    };

    let mut session = shared.lock().await;
    let view = match session.results.as_mut() {
        Some(view) => view,
        None => return Ok(None),
    };

    let applied = action(&mut *view)?;

    Ok(Some(results_reply(session_id, view, applied)))
}

fn format_server_timing(elapsed: Duration) -> String {
    format!("handler;dur={}", elapsed.as_secs_f64() * 1000.0)
}
