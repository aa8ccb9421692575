//! The two-step intake form: who the gift is for, then what they like
//! and what to spend. Transitions whose requirements are not met are
//! simply unavailable; they report `false` and change nothing.

use std::convert::TryFrom;
use std::time::Duration;

use futures::future::{AbortHandle, AbortRegistration, Abortable, Aborted};
use log::{debug, warn, Logger};
use serde::{Deserialize, Serialize};

use crate::choices::{AgeRange, Budget, Interest, Occasion, Relationship};
use crate::errors::SubmissionFailure;
use crate::normalization::{deserialize_option, normalize_text};
use crate::profile::{Interests, PreferenceProfile};
use crate::recommender::Recommender;

/// Where visitors start the form, and where they are sent when they
/// reach the results without having finished it.
pub const INTAKE_PATH: &str = "/recommend";

/// The fields entered so far. Nothing here is validated; the
/// transitions check for presence when they are attempted.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FormDraft {
    pub(crate) recipient_name: Option<String>,
    pub(crate) relationship: Option<Relationship>,
    pub(crate) age_range: Option<AgeRange>,
    pub(crate) occasion: Option<Occasion>,
    pub(crate) interests: Interests,
    pub(crate) budget: Option<Budget>,
    pub(crate) preferences: Option<String>,
}

/// A change to a single field. `None` clears the field.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FieldUpdate {
    #[serde(deserialize_with = "deserialize_option")]
    RecipientName(Option<String>),
    Relationship(Option<Relationship>),
    AgeRange(Option<AgeRange>),
    Occasion(Option<Occasion>),
    Budget(Option<Budget>),
    #[serde(deserialize_with = "deserialize_option")]
    Preferences(Option<String>),
}

impl FormDraft {
    pub fn recipient_name(&self) -> Option<&str> {
        self.recipient_name.as_deref()
    }

    pub fn relationship(&self) -> Option<Relationship> {
        self.relationship
    }

    pub fn age_range(&self) -> Option<AgeRange> {
        self.age_range
    }

    pub fn occasion(&self) -> Option<Occasion> {
        self.occasion
    }

    pub fn interests(&self) -> &Interests {
        &self.interests
    }

    pub fn budget(&self) -> Option<Budget> {
        self.budget
    }

    pub fn preferences(&self) -> Option<&str> {
        self.preferences.as_deref()
    }

    pub(crate) fn apply(&mut self, update: FieldUpdate) {
        match update {
            FieldUpdate::RecipientName(name) => self.recipient_name = name.and_then(normalize_text),
            FieldUpdate::Relationship(relationship) => self.relationship = relationship,
            FieldUpdate::AgeRange(age_range) => self.age_range = age_range,
            FieldUpdate::Occasion(occasion) => self.occasion = occasion,
            FieldUpdate::Budget(budget) => self.budget = budget,
            FieldUpdate::Preferences(text) => self.preferences = text.and_then(normalize_text),
        }
    }

    /// Whether the first step has everything it needs.
    pub fn basics_complete(&self) -> bool {
        self.relationship.is_some() && self.age_range.is_some() && self.occasion.is_some()
    }

    /// Whether the second step has everything it needs.
    pub fn preferences_complete(&self) -> bool {
        !self.interests.is_empty() && self.budget.is_some()
    }

    /// Names the required fields that are still empty, in form order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let checks = [
            ("relationship", self.relationship.is_some()),
            ("age range", self.age_range.is_some()),
            ("occasion", self.occasion.is_some()),
            ("interests", !self.interests.is_empty()),
            ("budget", self.budget.is_some()),
        ];

        checks
            .iter()
            .filter(|(_, present)| !present)
            .map(|(name, _)| *name)
            .collect()
    }
}

/// The page of the form being shown.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    BasicInfo,
    Preferences,
}

impl Step {
    pub fn number(self) -> u8 {
        match self {
            Step::BasicInfo => 1,
            Step::Preferences => 2,
        }
    }

    /// How many steps the form has.
    pub const COUNT: u8 = 2;
}

#[derive(Clone, Debug, PartialEq)]
pub enum IntakeState {
    BasicInfo,
    Preferences,
    Submitting,
    Submitted,

    /// Back on the second step with a notice about the last attempt.
    Failed(SubmissionFailure),
}

/// What came of a call to [`IntakeSession::submit`] or
/// [`IntakeSession::finish_submit`].
#[derive(Clone, Debug, PartialEq)]
pub enum SubmitOutcome {
    /// The submission was not available, or the attempt had been superseded.
    Unavailable,
    Submitted(PreferenceProfile),
    Failed(SubmissionFailure),
}

/// A submission that has left the form and not come back yet.
#[derive(Debug)]
pub struct PendingSubmission {
    attempt: u64,
    profile: PreferenceProfile,
    registration: AbortRegistration,
}

impl PendingSubmission {
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    pub fn profile(&self) -> &PreferenceProfile {
        &self.profile
    }

    /// Sends the request, giving up after `timeout` or as soon as the
    /// owning session is abandoned.
    pub async fn run(
        self,
        recommender: &dyn Recommender,
        timeout: Duration,
    ) -> Result<PreferenceProfile, SubmissionFailure> {
        let request = Abortable::new(recommender.request(self.profile), self.registration);

        match tokio::time::timeout(timeout, request).await {
            Err(_) => Err(SubmissionFailure::TimedOut(timeout)),
            Ok(Err(Aborted)) => Err(SubmissionFailure::Cancelled),
            Ok(Ok(Err(e))) => Err(SubmissionFailure::Rejected(e.to_string())),
            Ok(Ok(Ok(profile))) => Ok(profile),
        }
    }
}

#[derive(Debug)]
struct InFlight {
    attempt: u64,
    handle: AbortHandle,
}

/// One visitor's pass through the form.
pub struct IntakeSession {
    logger: Logger,
    draft: FormDraft,
    state: IntakeState,
    in_flight: Option<InFlight>,
    attempts: u64,
}

impl IntakeSession {
    /// Starts an empty form on the first step.
    pub fn new(logger: Logger) -> Self {
        Self::resume(logger, FormDraft::default())
    }

    /// Starts over on the first step with the given answers filled in.
    pub fn resume(logger: Logger, draft: FormDraft) -> Self {
        IntakeSession {
            logger,
            draft,
            state: IntakeState::BasicInfo,
            in_flight: None,
            attempts: 0,
        }
    }

    pub fn draft(&self) -> &FormDraft {
        &self.draft
    }

    pub fn state(&self) -> &IntakeState {
        &self.state
    }

    /// The page the form is on. Submitting and failed submissions stay
    /// on the second page; a finished form has none.
    pub fn step(&self) -> Option<Step> {
        match self.state {
            IntakeState::BasicInfo => Some(Step::BasicInfo),
            IntakeState::Preferences | IntakeState::Submitting | IntakeState::Failed(_) => {
                Some(Step::Preferences)
            }
            IntakeState::Submitted => None,
        }
    }

    /// The notice left by the last failed submission, if it is still showing.
    pub fn notice(&self) -> Option<&SubmissionFailure> {
        match &self.state {
            IntakeState::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    fn on_second_step(&self) -> bool {
        matches!(self.state, IntakeState::Preferences | IntakeState::Failed(_))
    }

    fn editable(&self) -> bool {
        matches!(
            self.state,
            IntakeState::BasicInfo | IntakeState::Preferences | IntakeState::Failed(_)
        )
    }

    pub fn can_advance(&self) -> bool {
        self.state == IntakeState::BasicInfo && self.draft.basics_complete()
    }

    /// Whether `submit` would go ahead. Also requires the first step to
    /// still be complete, since its fields stay editable on the second.
    pub fn can_submit(&self) -> bool {
        self.on_second_step() && self.draft.basics_complete() && self.draft.preferences_complete()
    }

    pub fn update_field(&mut self, update: FieldUpdate) -> bool {
        if !self.editable() {
            return false;
        }

        debug!(self.logger, "Updating field"; "update" => ?update);
        self.draft.apply(update);

        true
    }

    pub fn toggle_interest(&mut self, interest: Interest) -> bool {
        if !self.on_second_step() {
            return false;
        }

        let selected = self.draft.interests.toggle(interest);
        debug!(self.logger, "Toggled interest"; "interest" => interest.id(), "selected" => selected);

        true
    }

    pub fn advance(&mut self) -> bool {
        if !self.can_advance() {
            return false;
        }

        debug!(self.logger, "Advancing to preferences...");
        self.state = IntakeState::Preferences;

        true
    }

    pub fn retreat(&mut self) -> bool {
        if !self.on_second_step() {
            return false;
        }

        debug!(self.logger, "Going back to basic info...");
        self.state = IntakeState::BasicInfo;

        true
    }

    /// Clears the notice left by a failed submission.
    pub fn dismiss_notice(&mut self) -> bool {
        if self.notice().is_none() {
            return false;
        }

        self.state = IntakeState::Preferences;

        true
    }

    /// Moves to `Submitting` and hands back the finished profile for
    /// the caller to send. Returns `None` when submitting is not
    /// available, including while another submission is in flight.
    pub fn begin_submit(&mut self) -> Option<PendingSubmission> {
        if !self.can_submit() {
            return None;
        }

        let profile = PreferenceProfile::try_from(&self.draft).ok()?;

        self.attempts += 1;
        let attempt = self.attempts;
        let (handle, registration) = AbortHandle::new_pair();

        debug!(self.logger, "Submitting..."; "attempt" => attempt);
        self.in_flight = Some(InFlight { attempt, handle });
        self.state = IntakeState::Submitting;

        Some(PendingSubmission {
            attempt,
            profile,
            registration,
        })
    }

    /// Records how a submission ended. Outcomes for attempts other than
    /// the one in flight are ignored.
    pub fn finish_submit(
        &mut self,
        attempt: u64,
        outcome: Result<PreferenceProfile, SubmissionFailure>,
    ) -> SubmitOutcome {
        match &self.in_flight {
            Some(in_flight) if in_flight.attempt == attempt => {}
            _ => {
                debug!(self.logger, "Ignoring stale submission"; "attempt" => attempt);
                return SubmitOutcome::Unavailable;
            }
        }

        self.in_flight = None;

        match outcome {
            Ok(profile) => {
                debug!(self.logger, "Submitted"; "attempt" => attempt);
                self.draft = FormDraft::default();
                self.state = IntakeState::Submitted;

                SubmitOutcome::Submitted(profile)
            }
            Err(failure) => {
                warn!(self.logger, "Submission failed"; "attempt" => attempt, "error" => %failure);
                self.state = IntakeState::Failed(failure.clone());

                SubmitOutcome::Failed(failure)
            }
        }
    }

    /// Submits the form and waits for the outcome. For callers that own
    /// the session outright; shared sessions should use
    /// [`begin_submit`](Self::begin_submit) and
    /// [`finish_submit`](Self::finish_submit) instead.
    pub async fn submit(&mut self, recommender: &dyn Recommender, timeout: Duration) -> SubmitOutcome {
        let pending = match self.begin_submit() {
            Some(pending) => pending,
            None => return SubmitOutcome::Unavailable,
        };

        let attempt = pending.attempt();
        let outcome = pending.run(recommender, timeout).await;

        self.finish_submit(attempt, outcome)
    }

    /// Leaves the form. Any request still in flight is cancelled and the
    /// draft goes with the session.
    pub fn abandon(self) {
        if let Some(in_flight) = self.in_flight {
            debug!(self.logger, "Cancelling submission"; "attempt" => in_flight.attempt);
            in_flight.handle.abort();
        }

        debug!(self.logger, "Abandoned form");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use futures::future::{BoxFuture, FutureExt};
    use proptest::collection::vec;
    use proptest::option;
    use proptest::prelude::*;
    use proptest::sample::select;

    use super::*;
    use crate::errors::GiftError;
    use crate::recommender::SimulatedRecommender;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn session() -> IntakeSession {
        IntakeSession::new(log::discard())
    }

    fn filled_session() -> IntakeSession {
        let mut session = session();
        session.update_field(FieldUpdate::Relationship(Some(Relationship::Sibling)));
        session.update_field(FieldUpdate::AgeRange(Some(AgeRange::YoungAdult)));
        session.update_field(FieldUpdate::Occasion(Some(Occasion::Graduation)));
        assert!(session.advance());
        assert!(session.toggle_interest(Interest::Gaming));
        session.update_field(FieldUpdate::Budget(Some(Budget::UpTo5000)));
        session
    }

    /// Fails the first `failures` requests, then echoes the profile.
    struct Flaky {
        failures: usize,
        calls: AtomicUsize,
    }

    impl Recommender for Flaky {
        fn request(
            &self,
            profile: PreferenceProfile,
        ) -> BoxFuture<'_, Result<PreferenceProfile, GiftError>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let fail = call < self.failures;

            async move {
                if fail {
                    Err(GiftError::Backend("service unavailable".to_owned()))
                } else {
                    Ok(profile)
                }
            }
            .boxed()
        }
    }

    fn drafts() -> impl Strategy<Value = FormDraft> {
        (
            option::of(select(Relationship::ALL.to_vec())),
            option::of(select(AgeRange::ALL.to_vec())),
            option::of(select(Occasion::ALL.to_vec())),
            vec(select(Interest::ALL.to_vec()), 0..4),
            option::of(select(Budget::ALL.to_vec())),
            option::of("[a-z]{1,8}"),
        )
            .prop_map(
                |(relationship, age_range, occasion, interests, budget, recipient_name)| FormDraft {
                    recipient_name,
                    relationship,
                    age_range,
                    occasion,
                    interests: interests.into(),
                    budget,
                    preferences: None,
                },
            )
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            max_global_rejects: 16384, ..ProptestConfig::default()
        })]

        #[test]
        fn advancing_requires_the_basics(draft in drafts()) {
            let mut session = IntakeSession::resume(log::discard(), draft.clone());
            let advanced = session.advance();

            prop_assert_eq!(advanced, draft.basics_complete());
            prop_assert_eq!(session.step(), Some(if advanced { Step::Preferences } else { Step::BasicInfo }));
            prop_assert_eq!(session.draft(), &draft);
        }

        #[test]
        fn submitting_requires_interests_and_budget(draft in drafts()) {
            let mut session = IntakeSession::resume(log::discard(), draft.clone());
            prop_assume!(session.advance());

            let pending = session.begin_submit();

            prop_assert_eq!(pending.is_some(), draft.preferences_complete());
            prop_assert_eq!(
                session.state() == &IntakeState::Submitting,
                draft.preferences_complete()
            );
            prop_assert_eq!(session.draft(), &draft);
        }

        #[test]
        fn going_back_and_forth_keeps_every_answer(draft in drafts()) {
            let mut session = IntakeSession::resume(log::discard(), draft.clone());
            prop_assume!(session.advance());

            prop_assert!(session.retreat());
            prop_assert!(session.advance());
            prop_assert_eq!(session.draft(), &draft);
        }
    }

    #[test]
    fn field_updates_arrive_as_field_and_value() {
        let update: FieldUpdate =
            serde_json::from_str(r#"{"field": "recipient_name", "value": "  Asha "}"#).unwrap();
        assert_eq!(update, FieldUpdate::RecipientName(Some("Asha".to_owned())));

        let update: FieldUpdate =
            serde_json::from_str(r#"{"field": "budget", "value": "10000+"}"#).unwrap();
        assert_eq!(update, FieldUpdate::Budget(Some(Budget::Above10000)));

        let update: FieldUpdate =
            serde_json::from_str(r#"{"field": "occasion", "value": null}"#).unwrap();
        assert_eq!(update, FieldUpdate::Occasion(None));

        assert!(serde_json::from_str::<FieldUpdate>(r#"{"field": "budget", "value": "lots"}"#).is_err());
    }

    #[test]
    fn interests_only_toggle_on_the_second_step() {
        let mut session = session();

        assert!(!session.toggle_interest(Interest::Books));
        assert!(session.draft().interests().is_empty());
    }

    #[test]
    fn retreating_is_only_possible_from_the_second_step() {
        let mut session = session();

        assert!(!session.retreat());
        assert_eq!(session.state(), &IntakeState::BasicInfo);
    }

    #[test]
    fn clearing_a_basic_field_on_the_second_step_blocks_submission() {
        let mut session = filled_session();
        assert!(session.can_submit());

        session.update_field(FieldUpdate::Occasion(None));

        assert!(!session.can_submit());
        assert!(session.begin_submit().is_none());
        assert_eq!(session.state(), &IntakeState::Preferences);
    }

    #[test]
    fn only_one_submission_can_be_in_flight() {
        let mut session = filled_session();

        let first = session.begin_submit();
        assert!(first.is_some());
        assert!(session.begin_submit().is_none());
        assert!(!session.update_field(FieldUpdate::Budget(None)));
        assert!(!session.retreat());
        assert_eq!(session.state(), &IntakeState::Submitting);
    }

    #[tokio::test]
    async fn successful_submissions_hand_over_the_profile() {
        let mut session = filled_session();
        let recommender = SimulatedRecommender::new(Duration::from_millis(5));

        let outcome = session.submit(&recommender, TIMEOUT).await;

        match outcome {
            SubmitOutcome::Submitted(profile) => {
                assert_eq!(profile.relationship(), Relationship::Sibling);
                assert!(profile.interests().contains(Interest::Gaming));
                assert_eq!(profile.budget(), Budget::UpTo5000);
            }
            other => panic!("unexpected {:?}", other),
        }

        assert_eq!(session.state(), &IntakeState::Submitted);
        assert_eq!(session.step(), None);
        assert_eq!(session.draft(), &FormDraft::default());
        assert!(!session.update_field(FieldUpdate::Budget(None)));
        assert_eq!(session.submit(&recommender, TIMEOUT).await, SubmitOutcome::Unavailable);
    }

    #[tokio::test]
    async fn failed_submissions_keep_the_draft_and_can_be_retried() {
        let mut session = filled_session();
        let draft = session.draft().clone();
        let recommender = Flaky {
            failures: 1,
            calls: AtomicUsize::new(0),
        };

        let outcome = session.submit(&recommender, TIMEOUT).await;

        assert!(matches!(outcome, SubmitOutcome::Failed(SubmissionFailure::Rejected(_))));
        assert!(session.notice().is_some());
        assert_eq!(session.step(), Some(Step::Preferences));
        assert_eq!(session.draft(), &draft);
        assert!(session.can_submit());

        assert!(matches!(
            session.submit(&recommender, TIMEOUT).await,
            SubmitOutcome::Submitted(_)
        ));
    }

    #[tokio::test]
    async fn notices_can_be_dismissed() {
        let mut session = filled_session();
        let recommender = Flaky {
            failures: 1,
            calls: AtomicUsize::new(0),
        };

        session.submit(&recommender, TIMEOUT).await;

        assert!(session.dismiss_notice());
        assert_eq!(session.state(), &IntakeState::Preferences);
        assert!(!session.dismiss_notice());
    }

    #[tokio::test]
    async fn slow_requests_time_out() {
        let mut session = filled_session();
        let recommender = SimulatedRecommender::new(Duration::from_secs(30));
        let timeout = Duration::from_millis(20);

        let outcome = session.submit(&recommender, timeout).await;

        assert_eq!(outcome, SubmitOutcome::Failed(SubmissionFailure::TimedOut(timeout)));
        assert_eq!(session.state(), &IntakeState::Failed(SubmissionFailure::TimedOut(timeout)));
    }

    #[tokio::test]
    async fn abandoning_cancels_the_request() {
        let mut session = filled_session();
        let recommender = Arc::new(SimulatedRecommender::new(Duration::from_secs(30)));
        let pending = session.begin_submit().unwrap();

        let task = {
            let recommender = recommender.clone();
            tokio::spawn(async move { pending.run(recommender.as_ref(), TIMEOUT).await })
        };

        session.abandon();

        assert_eq!(task.await.unwrap(), Err(SubmissionFailure::Cancelled));
    }

    #[tokio::test]
    async fn stale_outcomes_are_ignored() {
        let mut session = filled_session();
        let pending = session.begin_submit().unwrap();
        let profile = pending.profile().clone();

        let outcome = session.finish_submit(pending.attempt() + 1, Ok(profile.clone()));

        assert_eq!(outcome, SubmitOutcome::Unavailable);
        assert_eq!(session.state(), &IntakeState::Submitting);

        let outcome = session.finish_submit(pending.attempt(), Ok(profile.clone()));
        assert_eq!(outcome, SubmitOutcome::Submitted(profile));
    }
}
