use serde::Serialize;
use uuid::Uuid;

use crate::currency::format_price;
use crate::gift::GiftItem;
use crate::intake::{FormDraft, IntakeSession, IntakeState, Step};
use crate::label::Label;
use crate::results::{EmptyState, Listing, RecipientSummary, ResultsSession, TagFilter};

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SuccessResponse<'a> {
    Healthz {
        revision: Option<&'a str>,
        timestamp: Option<&'a str>,
        version: &'a str,
        sessions: usize,
    },
    Options {
        relationships: Vec<Label>,
        age_ranges: Vec<Label>,
        occasions: Vec<Label>,
        interests: Vec<Label>,
        budgets: Vec<Label>,
    },
    Intake(IntakeView<'a>),
    Results(ResultsView<'a>),
}

/// The form as the visitor should see it after a request.
#[derive(Debug, Serialize)]
pub struct IntakeView<'a> {
    pub(crate) session: Uuid,

    /// Whether the requested transition happened.
    pub(crate) applied: bool,

    pub(crate) state: &'static str,
    pub(crate) step: Option<Step>,
    pub(crate) step_number: Option<u8>,
    pub(crate) steps: u8,
    pub(crate) draft: &'a FormDraft,
    pub(crate) missing: Vec<&'static str>,
    pub(crate) can_advance: bool,
    pub(crate) can_submit: bool,
    pub(crate) notice: Option<String>,

    /// Where to go once the form has been submitted.
    pub(crate) next: Option<String>,
}

impl<'a> IntakeView<'a> {
    pub fn new(session: Uuid, intake: &'a IntakeSession, applied: bool) -> Self {
        let step = intake.step();
        let next = match intake.state() {
            IntakeState::Submitted => Some(format!("/results/{}", session)),
            _ => None,
        };

        IntakeView {
            session,
            applied,
            state: state_name(intake.state()),
            step,
            step_number: step.map(Step::number),
            steps: Step::COUNT,
            draft: intake.draft(),
            missing: intake.draft().missing_fields(),
            can_advance: intake.can_advance(),
            can_submit: intake.can_submit(),
            notice: intake.notice().map(|failure| failure.to_string()),
            next,
        }
    }
}

fn state_name(state: &IntakeState) -> &'static str {
    match state {
        IntakeState::BasicInfo => "basic_info",
        IntakeState::Preferences => "preferences",
        IntakeState::Submitting => "submitting",
        IntakeState::Submitted => "submitted",
        IntakeState::Failed(_) => "failed",
    }
}

/// A gift as shown on its card.
#[derive(Debug, Serialize)]
pub struct GiftCard<'a> {
    #[serde(flatten)]
    pub(crate) item: &'a GiftItem,
    pub(crate) price_label: String,
    pub(crate) favorite: bool,
}

/// The results page as the visitor should see it after a request.
#[derive(Debug, Serialize)]
pub struct ResultsView<'a> {
    pub(crate) session: Uuid,
    pub(crate) applied: bool,
    pub(crate) recipient: RecipientSummary,
    pub(crate) filters: Vec<TagFilter>,
    pub(crate) active_filter: &'a TagFilter,
    pub(crate) fallback: bool,
    pub(crate) gifts: Vec<GiftCard<'a>>,
    pub(crate) empty: Option<EmptyState>,
}

impl<'a> ResultsView<'a> {
    pub fn new(session: Uuid, view: &'a ResultsSession, applied: bool) -> Self {
        let results = view.results();

        let (gifts, empty) = match results.listing() {
            Listing::Gifts(items) => (
                items
                    .into_iter()
                    .map(|item| GiftCard {
                        item,
                        price_label: format_price(item.price()),
                        favorite: results.is_favorite(item.id()),
                    })
                    .collect(),
                None,
            ),
            Listing::Empty(empty) => (Vec::new(), Some(empty)),
        };

        ResultsView {
            session,
            applied,
            recipient: view.summary(),
            filters: view.filter_options(),
            active_filter: results.active_filter(),
            fallback: results.used_fallback(),
            gifts,
            empty,
        }
    }
}
