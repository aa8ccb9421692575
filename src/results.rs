//! Turning a submitted profile into the list of gifts shown for it.
//!
//! Recommendations are plain filtering: an item qualifies when it shares
//! at least one tag with the recipient's interests and its price fits
//! the budget. When nothing qualifies the whole catalog is shown
//! instead, so a non-empty catalog never yields an empty base result.
//! Narrowing that result by a single tag afterwards has no such
//! fallback; an empty view is reported as such.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use log::{debug, info, Logger};
use serde::{Serialize, Serializer};

use crate::catalog::Catalog;
use crate::choices::BudgetRange;
use crate::errors::GiftError;
use crate::gift::GiftItem;
use crate::handoff::Handoff;
use crate::intake::INTAKE_PATH;
use crate::profile::{Interests, PreferenceProfile};

/// What an item has to satisfy to be recommended.
#[derive(Clone, Debug, PartialEq)]
pub struct Criteria {
    interests: Interests,
    budget: Option<BudgetRange>,
}

impl Criteria {
    pub fn new(interests: Interests, budget: Option<BudgetRange>) -> Self {
        Criteria { interests, budget }
    }

    /// Whether the item passes both the interest and the budget test.
    /// Either test is skipped when its criterion is absent.
    pub fn admits(&self, item: &GiftItem) -> bool {
        let interesting = self.interests.is_empty()
            || self
                .interests
                .matches_any(item.tags().iter().map(String::as_str));
        let affordable = self.budget.map_or(true, |b| b.contains(item.price()));

        interesting && affordable
    }
}

impl From<&PreferenceProfile> for Criteria {
    fn from(profile: &PreferenceProfile) -> Self {
        Criteria::new(profile.interests().clone(), Some(profile.budget().range()))
    }
}

/// Filters the catalog, keeping catalog order. Falls back to the whole
/// catalog when nothing qualifies; the flag reports whether it did.
pub fn filter_catalog(criteria: &Criteria, catalog: &[GiftItem]) -> (Vec<GiftItem>, bool) {
    let matching: Vec<GiftItem> = catalog
        .iter()
        .filter(|item| criteria.admits(item))
        .cloned()
        .collect();

    if matching.is_empty() {
        (catalog.to_vec(), true)
    } else {
        (matching, false)
    }
}

/// Computes the base result for a profile.
pub fn compute_results(profile: &PreferenceProfile, catalog: &[GiftItem]) -> ResultSet {
    let (items, fallback) = filter_catalog(&Criteria::from(profile), catalog);

    ResultSet::new(items, fallback)
}

/// Narrows items to those carrying the tag. `All` keeps everything.
pub fn apply_tag_filter<'a>(items: &'a [GiftItem], filter: &TagFilter) -> Vec<&'a GiftItem> {
    match filter {
        TagFilter::All => items.iter().collect(),
        TagFilter::Tag(tag) => items.iter().filter(|item| item.has_tag(tag)).collect(),
    }
}

/// A single-tag narrowing of the results.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum TagFilter {
    All,
    Tag(String),
}

impl TagFilter {
    pub const ALL: &'static str = "all";

    pub fn as_str(&self) -> &str {
        match self {
            TagFilter::All => Self::ALL,
            TagFilter::Tag(tag) => tag,
        }
    }
}

impl Default for TagFilter {
    fn default() -> Self {
        TagFilter::All
    }
}

impl FromStr for TagFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s == Self::ALL {
            TagFilter::All
        } else {
            TagFilter::Tag(s.to_owned())
        })
    }
}

impl fmt::Display for TagFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TagFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The gifts found for a profile plus what the visitor has done with
/// them. The items never change; filters and favorites only affect what
/// is shown.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultSet {
    items: Vec<GiftItem>,
    favorites: BTreeSet<u32>,
    active_filter: TagFilter,
    fallback: bool,
}

impl ResultSet {
    fn new(items: Vec<GiftItem>, fallback: bool) -> Self {
        ResultSet {
            items,
            favorites: BTreeSet::new(),
            active_filter: TagFilter::All,
            fallback,
        }
    }

    /// The base result.
    pub fn items(&self) -> &[GiftItem] {
        &self.items
    }

    /// Whether the base result is the whole catalog because nothing matched.
    pub fn used_fallback(&self) -> bool {
        self.fallback
    }

    pub fn active_filter(&self) -> &TagFilter {
        &self.active_filter
    }

    pub fn favorites(&self) -> &BTreeSet<u32> {
        &self.favorites
    }

    pub fn contains(&self, id: u32) -> bool {
        self.items.iter().any(|item| item.id() == id)
    }

    /// Replaces the active filter. Filters never stack.
    pub fn set_filter(&mut self, filter: TagFilter) {
        self.active_filter = filter;
    }

    pub fn with_filter(mut self, filter: TagFilter) -> Self {
        self.set_filter(filter);
        self
    }

    /// The items the active filter lets through.
    pub fn visible(&self) -> Vec<&GiftItem> {
        apply_tag_filter(&self.items, &self.active_filter)
    }

    /// Either the visible items or, if there are none, what to show instead.
    pub fn listing(&self) -> Listing<'_> {
        let visible = self.visible();

        if visible.is_empty() {
            Listing::Empty(EmptyState::default())
        } else {
            Listing::Gifts(visible)
        }
    }

    /// Marks or unmarks a gift as a favorite. Returns whether it is a
    /// favorite afterwards.
    pub fn toggle_favorite(&mut self, id: u32) -> bool {
        if self.favorites.remove(&id) {
            false
        } else {
            self.favorites.insert(id);
            true
        }
    }

    pub fn is_favorite(&self, id: u32) -> bool {
        self.favorites.contains(&id)
    }
}

#[derive(Debug, PartialEq)]
pub enum Listing<'a> {
    Gifts(Vec<&'a GiftItem>),
    Empty(EmptyState),
}

/// Shown in place of the list when a tag filter leaves nothing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EmptyState {
    pub title: &'static str,
    pub message: &'static str,
    pub action: &'static str,
    pub path: &'static str,
}

impl Default for EmptyState {
    fn default() -> Self {
        EmptyState {
            title: "No gifts found",
            message: "We couldn't find any gifts matching your current filters. Try changing your preferences.",
            action: "Adjust Preferences",
            path: INTAKE_PATH,
        }
    }
}

/// Who the results are for, as shown beside the list.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecipientSummary {
    pub name: String,
    pub relationship: &'static str,
    pub age_range: &'static str,
    pub occasion: &'static str,
    pub budget: &'static str,
}

impl From<&PreferenceProfile> for RecipientSummary {
    fn from(profile: &PreferenceProfile) -> Self {
        RecipientSummary {
            name: profile.recipient_name().unwrap_or("Someone special").to_owned(),
            relationship: profile.relationship().label(),
            age_range: profile.age_range().label(),
            occasion: profile.occasion().label(),
            budget: profile.budget().label(),
        }
    }
}

/// One visitor's look at the results for a submitted profile.
#[derive(Clone, Debug)]
pub struct ResultsSession {
    profile: PreferenceProfile,
    results: ResultSet,
}

impl ResultsSession {
    pub fn new(profile: PreferenceProfile, catalog: &[GiftItem]) -> Self {
        let results = compute_results(&profile, catalog);

        ResultsSession { profile, results }
    }

    /// Reads the catalog, giving up after `timeout`, and computes the
    /// results for the profile.
    pub async fn load(
        profile: PreferenceProfile,
        catalog: &dyn Catalog,
        timeout: Duration,
        logger: &Logger,
    ) -> Result<Self, GiftError> {
        debug!(logger, "Reading catalog...");
        let items = tokio::time::timeout(timeout, catalog.items())
            .await
            .map_err(|_| GiftError::TimedOut(timeout))??;

        let session = Self::new(profile, &items);

        if session.results.used_fallback() {
            info!(logger, "Nothing matched; showing the whole catalog"; "catalog" => items.len());
        } else {
            debug!(logger, "Found matches"; "matches" => session.results.items().len(), "catalog" => items.len());
        }

        Ok(session)
    }

    /// Picks the profile up from the hand-off and loads its results.
    /// Without a profile there is nothing to show and the visitor
    /// belongs back on the form. A profile whose results could not be
    /// loaded goes back into the hand-off for the next attempt.
    pub async fn open(
        handoff: &mut Handoff,
        catalog: &dyn Catalog,
        timeout: Duration,
        logger: &Logger,
    ) -> Result<Self, GiftError> {
        let profile = handoff.take().ok_or(GiftError::MissingProfile)?;

        match Self::load(profile.clone(), catalog, timeout, logger).await {
            Ok(session) => Ok(session),
            Err(e) => {
                handoff.deliver(profile);
                Err(e)
            }
        }
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    pub fn results_mut(&mut self) -> &mut ResultSet {
        &mut self.results
    }

    pub fn summary(&self) -> RecipientSummary {
        RecipientSummary::from(&self.profile)
    }

    /// `all` followed by one filter per interest, in the order they were picked.
    pub fn filter_options(&self) -> Vec<TagFilter> {
        std::iter::once(TagFilter::All)
            .chain(
                self.profile
                    .interests()
                    .iter()
                    .map(|i| TagFilter::Tag(i.tag().to_owned())),
            )
            .collect()
    }
}
