use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};

use crate::errors::GiftError;
use crate::profile::PreferenceProfile;

/// Whatever turns a finished profile into a recommendation request.
/// The intake form only sees the outcome, so a remote service can
/// replace the simulated one without touching its transitions.
pub trait Recommender: Send + Sync {
    /// Sends the request and resolves to the profile the results view
    /// should work from.
    fn request(&self, profile: PreferenceProfile)
        -> BoxFuture<'_, Result<PreferenceProfile, GiftError>>;
}

/// Pretends to call a backend by waiting and then echoing the profile.
#[derive(Clone, Copy, Debug)]
pub struct SimulatedRecommender {
    delay: Duration,
}

impl SimulatedRecommender {
    pub fn new(delay: Duration) -> Self {
        SimulatedRecommender { delay }
    }
}

impl Recommender for SimulatedRecommender {
    fn request(
        &self,
        profile: PreferenceProfile,
    ) -> BoxFuture<'_, Result<PreferenceProfile, GiftError>> {
        let delay = self.delay;

        async move {
            tokio::time::sleep(delay).await;
            Ok(profile)
        }
        .boxed()
    }
}
