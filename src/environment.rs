use std::sync::Arc;
use std::time::Duration;

use log::Logger;

use crate::catalog::Catalog;
use crate::config::get_optional_variable;
use crate::recommender::Recommender;
use crate::sessions::Sessions;

const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// Everything a route handler needs.
#[derive(Clone)]
pub struct Environment {
    pub logger: Arc<Logger>,
    pub catalog: Arc<dyn Catalog>,
    pub recommender: Arc<dyn Recommender>,
    pub sessions: Arc<Sessions>,
    pub config: Config,
}

impl Environment {
    pub fn new(
        logger: Arc<Logger>,
        catalog: Arc<dyn Catalog>,
        recommender: Arc<dyn Recommender>,
        sessions: Arc<Sessions>,
        config: Config,
    ) -> Self {
        Self {
            logger,
            catalog,
            recommender,
            sessions,
            config,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// How long the simulated recommendation request takes.
    pub(crate) submit_delay: Duration,

    /// How long the simulated catalog read takes.
    pub(crate) results_delay: Duration,

    /// How long either may take before it counts as failed.
    pub(crate) timeout: Duration,

    /// How long a session may sit unused before it is dropped.
    pub(crate) session_ttl: Duration,
}

impl Config {
    pub fn new(submit_delay: Duration, results_delay: Duration, timeout: Duration) -> Self {
        Self {
            submit_delay,
            results_delay,
            timeout,
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }

    pub fn with_session_ttl(self, session_ttl: Duration) -> Self {
        Self {
            session_ttl,
            ..self
        }
    }

    /// Reads `GIFTWISE_SUBMIT_DELAY_MS`, `GIFTWISE_RESULTS_DELAY_MS`,
    /// `GIFTWISE_TIMEOUT_MS` and `GIFTWISE_SESSION_TTL_SECS`, falling back
    /// to the defaults for any that are unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let millis = |name: &str, default: Duration| {
            Duration::from_millis(get_optional_variable(name, default.as_millis() as u64))
        };

        Self::new(
            millis("GIFTWISE_SUBMIT_DELAY_MS", defaults.submit_delay),
            millis("GIFTWISE_RESULTS_DELAY_MS", defaults.results_delay),
            millis("GIFTWISE_TIMEOUT_MS", defaults.timeout),
        )
        .with_session_ttl(Duration::from_secs(get_optional_variable(
            "GIFTWISE_SESSION_TTL_SECS",
            defaults.session_ttl.as_secs(),
        )))
    }

    pub fn submit_delay(&self) -> Duration {
        self.submit_delay
    }

    pub fn results_delay(&self) -> Duration {
        self.results_delay
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(2_000),
            Duration::from_millis(1_000),
            Duration::from_secs(10),
        )
    }
}
