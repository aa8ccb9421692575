use serde::Serialize;
use warp::reject;

use crate::errors::GiftError;

#[derive(Debug)]
pub struct Rejection {
    pub(crate) context: Context,
    pub(crate) error: GiftError,
}

impl Rejection {
    pub fn new(context: Context, error: GiftError) -> Self {
        Rejection { context, error }
    }

    pub fn flatten(&self) -> FlattenedRejection {
        FlattenedRejection {
            context: self.context.clone(),
            message: format!("{}", self.error),
        }
    }
}

impl reject::Reject for Rejection {}

#[derive(Debug, Serialize)]
pub struct FlattenedRejection {
    #[serde(flatten)]
    pub(crate) context: Context,
    pub(crate) message: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum Context {
    Options,
    Start,
    Intake { session: String },
    Results { session: String },
    Favorite { session: String, gift: u32 },
}

impl Context {
    pub fn options() -> Context {
        Context::Options
    }

    pub fn start() -> Context {
        Context::Start
    }

    pub fn intake(session: &str) -> Context {
        Context::Intake {
            session: session.to_owned(),
        }
    }

    pub fn results(session: &str) -> Context {
        Context::Results {
            session: session.to_owned(),
        }
    }

    pub fn favorite(session: &str, gift: u32) -> Context {
        Context::Favorite {
            session: session.to_owned(),
            gift,
        }
    }
}
