use std::mem;

use crate::profile::PreferenceProfile;

/// Where a submitted profile waits for the results view.
#[derive(Clone, Debug, PartialEq)]
pub enum HandoffState {
    /// Nothing has been submitted.
    Absent,

    /// A profile is waiting to be picked up.
    Pending(PreferenceProfile),

    /// The results view has picked the profile up.
    Consumed,
}

/// A single-slot hand-off from the intake form to the results view.
/// The slot holds at most one profile and gives it out once.
#[derive(Debug)]
pub struct Handoff {
    state: HandoffState,
}

impl Default for Handoff {
    fn default() -> Self {
        Handoff {
            state: HandoffState::Absent,
        }
    }
}

impl Handoff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts a profile in the slot, replacing anything not yet picked up.
    pub fn deliver(&mut self, profile: PreferenceProfile) {
        self.state = HandoffState::Pending(profile);
    }

    /// Takes the waiting profile, if there is one.
    pub fn take(&mut self) -> Option<PreferenceProfile> {
        match mem::replace(&mut self.state, HandoffState::Consumed) {
            HandoffState::Pending(profile) => Some(profile),
            previous => {
                self.state = previous;
                None
            }
        }
    }

    pub fn state(&self) -> &HandoffState {
        &self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, HandoffState::Pending(_))
    }
}
