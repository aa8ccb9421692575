use serde::Deserialize;

/// The interest to select or deselect. Labels and IDs are both accepted.
#[derive(Debug, Deserialize)]
pub struct InterestToggle {
    pub(crate) interest: String,
}

/// The tag to narrow the results to, or `all`.
#[derive(Debug, Deserialize)]
pub struct FilterChoice {
    pub(crate) tag: String,
}
