use std::convert::TryFrom;

use serde::{Deserialize, Serialize};

use crate::choices::{AgeRange, Budget, Interest, Occasion, Relationship};
use crate::errors::Incomplete;
use crate::intake::FormDraft;

/// The interests picked for a recipient, in the order they were
/// picked. Holds each interest at most once.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Interest>")]
pub struct Interests(Vec<Interest>);

impl Interests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the interest if it is missing and removes it otherwise.
    /// Returns whether it is selected afterwards.
    pub fn toggle(&mut self, interest: Interest) -> bool {
        match self.0.iter().position(|&i| i == interest) {
            Some(index) => {
                self.0.remove(index);
                false
            }
            None => {
                self.0.push(interest);
                true
            }
        }
    }

    pub fn contains(&self, interest: Interest) -> bool {
        self.0.contains(&interest)
    }

    /// Whether any of the given catalog tags names one of these interests.
    pub fn matches_any<'a>(&self, mut tags: impl Iterator<Item = &'a str>) -> bool {
        tags.any(|tag| self.0.iter().any(|i| i.tag() == tag))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Interest> + '_ {
        self.0.iter().copied()
    }
}

impl From<Vec<Interest>> for Interests {
    fn from(raw: Vec<Interest>) -> Self {
        raw.into_iter().collect()
    }
}

impl std::iter::FromIterator<Interest> for Interests {
    fn from_iter<I: IntoIterator<Item = Interest>>(iter: I) -> Self {
        let mut interests = Interests::new();

        for interest in iter {
            if !interests.contains(interest) {
                interests.0.push(interest);
            }
        }

        interests
    }
}

/// Everything the intake form collected, once every required field has
/// been filled in. Can only be built from a complete [`FormDraft`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PreferenceProfile {
    recipient_name: Option<String>,
    relationship: Relationship,
    age_range: AgeRange,
    occasion: Occasion,
    interests: Interests,
    budget: Budget,

    /// Carried along for display only; filtering ignores it.
    preferences: Option<String>,
}

impl PreferenceProfile {
    pub fn recipient_name(&self) -> Option<&str> {
        self.recipient_name.as_deref()
    }

    pub fn relationship(&self) -> Relationship {
        self.relationship
    }

    pub fn age_range(&self) -> AgeRange {
        self.age_range
    }

    pub fn occasion(&self) -> Occasion {
        self.occasion
    }

    pub fn interests(&self) -> &Interests {
        &self.interests
    }

    pub fn budget(&self) -> Budget {
        self.budget
    }

    pub fn preferences(&self) -> Option<&str> {
        self.preferences.as_deref()
    }
}

impl TryFrom<&FormDraft> for PreferenceProfile {
    type Error = Incomplete;

    fn try_from(draft: &FormDraft) -> Result<Self, Self::Error> {
        let missing = draft.missing_fields();

        match (draft.relationship, draft.age_range, draft.occasion, draft.budget) {
            (Some(relationship), Some(age_range), Some(occasion), Some(budget))
                if missing.is_empty() =>
            {
                Ok(PreferenceProfile {
                    recipient_name: draft.recipient_name.clone(),
                    relationship,
                    age_range,
                    occasion,
                    interests: draft.interests.clone(),
                    budget,
                    preferences: draft.preferences.clone(),
                })
            }
            _ => Err(Incomplete { missing }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::FieldUpdate;

    #[test]
    fn toggling_twice_restores_the_selection() {
        let mut interests = Interests::from(vec![Interest::Art, Interest::Books]);

        assert!(interests.toggle(Interest::Music));
        assert!(!interests.toggle(Interest::Music));
        assert_eq!(interests, Interests::from(vec![Interest::Art, Interest::Books]));

        assert!(!interests.toggle(Interest::Art));
        assert_eq!(interests.iter().collect::<Vec<_>>(), vec![Interest::Books]);
    }

    #[test]
    fn duplicates_collapse_on_deserialization() {
        let interests: Interests =
            serde_json::from_str(r#"["Gaming", "Books", "Gaming"]"#).unwrap();

        assert_eq!(
            interests.iter().collect::<Vec<_>>(),
            vec![Interest::Gaming, Interest::Books]
        );
    }

    #[test]
    fn incomplete_drafts_list_what_is_missing() {
        let mut draft = FormDraft::default();
        draft.apply(FieldUpdate::Relationship(Some(Relationship::Friend)));
        draft.apply(FieldUpdate::Budget(Some(Budget::UpTo1000)));

        let error = PreferenceProfile::try_from(&draft).unwrap_err();

        assert_eq!(error.missing, vec!["age range", "occasion", "interests"]);
    }

    #[test]
    fn complete_drafts_become_profiles() {
        let mut draft = FormDraft::default();
        draft.apply(FieldUpdate::RecipientName(Some("  Dad ".to_owned())));
        draft.apply(FieldUpdate::Relationship(Some(Relationship::Parent)));
        draft.apply(FieldUpdate::AgeRange(Some(AgeRange::Senior)));
        draft.apply(FieldUpdate::Occasion(Some(Occasion::Birthday)));
        draft.apply(FieldUpdate::Budget(Some(Budget::UpTo2500)));
        draft.interests.toggle(Interest::Cooking);

        let profile = PreferenceProfile::try_from(&draft).unwrap();

        assert_eq!(profile.recipient_name(), Some("Dad"));
        assert_eq!(profile.relationship(), Relationship::Parent);
        assert_eq!(profile.budget(), Budget::UpTo2500);
        assert!(profile.interests().contains(Interest::Cooking));
        assert_eq!(profile.preferences(), None);
    }
}
