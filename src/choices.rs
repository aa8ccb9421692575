//! The closed lists the intake form offers. Every choice travels as its
//! ID and is shown as its label; neither is ever parsed for meaning.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::GiftError;
use crate::label::Label;

macro_rules! choices {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $id:literal, $label:literal;)+ }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
        pub enum $name {
            $(
                #[serde(rename = $id)]
                $variant,
            )+
        }

        impl $name {
            /// Every choice, in the order the form lists them.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn id(self) -> &'static str {
                match self {
                    $($name::$variant => $id,)+
                }
            }

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            pub fn labels() -> Vec<Label> {
                Self::ALL.iter().map(|c| Label::new(c.id(), c.label())).collect()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = GiftError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|c| c.id() == s || c.label() == s)
                    .ok_or_else(|| GiftError::UnknownChoice {
                        kind: $kind,
                        value: s.to_owned(),
                    })
            }
        }
    };
}

choices! {
    /// How the shopper knows the recipient.
    Relationship, "relationship" {
        Friend => "Friend", "Friend";
        Parent => "Parent", "Parent";
        Sibling => "Sibling", "Sibling";
        Partner => "Partner", "Partner";
        Spouse => "Spouse", "Spouse";
        Child => "Child", "Child";
        Colleague => "Colleague", "Colleague";
        Other => "Other", "Other";
    }
}

choices! {
    /// The recipient's age bracket.
    AgeRange, "age range" {
        Child => "0-12", "Child (0-12)";
        Teen => "13-19", "Teenager (13-19)";
        YoungAdult => "20-30", "Young Adult (20-30)";
        Adult => "31-50", "Adult (31-50)";
        Senior => "51+", "Senior (51+)";
    }
}

choices! {
    /// What the gift is for.
    Occasion, "occasion" {
        Birthday => "Birthday", "Birthday";
        Anniversary => "Anniversary", "Anniversary";
        Wedding => "Wedding", "Wedding";
        Graduation => "Graduation", "Graduation";
        Festival => "Festival", "Festival";
        Housewarming => "Housewarming", "Housewarming";
        BabyShower => "Baby Shower", "Baby Shower";
        Other => "Other", "Other";
    }
}

choices! {
    /// An interest the recipient has. The label doubles as the catalog
    /// tag it matches.
    Interest, "interest" {
        Books => "Books", "Books";
        Technology => "Technology", "Technology";
        Fashion => "Fashion", "Fashion";
        Sports => "Sports", "Sports";
        Cooking => "Cooking", "Cooking";
        Travel => "Travel", "Travel";
        Art => "Art", "Art";
        Music => "Music", "Music";
        Fitness => "Fitness", "Fitness";
        Gaming => "Gaming", "Gaming";
        HomeDecor => "Home Decor", "Home Decor";
        Beauty => "Beauty", "Beauty";
    }
}

choices! {
    /// A budget band. The bounds live in [`Budget::range`].
    Budget, "budget" {
        UpTo1000 => "500-1000", "₹500 - ₹1,000";
        UpTo2500 => "1000-2500", "₹1,000 - ₹2,500";
        UpTo5000 => "2500-5000", "₹2,500 - ₹5,000";
        UpTo10000 => "5000-10000", "₹5,000 - ₹10,000";
        Above10000 => "10000+", "₹10,000+";
    }
}

impl Interest {
    /// The catalog tag this interest matches.
    pub fn tag(self) -> &'static str {
        self.label()
    }
}

impl Budget {
    pub fn range(self) -> BudgetRange {
        use Budget::*;

        match self {
            UpTo1000 => BudgetRange::between(500, 1_000),
            UpTo2500 => BudgetRange::between(1_000, 2_500),
            UpTo5000 => BudgetRange::between(2_500, 5_000),
            UpTo10000 => BudgetRange::between(5_000, 10_000),
            Above10000 => BudgetRange::at_least(10_000),
        }
    }
}

/// Inclusive price bounds in whole rupees. `max` is `None` when the
/// range is open-ended.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct BudgetRange {
    min: u32,
    max: Option<u32>,
}

impl BudgetRange {
    /// A bounded range. The bounds are swapped if given in the wrong
    /// order so that `min <= max` always holds.
    pub fn between(min: u32, max: u32) -> Self {
        BudgetRange {
            min: min.min(max),
            max: Some(min.max(max)),
        }
    }

    pub fn at_least(min: u32) -> Self {
        BudgetRange { min, max: None }
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> Option<u32> {
        self.max
    }

    pub fn contains(&self, price: u32) -> bool {
        price >= self.min && self.max.map_or(true, |max| price <= max)
    }
}
