use serde::{Deserialize, Serialize};
use url::Url;

/// A single item in the catalog.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GiftItem {
    /// The ID of the item. Unique within a catalog.
    pub(crate) id: u32,

    /// The name shown on the card.
    pub(crate) name: String,

    /// A sentence or two about the item.
    pub(crate) description: String,

    /// The price in whole rupees.
    pub(crate) price: u32,

    /// Where the picture lives.
    pub(crate) image: Url,

    /// The interests this item suits.
    pub(crate) tags: Vec<String>,

    /// The average rating, between 0 and 5.
    pub(crate) rating: f32,
}

impl GiftItem {
    pub fn new(
        id: u32,
        name: impl Into<String>,
        description: impl Into<String>,
        price: u32,
        image: Url,
        tags: Vec<String>,
        rating: f32,
    ) -> Self {
        GiftItem {
            id,
            name: name.into(),
            description: description.into(),
            price,
            image,
            tags,
            rating,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> u32 {
        self.price
    }

    pub fn image(&self) -> &Url {
        &self.image
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn rating(&self) -> f32 {
        self.rating
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}
