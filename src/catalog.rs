use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use lazy_static::lazy_static;
use url::Url;

use crate::errors::GiftError;
use crate::gift::GiftItem;

/// A source of candidate gifts.
pub trait Catalog: Send + Sync {
    /// Reads every item, in catalog order.
    fn items(&self) -> BoxFuture<'_, Result<Vec<GiftItem>, GiftError>>;
}

/// A catalog held in memory for the lifetime of the process.
#[derive(Clone, Debug)]
pub struct StaticCatalog {
    items: Arc<Vec<GiftItem>>,

    /// How long every read pretends to take.
    latency: Duration,
}

impl StaticCatalog {
    /// Creates a new instance after checking that IDs are unique,
    /// names are present and ratings are within 0 to 5.
    pub fn new(items: Vec<GiftItem>) -> Result<Self, GiftError> {
        validate(&items)?;

        Ok(StaticCatalog {
            items: Arc::new(items),
            latency: Duration::from_millis(0),
        })
    }

    /// The eight items the site ships with.
    pub fn builtin() -> Self {
        StaticCatalog {
            items: BUILTIN.clone(),
            latency: Duration::from_millis(0),
        }
    }

    /// Loads a JSON array of items from the given file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GiftError> {
        let raw = fs::read(path.as_ref()).map_err(|source| GiftError::CatalogIo { source })?;
        let items: Vec<GiftItem> =
            serde_json::from_slice(&raw).map_err(|source| GiftError::CatalogParse { source })?;

        Self::new(items)
    }

    pub fn with_latency(self, latency: Duration) -> Self {
        StaticCatalog { latency, ..self }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Catalog for StaticCatalog {
    fn items(&self) -> BoxFuture<'_, Result<Vec<GiftItem>, GiftError>> {
        read(self).boxed()
    }
}

async fn read(catalog: &StaticCatalog) -> Result<Vec<GiftItem>, GiftError> {
    if catalog.latency > Duration::from_millis(0) {
        tokio::time::sleep(catalog.latency).await;
    }

    Ok(catalog.items.as_ref().clone())
}

fn validate(items: &[GiftItem]) -> Result<(), GiftError> {
    let invalid = |reason: String| GiftError::InvalidCatalog { reason };
    let mut seen = HashSet::new();

    for item in items {
        if !seen.insert(item.id) {
            return Err(invalid(format!("item {} appears more than once", item.id)));
        }

        if item.name.trim().is_empty() {
            return Err(invalid(format!("item {} has no name", item.id)));
        }

        if !(0.0..=5.0).contains(&item.rating) {
            return Err(invalid(format!(
                "item {} has rating {} outside 0 to 5",
                item.id, item.rating
            )));
        }
    }

    Ok(())
}

fn item(
    id: u32,
    name: &str,
    description: &str,
    price: u32,
    photo: u32,
    tags: &[&str],
    rating: f32,
) -> GiftItem {
    let image = format!(
        "https://images.pexels.com/photos/{0}/pexels-photo-{0}.jpeg?auto=compress&cs=tinysrgb&w=600",
        photo
    );

    GiftItem::new(
        id,
        name,
        description,
        price,
        Url::parse(&image).expect("parse built-in image URL"),
        tags.iter().map(|t| (*t).to_owned()).collect(),
        rating,
    )
}

lazy_static! {
    static ref BUILTIN: Arc<Vec<GiftItem>> = Arc::new(vec![
        item(
            1,
            "Premium Leather Journal",
            "Handcrafted leather journal with high-quality paper, perfect for writers and creatives.",
            1299,
            6707628,
            &["Books", "Art"],
            4.7,
        ),
        item(
            2,
            "Wireless Noise-Cancelling Headphones",
            "Premium sound quality with active noise cancellation for an immersive audio experience.",
            8999,
            577769,
            &["Technology", "Music"],
            4.5,
        ),
        item(
            3,
            "Smart Fitness Watch",
            "Track your fitness goals, heart rate, and sleep patterns with this sleek smart watch.",
            3499,
            437037,
            &["Technology", "Fitness"],
            4.3,
        ),
        item(
            4,
            "Gourmet Spice Collection",
            "A set of premium spices from around the world for the cooking enthusiast.",
            999,
            6937454,
            &["Cooking"],
            4.8,
        ),
        item(
            5,
            "Indoor Plant Starter Kit",
            "All you need to start your indoor garden with decorative pots and easy-care plants.",
            1499,
            1470171,
            &["Home Decor"],
            4.4,
        ),
        item(
            6,
            "Personalized Star Map",
            "Custom star map showing the night sky from a specific date and location.",
            2299,
            998641,
            &["Art", "Home Decor"],
            4.6,
        ),
        item(
            7,
            "Premium Coffee Subscription",
            "Monthly delivery of freshly roasted specialty coffee beans from around the world.",
            849,
            1251175,
            &["Cooking"],
            4.9,
        ),
        item(
            8,
            "Board Game Collection",
            "Set of popular strategy board games for game nights with friends and family.",
            3299,
            776654,
            &["Gaming"],
            4.7,
        ),
    ]);
}
