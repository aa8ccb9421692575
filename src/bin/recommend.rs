use std::error::Error;
use std::path::PathBuf;

use dotenv::dotenv;
use structopt::StructOpt;

use giftwise::catalog::{Catalog, StaticCatalog};
use giftwise::choices::{Budget, Interest};
use giftwise::currency::format_price;
use giftwise::profile::Interests;
use giftwise::results::{apply_tag_filter, filter_catalog, Criteria, TagFilter};
use log::{debug, info, initialize_logger};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "recommend",
    about = "Print the gifts the site would recommend for the given interests and budget"
)]
struct Opt {
    /// The budget band, as its ID (e.g. `1000-2500`) or label
    #[structopt(short, long)]
    budget: Budget,

    /// Narrow the list to a single tag
    #[structopt(short, long, default_value = "all")]
    filter: TagFilter,

    /// Read the catalog from this JSON file instead of using the built-in one
    #[structopt(short, long, parse(from_os_str))]
    catalog: Option<PathBuf>,

    /// The recipient's interests
    #[structopt(required = true)]
    interests: Vec<Interest>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();

    let opt = Opt::from_args();

    let logger = initialize_logger();

    let catalog = match &opt.catalog {
        Some(path) => {
            info!(logger, "Loading catalog..."; "path" => %path.display());
            StaticCatalog::from_file(path)?
        }
        None => StaticCatalog::builtin(),
    };

    let items = catalog.items().await?;
    let interests: Interests = opt.interests.iter().copied().collect();
    let criteria = Criteria::new(interests, Some(opt.budget.range()));

    debug!(logger, "Filtering..."; "criteria" => ?criteria, "catalog" => items.len());
    let (matches, fallback) = filter_catalog(&criteria, &items);
    let visible = apply_tag_filter(&matches, &opt.filter);

    if fallback {
        println!("Nothing matched; showing the whole catalog.");
    }

    if visible.is_empty() {
        println!("No gifts found.");
    }

    for item in visible {
        println!(
            "{:>3}  {:<32} {:>10}  {:.1}  [{}]",
            item.id(),
            item.name(),
            format_price(item.price()),
            item.rating(),
            item.tags().join(", ")
        );
    }

    Ok(())
}
