mod fetch;
mod model;

pub use fetch::{fetch_catalog, is_url, parse_catalog, read_catalog_file};
pub use model::{Episode, Podcast, Season, filter_podcasts, find_episode};
