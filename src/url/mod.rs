//! URL handling for the crawl pipeline
//!
//! This module covers the three URL-derived values the pipeline needs:
//! canonical link members for the link set, short storage keys for harvested
//! pages, and the site identity used to name the sink destination.

mod key;
mod normalize;
mod site;

pub use key::{derive_key, MAX_KEY_LEN};
pub use normalize::{canonicalize_link, parse_seed};
pub use site::site_name;
