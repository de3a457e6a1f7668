//! Pure text and ranking helpers used by the discovery pipeline.
//!
//! Every function here is total: malformed input degrades to an empty list or
//! the unchanged string, never a panic.

pub mod mixing;
pub mod price;
pub mod title;

pub use mixing::{combine_with_category, mix_search_terms, strip_category, MixingWeights};
pub use price::format_price;
pub use title::clean_title;
