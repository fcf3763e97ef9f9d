//! Query understanding: free text in, structured filter out.

mod extract;
mod filter;
pub mod gazetteer;

pub use extract::extract;
pub use filter::QueryFilter;
pub use gazetteer::fold_diacritics;
