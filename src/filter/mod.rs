pub mod types;
pub mod filter;
pub mod filter_where;
pub mod filter_order;
pub mod finder;
pub mod error;

pub use types::*;
pub use filter::Filter;
pub use finder::{Finder, FinderKind};
