pub mod filter;
pub mod finder;

pub use filter::find_post;
pub use finder::list as finder_list;
pub use finder::run as finder_run;
