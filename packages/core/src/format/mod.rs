//! Turning recently added items into embeds.

pub mod movie;
pub mod ranges;
pub mod time;
pub mod tv;

pub use movie::format_movie;
pub use ranges::format_ranges;
pub use tv::{aggregate_tv, describe_show, format_show, ShowSummary};
