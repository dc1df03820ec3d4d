//! Hour-windowed metric aggregation over the joined dataset.
//!
//! Unobserved departures are dropped, the remaining timestamps parsed, the
//! hour window applied, and one mean value produced per stop post.

pub mod aggregate;
pub mod kind;
pub mod timestamp;
pub mod utility;
pub mod window;

pub use aggregate::{AggregatedMetric, aggregate, aggregate_window};
pub use kind::Metric;
pub use window::HourWindow;
