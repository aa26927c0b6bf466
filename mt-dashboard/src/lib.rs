//! Dashboard logic for the Music Trends charts.
//!
//! [`state`] keeps the country, date range, artist and song filters
//! consistent with each other, [`charts`] turns a resolved state into the
//! three chart views, and [`titles`] builds their titles and captions.
//! Drawing the views is left to the rendering layer.

pub mod charts;
pub mod state;
pub mod titles;

pub use charts::{render, DashboardView};
pub use state::{resolve, DashboardState, FilterEvent, FilterState};
