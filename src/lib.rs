//! Vehicle registration analytics over yearly Vahan CSV extracts.
//!
//! The pipeline is load → normalize → aggregate → print:
//! [`loader`] turns each year's wide month-column file into
//! [`CanonicalRecord`](types::CanonicalRecord) rows, [`cache`] memoizes that
//! result until explicitly refreshed, and [`reports`] derives growth, share
//! and quarterly tables from it.

pub mod cache;
pub mod config;
pub mod error;
pub mod loader;
pub mod logging;
pub mod output;
pub mod reports;
pub mod types;
pub mod util;
