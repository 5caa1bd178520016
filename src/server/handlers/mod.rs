//! HTTP request handlers for the web server.

mod analyze;
mod api;
mod helpers;
mod report;

pub use analyze::analyze;
pub use api::{health, index};
pub use report::report;
