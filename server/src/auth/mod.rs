//! Bearer credential extraction.

mod middleware;

pub use middleware::*;
