//! Utility functions

pub mod safe;
pub mod time;

pub use safe::*;
pub use time::*;
