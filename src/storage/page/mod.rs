//! Page types.
//!
//! This module contains:
//! - [`Page`] - An opaque, fixed-size payload with a dirty marker
//! - [`PageRef`] - The shared handle the pool caches and hands out

#[allow(clippy::module_inception)]
mod page;

pub use page::{Page, PageRef};
