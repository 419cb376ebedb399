//! Data models for the disaster management API.
//!
//! Stored records are schema-less documents; the typed models here cover the
//! shapes the service builds itself.

mod analytics;
mod collection;
mod user;
mod weather;

pub use analytics::*;
pub use collection::*;
pub use user::*;
pub use weather::*;
