//! Data layer for the Echoes social feed: echo (post and comment) storage,
//! like/reaction toggling, and the aggregation queries pages render from.
//!
//! Back-reference lists that the page layer needs (a user's authored or
//! reacted echoes, a community's echoes, an echo's children) are derived
//! from indexed queries rather than stored, so they can never disagree with
//! the rows they summarize.

pub mod config;
pub mod error;
pub mod models;
pub mod reactions;
pub mod repositories;
pub mod store;
pub mod utils;

pub use config::Config;
pub use error::Error;
pub use store::Store;
