pub mod ai;
pub mod classify;
pub mod config;
pub mod daterange;
pub mod duration;
pub mod enrich;
pub mod error;
pub mod hiring;
pub mod locator;
pub mod merge;
pub mod models;
pub mod pipeline;
pub mod sections;
pub mod selectors;
pub mod session;
