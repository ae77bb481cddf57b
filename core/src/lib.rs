//! journal-core: per-user daily prompt resolution for a multi-tenant
//! journaling app, with the profile, rule and prompt-library
//! administration that feeds it.

pub mod catalog;
pub mod config;
pub mod date;
pub mod engine;
pub mod error;
pub mod journal;
pub mod library;
pub mod membership;
pub mod profile;
pub mod prompt;
pub mod resolver;
pub mod rng;
pub mod rules;
pub mod store;
pub mod types;
