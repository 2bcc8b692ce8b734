//! Meal-plan templates, blacklist-aware food substitution and daily
//! adherence tracking behind a small axum API.

pub mod app;
pub mod catalog;
pub mod config;
pub mod days;
pub mod diet;
pub mod errors;
pub mod extractors;
pub mod state;
pub mod store;
pub mod templates;
