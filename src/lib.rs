//! Client-side content core for the Code to Crack publishing site.
//!
//! The crate implements the slug, routing, and canonical-URL subsystem of a
//! blog running directly against a hosted document database: slug derivation
//! and uniqueness, clean-URL parsing and construction, post resolution with
//! canonical redirects, the SPA navigation state machine, SEO head updates,
//! and sitemap/feed generation. Persistence and blob storage stay behind the
//! traits in [`application::store`]; rendering is left to the host page.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
