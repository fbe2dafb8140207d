//! Stylesheet pipeline for static sites.
//!
//! Sources under the document root are rendered through an ordered stage chain,
//! either in a batch into the dist tree or on demand by the development server.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
