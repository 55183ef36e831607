//! Content syndication and SEO analysis pipeline.
//!
//! Feeds are fetched and parsed (`feeds`), turned into canonical content
//! records (`converter`), scored (`seo`, `content::analysis`) and stored
//! through a persistence port (`repositories`). `syndication` ties the
//! stages together for batches of feeds; `content` owns the editorial
//! lifecycle of individual records.

pub mod config;
pub mod content;
pub mod converter;
pub mod feeds;
pub mod fingerprint;
pub mod repositories;
pub mod sanitizer;
pub mod seo;
pub mod syndication;
