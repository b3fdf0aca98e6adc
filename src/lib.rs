//! # dotchk-site
//!
//! Build configuration for the dotchk.org static site. The site itself is
//! compiled by an external static-site generator; this crate owns the record
//! handed to it: validating it, filling in defaults, and emitting it in the
//! camelCase form the tool reads.
//!
//! ```text
//! site.toml ─┐
//!            ├─ merge ─→ PartialSiteConfig ─ resolve ─→ SiteConfig ─→ JSON
//! deploy.json┘
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Resolved `SiteConfig` types, stock defaults, file parsing and layered loading |
//! | [`resolve`] | Pure partial → full resolution with per-field validation errors |
//! | [`remote`] | Remote image allow-list matching for `image.domains` / `image.remotePatterns` |
//! | [`output`] | CLI output formatting |
//!
//! # Example
//!
//! ```rust
//! use dotchk_site::resolve::{PartialSiteConfig, resolve};
//!
//! let config = resolve(PartialSiteConfig {
//!     site: Some("https://dotchk.org".to_string()),
//!     ..Default::default()
//! })
//! .unwrap();
//! assert_eq!(config, dotchk_site::config::dotchk_site());
//! ```
//!
//! # Design Decisions
//!
//! ## Enums Travel as Strings Until Resolution
//!
//! `inlineStylesheets` and `defaultStrategy` are parsed as plain strings and
//! only turned into enums by [`resolve::resolve`]. A bad value is then
//! reported with its field path (`prefetch.defaultStrategy`) and the list of
//! accepted values, instead of a deserializer message pointing at a byte
//! offset.
//!
//! ## `site` Is Stored Verbatim
//!
//! The origin is validated with the `url` crate but kept as the original
//! string. URL serialization would append a trailing slash, and the resolved
//! record must compare equal to the literal the site is deployed with.

pub mod config;
pub mod output;
pub mod remote;
pub mod resolve;
