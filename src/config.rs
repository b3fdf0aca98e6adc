//! Site build configuration module.
//!
//! Holds the normalized [`SiteConfig`] handed to the static-site build tool,
//! and the loading side: reading `.toml` / `.json` config files, layering
//! them on top of each other, and resolving the merged result.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! site = "https://dotchk.org"   # Canonical origin (no default)
//! base = "/"                    # Root path the site is served under
//! compressHTML = true
//!
//! [build]
//! inlineStylesheets = "auto"    # always | auto | never
//! assets = "assets"             # Output directory for bundled assets
//! minify = true
//!
//! [prefetch]
//! prefetchAll = true
//! defaultStrategy = "viewport"  # load | hover | tap | viewport
//!
//! [image]
//! domains = []                  # Allowed remote image hosts
//! remotePatterns = []           # See [`RemotePattern`]
//! ```
//!
//! Keys use the camelCase spelling the build tool expects. Unknown keys are
//! rejected to catch typos early.
//!
//! ## Layering
//!
//! Several files can be stacked: each one is merged key by key on top of the
//! previous ones before resolution, so a deployment file only has to name the
//! values it changes.

use crate::remote::RemotePattern;
use crate::resolve::{InvalidConfig, PartialSiteConfig, resolve};
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported config format for {} (expected .toml or .json)", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("{}: {source}", .path.display())]
    Layer {
        path: PathBuf,
        #[source]
        source: Box<ConfigError>,
    },
    #[error("expected a table at `{0}`")]
    NotATable(String),
    #[error(transparent)]
    Invalid(#[from] InvalidConfig),
}

/// A closed set of string values a config field may hold.
pub trait ConfigEnum: Sized + Copy + 'static {
    /// Every variant, in declaration order.
    const ALL: &'static [Self];

    /// The spelling used in config files.
    fn name(self) -> &'static str;

    fn from_name(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.name() == value)
    }

    fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|v| v.name()).collect()
    }
}

/// How the build tool emits stylesheets: inline `<style>` tags or linked files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InlineStylesheets {
    Always,
    #[default]
    Auto,
    Never,
}

impl ConfigEnum for InlineStylesheets {
    const ALL: &'static [Self] = &[Self::Always, Self::Auto, Self::Never];

    fn name(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Auto => "auto",
            Self::Never => "never",
        }
    }
}

/// When links are prefetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrefetchStrategy {
    Load,
    Hover,
    Tap,
    #[default]
    Viewport,
}

impl ConfigEnum for PrefetchStrategy {
    const ALL: &'static [Self] = &[Self::Load, Self::Hover, Self::Tap, Self::Viewport];

    fn name(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Hover => "hover",
            Self::Tap => "tap",
            Self::Viewport => "viewport",
        }
    }
}

impl fmt::Display for InlineStylesheets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for PrefetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fully resolved site configuration.
///
/// Every field is populated; this is what the build tool consumes. Build one
/// with [`resolve`] or one of the loaders rather than by hand, so enum and
/// URL constraints are checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    /// Canonical deployment origin. Kept exactly as written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    /// Root path the site is served under.
    pub base: String,
    #[serde(rename = "compressHTML")]
    pub compress_html: bool,
    pub build: BuildConfig,
    pub prefetch: PrefetchConfig,
    pub image: ImageConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site: None,
            base: default_base(),
            compress_html: true,
            build: BuildConfig::default(),
            prefetch: PrefetchConfig::default(),
            image: ImageConfig::default(),
        }
    }
}

pub(crate) fn default_base() -> String {
    "/".to_string()
}

impl SiteConfig {
    /// Pretty camelCase JSON, the form handed to the build tool.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Output options for the build step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    pub inline_stylesheets: InlineStylesheets,
    /// Directory name for bundled assets inside the output.
    pub assets: String,
    pub minify: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            inline_stylesheets: InlineStylesheets::Auto,
            assets: "assets".to_string(),
            minify: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefetchConfig {
    /// Prefetch every link, not only the ones opted in.
    pub prefetch_all: bool,
    pub default_strategy: PrefetchStrategy,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            prefetch_all: true,
            default_strategy: PrefetchStrategy::Viewport,
        }
    }
}

/// Remote image allow-list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    /// Allowed remote hostnames. Unique, in first-seen order.
    pub domains: Vec<String>,
    pub remote_patterns: Vec<RemotePattern>,
}

/// Stock defaults: every field at its documented default, no `site`.
pub fn stock_defaults() -> SiteConfig {
    SiteConfig::default()
}

/// The configuration the dotchk.org site ships with.
pub fn dotchk_site() -> SiteConfig {
    SiteConfig {
        site: Some("https://dotchk.org".to_string()),
        ..SiteConfig::default()
    }
}

// =============================================================================
// Parsing, merging, and layered loading
// =============================================================================

/// On-disk config file syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Self::Toml),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Parse config text straight into the partial record.
///
/// Rejects unknown keys and mistyped values; enum values and the `site` URL
/// are only checked later by [`resolve`].
pub fn parse_raw(text: &str, format: ConfigFormat) -> Result<PartialSiteConfig, ConfigError> {
    let value = parse_value(text, format)?;
    check_tables(&value)?;
    let raw: PartialSiteConfig = match format {
        ConfigFormat::Toml => toml::from_str(text)?,
        ConfigFormat::Json => serde_json::from_value(value)?,
    };
    Ok(raw)
}

/// Parse config text into an untyped value tree for merging.
pub fn parse_value(text: &str, format: ConfigFormat) -> Result<Value, ConfigError> {
    let value: Value = match format {
        ConfigFormat::Toml => toml::from_str(text)?,
        ConfigFormat::Json => serde_json::from_str(text)?,
    };
    Ok(value)
}

/// Require tables wherever the config has records.
///
/// Derived deserializers also accept arrays as positional records, so
/// `["https://x"]` would otherwise parse as a config with `site` set.
pub fn check_tables(value: &Value) -> Result<(), ConfigError> {
    expect_table(value, "(root)")?;
    for section in ["build", "prefetch", "image"] {
        if let Some(record) = value.get(section).filter(|v| !v.is_null()) {
            expect_table(record, section)?;
        }
    }
    if let Some(Value::Array(patterns)) = value.pointer("/image/remotePatterns") {
        for (i, pattern) in patterns.iter().enumerate() {
            expect_table(pattern, &format!("image.remotePatterns[{i}]"))?;
        }
    }
    Ok(())
}

fn expect_table(value: &Value, path: &str) -> Result<(), ConfigError> {
    if value.is_object() {
        Ok(())
    } else {
        Err(ConfigError::NotATable(path.to_string()))
    }
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Objects are merged key-by-key (overlay keys override base keys).
/// - Non-object values in overlay replace base values entirely, arrays included.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_values(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_val) => merge_values(base_val, overlay_val),
                    None => overlay_val,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Read one config file as a value tree, checking its keys on the way.
pub fn load_raw_value(path: &Path) -> Result<Value, ConfigError> {
    let read = || -> Result<Value, ConfigError> {
        let format = ConfigFormat::from_path(path)?;
        let content = fs::read_to_string(path)?;
        let value = parse_value(&content, format)?;
        check_tables(&value)?;
        // Typos are reported against the file that contains them, not the merge.
        serde_json::from_value::<PartialSiteConfig>(value.clone())?;
        Ok(value)
    };
    read().map_err(|source| ConfigError::Layer {
        path: path.to_path_buf(),
        source: Box::new(source),
    })
}

/// Merge every file in order on top of the previous ones, then resolve.
///
/// No files resolves to [`stock_defaults`].
pub fn load_layered<P: AsRef<Path>>(paths: &[P]) -> Result<SiteConfig, ConfigError> {
    let mut merged = Value::Object(Map::new());
    for path in paths {
        let path = path.as_ref();
        debug!("loading config layer {}", path.display());
        merged = merge_values(merged, load_raw_value(path)?);
    }
    let raw: PartialSiteConfig = serde_json::from_value(merged)?;
    let listed = raw
        .image
        .as_ref()
        .and_then(|image| image.domains.as_ref())
        .map_or(0, Vec::len);
    let config = resolve(raw)?;
    if config.image.domains.len() < listed {
        warn!(
            "{} duplicate image domain(s) ignored",
            listed - config.image.domains.len()
        );
    }
    info!(
        "resolved site config from {} layer(s), site={}",
        paths.len(),
        config.site.as_deref().unwrap_or("<unset>")
    );
    Ok(config)
}

/// Load and resolve a single config file.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    load_layered(&[path])
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# dotchk.org Site Configuration
# =============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Several files can be layered; later files override earlier ones key by key.
# Unknown keys will cause an error.

# Canonical deployment origin. Must be an absolute URL. No default.
# site = "https://dotchk.org"

# Root path the site is served under.
base = "/"

# Collapse whitespace in generated HTML.
compressHTML = true

# ---------------------------------------------------------------------------
# Build output
# ---------------------------------------------------------------------------
[build]
# Inline stylesheets into pages: "always", "auto" (small ones only), "never".
inlineStylesheets = "auto"

# Directory name for bundled assets in the output.
assets = "assets"

# Minify emitted CSS and JavaScript.
minify = true

# ---------------------------------------------------------------------------
# Link prefetching
# ---------------------------------------------------------------------------
[prefetch]
# Prefetch every link instead of only opted-in ones.
prefetchAll = true

# When to prefetch: "load", "hover", "tap", "viewport".
defaultStrategy = "viewport"

# ---------------------------------------------------------------------------
# Remote images
# ---------------------------------------------------------------------------
[image]
# Hostnames remote images may be loaded from.
domains = []

# URL patterns remote images may match. Each part is optional:
#   protocol = "https"
#   hostname = "**.example.com"   # "**." any depth, "*." one label
#   port     = "8080"
#   pathname = "/images/**"       # "/**" any depth, "/*" one segment
remotePatterns = []
"##
}
