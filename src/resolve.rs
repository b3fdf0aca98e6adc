//! Resolution: partial config in, fully populated [`SiteConfig`] out.
//!
//! [`resolve`] is pure. It applies the stock defaults to every absent field,
//! checks enumerated fields and the `site` URL, and collapses duplicate
//! image domains. It either succeeds completely or fails with a single
//! [`InvalidConfig`] naming the offending field.
//!
//! Enumerated fields are carried as plain strings in [`PartialSiteConfig`]
//! so an unrecognized value survives parsing and gets reported here with its
//! dotted field path, rather than as an opaque deserializer error.

use crate::config::{
    BuildConfig, ConfigEnum, ImageConfig, InlineStylesheets, PrefetchConfig, PrefetchStrategy,
    SiteConfig, default_base,
};
use crate::remote::RemotePattern;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Resolution failure: which field, and why.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid config at `{path}`: {reason}")]
pub struct InvalidConfig {
    /// Dotted field path, e.g. `prefetch.defaultStrategy`.
    pub path: String,
    pub reason: InvalidReason,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    #[error("unrecognized value {value:?} (expected one of: {})", .expected.join(", "))]
    UnknownVariant {
        value: String,
        expected: Vec<&'static str>,
    },
    #[error("{value:?} is not an absolute URL: {detail}")]
    MalformedUrl { value: String, detail: String },
}

/// A config record with any subset of fields present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct PartialSiteConfig {
    pub site: Option<String>,
    pub base: Option<String>,
    #[serde(rename = "compressHTML")]
    pub compress_html: Option<bool>,
    pub build: Option<PartialBuildConfig>,
    pub prefetch: Option<PartialPrefetchConfig>,
    pub image: Option<PartialImageConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct PartialBuildConfig {
    pub inline_stylesheets: Option<String>,
    pub assets: Option<String>,
    pub minify: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct PartialPrefetchConfig {
    pub prefetch_all: Option<bool>,
    pub default_strategy: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct PartialImageConfig {
    pub domains: Option<Vec<String>>,
    pub remote_patterns: Option<Vec<RemotePattern>>,
}

/// Lift a resolved config back to a fully populated partial one.
impl From<SiteConfig> for PartialSiteConfig {
    fn from(config: SiteConfig) -> Self {
        Self {
            site: config.site,
            base: Some(config.base),
            compress_html: Some(config.compress_html),
            build: Some(PartialBuildConfig {
                inline_stylesheets: Some(config.build.inline_stylesheets.name().to_string()),
                assets: Some(config.build.assets),
                minify: Some(config.build.minify),
            }),
            prefetch: Some(PartialPrefetchConfig {
                prefetch_all: Some(config.prefetch.prefetch_all),
                default_strategy: Some(config.prefetch.default_strategy.name().to_string()),
            }),
            image: Some(PartialImageConfig {
                domains: Some(config.image.domains),
                remote_patterns: Some(config.image.remote_patterns),
            }),
        }
    }
}

/// Merge `raw` with the stock defaults and validate the result.
pub fn resolve(raw: PartialSiteConfig) -> Result<SiteConfig, InvalidConfig> {
    let site = raw.site.map(check_site).transpose()?;

    let build = raw.build.unwrap_or_default();
    let defaults = BuildConfig::default();
    let build = BuildConfig {
        inline_stylesheets: pick_variant(
            "build.inlineStylesheets",
            build.inline_stylesheets,
            InlineStylesheets::default(),
        )?,
        assets: build.assets.unwrap_or(defaults.assets),
        minify: build.minify.unwrap_or(defaults.minify),
    };

    let prefetch = raw.prefetch.unwrap_or_default();
    let prefetch = PrefetchConfig {
        prefetch_all: prefetch
            .prefetch_all
            .unwrap_or(PrefetchConfig::default().prefetch_all),
        default_strategy: pick_variant(
            "prefetch.defaultStrategy",
            prefetch.default_strategy,
            PrefetchStrategy::default(),
        )?,
    };

    let image = raw.image.unwrap_or_default();
    let image = ImageConfig {
        domains: unique_domains(image.domains.unwrap_or_default()),
        remote_patterns: image.remote_patterns.unwrap_or_default(),
    };

    Ok(SiteConfig {
        site,
        base: raw.base.unwrap_or_else(default_base),
        compress_html: raw
            .compress_html
            .unwrap_or(SiteConfig::default().compress_html),
        build,
        prefetch,
        image,
    })
}

fn pick_variant<T: ConfigEnum>(
    path: &str,
    value: Option<String>,
    default: T,
) -> Result<T, InvalidConfig> {
    let Some(value) = value else {
        return Ok(default);
    };
    T::from_name(&value).ok_or_else(|| InvalidConfig {
        path: path.to_string(),
        reason: InvalidReason::UnknownVariant {
            value,
            expected: T::names(),
        },
    })
}

/// `site` must parse as an absolute URL with a host.
fn check_site(value: String) -> Result<String, InvalidConfig> {
    let detail = match Url::parse(&value) {
        Ok(url) if url.has_host() => return Ok(value),
        Ok(_) => "URL has no host".to_string(),
        Err(e) => e.to_string(),
    };
    Err(InvalidConfig {
        path: "site".to_string(),
        reason: InvalidReason::MalformedUrl { value, detail },
    })
}

/// Hostnames compare case-insensitively; the first spelling is kept.
fn unique_domains(domains: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(domains.len());
    for domain in domains {
        if !unique.iter().any(|d| d.eq_ignore_ascii_case(&domain)) {
            unique.push(domain);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{dotchk_site, stock_defaults};

    fn with_strategy(strategy: &str) -> PartialSiteConfig {
        PartialSiteConfig {
            prefetch: Some(PartialPrefetchConfig {
                default_strategy: Some(strategy.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn empty_input_resolves_to_stock_defaults() {
        assert_eq!(resolve(PartialSiteConfig::default()).unwrap(), stock_defaults());
    }

    #[test]
    fn omitted_base_is_root() {
        let raw = PartialSiteConfig {
            site: Some("https://dotchk.org".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve(raw).unwrap().base, "/");
    }

    #[test]
    fn site_and_base_give_the_site_literal() {
        let raw = PartialSiteConfig {
            site: Some("https://dotchk.org".to_string()),
            base: Some("/".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve(raw).unwrap(), dotchk_site());
    }

    #[test]
    fn site_is_kept_verbatim() {
        let raw = PartialSiteConfig {
            site: Some("https://dotchk.org".to_string()),
            ..Default::default()
        };
        // No trailing slash added by URL normalization
        assert_eq!(resolve(raw).unwrap().site.as_deref(), Some("https://dotchk.org"));
    }

    #[test]
    fn resolve_is_idempotent() {
        let raw = PartialSiteConfig {
            site: Some("https://dotchk.org".to_string()),
            base: Some("/docs/".to_string()),
            build: Some(PartialBuildConfig {
                inline_stylesheets: Some("always".to_string()),
                ..Default::default()
            }),
            image: Some(PartialImageConfig {
                domains: Some(vec!["a.com".to_string(), "a.com".to_string()]),
                remote_patterns: Some(vec![RemotePattern {
                    hostname: Some("**.dotchk.org".to_string()),
                    ..Default::default()
                }]),
            }),
            ..Default::default()
        };
        let once = resolve(raw).unwrap();
        let twice = resolve(PartialSiteConfig::from(once.clone())).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn malformed_site_is_invalid() {
        let raw = PartialSiteConfig {
            site: Some("not a url".to_string()),
            ..Default::default()
        };
        let err = resolve(raw).unwrap_err();
        assert_eq!(err.path, "site");
        assert!(matches!(err.reason, InvalidReason::MalformedUrl { .. }));
    }

    #[test]
    fn relative_site_is_invalid() {
        let raw = PartialSiteConfig {
            site: Some("/dotchk".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve(raw).unwrap_err().path, "site");
    }

    #[test]
    fn hostless_site_is_invalid() {
        let raw = PartialSiteConfig {
            site: Some("mailto:admin@dotchk.org".to_string()),
            ..Default::default()
        };
        let err = resolve(raw).unwrap_err();
        assert_eq!(
            err.reason,
            InvalidReason::MalformedUrl {
                value: "mailto:admin@dotchk.org".to_string(),
                detail: "URL has no host".to_string(),
            }
        );
    }

    #[test]
    fn bogus_strategy_is_invalid() {
        let err = resolve(with_strategy("bogus")).unwrap_err();
        assert_eq!(err.path, "prefetch.defaultStrategy");
        assert_eq!(
            err.reason,
            InvalidReason::UnknownVariant {
                value: "bogus".to_string(),
                expected: vec!["load", "hover", "tap", "viewport"],
            }
        );
    }

    #[test]
    fn every_strategy_is_accepted() {
        for name in PrefetchStrategy::names() {
            let config = resolve(with_strategy(name)).unwrap();
            assert_eq!(config.prefetch.default_strategy.name(), name);
        }
    }

    #[test]
    fn bogus_inline_stylesheets_is_invalid() {
        let raw = PartialSiteConfig {
            build: Some(PartialBuildConfig {
                inline_stylesheets: Some("AUTO".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(resolve(raw).unwrap_err().path, "build.inlineStylesheets");
    }

    #[test]
    fn error_message_names_field_and_choices() {
        let err = resolve(with_strategy("eager")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid config at `prefetch.defaultStrategy`: unrecognized value \"eager\" \
             (expected one of: load, hover, tap, viewport)"
        );
    }

    #[test]
    fn partial_record_keeps_sibling_defaults() {
        let raw = PartialSiteConfig {
            build: Some(PartialBuildConfig {
                minify: Some(false),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = resolve(raw).unwrap();
        assert!(!config.build.minify);
        assert_eq!(config.build.inline_stylesheets, InlineStylesheets::Auto);
        assert_eq!(config.build.assets, "assets");
    }

    #[test]
    fn duplicate_domains_collapse_in_order() {
        let raw = PartialSiteConfig {
            image: Some(PartialImageConfig {
                domains: Some(
                    ["cdn.dotchk.org", "img.example.com", "cdn.dotchk.org"]
                        .map(String::from)
                        .to_vec(),
                ),
                remote_patterns: None,
            }),
            ..Default::default()
        };
        let config = resolve(raw).unwrap();
        assert_eq!(config.image.domains, vec!["cdn.dotchk.org", "img.example.com"]);
    }

    #[test]
    fn duplicate_domains_ignore_case() {
        let raw = PartialSiteConfig {
            image: Some(PartialImageConfig {
                domains: Some(
                    ["CDN.dotchk.org", "cdn.dotchk.org", "Cdn.DotChk.org"]
                        .map(String::from)
                        .to_vec(),
                ),
                remote_patterns: None,
            }),
            ..Default::default()
        };
        let config = resolve(raw).unwrap();
        assert_eq!(config.image.domains, vec!["CDN.dotchk.org"]);
    }

    #[test]
    fn explicit_compress_html_overrides_default() {
        let raw = PartialSiteConfig {
            compress_html: Some(false),
            ..Default::default()
        };
        let config = resolve(raw).unwrap();
        assert!(!config.compress_html);
        assert_eq!(config.base, "/");
    }
}
