//! CLI output formatting.
//!
//! # Output Format
//!
//! ```text
//! Layers
//!     site.toml
//!     deploy.json
//!
//! Site
//!     Origin: https://dotchk.org
//!     Base: /
//!     Compress HTML: yes
//! Build
//!     Inline stylesheets: auto
//!     Assets: assets/
//!     Minify: yes
//! Prefetch
//!     All links: yes
//!     Strategy: viewport
//! Images
//!     Domains: (none)
//!     Remote patterns: (none)
//! ```
//!
//! Each `format_*` function returns `Vec<String>` for testability and has a
//! `print_*` wrapper that writes to stdout. Format functions are pure.

use crate::config::SiteConfig;
use std::fmt::Display;
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

/// Format a labelled list: inline `(none)` when empty, one per line otherwise.
fn list_lines<T: Display>(label: &str, items: &[T]) -> Vec<String> {
    if items.is_empty() {
        return vec![format!("{}{}: (none)", indent(1), label)];
    }
    let mut lines = vec![format!("{}{}:", indent(1), label)];
    lines.extend(items.iter().map(|item| format!("{}{item}", indent(2))));
    lines
}

/// Format the config files that were layered, in merge order.
pub fn format_layers<P: AsRef<Path>>(paths: &[P]) -> Vec<String> {
    let mut lines = vec!["Layers".to_string()];
    if paths.is_empty() {
        lines.push(format!("{}(stock defaults)", indent(1)));
    } else {
        lines.extend(
            paths
                .iter()
                .map(|p| format!("{}{}", indent(1), p.as_ref().display())),
        );
    }
    lines
}

/// Format a resolved config as a sectioned summary.
pub fn format_config(config: &SiteConfig) -> Vec<String> {
    let mut lines = vec![
        "Site".to_string(),
        format!(
            "{}Origin: {}",
            indent(1),
            config.site.as_deref().unwrap_or("(unset)")
        ),
        format!("{}Base: {}", indent(1), config.base),
        format!("{}Compress HTML: {}", indent(1), yes_no(config.compress_html)),
        "Build".to_string(),
        format!(
            "{}Inline stylesheets: {}",
            indent(1),
            config.build.inline_stylesheets
        ),
        format!("{}Assets: {}/", indent(1), config.build.assets),
        format!("{}Minify: {}", indent(1), yes_no(config.build.minify)),
        "Prefetch".to_string(),
        format!("{}All links: {}", indent(1), yes_no(config.prefetch.prefetch_all)),
        format!("{}Strategy: {}", indent(1), config.prefetch.default_strategy),
        "Images".to_string(),
    ];
    lines.extend(list_lines("Domains", &config.image.domains));
    lines.extend(list_lines("Remote patterns", &config.image.remote_patterns));
    lines
}

/// Format the `check` command output: layers, a blank line, then the config.
pub fn format_check_output<P: AsRef<Path>>(config: &SiteConfig, paths: &[P]) -> Vec<String> {
    let mut lines = format_layers(paths);
    lines.push(String::new());
    lines.extend(format_config(config));
    lines
}

pub fn print_check_output<P: AsRef<Path>>(config: &SiteConfig, paths: &[P]) {
    for line in format_check_output(config, paths) {
        println!("{}", line);
    }
}
