use clap::{Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use dotchk_site::{config, output};
use std::path::PathBuf;
use url::Url;

/// Config files to layer, lowest priority first.
#[derive(clap::Args, Clone)]
struct LayerArgs {
    /// Config files (.toml or .json); later files override earlier ones
    files: Vec<PathBuf>,
}

#[derive(Parser)]
#[command(name = "dotchk-site")]
#[command(about = "Validate and normalize the dotchk.org site build config")]
#[command(long_about = "\
Validate and normalize the dotchk.org site build config

Config files are layered on top of the stock defaults in the order given.
Each file only needs the keys it wants to override:

  site.toml          # site = \"https://dotchk.org\"
  deploy.json        # {\"base\": \"/preview/\"}

Run 'dotchk-site gen-config' to generate a documented site.toml.")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve the config and print a summary
    Check(LayerArgs),
    /// Print the resolved config as JSON for the build tool
    Resolve(LayerArgs),
    /// Check whether a remote image URL is allowed by the image config
    ImageAllowed {
        /// Remote image URL
        url: Url,
        #[command(flatten)]
        layers: LayerArgs,
    },
    /// Print a stock site.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .format_timestamp(None)
        .init();

    match cli.command {
        Command::Check(layers) => {
            let site_config = config::load_layered(&layers.files)?;
            output::print_check_output(&site_config, &layers.files);
            println!("==> Config is valid");
        }
        Command::Resolve(layers) => {
            let site_config = config::load_layered(&layers.files)?;
            println!("{}", site_config.to_json()?);
        }
        Command::ImageAllowed { url, layers } => {
            let site_config = config::load_layered(&layers.files)?;
            if site_config.image.is_remote_allowed(&url) {
                println!("allowed: {url}");
            } else {
                println!("blocked: {url}");
                std::process::exit(1);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
