use clap::{Parser, Subcommand};
use koukoutu_node::config::{self, CONFIG_FILENAME};
use koukoutu_node::removal::NodeInputs;
use koukoutu_node::{HostImage, RemovalClient, RemovalError, RemovalRequest, cache, imaging};
use std::path::{Path, PathBuf};

/// Options shared by commands that build a removal request.
///
/// Anything left unset falls back to the `[defaults]` section of the config.
#[derive(clap::Args, Clone)]
struct RequestArgs {
    /// Input image (PNG, JPEG or WebP)
    input: PathBuf,

    /// Koukoutu API key
    #[arg(long, env = "KOUKOUTU_API_KEY", hide_env_values = true, default_value = "")]
    api_key: String,

    /// Segmentation model: general | stamp
    #[arg(long)]
    model: Option<String>,

    /// Result encoding: png | webp
    #[arg(long)]
    format: Option<String>,

    /// Crop the result to the subject's bounds
    #[arg(long, overrides_with = "no_crop")]
    crop: bool,

    /// Keep the full canvas even if the config enables cropping
    #[arg(long, overrides_with = "crop")]
    no_crop: bool,

    /// Auto-detect and crop printed stamps
    #[arg(long, overrides_with = "no_stamp_crop")]
    stamp_crop: bool,

    /// Leave stamps uncropped even if the config enables it
    #[arg(long, overrides_with = "stamp_crop")]
    no_stamp_crop: bool,

    /// Edge enhancement: none | standard | high
    #[arg(long)]
    border: Option<String>,

    /// Result delivery: file | url
    #[arg(long)]
    response: Option<String>,
}

impl RequestArgs {
    fn to_request(
        &self,
        defaults: &config::DefaultsConfig,
    ) -> Result<RemovalRequest, RemovalError> {
        RemovalRequest::from_inputs(&NodeInputs {
            api_key: &self.api_key,
            model: self.model.as_deref().unwrap_or(&defaults.model),
            output_format: self.format.as_deref().unwrap_or(&defaults.output_format),
            crop: switch(self.crop, self.no_crop).unwrap_or(defaults.crop),
            stamp_crop: switch(self.stamp_crop, self.no_stamp_crop).unwrap_or(defaults.stamp_crop),
            border: self.border.as_deref().unwrap_or(&defaults.border),
            response: self.response.as_deref().unwrap_or(&defaults.response),
        })
    }
}

/// A `--flag` / `--no-flag` pair: `None` when neither was given.
fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

#[derive(Parser)]
#[command(name = "koukoutu")]
#[command(about = "Remove image backgrounds with the Koukoutu API")]
#[command(long_about = "\
Remove image backgrounds with the Koukoutu API

The input image is uploaded as PNG; the result always comes back with an
alpha channel. Transient server errors are retried immediately.

The API key is read from --api-key or KOUKOUTU_API_KEY.

Run 'koukoutu gen-config' to generate a documented koukoutu.toml.")]
#[command(version)]
struct Cli {
    /// Config file (missing file = stock defaults)
    #[arg(long, default_value = CONFIG_FILENAME, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Remove the background of an image and write the cut-out
    Remove {
        #[command(flatten)]
        request: RequestArgs,

        /// Where to write the result (format follows the extension)
        output: PathBuf,
    },
    /// Print the cache key the node would report for these inputs
    CacheKey {
        #[command(flatten)]
        request: RequestArgs,
    },
    /// Print a stock koukoutu.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Remove { request, output } => {
            let config = config::load_config(&cli.config)?;
            let removal = request.to_request(&config.defaults)?;
            log_request(&removal);

            let image = read_host_image(&request.input)?;
            let client = RemovalClient::from_config(&config)?;
            let result = client.remove_background(&image, &removal)?;

            imaging::decode(&result)?.save(&output)?;
            println!("==> Wrote {}", output.display());
        }
        Command::CacheKey { request } => {
            let config = config::load_config(&cli.config)?;
            let removal = request.to_request(&config.defaults)?;
            let image = read_host_image(&request.input)?;
            println!("{}", cache::cache_key(&image, &removal));
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load an image file the way the host would hand it over.
fn read_host_image(path: &Path) -> Result<HostImage, image::ImageError> {
    let img = image::open(path)?;
    log::debug!("Read {} ({}x{})", path.display(), img.width(), img.height());
    Ok(imaging::encode(&img))
}

fn log_request(request: &RemovalRequest) {
    log::info!(
        "Removing background: model={}, format={}, border={}, response={}, crop={}, stamp_crop={}",
        request.model().wire_id(),
        request.output_format().wire_id(),
        request.border().wire_code(),
        request.response().wire_id(),
        request.crop(),
        request.stamp_crop()
    );
}
