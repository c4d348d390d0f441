use clap::{Parser, Subcommand};
use discord_image_tools::imaging::{
    DecodeError, Dimensions, FitPolicy, OutputFormat, RustCodec, supported_input_mime_types,
};
use discord_image_tools::output::{self, InspectReport};
use discord_image_tools::session::{Session, SessionError};
use discord_image_tools::{config, profile::PlatformProfile};
use image::ImageFormat;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Profile selection shared by commands that fit images to a platform.
#[derive(clap::Args, Clone)]
struct ProfileArgs {
    /// Platform profile to fit into (overrides `profile` in the config)
    #[arg(long)]
    profile: Option<String>,
}

#[derive(clap::Args)]
struct OptimizeArgs {
    /// Image to optimize
    input: PathBuf,

    /// Directory the result is written to
    #[arg(long, short, default_value = ".")]
    output: PathBuf,

    /// Output width in pixels (height follows the aspect ratio if omitted)
    #[arg(long)]
    width: Option<u32>,

    /// Output height in pixels (width follows the aspect ratio if omitted)
    #[arg(long)]
    height: Option<u32>,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Encoding quality, 1-100 (out-of-range values are clamped)
    #[arg(long)]
    quality: Option<u32>,

    /// Keep the original dimensions instead of fitting to the profile
    #[arg(long)]
    keep_size: bool,

    /// Never scale small images up when fitting to the profile
    #[arg(long)]
    shrink_only: bool,

    #[command(flatten)]
    profile: ProfileArgs,
}

#[derive(Parser)]
#[command(name = "discord-image-tools")]
#[command(about = "Resize and re-encode images for Discord uploads")]
#[command(long_about = "\
Resize and re-encode images for Discord uploads

By default `optimize` fits the image into the selected platform profile
(1920x1080 for Discord) and encodes it as WebP at quality 85. Explicit
--width/--height/--format/--quality flags override the recommendation.

The result is written as optimized.<ext> in the output directory.
Dimensions or file sizes over the profile limits are reported as warnings,
not errors.

Run 'discord-image-tools gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Config file (missing file = stock defaults)
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Log session activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show an image's size and the settings the optimizer would pick
    Inspect {
        /// Image to inspect
        input: PathBuf,

        /// Print a JSON report instead of text
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        profile: ProfileArgs,
    },
    /// Resize and re-encode an image
    Optimize(OptimizeArgs),
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Inspect {
            input,
            json,
            profile,
        } => {
            let config = config::load_config(&cli.config)?;
            let (profile_name, profile) = select_profile(&config, &profile)?;
            let mut session = Session::new(profile, config.optimizer_policy());
            let (dims, mime, byte_len) = upload_file(&mut session, &RustCodec::new(), &input)?;
            let recommended = session.recommended_spec()?;

            if json {
                let report = InspectReport {
                    width: dims.width,
                    height: dims.height,
                    mime_type: mime,
                    bytes: byte_len,
                    profile: &profile_name,
                    limits: profile,
                    recommended,
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_source(dims, mime, byte_len);
                output::print_target("Recommended", &recommended, &profile_name, &profile);
            }
        }
        Command::Optimize(args) => run_optimize(&cli.config, args)?,
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn run_optimize(config_path: &Path, args: OptimizeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_config(config_path)?;
    let (profile_name, profile) = select_profile(&config, &args.profile)?;
    let mut policy = config.optimizer_policy();
    if args.shrink_only {
        policy.fit = FitPolicy::ShrinkOnly;
    }

    let codec = RustCodec::new();
    let mut session = Session::new(profile, policy);
    let (dims, mime, byte_len) = upload_file(&mut session, &codec, &args.input)?;
    output::print_source(dims, mime, byte_len);

    if !args.keep_size {
        session.apply_recommended()?;
    }
    session.resize(args.width, args.height)?;
    if let Some(format) = args.format {
        session.set_format(format)?;
    }
    if let Some(quality) = args.quality {
        session.set_quality(quality)?;
    }
    if let Some(spec) = session.target_spec() {
        output::print_target("Target", spec, &profile_name, &profile);
    }

    let artifact = session.encode(&codec)?;
    std::fs::create_dir_all(&args.output)?;
    let path = args.output.join(artifact.suggested_file_name());
    std::fs::write(&path, artifact.bytes())?;
    output::print_artifact(artifact, &path);

    output::print_warnings(&session.limit_warnings());
    Ok(())
}

/// Resolve the profile from the CLI flag, falling back to the config.
fn select_profile(
    config: &config::ToolConfig,
    args: &ProfileArgs,
) -> Result<(String, PlatformProfile), config::ConfigError> {
    let name = args.profile.clone().unwrap_or_else(|| config.profile.clone());
    let profile = config.lookup_profile(&name)?;
    Ok((name, profile))
}

/// Feed a file into the session, listing the decodable formats when its
/// format has no decoder.
fn upload_file(
    session: &mut Session,
    codec: &RustCodec,
    path: &Path,
) -> Result<(Dimensions, &'static str, u64), Box<dyn std::error::Error>> {
    let (bytes, mime) = read_upload(path)?;
    let byte_len = bytes.len() as u64;
    match session.accept_upload(codec, bytes, mime) {
        Ok(dims) => Ok((dims, mime, byte_len)),
        Err(e) => {
            if let SessionError::Decode(DecodeError::UnsupportedFormat(_)) = e {
                output::print_supported_inputs(&supported_input_mime_types());
            }
            Err(e.into())
        }
    }
}

/// Read a file and derive its declared MIME type from the extension,
/// the way a browser file picker would.
fn read_upload(path: &Path) -> std::io::Result<(Vec<u8>, &'static str)> {
    let bytes = std::fs::read(path)?;
    let mime = ImageFormat::from_path(path)
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream");
    Ok((bytes, mime))
}

fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "discord_image_tools=debug"
    } else {
        "discord_image_tools=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
