use clap::{Parser, Subcommand};
use image_uploader::config::{self, UploaderConfig};
use image_uploader::imaging::{self, CropInput, PixelRect, Quality};
use image_uploader::output::{self, CheckResult, ConsoleHooks};
use image_uploader::preview::BlobRegistry;
use image_uploader::scan;
use image_uploader::upload::ReqwestTransport;
use image_uploader::uploader::{Phase, Uploader};
use image_uploader::validation::{self, ValidationError};
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "image-uploader")]
#[command(about = "Validate, crop and upload images")]
#[command(long_about = "\
Validate, crop and upload images

Runs the uploader core headlessly: files are validated against the configured
size, type and count limits, optionally cropped, and submitted as multipart
form data.

Examples:

  image-uploader check photos/
  image-uploader crop dawn.jpg --rect 10,10,400,300 -o dawn-cropped.jpg
  image-uploader compress dawn.png --quality 70 -o dawn.jpg
  image-uploader upload --url https://example.com/upload dawn.jpg dusk.png

Directories are walked recursively; only image files inside them are used.
The declared media type of each file comes from its extension.

Run 'image-uploader gen-config' to generate a documented uploader.toml.")]
#[command(version)]
struct Cli {
    /// Config file (missing file = stock defaults)
    #[arg(long, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate files against the configured limits
    Check {
        /// Files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Crop one image and write the result
    Crop(CropArgs),
    /// Re-encode one image as JPEG at a lower quality
    Compress(CompressArgs),
    /// Validate, crop when enabled, and upload files
    Upload(UploadArgs),
    /// Print a stock uploader.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct CropArgs {
    /// Source image
    input: PathBuf,

    /// Region as x,y,width,height in source pixels. Defaults to the largest
    /// centred area for the configured aspect ratio.
    #[arg(long, value_parser = parse_rect)]
    rect: Option<PixelRect>,

    /// Destination file
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(clap::Args)]
struct CompressArgs {
    /// Source image
    input: PathBuf,

    /// JPEG quality (1-100)
    #[arg(long, default_value_t = imaging::DEFAULT_COMPRESS_QUALITY.value())]
    #[arg(value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Destination file
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(clap::Args)]
struct UploadArgs {
    /// Files or directories
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Upload endpoint, overrides upload.url
    #[arg(long)]
    url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Check { paths } => {
            let config = config::load_config(&cli.config)?;
            check(&config, &paths)?;
        }
        Command::Crop(args) => {
            let config = config::load_config(&cli.config)?;
            crop(&config, &args)?;
        }
        Command::Compress(args) => {
            compress(&args)?;
        }
        Command::Upload(args) => {
            let mut config = config::load_config(&cli.config)?;
            if let Some(url) = args.url {
                config.upload.url = Some(url);
                config.validate()?;
            }
            upload(config, &args.paths).await?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_rect(value: &str) -> Result<PixelRect, String> {
    let parts = value
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid number in '{value}': {e}"))?;
    match parts[..] {
        [x, y, width, height] => Ok(PixelRect::new(x, y, width, height)),
        _ => Err(format!("expected x,y,width,height, got '{value}'")),
    }
}

fn check(config: &UploaderConfig, paths: &[PathBuf]) -> Result<(), Box<dyn Error>> {
    let results: Vec<CheckResult> = scan::load_payloads(paths)?
        .into_iter()
        .map(|payload| {
            let error =
                validation::validate_one(&payload, config.max_file_size, &config.accepted_types);
            CheckResult { payload, error }
        })
        .collect();
    let count_error = (results.len() > config.max_files).then_some(ValidationError::TooMany {
        max: config.max_files,
    });

    output::print_check_results(&results, count_error.as_ref());

    if count_error.is_some() || results.iter().any(|r| r.error.is_some()) {
        return Err("validation failed".into());
    }
    Ok(())
}

fn crop(config: &UploaderConfig, args: &CropArgs) -> Result<(), Box<dyn Error>> {
    let payload = scan::load_payload(&args.input)?;
    let rect = match args.rect {
        Some(rect) => rect,
        None => {
            let (width, height) = imaging::image_dimensions(&payload.bytes)?;
            imaging::calculate_crop_area(width, height, config.crop.aspect_ratio)
        }
    };

    let cropped = imaging::crop(
        &CropInput::from_payload(&payload),
        &rect,
        &config.crop_options(),
    )?;
    std::fs::write(&args.output, &cropped.bytes)?;

    let dimensions = imaging::image_dimensions(&cropped.bytes)?;
    output::print_crop_result(&args.input, &args.output, &rect, &cropped, dimensions);
    Ok(())
}

fn compress(args: &CompressArgs) -> Result<(), Box<dyn Error>> {
    let payload = scan::load_payload(&args.input)?;
    let quality = Quality::new(args.quality);
    let compressed = imaging::compress(&payload, quality)?;
    std::fs::write(&args.output, &compressed.bytes)?;

    output::print_compress_result(&args.input, &args.output, &payload, &compressed, quality);
    Ok(())
}

/// Drive a full uploader: one selection per file, default crop when cropping
/// is enabled, then a single upload.
async fn upload(config: UploaderConfig, paths: &[PathBuf]) -> Result<(), Box<dyn Error>> {
    if config.upload.url.is_none() {
        return Err("no upload url: set upload.url in the config or pass --url".into());
    }
    let payloads = scan::load_payloads(paths)?;

    let mut uploader = Uploader::new(
        config,
        BlobRegistry::new(),
        ReqwestTransport::new(),
        ConsoleHooks::default(),
    );

    for payload in payloads {
        uploader.select_files(vec![payload]);
        if matches!(uploader.phase(), Phase::AwaitingCrop(_)) {
            match uploader.default_crop_rect().await {
                Ok(Some(rect)) => {
                    uploader.confirm_crop(rect).await;
                }
                Ok(None) => {}
                Err(e) => {
                    uploader.cancel_crop();
                    return Err(e.into());
                }
            }
        }
        if let Some(error) = uploader.hooks().errors.first() {
            return Err(error.clone().into());
        }
        uploader.frame_committed(uploader.machine().revision());
    }

    uploader.upload().await;
    output::print_entries(uploader.entries());

    let outcome = match uploader.hooks().outcome() {
        Ok(Some(_)) => Ok(()),
        Ok(None) => {
            tracing::info!("every file was already uploaded");
            Ok(())
        }
        Err(error) => Err(error.into()),
    };
    uploader.unmount();
    outcome
}
