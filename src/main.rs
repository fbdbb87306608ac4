// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use qr_studio::config::Config;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "qr-studio")]
#[command(about = "Generate QR codes from text and scan them with a camera")]
#[command(version = qr_studio::constants::app_info::version())]
#[command(subcommand_required = false)]
struct Cli {
    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive terminal UI (default)
    Terminal,

    /// List available cameras
    List,

    /// Encode text and save the QR code
    Generate {
        /// Text to encode
        text: String,

        /// Output file path (default: download directory, qrcode.png)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write an SVG instead of a PNG
        #[arg(long)]
        svg: bool,

        /// Side length of the PNG in pixels
        #[arg(short, long)]
        size: Option<u32>,

        /// Black on white with a quiet zone instead of the on-screen colors
        #[arg(long)]
        printable: bool,
    },

    /// Scan a single QR code
    Scan {
        /// Camera index to use (from 'qr-studio list')
        #[arg(short, long)]
        camera: Option<usize>,

        /// Scan an image file instead of a camera
        #[arg(short, long, conflicts_with = "camera")]
        image: Option<PathBuf>,

        /// Give up after this many seconds
        #[arg(short, long, default_value = "30")]
        timeout: u64,

        /// Copy the result to the clipboard
        #[arg(long)]
        copy: bool,

        /// Open the result in the browser if it is a link
        #[arg(long)]
        open: bool,
    },

    /// Show the effective configuration
    Config {
        /// Write the defaults to the config file if it does not exist
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let terminal_mode = matches!(cli.command, None | Some(Commands::Terminal));

    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=qr_studio=debug, RUST_LOG=info
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    if terminal_mode {
        // The terminal belongs to the UI; log to a file instead
        let log_path = qr_studio::storage::log_file_path();
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(log_file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    match cli.command {
        None | Some(Commands::Terminal) => qr_studio::terminal::run(config),
        Some(Commands::List) => cli::list_cameras(),
        Some(Commands::Generate {
            text,
            output,
            svg,
            size,
            printable,
        }) => cli::generate(&config, &text, output, svg, size, printable),
        Some(Commands::Scan {
            camera,
            image,
            timeout,
            copy,
            open,
        }) => cli::scan(config, camera, image, timeout, copy, open),
        Some(Commands::Config { init }) => cli::show_config(&config, cli.config, init),
    }
}
