//! Command-line interface for ESDC fiscal secure elements

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use esdc_apdu_core::Bytes;
use esdc_apdu_transport_pcsc::{PcscDeviceManager, PcscError};
use tracing::{debug, info};

mod config;
mod invoice;

use config::{Overrides, Settings};
use invoice::InvoiceFile;

#[derive(Parser)]
#[command(version, about = "Sign invoices with an ESDC fiscal secure element")]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "esdc.toml")]
    config: PathBuf,

    /// Reader to use (probes every reader if not specified)
    #[arg(short, long)]
    reader: Option<String>,

    /// PIN of the secure element
    #[arg(long)]
    pin: Option<String>,

    /// Debug level output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available readers
    List,

    /// Find the reader hosting the secure element
    Probe,

    /// Print the encoded invoice record as hex
    Encode {
        /// Invoice description file
        invoice: PathBuf,
    },

    /// Sign an invoice and print the device's response as hex
    Sign {
        /// Invoice description file
        invoice: PathBuf,
    },
}

fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let overrides = Overrides {
        pin: cli.pin,
        reader: cli.reader,
    };
    let settings = Settings::load(&cli.config, overrides)?;
    debug!(config = %cli.config.display(), ?settings, "Loaded settings");

    match cli.command {
        Commands::List => list_readers(),
        Commands::Probe => probe(&settings),
        Commands::Encode { invoice } => encode(&invoice),
        Commands::Sign { invoice } => sign(&settings, &invoice),
    }
}

fn list_readers() -> eyre::Result<()> {
    let manager = PcscDeviceManager::new()?;
    let readers = match manager.list_readers() {
        Ok(readers) => readers,
        Err(PcscError::NoReadersAvailable) => Vec::new(),
        Err(e) => return Err(e.into()),
    };

    if readers.is_empty() {
        println!("No readers found!");
        return Ok(());
    }

    println!("Available readers:");
    for (i, reader) in readers.iter().enumerate() {
        println!("{}. {reader}", i + 1);
    }

    Ok(())
}

fn probe(settings: &Settings) -> eyre::Result<()> {
    let manager = PcscDeviceManager::new()?;
    let aid = Bytes::from(settings.aid()?);
    let reader = esdc::find_reader(&manager, &aid, settings.reader.as_deref())?;

    println!("Secure element found in reader: {reader}");
    Ok(())
}

fn encode(path: &Path) -> eyre::Result<()> {
    let record = InvoiceFile::load(path)?.into_record()?;
    let encoded = record.encode()?;

    debug!(len = encoded.len(), "Encoded invoice record");
    println!("{}", hex::encode_upper(&encoded));
    Ok(())
}

fn sign(settings: &Settings, path: &Path) -> eyre::Result<()> {
    let record = InvoiceFile::load(path)?.into_record()?;
    let config = settings.session_config()?;

    let manager = PcscDeviceManager::new()?;
    let signed = esdc::sign_invoice(&manager, config, &record)?;

    info!(len = signed.len(), "Invoice signed");
    println!("{}", signed.to_hex());
    Ok(())
}

fn setup_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_ansi(true)
        .init();
}
