use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use geoid::GridHeader;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

/// Geoid grid conversion and height query tool
#[derive(Parser)]
#[command(name = "geoid")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Geoid model file (.asc or .bin, optionally .gz)
    #[arg(short, long, env = "GEOID_MODEL_PATH", global = true)]
    model: Option<PathBuf>,

    /// Reject models whose version tag differs
    #[arg(long, env = "GEOID_EXPECTED_VERSION", global = true)]
    expected_version: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a grid between ISG, ASC and binary formats
    Convert {
        /// Input file (.isg, .asc or .bin, optionally .gz)
        input: PathBuf,

        /// Output file (.asc or .bin, optionally .gz)
        output: PathBuf,

        /// Gzip the output even without a .gz extension
        #[arg(short, long)]
        gzip: bool,

        #[command(flatten)]
        layout: IsgLayoutArgs,
    },

    /// Query geoid height for a single coordinate
    Query {
        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,

        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Add geoid heights to every row of a CSV file
    Batch {
        /// Input CSV file
        input: PathBuf,

        /// Output file (defaults to <input>_geoid.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Column name for longitude
        #[arg(long, default_value = "lng")]
        lng_col: String,

        /// Column name for latitude
        #[arg(long, default_value = "lat")]
        lat_col: String,
    },

    /// Display header and statistics of a geoid model
    Info,
}

/// Grid geometry of an ISG input; defaults to GSIGEO2024 (beta).
#[derive(Args, Debug)]
pub struct IsgLayoutArgs {
    /// Number of ISG columns
    #[arg(long)]
    pub n_lng: Option<u16>,

    /// Number of ISG rows
    #[arg(long)]
    pub n_lat: Option<u16>,

    /// Western edge longitude
    #[arg(long, allow_hyphen_values = true)]
    pub lng_min: Option<f64>,

    /// Southern edge latitude
    #[arg(long, allow_hyphen_values = true)]
    pub lat_min: Option<f64>,

    /// Longitude step denominator (spacing = 1/denom degrees)
    #[arg(long)]
    pub lng_denom: Option<u16>,

    /// Latitude step denominator (spacing = 1/denom degrees)
    #[arg(long)]
    pub lat_denom: Option<u16>,

    /// Grid kind tag
    #[arg(long)]
    pub kind: Option<u16>,

    /// Version tag written to the output
    #[arg(long = "tag")]
    pub version: Option<String>,
}

impl IsgLayoutArgs {
    pub fn to_header(&self) -> GridHeader {
        let preset = GridHeader::gsigeo2024_beta();
        GridHeader {
            n_lng: self.n_lng.unwrap_or(preset.n_lng),
            n_lat: self.n_lat.unwrap_or(preset.n_lat),
            lng_min: self.lng_min.unwrap_or(preset.lng_min),
            lat_min: self.lat_min.unwrap_or(preset.lat_min),
            lng_denom: self.lng_denom.unwrap_or(preset.lng_denom),
            lat_denom: self.lat_denom.unwrap_or(preset.lat_denom),
            kind: self.kind.unwrap_or(preset.kind),
            version: self.version.clone().unwrap_or(preset.version),
        }
    }
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("geoid=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            input,
            output,
            gzip,
            layout,
        } => commands::convert::run(input, output, gzip, layout.to_header()),
        Commands::Query { lng, lat, json } => {
            commands::query::run(cli.model, cli.expected_version, lng, lat, json)
        }
        Commands::Batch {
            input,
            output,
            lng_col,
            lat_col,
        } => commands::batch::run(
            cli.model,
            cli.expected_version,
            input,
            output,
            lng_col,
            lat_col,
        ),
        Commands::Info => commands::info::run(cli.model, cli.expected_version),
    }
}
