//! Command line surface of `merge-rgba`.

use clap::{ArgAction, Parser};
use log::LevelFilter;
use std::path::PathBuf;

use crate::{
    components::{
        grid::{MergeOptions, Resolution},
        profile::ProfileOverrides,
    },
    errors::{MergeError, Result, ValidationError},
};

#[derive(Parser, Debug)]
#[command(name = "merge-rgba")]
#[command(about = "Merge RGBA rasters, earlier inputs win where their alpha is set")]
pub struct Args {
    /// Input files, followed by the output file unless --output is given
    #[arg(required = true, value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Output file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output bounds as west south east north
    #[arg(long, num_args = 4, allow_negative_numbers = true, value_names = ["W", "S", "E", "N"])]
    pub bounds: Option<Vec<f64>>,

    /// Output resolution, given once for both axes or twice for x then y
    #[arg(long, value_name = "RES", action = ArgAction::Append)]
    pub res: Option<Vec<f64>>,

    /// Decimal places used when snapping coordinates to pixels
    #[arg(long, default_value_t = crate::components::grid::DEFAULT_PRECISION)]
    pub precision: u32,

    /// Driver specific creation option, may be repeated
    #[arg(long = "co", value_name = "NAME=VALUE", action = ArgAction::Append)]
    pub creation_options: Vec<String>,

    /// Overwrite an existing output file
    #[arg(short, long)]
    pub force_overwrite: bool,

    /// Print the output profile as JSON and exit without writing
    #[arg(long)]
    pub print_profile: bool,

    /// Increase verbosity, may be repeated
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Splits `files` into inputs and output.
    ///
    /// Without `--output` the last file is the output. An existing output is
    /// refused unless overwriting is forced.
    pub fn resolve_inout(&self) -> Result<(Vec<PathBuf>, PathBuf)> {
        let (inputs, output) = match &self.output {
            Some(output) => (self.files.clone(), output.clone()),
            None => match self.files.split_last() {
                Some((output, inputs)) => (inputs.to_vec(), output.clone()),
                None => Err(ValidationError::NoSources)?,
            },
        };
        if inputs.is_empty() {
            Err(ValidationError::NoSources)?
        }
        if output.exists() && !self.force_overwrite && !self.print_profile {
            return Err(MergeError::OutputExists(output));
        }
        Ok((inputs, output))
    }

    pub fn to_options(&self) -> Result<MergeOptions> {
        let bounds = match self.bounds.as_deref() {
            None => None,
            Some(&[west, south, east, north]) => Some([west, south, east, north]),
            Some(other) => Err(ValidationError::BoundsLength(other.to_vec()))?,
        };
        let resolution = match &self.res {
            None => Resolution::Native,
            Some(values) if values.len() <= 2 => Resolution::Sequence(values.clone()),
            Some(values) => Err(ValidationError::InvalidResolution(values.clone()))?,
        };
        Ok(MergeOptions {
            bounds,
            resolution,
            precision: self.precision,
            overrides: ProfileOverrides::parse(&self.creation_options)?,
        })
    }

    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        }
    }
}

/// Installs `env_logger` at the level asked for by `-v`, `RUST_LOG` wins.
pub fn init_logging(level: LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}
