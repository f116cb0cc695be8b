use clap::Parser;
use log::{error, info};
use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use rgba_merge::{
    backends::gdal_backend::{data_type_of, GdalDriver, GdalSample, GdalSource},
    cli::{init_logging, Args},
    merge, resolve_profile, LogObserver, MergeError, MergeOptions, Result,
};

fn merge_files<T: GdalSample>(
    inputs: &[PathBuf],
    output: &Path,
    options: &MergeOptions,
    print_profile: bool,
) -> Result<()> {
    let sources = inputs
        .iter()
        .map(|path| GdalSource::open::<T, _>(path))
        .collect::<Result<Vec<_>>>()?;

    if print_profile {
        let (_, profile) = resolve_profile::<T, _>(&sources, options)?;
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }

    let merged = merge::<T, _, _>(&sources, &GdalDriver::new(output), options, &mut LogObserver)?;
    info!(
        "wrote {} ({}x{}) in {} blocks, {} finished early",
        output.display(),
        merged.profile.width,
        merged.profile.height,
        merged.summary.blocks,
        merged.summary.early_exits
    );
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    let (inputs, output) = args.resolve_inout()?;
    let options = args.to_options()?;
    let first = inputs.first().map(data_type_of).transpose()?;
    match first.as_deref() {
        Some("uint8") => merge_files::<u8>(&inputs, &output, &options, args.print_profile),
        Some("uint16") => merge_files::<u16>(&inputs, &output, &options, args.print_profile),
        Some("int16") => merge_files::<i16>(&inputs, &output, &options, args.print_profile),
        Some("uint32") => merge_files::<u32>(&inputs, &output, &options, args.print_profile),
        Some("int32") => merge_files::<i32>(&inputs, &output, &options, args.print_profile),
        Some("float32") => merge_files::<f32>(&inputs, &output, &options, args.print_profile),
        Some("float64") => merge_files::<f64>(&inputs, &output, &options, args.print_profile),
        other => Err(MergeError::DataTypeMismatch {
            expected: "a supported sample type",
            found: other.unwrap_or_default().to_string(),
        }),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.log_level());
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
