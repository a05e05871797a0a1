use std::fs;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use musys::cli::Cli;
use musys::device_table::DeviceTable;
use musys::error::{LoadError, OutputError};
use musys::paragraphs::DataParagraphs;
use musys::{Interpreter, RunConfig};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config: RunConfig = cli.into();
    init_tracing(config.debug);

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("musys: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("musys=debug")
    } else {
        EnvFilter::new("musys=warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Output(#[from] OutputError),
}

fn run(config: &RunConfig) -> Result<(), RunError> {
    let source = fs::read_to_string(&config.source_path).map_err(|source_err| {
        LoadError::SourceUnreadable {
            path: config.source_path.display().to_string(),
            source: source_err,
        }
    })?;
    let program = musys::loader::load(&source)?;

    let data = match &config.data_path {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|source_err| LoadError::DataUnreadable {
                path: path.display().to_string(),
                source: source_err,
            })?;
            DataParagraphs::parse(&text)
        }
        None => DataParagraphs::default(),
    };

    let devices = match &config.devices_path {
        Some(path) => {
            let text =
                fs::read_to_string(path).map_err(|source_err| LoadError::DeviceCatalogUnreadable {
                    path: path.display().to_string(),
                    source: source_err,
                })?;
            DeviceTable::parse(&text)?
        }
        None => DeviceTable::default_catalog(),
    };

    let sink: Box<dyn std::io::Write> = Box::new(std::io::stdout());
    let mut interpreter = Interpreter::new(program, data, devices, config.seed, sink);
    interpreter.run();

    musys::output::write_buses(interpreter.buses(), &config.output_path)?;
    Ok(())
}
