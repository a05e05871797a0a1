//! Command-line surface, in the teacher's derive-macro style.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "musys",
    version,
    about = "Interpreter for the MUSYS (Grogono, 1973) hybrid-studio control language"
)]
pub struct Cli {
    /// Source program to run.
    pub source: PathBuf,

    /// Data file supplying the A..Z data paragraphs.
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Where to write the six finished buses (defaults to `musys.out`).
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Device catalog override file; without this flag the built-in
    /// Grogono-1973 catalog is used.
    #[arg(long = "devices")]
    pub devices: Option<PathBuf>,

    /// Seed for the random operator (`^`), for reproducible runs.
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Enable per-character dispatch tracing on stderr.
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,
}
