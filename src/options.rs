use std::path::PathBuf;

use structopt::StructOpt;

use crate::data::{Algorithm, Strategy};

#[derive(Debug, StructOpt)]
#[structopt(about = "A tool to lay out sprite sheets by packing rectangles")]
pub struct Options {
    #[structopt(flatten)]
    pub global: GlobalOptions,

    #[structopt(subcommand)]
    pub command: Subcommand,
}

#[derive(Debug, StructOpt)]
pub struct GlobalOptions {
    /// Hides the progress bar, even when writing to a terminal.
    #[structopt(long, global = true)]
    pub no_progress: bool,
}

#[derive(Debug, StructOpt)]
pub enum Subcommand {
    /// Packs the rects listed in a sheetpack.toml file and writes the
    /// resulting layout as JSON.
    Pack(PackOptions),
}

#[derive(Debug, StructOpt)]
pub struct PackOptions {
    /// The path to a sheetpack.toml file, or a folder containing one. Defaults
    /// to the current working directory.
    pub project_path: Option<PathBuf>,

    /// Where to write the layout. Defaults to stdout.
    #[structopt(long, short)]
    pub output: Option<PathBuf>,

    /// Stops searching after this many seconds and uses the best layout found
    /// so far.
    #[structopt(long)]
    pub timeout: Option<u64>,

    /// Overrides the strategy from the project file.
    ///
    /// Options: unknown-size, power-of-two, fixed-size, genetic
    #[structopt(long)]
    pub strategy: Option<Strategy>,

    /// Overrides the placement algorithm from the project file.
    ///
    /// Options: guillotine, maximal-rects, skyline, skyline-fast
    #[structopt(long)]
    pub algorithm: Option<Algorithm>,
}
