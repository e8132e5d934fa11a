use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[clap(author, version, about)]
pub struct MandelbrotZoomArgs {
    #[command(subcommand)]
    pub command: Option<CommandsEnum>,
}

#[derive(Debug, Subcommand)]
pub enum CommandsEnum {
    /// Render the parameter file once and write the image and diagnostics to `out/`.
    Render(ParameterFilePath),
    /// Open a window; drag a rectangle with the left mouse button to zoom into it.
    Explore(ParameterFilePath),
}

#[derive(Debug, Args)]
pub struct ParameterFilePath {
    pub params_path: String,

    /// Write output into a date-time stamped sub-directory.
    #[clap(long, short)]
    pub date_time_out: bool,

    /// Override the number of worker threads from the parameter file.
    #[clap(long, short)]
    pub workers: Option<usize>,
}
