use anyhow::Context;
use clap::Parser;
use env_logger::{Builder, Env};

use mandelbrot_zoom::cli::args::{CommandsEnum, MandelbrotZoomArgs, ParameterFilePath};
use mandelbrot_zoom::cli::explore::explore_mandelbrot;
use mandelbrot_zoom::cli::render::render_mandelbrot;
use mandelbrot_zoom::core::file_io::{
    build_output_path_with_date_time, extract_base_name, maybe_date_time_string, FilePrefix,
};
use mandelbrot_zoom::fractals::mandelbrot::MandelbrotParams;

const PROJECT_NAME: &str = "mandelbrot";

fn load_params(args: &ParameterFilePath) -> anyhow::Result<MandelbrotParams> {
    let mut params = MandelbrotParams::load(&args.params_path)
        .with_context(|| format!("Unable to load parameters from {}", args.params_path))?;
    if let Some(worker_count) = args.workers {
        params.render_options.worker_count = Some(worker_count);
    }
    Ok(params)
}

fn build_file_prefix(args: &ParameterFilePath) -> FilePrefix {
    FilePrefix {
        directory_path: build_output_path_with_date_time(
            &args.params_path,
            PROJECT_NAME,
            &maybe_date_time_string(args.date_time_out),
        ),
        file_base: extract_base_name(&args.params_path).to_owned(),
    }
}

fn main() -> anyhow::Result<()> {
    Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = MandelbrotZoomArgs::parse();

    match &args.command {
        Some(CommandsEnum::Render(params_args)) => {
            let params = load_params(params_args)?;
            render_mandelbrot(&params, build_file_prefix(params_args))?;
        }
        Some(CommandsEnum::Explore(params_args)) => {
            let params = load_params(params_args)?;
            explore_mandelbrot(&params, build_file_prefix(params_args))?;
        }
        None => {
            log::info!("No command given; try `render <params.json>` or `explore <params.json>`.");
        }
    }
    Ok(())
}
