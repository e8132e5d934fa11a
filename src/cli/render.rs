use std::io::Write;

use anyhow::Context;

use crate::core::{
    file_io::{serialize_to_json, FilePrefix},
    image_utils::write_image_to_file,
    stopwatch::Stopwatch,
};
use crate::fractals::mandelbrot::{render_with_precision, MandelbrotParams, RenderDiagnostics};

/**
 * Render the parameters once, writing three files next to each other:
 * `<base>.json` (the effective parameters), `<base>.png`, and `<base>_diagnostics.txt`.
 */
pub fn render_mandelbrot(
    params: &MandelbrotParams,
    file_prefix: FilePrefix,
) -> anyhow::Result<RenderDiagnostics> {
    let mut stopwatch = Stopwatch::new("Render Stopwatch".to_owned());

    file_prefix.create_directory().with_context(|| {
        format!(
            "Unable to create output directory {}",
            file_prefix.directory_path.display()
        )
    })?;
    serialize_to_json(&file_prefix.with_suffix(".json"), params)?;

    stopwatch.record_split("basic setup".to_owned());

    let output = render_with_precision(params);

    stopwatch.record_split("compute escape times".to_owned());

    write_image_to_file(&file_prefix.with_suffix(".png"), &output.image)?;

    stopwatch.record_split("write PNG".to_owned());

    let mut diagnostics_file = file_prefix.create_file_with_suffix("_diagnostics.txt")?;
    stopwatch.display(&mut diagnostics_file)?;
    writeln!(diagnostics_file, "Precision: {}", params.precision)?;
    writeln!(
        diagnostics_file,
        "{}",
        serde_json::to_string_pretty(&output.diagnostics)?
    )?;
    diagnostics_file.flush()?;

    Ok(output.diagnostics)
}
