use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;

pub fn extract_base_name(path: &str) -> &str {
    Path::new(path)
        .file_stem() // Get the base name component of the path
        .and_then(|name| name.to_str())
        .unwrap_or("render")
}

/**
 * Output directory for a render: `out/<project>/<params base name>[/<datetime>]`.
 */
pub fn build_output_path_with_date_time(
    params_path: &str,
    project: &str,
    datetime: &Option<String>,
) -> PathBuf {
    let mut dirs = vec!["out", project, extract_base_name(params_path)];
    if let Some(inner_datetime_str) = datetime {
        dirs.push(inner_datetime_str);
    }
    dirs.iter().collect()
}

pub fn date_time_string() -> String {
    use chrono::{Datelike, Local, Timelike};
    let local_time = Local::now();
    format!(
        "{:04}{:02}{:02}_{:02}{:02}{:02}",
        local_time.year(),
        local_time.month(),
        local_time.day(),
        local_time.hour(),
        local_time.minute(),
        local_time.second()
    )
}

pub fn maybe_date_time_string(enable: bool) -> Option<String> {
    if enable {
        Some(date_time_string())
    } else {
        None
    }
}

/**
 * Store a path and prefix together, making it easy to quickly generate
 * a collection of files with the same prefix, but separate suffixes.
 */
#[derive(Debug, Clone)]
pub struct FilePrefix {
    pub directory_path: PathBuf,
    pub file_base: String,
}

impl FilePrefix {
    pub fn create_directory(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.directory_path)
    }

    pub fn with_suffix(&self, suffix: &str) -> PathBuf {
        self.directory_path.join(self.file_base.clone() + suffix)
    }

    pub fn create_file_with_suffix(
        &self,
        suffix: &str,
    ) -> std::io::Result<std::io::BufWriter<std::fs::File>> {
        let file = std::fs::File::create(self.with_suffix(suffix))?;
        Ok(std::io::BufWriter::new(file))
    }
}

pub fn serialize_to_json<T: Serialize>(filename: &Path, data: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(data)?;
    std::fs::write(filename, text)
        .with_context(|| format!("Unable to write {}", filename.display()))?;
    Ok(())
}
