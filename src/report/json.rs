use crate::error::{BenchError, Result};
use crate::types::config::Options;
use crate::types::result::RawResult;
use crate::types::scoring::ScoreSummary;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct ResultDocument<'a> {
    pub options: &'a Options,
    #[serde(flatten)]
    pub result: &'a RawResult,
    pub summary: &'a ScoreSummary,
}

pub fn to_json(document: &ResultDocument<'_>) -> std::result::Result<String, serde_json::Error> {
    serde_json::to_string_pretty(document)
}

/// Checked before the run so a bad path is a configuration error, not a lost result.
pub fn check_output_path(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Err(BenchError::ResultPath(format!(
            "{} is a directory",
            path.display()
        )));
    }
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !parent.is_dir() {
        return Err(BenchError::ResultPath(format!(
            "{}: directory {} does not exist",
            path.display(),
            parent.display()
        )));
    }
    Ok(())
}

pub fn write_json(path: &Path, document: &ResultDocument<'_>) -> Result<()> {
    let rendered = to_json(document)?;
    std::fs::write(path, rendered)?;
    Ok(())
}
