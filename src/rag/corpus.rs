//! Batch corpus loading and splitting.

use std::path::Path;

use crate::core::config::SplitMode;

use super::error::RagError;

pub async fn load_corpus(path: &Path, mode: SplitMode) -> Result<Vec<String>, RagError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| RagError::Corpus {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
    Ok(split_corpus(&text, mode))
}

/// `Whole` keeps the file as one unit; `Paragraph` splits on blank lines.
/// Blank units are dropped in both modes.
pub fn split_corpus(text: &str, mode: SplitMode) -> Vec<String> {
    match mode {
        SplitMode::Whole => {
            if text.trim().is_empty() {
                Vec::new()
            } else {
                vec![text.to_string()]
            }
        }
        SplitMode::Paragraph => {
            let mut units = Vec::new();
            let mut current: Vec<&str> = Vec::new();
            for line in text.lines() {
                if line.trim().is_empty() {
                    flush(&mut current, &mut units);
                } else {
                    current.push(line.trim_end());
                }
            }
            flush(&mut current, &mut units);
            units
        }
    }
}

fn flush(current: &mut Vec<&str>, units: &mut Vec<String>) {
    if current.is_empty() {
        return;
    }
    let unit = current.join("\n");
    let trimmed = unit.trim();
    if !trimmed.is_empty() {
        units.push(trimmed.to_string());
    }
    current.clear();
}
