use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;

use crate::error::{AppError, Result};
use crate::transcript::to_markdown;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    #[value(alias = "md")]
    Markdown,
}

impl OutputFormat {
    /// An explicit choice wins; otherwise `.md`/`.markdown` files get Markdown.
    pub fn for_path(path: &Path, explicit: Option<OutputFormat>) -> OutputFormat {
        if let Some(format) = explicit {
            return format;
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("md") | Some("markdown") => OutputFormat::Markdown,
            _ => OutputFormat::Text,
        }
    }

    pub fn apply(self, transcript: &str) -> String {
        match self {
            OutputFormat::Text => transcript.to_string(),
            OutputFormat::Markdown => to_markdown(transcript),
        }
    }
}

/// Paths without an extension get `.md`.
pub fn output_path(requested: &Path) -> PathBuf {
    if requested.extension().is_some() {
        requested.to_path_buf()
    } else {
        requested.with_extension("md")
    }
}

/// Write `content` to `requested`, creating parent directories. Returns the
/// path actually written.
pub fn save_transcript(
    content: &str,
    requested: &Path,
    explicit: Option<OutputFormat>,
) -> Result<PathBuf> {
    let path = output_path(requested);
    let format = OutputFormat::for_path(&path, explicit);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| AppError::WriteFile {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    fs::write(&path, format.apply(content)).map_err(|e| AppError::WriteFile {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(path)
}
