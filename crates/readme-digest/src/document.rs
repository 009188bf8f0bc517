use anyhow::{Context, Result};
use regex::{Captures, Regex};
use std::fs;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum SpliceError {
    #[error("marker pair '<!-- {marker} starts -->' / '<!-- {marker} ends -->' not found")]
    MarkerNotFound { marker: String },

    #[error("invalid marker pattern: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpliceMode {
    /// Put the fragment on its own lines between the markers.
    #[default]
    Block,
    /// Insert the fragment verbatim, directly against the markers.
    Inline,
}

/// Replace the interior of every `<!-- marker starts -->` … `<!-- marker ends -->`
/// region in `content` with `chunk`.
///
/// The marker tags and everything outside the regions are kept byte for byte.
pub fn replace_chunk(
    content: &str,
    marker: &str,
    chunk: &str,
    mode: SpliceMode,
) -> Result<String, SpliceError> {
    let marker_pattern = regex::escape(marker);
    let pattern = Regex::new(&format!(
        r"(?s)(<!--\s*{m}\s+starts\s*-->)(.*?)(<!--\s*{m}\s+ends\s*-->)",
        m = marker_pattern
    ))?;

    if !pattern.is_match(content) {
        return Err(SpliceError::MarkerNotFound {
            marker: marker.to_string(),
        });
    }

    let body = match mode {
        SpliceMode::Block => format!("\n{}\n", chunk.trim()),
        SpliceMode::Inline => chunk.to_string(),
    };

    let replaced = pattern.replace_all(content, |caps: &Captures| {
        format!("{}{}{}", &caps[1], body, &caps[3])
    });

    Ok(replaced.into_owned())
}

/// A text file with marker-delimited regions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    content: String,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Document not found: {}", path.display());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Ok(Self::new(content))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, &self.content)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Splice `fragment` into the `marker` region. On error the document is
    /// left untouched.
    pub fn splice(&mut self, marker: &str, fragment: &str, mode: SpliceMode) -> Result<(), SpliceError> {
        self.content = replace_chunk(&self.content, marker, fragment, mode)?;
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn into_string(self) -> String {
        self.content
    }
}
