use std::path::Path;
use log::info;
use crate::error::{CoreError, Result};

/// Ordered, read-only collection of descriptive phrases.
///
/// Each entry is a raw description line. Entries are split into
/// sub-fragments lazily by the [`PromptSynthesizer`](crate::PromptSynthesizer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentCorpus {
    entries: Vec<String>,
}

impl FragmentCorpus {
    /// Parse a corpus from text, one entry per line. Lines are trimmed and
    /// blank lines are dropped. An empty result is an error.
    pub fn parse(text: &str) -> Result<Self> {
        let entries: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        if entries.is_empty() {
            return Err(CoreError::EmptyCorpus);
        }

        Ok(Self { entries })
    }

    /// Load a corpus from a UTF-8 text file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CoreError::CorpusRead {
            path: path.to_path_buf(),
            source,
        })?;

        let corpus = Self::parse(&text)?;
        info!("Loaded {} corpus entries from {}", corpus.len(), path.display());
        Ok(corpus)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
