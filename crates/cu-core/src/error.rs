use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Failed to read corpus '{path}': {source}")]
    CorpusRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corpus is empty")]
    EmptyCorpus,
}

pub type Result<T> = std::result::Result<T, CoreError>;
