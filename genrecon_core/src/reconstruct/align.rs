//! Protein similarity search via an external aligner subprocess
//!
//! The aligner is any DIAMOND-compatible binary: it is invoked with a
//! protein query file and a reference database and writes a tabular hit
//! file whose first two columns are the query id and the best reference
//! hit. The subprocess is awaited to completion before model building
//! continues.

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::info;

/// Extension given to hit files written next to their query file
const HITS_EXTENSION: &str = "hits.out";

/// Handle on an external similarity-search binary and its database
#[derive(Clone, Debug)]
pub struct Aligner {
    binary: PathBuf,
    database: PathBuf,
}

impl Aligner {
    pub fn new(binary: impl Into<PathBuf>, database: impl Into<PathBuf>) -> Self {
        Aligner {
            binary: binary.into(),
            database: database.into(),
        }
    }

    /// Use a `diamond` binary found on the PATH
    pub fn diamond(database: impl Into<PathBuf>) -> Self {
        Aligner::new("diamond", database)
    }

    /// Search the query sequences against the database, writing hits to
    /// `output`
    ///
    /// Keeps only the single best reference hit per query. The processor
    /// count is passed through to the aligner untouched; when absent the
    /// aligner picks its own.
    pub fn search(
        &self,
        query: &Path,
        output: &Path,
        processors: Option<u32>,
    ) -> Result<(), AlignError> {
        let mut command = Command::new(&self.binary);
        command
            .arg("blastp")
            .arg("--db")
            .arg(&self.database)
            .arg("--query")
            .arg(query)
            .arg("--out")
            .arg(output)
            .args(["--more-sensitive", "--max-target-seqs", "1"]);
        if let Some(processors) = processors {
            command.args(["--threads", &processors.to_string()]);
        }

        info!(binary = %self.binary.display(), query = %query.display(), "running similarity search");
        let result = command.output().map_err(|source| AlignError::Spawn {
            binary: self.binary.clone(),
            source,
        })?;
        if !result.status.success() {
            return Err(AlignError::Failed {
                status: result.status.code(),
                stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
            });
        }
        Ok(())
    }
}

/// The conventional location of the hit file for a query file
pub fn hits_path(query: &Path) -> PathBuf {
    query.with_extension(HITS_EXTENSION)
}

#[derive(Debug, Error)]
pub enum AlignError {
    #[error("failed to launch aligner {binary:?}: {source}")]
    Spawn {
        binary: PathBuf,
        source: std::io::Error,
    },
    #[error("aligner exited with status {status:?}: {stderr}")]
    Failed {
        status: Option<i32>,
        stderr: String,
    },
}
