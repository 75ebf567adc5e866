use std::path::PathBuf;
use thiserror::Error;

/**
Everything that can stop an export before it reports a status.

At the orchestration boundary all of these collapse into the generic export error status,
the variant only matters for the log and the transcript.
*/
#[derive(Error, Debug)]
pub enum ExportError
{
    #[error("{0} not defined")]
    MissingSetting(&'static str),

    #[error("Cannot find and/or write to {}", .0.display())]
    SinkUnwritable(PathBuf),

    #[error("Refusing to write an empty string to {}", .0.display())]
    EmptyWrite(PathBuf),

    #[error("Can't find `{0}`")]
    CommandUnavailable(String),

    #[error("Failed to run {purpose}")]
    CommandFailed { purpose: String },

    #[error("Database has no tables to export")]
    NoTables,

    #[error("Table {0} has no create statement")]
    NoCreateStatement(String),

    #[error("Database error: {0}")]
    Database(#[from] mysql::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;
