// Copyright (c) 2026 rezky_nightky

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to apply {flag} {value} ({reason})")]
    InvalidArg {
        flag: &'static str,
        value: String,
        reason: String,
    },

    #[error("failed to write snapshot {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AppError {
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::InvalidArg { .. } | AppError::LogFile { .. } => 1,
            AppError::Io(_) | AppError::Export { .. } => 2,
        }
    }
}
