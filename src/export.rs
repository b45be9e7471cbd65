// Copyright (c) 2026 rezky_nightky

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::frame::Frame;

pub fn snapshot_name(unix_ms: u128) -> String {
    format!("dossier-rain-{}.txt", unix_ms)
}

pub fn snapshot_text(frame: &Frame) -> String {
    let mut out = String::with_capacity(frame.width as usize * frame.height as usize + 8);
    for y in 0..frame.height {
        out.push_str(&frame.row_text(y));
        out.push('\n');
    }
    out
}

pub fn write_snapshot(dir: &Path, frame: &Frame, unix_ms: u128) -> Result<PathBuf, AppError> {
    let path = dir.join(snapshot_name(unix_ms));
    fs::write(&path, snapshot_text(frame)).map_err(|source| AppError::Export {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
