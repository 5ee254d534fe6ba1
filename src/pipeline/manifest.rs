use crate::error::Result;
use crate::pipeline::processing::{CleanReport, DatasetScalars, RegionTotals};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Content fingerprint of one input file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileDigest {
    pub path: String,
    pub bytes: u64,
    pub sha256: String,
}

/// Provenance record written next to the reports after each run
#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub input: String,
    pub input_files: Vec<FileDigest>,
    pub clean: CleanReport,
    pub scalars: DatasetScalars,
    pub region_totals: Vec<RegionTotals>,
    pub executive_groups: usize,
    pub outputs: Vec<String>,
}

impl RunManifest {
    pub fn write_to(&self, path: &Path) -> Result<PathBuf> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(path.to_path_buf())
    }
}

/// Hash the input: the file itself, or every `.csv` file in a directory (sorted by name).
pub fn fingerprint_input(path: &Path) -> Result<Vec<FileDigest>> {
    if path.is_file() {
        return Ok(vec![digest_file(path)?]);
    }
    if !path.is_dir() {
        return Ok(Vec::new());
    }

    let mut files: Vec<PathBuf> = fs::read_dir(path)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();
    files.iter().map(|p| digest_file(p)).collect()
}

fn digest_file(path: &Path) -> Result<FileDigest> {
    let content = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    Ok(FileDigest {
        path: path.to_string_lossy().to_string(),
        bytes: content.len() as u64,
        sha256: hex::encode(hasher.finalize()),
    })
}
