use chrono::Utc;
use contentblocks_core::Document;
use serde::{Deserialize, Serialize};
use std::{
    fs::{File, OpenOptions},
    io::{BufRead, BufReader, Write},
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WalRecord {
    Put { id: String, doc: Document },
    Delete { id: String },
}

/// Append-only JSON-lines log, one file per process start.
pub struct Wal {
    path: PathBuf,
    file: File,
}

impl Wal {
    pub fn open(dir: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("wal-{}.log", Utc::now().format("%Y%m%d%H%M%S%f")));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    #[cfg(test)]
    pub(crate) fn read_only(path: &Path) -> std::io::Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            file: File::open(path)?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&mut self, rec: &WalRecord) -> std::io::Result<()> {
        let line = serde_json::to_string(rec)?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        self.file.flush()?;
        Ok(())
    }

    /// Reads every `*.log` file in `dir` in name order. Lines that fail to
    /// decode (a torn final write, usually) are skipped.
    pub fn replay(dir: &Path) -> std::io::Result<Vec<WalRecord>> {
        let mut out = Vec::new();
        let Ok(rd) = std::fs::read_dir(dir) else {
            return Ok(out);
        };
        let mut files: Vec<_> = rd.filter_map(|e| e.ok()).collect();
        files.sort_by_key(|e| e.file_name());
        for f in files {
            let p = f.path();
            if p.extension().and_then(|s| s.to_str()) != Some("log") {
                continue;
            }
            let br = BufReader::new(File::open(&p)?);
            for line in br.lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<WalRecord>(&line) {
                    Ok(rec) => out.push(rec),
                    Err(e) => tracing::warn!(file = %p.display(), "skipping wal line: {}", e),
                }
            }
        }
        Ok(out)
    }
}
