//! Run storage API.

use crate::types::{CheckpointRecord, RunManifest};
use crate::{ResultsError, ResultsResult};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const MANIFEST: &str = "manifest.json";
const CHECKPOINTS: &str = "checkpoints.jsonl";

#[derive(Debug, Clone)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    /// Store under `<output_dir>/.trimlin/runs`.
    pub fn for_output_dir(output_dir: &Path) -> ResultsResult<Self> {
        if output_dir.is_file() {
            return Err(ResultsError::InvalidPath {
                message: format!("{} is a file", output_dir.display()),
            });
        }
        Self::new(output_dir.join(".trimlin").join("runs"))
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root_dir.join(run_id)
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.run_dir(run_id).join(MANIFEST).exists()
    }

    pub fn save_manifest(&self, manifest: &RunManifest) -> ResultsResult<()> {
        let run_dir = self.run_dir(&manifest.run_id);
        fs::create_dir_all(&run_dir)?;
        let manifest_json = serde_json::to_string_pretty(manifest)?;
        fs::write(run_dir.join(MANIFEST), manifest_json)?;
        tracing::debug!(run_id = %manifest.run_id, "saved manifest");
        Ok(())
    }

    /// Drop checkpoints from an earlier run with the same id.
    pub fn reset_checkpoints(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id);
        fs::create_dir_all(&run_dir)?;
        fs::write(run_dir.join(CHECKPOINTS), "")?;
        Ok(())
    }

    /// Append one JSON line to the run's checkpoint log.
    pub fn append_checkpoint(&self, run_id: &str, record: &CheckpointRecord) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id);
        fs::create_dir_all(&run_dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(run_dir.join(CHECKPOINTS))?;
        let line = serde_json::to_string(record)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        let manifest_path = self.run_dir(run_id).join(MANIFEST);

        if !manifest_path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }

        let content = fs::read_to_string(manifest_path)?;
        let manifest = serde_json::from_str(&content)?;
        Ok(manifest)
    }

    pub fn load_checkpoints(&self, run_id: &str) -> ResultsResult<Vec<CheckpointRecord>> {
        let path = self.run_dir(run_id).join(CHECKPOINTS);

        if !path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }

        let content = fs::read_to_string(path)?;
        let mut records = Vec::new();
        for line in content.lines() {
            if !line.trim().is_empty() {
                records.push(serde_json::from_str(line)?);
            }
        }
        Ok(records)
    }

    /// Best checkpoint written so far, if any.
    pub fn best_checkpoint(&self, run_id: &str) -> ResultsResult<Option<CheckpointRecord>> {
        Ok(self
            .load_checkpoints(run_id)?
            .into_iter()
            .min_by(|a, b| a.cost.total_cmp(&b.cost)))
    }

    /// All stored runs, newest first. `model` filters by model name.
    pub fn list_runs(&self, model: Option<&str>) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();

        if !self.root_dir.exists() {
            return Ok(runs);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                let run_id = entry.file_name().to_string_lossy().to_string();
                if let Ok(manifest) = self.load_manifest(&run_id)
                    && model.is_none_or(|m| manifest.model == m)
                {
                    runs.push(manifest);
                }
            }
        }

        runs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id);
        if run_dir.exists() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }
}
