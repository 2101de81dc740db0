//! Per-step diagnostic dumps for offline debugging.
//!
//! The writer only handles the cheap, synchronous side (directory layout,
//! naming, UI-tree text). Screenshots take the asynchronous capture pool.

use crate::engine::{EngineError, EngineResult};
use std::fs;
use std::path::PathBuf;

/// Writes step-numbered diagnostic artifacts into one output directory.
#[derive(Clone, Debug)]
pub struct StepDumpWriter {
    dir: PathBuf,
}

impl StepDumpWriter {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File stem shared by the tree dump and the matching screenshot.
    #[must_use]
    pub fn step_stem(step: u64, session_id: &str, action_id: &str, at_ms: u64) -> String {
        format!("step-{step}-{session_id}-{action_id}-{at_ms}")
    }

    #[must_use]
    pub fn ui_tree_path(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{stem}.xml"))
    }

    #[must_use]
    pub fn screenshot_path(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{stem}.png"))
    }

    /// Persist the serialized UI tree for one step.
    pub fn write_ui_tree(&self, stem: &str, tree_text: &str) -> EngineResult<PathBuf> {
        fs::create_dir_all(&self.dir)
            .map_err(|err| EngineError::io("E_IO", "failed to create diagnostics dir", err))?;
        let path = self.ui_tree_path(stem);
        fs::write(&path, tree_text)
            .map_err(|err| EngineError::io("E_IO", "failed to write ui tree dump", err))?;
        Ok(path)
    }
}
