//! Puzzle persistence. The engine never sees this; the CLI hands generated
//! puzzles to a store and reads them back by id.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tango_core::{GeneratedPuzzle, Grid, Puzzle};
use uuid::Uuid;

/// A generated puzzle together with the solution it was carved from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPuzzle {
    pub id: Uuid,
    pub puzzle: Puzzle,
    pub solution: Grid,
}

pub trait PuzzleStore {
    /// Persist a freshly generated puzzle under a new id.
    fn create(&mut self, generated: GeneratedPuzzle) -> Result<StoredPuzzle>;

    fn get(&self, id: Uuid) -> Result<Option<StoredPuzzle>>;
}

fn stored(generated: GeneratedPuzzle) -> StoredPuzzle {
    let (puzzle, solution) = generated.into_parts();
    StoredPuzzle {
        id: Uuid::new_v4(),
        puzzle,
        solution,
    }
}

/// One JSON file per puzzle in a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Platform data directory, or the working directory when there is none.
    pub fn default_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tango")
            .join("puzzles")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }
}

impl PuzzleStore for FileStore {
    fn create(&mut self, generated: GeneratedPuzzle) -> Result<StoredPuzzle> {
        let record = stored(generated);
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating store directory {}", self.dir.display()))?;

        let path = self.path_for(record.id);
        let json = serde_json::to_string_pretty(&record)?;
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        log::debug!("stored puzzle {} at {}", record.id, path.display());
        Ok(record)
    }

    fn get(&self, id: Uuid) -> Result<Option<StoredPuzzle>> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        let record = serde_json::from_str(&json)
            .with_context(|| format!("parsing stored puzzle {}", path.display()))?;
        Ok(Some(record))
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    puzzles: HashMap<Uuid, StoredPuzzle>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PuzzleStore for MemoryStore {
    fn create(&mut self, generated: GeneratedPuzzle) -> Result<StoredPuzzle> {
        let record = stored(generated);
        self.puzzles.insert(record.id, record.clone());
        Ok(record)
    }

    fn get(&self, id: Uuid) -> Result<Option<StoredPuzzle>> {
        Ok(self.puzzles.get(&id).cloned())
    }
}
