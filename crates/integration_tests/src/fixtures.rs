// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

use anyhow::{Context, Result};
use polkadot_ledger::types::RawBlock;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub struct FixtureLoader {
    fixtures_dir: PathBuf,
}

impl Default for FixtureLoader {
    fn default() -> Self {
        Self::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures"))
    }
}

impl FixtureLoader {
    /// Create a new fixture loader
    pub fn new(fixtures_dir: impl AsRef<Path>) -> Self {
        Self {
            fixtures_dir: fixtures_dir.as_ref().to_path_buf(),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.fixtures_dir.join(path)
        }
    }

    /// Load a JSON fixture file
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Value> {
        let full_path = self.resolve(path.as_ref());

        let content = std::fs::read_to_string(&full_path)
            .context(format!("Failed to read fixture file: {:?}", full_path))?;

        let json: Value = serde_json::from_str(&content)
            .context(format!("Failed to parse JSON fixture: {:?}", full_path))?;

        Ok(json)
    }

    /// Load `blocks/<name>.json` as a decoded block
    pub fn load_block(&self, name: &str) -> Result<RawBlock> {
        let json = self.load(format!("blocks/{}.json", name))?;
        serde_json::from_value(json).context(format!("Fixture '{}' is not a block", name))
    }

    /// Load `expected/<name>.json`
    pub fn load_expected(&self, name: &str) -> Result<Value> {
        self.load(format!("expected/{}.json", name))
    }

    /// Check if a fixture file exists
    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.resolve(path.as_ref()).exists()
    }

    /// Get the fixtures directory path
    pub fn fixtures_dir(&self) -> &Path {
        &self.fixtures_dir
    }

    /// Names of every block fixture, sorted
    pub fn block_names(&self) -> Result<Vec<String>> {
        let dir = self.fixtures_dir.join("blocks");
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&dir).context(format!("Failed to list {:?}", dir))? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}
