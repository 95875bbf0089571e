use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::fs::File;
use std::path::PathBuf;

use nutricheck_core::catalog::Catalog;
use nutricheck_core::models::Thresholds;

pub struct Config {
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("", "", "nutricheck")
            .context("Could not determine home directory")?;

        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let db_path = data_dir.join("nutricheck.db");

        Ok(Config { db_path, data_dir })
    }

    /// The food table is external data: a `catalog.csv` dropped into the
    /// data directory replaces the built-in table entirely.
    pub fn load_catalog(&self) -> Result<Catalog> {
        let path = self.data_dir.join("catalog.csv");
        if path.exists() {
            let file = File::open(&path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            return Catalog::from_csv_reader(file)
                .with_context(|| format!("Failed to load {}", path.display()));
        }
        Ok(Catalog::builtin())
    }

    /// Same override scheme for the threshold table (`thresholds.csv`).
    pub fn load_thresholds(&self) -> Result<Thresholds> {
        let path = self.data_dir.join("thresholds.csv");
        if path.exists() {
            let file = File::open(&path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            return Thresholds::from_csv_reader(file)
                .with_context(|| format!("Failed to load {}", path.display()));
        }
        Ok(Thresholds::builtin())
    }
}
