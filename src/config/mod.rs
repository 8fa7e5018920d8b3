use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::calendar::{fallback::DEFAULT_YEAR_OFFSET, NEPAL_UTC_OFFSET_MINUTES};
use crate::errors::LedgerError;
use crate::utils::paths::{self, ensure_dir, tmp_path};

/// Which calendar adapter drives period filtering and report labels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum CalendarKind {
    #[default]
    BikramSambat,
    GregorianFallback,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub locale: String,
    pub currency: String,
    pub calendar: CalendarKind,
    pub utc_offset_minutes: i32,
    pub fallback_year_offset: i32,
    pub load_latency_ms: u64,
    pub save_latency_ms: u64,
    pub report_years: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "ne-NP".into(),
            currency: "NPR".into(),
            calendar: CalendarKind::BikramSambat,
            utc_offset_minutes: NEPAL_UTC_OFFSET_MINUTES,
            fallback_year_offset: DEFAULT_YEAR_OFFSET,
            load_latency_ms: 500,
            save_latency_ms: 300,
            report_years: 10,
        }
    }
}

impl Config {
    pub fn load_latency(&self) -> Duration {
        Duration::from_millis(self.load_latency_ms)
    }

    pub fn save_latency(&self) -> Duration {
        Duration::from_millis(self.save_latency_ms)
    }
}

/// Loads and stores [`Config`] as `config.json` in the application directory.
pub struct ConfigManager {
    base: PathBuf,
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, LedgerError> {
        Self::with_base_dir(paths::app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, LedgerError> {
        ensure_dir(&base)?;
        Ok(Self {
            path: paths::config_file_in(&base),
            base,
        })
    }

    pub fn load(&self) -> Result<Config, LedgerError> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            serde_json::from_str(&data).map_err(|err| {
                LedgerError::Config(format!("{}: {}", self.path.display(), err))
            })
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<(), LedgerError> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent)?;
        }
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    /// Directory the JSON key/value store writes into.
    pub fn data_dir(&self) -> PathBuf {
        paths::data_dir_in(&self.base)
    }
}

fn write_atomic(path: &Path, data: &str) -> Result<(), LedgerError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
