use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{RevenueError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Monthly base salary deducted from revenue before incentive.
    #[serde(default = "default_salary")]
    pub salary: f64,
    /// Number of months the salary is multiplied by.
    #[serde(default = "default_months")]
    pub months: u32,
    #[serde(default = "default_export_dir_string")]
    pub export_dir: String,
}

fn default_salary() -> f64 {
    250000.0
}

fn default_months() -> u32 {
    1
}

fn default_export_dir_string() -> String {
    default_export_dir().to_string_lossy().to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            salary: default_salary(),
            months: default_months(),
            export_dir: default_export_dir_string(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("revenue-eval")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_export_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("revenue-eval")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| RevenueError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

/// Salary must be a finite, non-negative amount.
pub fn validate_salary(salary: f64) -> Result<f64> {
    if !salary.is_finite() || salary < 0.0 {
        return Err(RevenueError::Settings(format!(
            "salary must be a non-negative amount, got {salary}"
        )));
    }
    Ok(salary)
}

pub fn get_export_dir() -> PathBuf {
    PathBuf::from(shellexpand_path(&load_settings().export_dir))
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
