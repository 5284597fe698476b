/// Runtime configuration: data file locations, service binding, export and scrape settings
use crate::occupancy::RoomFilter;
use crate::selection::CalendarExport;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse config {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Invalid value {value:?} for {name}")]
    InvalidEnv { name: String, value: String },
}

/// Top-level configuration. Every field has a default, so a config file only
/// needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the catalog and lookup tables
    pub data_dir: PathBuf,
    pub catalog_file: String,
    pub extra_occupied_file: String,
    pub student_courses_file: String,
    pub course_students_file: String,
    pub db_path: PathBuf,
    /// Room names starting with one of these are bookable rooms
    pub room_prefixes: Vec<String>,
    /// Minutes a selection may sit unused before it is dropped from memory
    pub selection_idle_minutes: u64,
    pub calendar: CalendarExport,
    pub scrape: ScrapeConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            data_dir: PathBuf::from("data"),
            catalog_file: "courses.json".to_string(),
            extra_occupied_file: "extra_occupied.json".to_string(),
            student_courses_file: "studentCourses.json".to_string(),
            course_students_file: "courseStudents.json".to_string(),
            db_path: PathBuf::from("timetable.db"),
            room_prefixes: vec!["LH".to_string()],
            selection_idle_minutes: 30,
            calendar: CalendarExport::default(),
            scrape: ScrapeConfig::default(),
        }
    }
}

/// Settings for the directory scrape job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub base_url: String,
    pub index_page: String,
    /// Course page links for the semester start with this, e.g. `"2502-"`
    pub semester_prefix: String,
    /// Pages fetched concurrently per batch
    pub batch_size: usize,
    pub accept_invalid_certs: bool,
    pub user_agent: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ldapweb.iitd.ac.in/LDAP/courses/".to_string(),
            index_page: "gpaliases.html".to_string(),
            semester_prefix: "2502-".to_string(),
            batch_size: 50,
            accept_invalid_certs: true,
            user_agent: concat!("timetable/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl AppConfig {
    /// Reads a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Loads the optional config file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Applies `HOST`, `PORT`, `TIMETABLE_DATA_DIR` and `TIMETABLE_DB`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(host) = lookup("HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                name: "PORT".to_string(),
                value: port.clone(),
            })?;
        }
        if let Some(dir) = lookup("TIMETABLE_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(db) = lookup("TIMETABLE_DB") {
            self.db_path = PathBuf::from(db);
        }
        Ok(())
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join(&self.catalog_file)
    }

    pub fn extra_occupied_path(&self) -> PathBuf {
        self.data_dir.join(&self.extra_occupied_file)
    }

    pub fn student_courses_path(&self) -> PathBuf {
        self.data_dir.join(&self.student_courses_file)
    }

    pub fn course_students_path(&self) -> PathBuf {
        self.data_dir.join(&self.course_students_file)
    }

    pub fn room_filter(&self) -> RoomFilter {
        RoomFilter::new(self.room_prefixes.iter().cloned())
    }

    pub fn selection_idle_ttl(&self) -> Duration {
        Duration::from_secs(self.selection_idle_minutes * 60)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
