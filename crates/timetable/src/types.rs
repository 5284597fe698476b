//! Shared state handed to every request handler.

use crate::catalog::{self, Catalog, ExtraOccupiedEntry};
use crate::config::AppConfig;
use crate::db::SnapshotDbManager;
use crate::directory::StudentDirectory;
use crate::occupancy::RoomFilter;
use crate::selection::{CalendarExport, SelectionRegistry};
use tracing::info;

pub struct AppState {
    /// Read-only for the lifetime of the process
    pub catalog: Catalog,
    pub extra_occupied: Vec<ExtraOccupiedEntry>,
    pub directory: StudentDirectory,
    pub room_filter: RoomFilter,
    pub calendar: CalendarExport,
    /// Resident per-user selections
    pub selections: SelectionRegistry,
    pub snapshot_db: SnapshotDbManager,
}

impl AppState {
    pub fn new(
        catalog: Catalog,
        extra_occupied: Vec<ExtraOccupiedEntry>,
        directory: StudentDirectory,
        room_filter: RoomFilter,
        calendar: CalendarExport,
        snapshot_db: SnapshotDbManager,
    ) -> Self {
        Self {
            catalog,
            extra_occupied,
            directory,
            room_filter,
            calendar,
            selections: SelectionRegistry::with_default_ttl(),
            snapshot_db,
        }
    }

    /// Loads every input named by the configuration.
    ///
    /// The catalog is required; the override list and lookup tables may be absent.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let catalog = Catalog::load_from_file(&config.catalog_path())?;

        let extra_path = config.extra_occupied_path();
        let extra_occupied = if extra_path.exists() {
            catalog::load_extra_occupied(&extra_path)?
        } else {
            Vec::new()
        };
        info!("Loaded {} extra occupied entries", extra_occupied.len());

        let directory = StudentDirectory::load(
            &config.student_courses_path(),
            &config.course_students_path(),
        )?;

        let db_path = config.db_path.to_string_lossy();
        let snapshot_db = SnapshotDbManager::new(&db_path)?;
        info!("Opened selection store at {}", db_path);

        let mut state = Self::new(
            catalog,
            extra_occupied,
            directory,
            config.room_filter(),
            config.calendar.clone(),
            snapshot_db,
        );
        state.selections = SelectionRegistry::new(config.selection_idle_ttl());
        Ok(state)
    }
}
