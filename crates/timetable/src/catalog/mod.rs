/// Static course catalog and manual occupancy overrides
mod error;
mod types;

pub use error::{CatalogError, LookupError};
pub use types::{Course, CreditStructure, ExtraOccupiedEntry, Slot};

use crate::timing::{self, human};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Default number of matches returned by a course search.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// The semester's courses, indexed by course code.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    courses: Vec<Course>,
    index: HashMap<String, usize>,
}

/// One page of search results.
#[derive(Debug, Clone)]
pub struct SearchPage<'a> {
    /// Number of matches before paging
    pub total: usize,
    pub courses: Vec<&'a Course>,
}

impl Catalog {
    /// Builds a catalog, keeping the first record for any repeated course code.
    ///
    /// Courses whose lecture codes are missing but whose registrar text is
    /// present get their codes derived from the text.
    pub fn from_courses(courses: Vec<Course>) -> Self {
        let mut catalog = Self::default();

        for mut course in courses {
            if catalog.index.contains_key(&course.course_code) {
                warn!(course = %course.course_code, "Duplicate course code in catalog, keeping the first");
                continue;
            }

            if !course.has_lecture_timing() {
                if let Some(text) = course.slot.lecture_timing_str.as_deref() {
                    let sessions = human::parse_timing_text(text);
                    if !sessions.is_empty() {
                        course.slot.lecture_timing = Some(timing::encode_all(&sessions));
                    }
                }
            }

            catalog
                .index
                .insert(course.course_code.clone(), catalog.courses.len());
            catalog.courses.push(course);
        }

        catalog
    }

    /// Loads `courses.json`.
    pub fn load_from_file(path: &Path) -> Result<Self, CatalogError> {
        let courses: Vec<Course> = read_json(path)?;
        let catalog = Self::from_courses(courses);
        info!("Loaded {} courses from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn get(&self, code: &str) -> Option<&Course> {
        self.index.get(code).map(|&i| &self.courses[i])
    }

    pub fn lookup(&self, code: &str) -> Result<&Course, LookupError> {
        self.get(code).ok_or_else(|| LookupError::CourseNotFound {
            code: code.to_string(),
        })
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    /// Case-insensitive substring search on course codes, in catalog order.
    ///
    /// An empty query matches every course.
    pub fn search(&self, query: &str, offset: usize, limit: usize) -> SearchPage<'_> {
        let needle = query.trim().to_uppercase();
        let matches: Vec<&Course> = self
            .courses
            .iter()
            .filter(|c| needle.is_empty() || c.course_code.to_uppercase().contains(&needle))
            .collect();

        SearchPage {
            total: matches.len(),
            courses: matches.into_iter().skip(offset).take(limit).collect(),
        }
    }
}

/// Loads `extra_occupied.json`.
///
/// Entries whose day is outside Monday..Friday, or whose range is empty,
/// could never match a query; they are dropped here with a warning.
pub fn load_extra_occupied(path: &Path) -> Result<Vec<ExtraOccupiedEntry>, CatalogError> {
    let entries: Vec<ExtraOccupiedEntry> = read_json(path)?;
    Ok(filter_extra_occupied(entries))
}

pub fn filter_extra_occupied(entries: Vec<ExtraOccupiedEntry>) -> Vec<ExtraOccupiedEntry> {
    entries
        .into_iter()
        .filter(|entry| {
            if entry.teaching_day().is_none() {
                warn!(
                    room = %entry.lecture_hall,
                    day = entry.day,
                    "Dropping extra occupied entry with a non-teaching day"
                );
                return false;
            }
            if entry.start_time >= entry.end_time {
                warn!(
                    room = %entry.lecture_hall,
                    start = %entry.start_time,
                    end = %entry.end_time,
                    "Dropping extra occupied entry with an empty time range"
                );
                return false;
            }
            true
        })
        .collect()
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CatalogError> {
    let content = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn course(code: &str, credits: &str, hall: Option<&str>, lecture: Option<&str>) -> Course {
        Course {
            course_code: code.to_string(),
            course_name: format!("{code} name"),
            semester_code: Some("2502".to_string()),
            instructor: None,
            total_credits: CreditStructure::parse(credits).unwrap_or_default().total(),
            credit_structure: credits.to_string(),
            current_strength: None,
            lecture_hall: hall.map(str::to_string),
            slot: Slot {
                name: "A".to_string(),
                lecture_timing: lecture.map(str::to_string),
                ..Slot::default()
            },
        }
    }

    #[test]
    fn test_lookup_and_duplicates() {
        let catalog = Catalog::from_courses(vec![
            course("COL106", "3-0-2", Some("LH 108"), Some("109301100")),
            course("COL106", "4-0-0", Some("LH 999"), None),
            course("MTL100", "3-1-0", Some("LH 121"), Some("208000850")),
        ]);

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.lookup("COL106").unwrap().credit_structure, "3-0-2");
        assert_eq!(
            catalog.lookup("XYZ999"),
            Err(LookupError::CourseNotFound {
                code: "XYZ999".to_string()
            })
        );
    }

    #[test]
    fn test_lecture_codes_derived_from_text() {
        let mut c = course("ELL201", "3-0-2", Some("LH 310"), None);
        c.slot.lecture_timing_str = Some("MTh 09:30-11:00".to_string());
        let catalog = Catalog::from_courses(vec![c]);

        let course = catalog.get("ELL201").unwrap();
        assert_eq!(
            course.slot.lecture_timing.as_deref(),
            Some("109301100,409301100")
        );
    }

    #[test]
    fn test_search_is_case_insensitive_and_paged() {
        let catalog = Catalog::from_courses(vec![
            course("COL100", "3-0-0", None, None),
            course("COL106", "3-0-0", None, None),
            course("MTL100", "3-0-0", None, None),
            course("COL202", "3-0-0", None, None),
        ]);

        let page = catalog.search("col", 0, DEFAULT_SEARCH_LIMIT);
        assert_eq!(page.total, 3);
        assert_eq!(page.courses[0].course_code, "COL100");

        let page = catalog.search("", 1, 2);
        assert_eq!(page.total, 4);
        let codes: Vec<_> = page.courses.iter().map(|c| c.course_code.as_str()).collect();
        assert_eq!(codes, vec!["COL106", "MTL100"]);

        assert_eq!(catalog.search("100", 0, 1).courses.len(), 1);
    }

    #[test]
    fn test_extra_occupied_filtering() {
        let entries: Vec<ExtraOccupiedEntry> = serde_json::from_value(serde_json::json!([
            {"day": 2, "startTime": "1400", "endTime": "1600", "lectureHall": "LH 202"},
            {"day": 0, "startTime": "1400", "endTime": "1600", "lectureHall": "LH 203"},
            {"day": 6, "startTime": "1400", "endTime": "1600", "lectureHall": "LH 204"},
            {"day": 3, "startTime": "1600", "endTime": "1400", "lectureHall": "LH 205"}
        ]))
        .unwrap();

        let kept = filter_extra_occupied(entries);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].lecture_hall, "LH 202");
    }
}
