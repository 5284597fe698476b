//! The courses a user has added to their timetable, and the per-course
//! schedules derived from them.
//!
//! Entries and schedules are created and destroyed together, keyed by course
//! code. Overlapping sessions are allowed; nothing here resolves conflicts.

mod error;
pub mod export;
pub mod registry;

pub use error::{SelectionError, SnapshotError};
pub use export::{CalendarExport, ExportSession};
pub use registry::{SelectionRegistry, UserKey};

use crate::catalog::{Catalog, Course};
use crate::schedule::{Component, CourseSchedule};
use crate::timing::Session;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};

/// What the timetable needs to know about one selected course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedCourseEntry {
    pub course_code: String,
    /// The catalog lists lecture timings for this course
    pub lecture: bool,
    /// The credit structure gives the tutorial non-zero weight
    pub tutorial: bool,
    /// The credit structure gives the lab non-zero weight
    pub lab: bool,
    pub credit_structure: String,
    #[serde(default)]
    pub lecture_hall: Option<String>,
}

impl SelectedCourseEntry {
    pub fn from_course(course: &Course) -> Self {
        let credits = course.credits();
        Self {
            course_code: course.course_code.clone(),
            lecture: course.has_lecture_timing(),
            tutorial: credits.has_tutorial(),
            lab: credits.has_lab(),
            credit_structure: course.credit_structure.clone(),
            lecture_hall: course.lecture_hall.clone(),
        }
    }

    pub fn offers(&self, component: Component) -> bool {
        match component {
            Component::Tutorial => self.tutorial,
            Component::Lab => self.lab,
        }
    }
}

/// The persisted form of a selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionSnapshot {
    pub selected_courses: Vec<SelectedCourseEntry>,
    pub timetable_data: BTreeMap<String, CourseSchedule>,
}

/// One user's selected courses, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionManager {
    selected: Vec<SelectedCourseEntry>,
    timetable: HashMap<String, CourseSchedule>,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds every listed course that is in the catalog and not yet selected.
    ///
    /// Repeats within `codes` are ignored and unknown codes are skipped. The
    /// additions are applied together after the whole list is staged.
    /// Returns the codes that were actually added.
    pub fn add_courses<I, S>(&mut self, catalog: &Catalog, codes: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen: HashSet<String> = self
            .selected
            .iter()
            .map(|entry| entry.course_code.clone())
            .collect();
        let mut staged = Vec::new();

        for code in codes {
            let code = code.as_ref().trim();
            if seen.contains(code) {
                continue;
            }
            let Some(course) = catalog.get(code) else {
                debug!(course = %code, "Skipping course code not in catalog");
                continue;
            };

            seen.insert(code.to_string());
            staged.push((
                SelectedCourseEntry::from_course(course),
                CourseSchedule::with_lectures(course.lecture_sessions()),
            ));
        }

        let added: Vec<String> = staged
            .iter()
            .map(|(entry, _)| entry.course_code.clone())
            .collect();
        for (entry, schedule) in staged {
            self.timetable.insert(entry.course_code.clone(), schedule);
            self.selected.push(entry);
        }

        if !added.is_empty() {
            info!("Added {} course(s) to selection: {}", added.len(), added.join(", "));
        }
        added
    }

    /// Removes a course and its schedule. Returns false if it was not selected.
    pub fn remove_course(&mut self, code: &str) -> bool {
        let before = self.selected.len();
        self.selected.retain(|entry| entry.course_code != code);
        self.timetable.remove(code);
        before != self.selected.len()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.timetable.contains_key(code)
    }

    pub fn entries(&self) -> &[SelectedCourseEntry] {
        &self.selected
    }

    pub fn entry(&self, code: &str) -> Option<&SelectedCourseEntry> {
        self.selected.iter().find(|entry| entry.course_code == code)
    }

    pub fn schedule(&self, code: &str) -> Option<&CourseSchedule> {
        self.timetable.get(code)
    }

    /// Entries paired with their schedules, in selection order.
    pub fn iter(&self) -> impl Iterator<Item = (&SelectedCourseEntry, &CourseSchedule)> {
        self.selected.iter().filter_map(|entry| {
            self.timetable
                .get(&entry.course_code)
                .map(|schedule| (entry, schedule))
        })
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    fn editable(
        &mut self,
        code: &str,
        component: Component,
    ) -> Result<&mut CourseSchedule, SelectionError> {
        let entry = self
            .selected
            .iter()
            .find(|entry| entry.course_code == code)
            .ok_or_else(|| SelectionError::NotSelected {
                code: code.to_string(),
            })?;
        if !entry.offers(component) {
            return Err(SelectionError::ComponentNotOffered {
                code: code.to_string(),
                component,
            });
        }
        self.timetable
            .get_mut(code)
            .ok_or_else(|| SelectionError::NotSelected {
                code: code.to_string(),
            })
    }

    /// Replaces a course's tutorial or lab sessions. See [`CourseSchedule::set_component`].
    pub fn set_component(
        &mut self,
        code: &str,
        component: Component,
        sessions: Vec<Session>,
    ) -> Result<(), SelectionError> {
        self.editable(code, component)?
            .set_component(component, sessions)?;
        Ok(())
    }

    pub fn add_session(
        &mut self,
        code: &str,
        component: Component,
        session: Session,
    ) -> Result<(), SelectionError> {
        self.editable(code, component)?
            .add_session(component, session)?;
        Ok(())
    }

    pub fn remove_session(
        &mut self,
        code: &str,
        component: Component,
        index: usize,
    ) -> Result<Session, SelectionError> {
        Ok(self
            .editable(code, component)?
            .remove_session(component, index)?)
    }

    pub fn snapshot(&self) -> SelectionSnapshot {
        SelectionSnapshot {
            selected_courses: self.selected.clone(),
            timetable_data: self
                .timetable
                .iter()
                .map(|(code, schedule)| (code.clone(), schedule.clone()))
                .collect(),
        }
    }

    /// Rebuilds a selection, rejecting snapshots that break its invariants.
    pub fn from_snapshot(snapshot: SelectionSnapshot) -> Result<Self, SnapshotError> {
        let SelectionSnapshot {
            selected_courses,
            timetable_data,
        } = snapshot;

        let mut codes = HashSet::new();
        for entry in &selected_courses {
            if !codes.insert(entry.course_code.as_str()) {
                return Err(SnapshotError::Inconsistent {
                    message: format!("course {} is selected twice", entry.course_code),
                });
            }
            if !timetable_data.contains_key(&entry.course_code) {
                return Err(SnapshotError::Inconsistent {
                    message: format!("course {} has no schedule", entry.course_code),
                });
            }
        }
        if let Some(orphan) = timetable_data.keys().find(|code| !codes.contains(code.as_str())) {
            return Err(SnapshotError::Inconsistent {
                message: format!("schedule for {orphan} has no selected course"),
            });
        }

        for (code, schedule) in &timetable_data {
            schedule
                .validate()
                .map_err(|source| SnapshotError::InvalidSchedule {
                    code: code.clone(),
                    source,
                })?;
            let cleared = [schedule.tutorial.as_ref(), schedule.lab.as_ref()]
                .into_iter()
                .flatten()
                .any(Vec::is_empty);
            if cleared {
                return Err(SnapshotError::Inconsistent {
                    message: format!("schedule for {code} holds an empty component"),
                });
            }
        }

        Ok(Self {
            selected: selected_courses,
            timetable: timetable_data.into_iter().collect(),
        })
    }

    pub fn serialize(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    pub fn deserialize(data: &str) -> Result<Self, SnapshotError> {
        Self::from_snapshot(serde_json::from_str(data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::course;
    use crate::schedule::ValidationError;
    use crate::timing::{ClockTime, Day};

    fn catalog() -> Catalog {
        Catalog::from_courses(vec![
            course("A", "3-1-0", Some("LH 101"), Some("109301100,409301100")),
            course("B", "3-0-2", Some("LH 202"), Some("211001200")),
            course("C", "3-0-0", None, None),
        ])
    }

    fn session(day: Day, start: u16, end: u16) -> Session {
        Session::new(
            day,
            ClockTime::from_hhmm(start).unwrap(),
            ClockTime::from_hhmm(end).unwrap(),
        )
    }

    #[test]
    fn test_add_courses_is_idempotent() {
        let catalog = catalog();
        let mut selection = SelectionManager::new();

        let added = selection.add_courses(&catalog, ["A", "A", "B"]);
        assert_eq!(added, vec!["A", "B"]);
        let added = selection.add_courses(&catalog, ["A", "A", "B"]);
        assert!(added.is_empty());

        let codes: Vec<_> = selection
            .entries()
            .iter()
            .map(|e| e.course_code.as_str())
            .collect();
        assert_eq!(codes, vec!["A", "B"]);
        assert_eq!(selection.snapshot().timetable_data.len(), 2);
    }

    #[test]
    fn test_add_courses_skips_unknown_codes() {
        let catalog = catalog();
        let mut selection = SelectionManager::new();
        let added = selection.add_courses(&catalog, ["NOPE", "C"]);
        assert_eq!(added, vec!["C"]);
        assert!(!selection.contains("NOPE"));
    }

    #[test]
    fn test_entry_and_initial_schedule() {
        let catalog = catalog();
        let mut selection = SelectionManager::new();
        selection.add_courses(&catalog, ["A", "C"]);

        let entry = selection.entry("A").unwrap();
        assert!(entry.lecture);
        assert!(entry.tutorial);
        assert!(!entry.lab);
        assert_eq!(entry.lecture_hall.as_deref(), Some("LH 101"));

        let schedule = selection.schedule("A").unwrap();
        assert_eq!(schedule.lecture.len(), 2);
        assert_eq!(schedule.tutorial, None);
        assert_eq!(schedule.lab, None);

        let entry = selection.entry("C").unwrap();
        assert!(!entry.lecture);
        assert!(selection.schedule("C").unwrap().lecture.is_empty());
    }

    #[test]
    fn test_remove_course() {
        let catalog = catalog();
        let mut selection = SelectionManager::new();
        assert!(!selection.remove_course("A"));

        selection.add_courses(&catalog, ["A", "B"]);
        assert!(selection.remove_course("A"));
        assert!(selection.schedule("A").is_none());
        assert!(selection.entry("A").is_none());
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn test_component_edits_respect_credit_structure() {
        let catalog = catalog();
        let mut selection = SelectionManager::new();
        selection.add_courses(&catalog, ["A"]);

        selection
            .set_component("A", Component::Tutorial, vec![session(Day::Friday, 800, 850)])
            .unwrap();
        assert_eq!(
            selection
                .schedule("A")
                .unwrap()
                .component(Component::Tutorial)
                .unwrap()
                .len(),
            1
        );

        assert_eq!(
            selection.set_component("A", Component::Lab, vec![session(Day::Friday, 1400, 1600)]),
            Err(SelectionError::ComponentNotOffered {
                code: "A".to_string(),
                component: Component::Lab
            })
        );
        assert_eq!(
            selection.add_session("B", Component::Lab, session(Day::Friday, 1400, 1600)),
            Err(SelectionError::NotSelected {
                code: "B".to_string()
            })
        );
        assert!(matches!(
            selection.add_session("A", Component::Tutorial, session(Day::Friday, 1600, 1400)),
            Err(SelectionError::Invalid(ValidationError::InvalidSession { index: 1, .. }))
        ));

        let removed = selection.remove_session("A", Component::Tutorial, 0).unwrap();
        assert_eq!(removed.day, Day::Friday);
        assert_eq!(selection.schedule("A").unwrap().tutorial, None);
    }

    #[test]
    fn test_serialize_round_trip() {
        let catalog = catalog();
        let mut selection = SelectionManager::new();
        selection.add_courses(&catalog, ["B", "A"]);
        selection
            .add_session(
                "B",
                Component::Lab,
                session(Day::Wednesday, 1400, 1600).with_location("LH 111"),
            )
            .unwrap();

        let data = selection.serialize().unwrap();
        let json: serde_json::Value = serde_json::from_str(&data).unwrap();
        assert!(json.get("selectedCourses").is_some());
        assert_eq!(json["timetableData"]["B"]["lab"][0]["start"], "1400");

        let restored = SelectionManager::deserialize(&data).unwrap();
        assert_eq!(restored, selection);
        let codes: Vec<_> = restored
            .entries()
            .iter()
            .map(|e| e.course_code.as_str())
            .collect();
        assert_eq!(codes, vec!["B", "A"]);
    }

    #[test]
    fn test_deserialize_rejects_broken_snapshots() {
        let catalog = catalog();
        let mut selection = SelectionManager::new();
        selection.add_courses(&catalog, ["A"]);

        let mut orphan = selection.snapshot();
        orphan
            .timetable_data
            .insert("Z".to_string(), CourseSchedule::default());
        assert!(matches!(
            SelectionManager::from_snapshot(orphan),
            Err(SnapshotError::Inconsistent { .. })
        ));

        let mut missing = selection.snapshot();
        missing.timetable_data.clear();
        assert!(matches!(
            SelectionManager::from_snapshot(missing),
            Err(SnapshotError::Inconsistent { .. })
        ));

        let mut empty_component = selection.snapshot();
        empty_component
            .timetable_data
            .get_mut("A")
            .unwrap()
            .tutorial = Some(vec![]);
        assert!(matches!(
            SelectionManager::from_snapshot(empty_component),
            Err(SnapshotError::Inconsistent { .. })
        ));

        let mut bad_range = selection.snapshot();
        bad_range.timetable_data.get_mut("A").unwrap().tutorial =
            Some(vec![session(Day::Monday, 1000, 900)]);
        assert!(matches!(
            SelectionManager::from_snapshot(bad_range),
            Err(SnapshotError::InvalidSchedule { .. })
        ));

        assert!(matches!(
            SelectionManager::deserialize("not json"),
            Err(SnapshotError::Json(_))
        ));
        assert!(SelectionManager::deserialize(r#"{"selectedCourses":[],"timetableData":{}}"#)
            .unwrap()
            .is_empty());
    }
}
