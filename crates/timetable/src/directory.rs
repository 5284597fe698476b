//! Student to course mappings produced by the directory scrape.
//!
//! Two tables: lowercase student identifier -> course codes (used to
//! auto-fill a timetable) and course code -> enrolled students (used for
//! course details). Both are read-only here.

use crate::catalog::{read_json, CatalogError, LookupError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::info;

/// A student listed on a course page.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StudentRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentDirectory {
    student_courses: HashMap<String, Vec<String>>,
    course_students: HashMap<String, Vec<StudentRef>>,
}

impl StudentDirectory {
    /// Builds a directory. Student keys are lowercased; lists for keys that
    /// collide after lowercasing are merged.
    pub fn new(
        student_courses: impl IntoIterator<Item = (String, Vec<String>)>,
        course_students: impl IntoIterator<Item = (String, Vec<StudentRef>)>,
    ) -> Self {
        let mut by_student: HashMap<String, Vec<String>> = HashMap::new();
        for (id, codes) in student_courses {
            let list = by_student.entry(id.trim().to_lowercase()).or_default();
            for code in codes {
                if !list.contains(&code) {
                    list.push(code);
                }
            }
        }

        Self {
            student_courses: by_student,
            course_students: course_students.into_iter().collect(),
        }
    }

    /// Loads `studentCourses.json` and `courseStudents.json`; a missing file
    /// yields an empty table.
    pub fn load(student_courses: &Path, course_students: &Path) -> Result<Self, CatalogError> {
        let forward: HashMap<String, Vec<String>> = read_optional(student_courses)?;
        let reverse: HashMap<String, Vec<StudentRef>> = read_optional(course_students)?;
        let directory = Self::new(forward, reverse);
        info!(
            "Loaded course lists for {} students and student lists for {} courses",
            directory.student_courses.len(),
            directory.course_students.len()
        );
        Ok(directory)
    }

    /// Course codes recorded for a student. Matching ignores case.
    ///
    /// An identifier with no recorded courses is reported as not found.
    pub fn lookup_student_courses(&self, id: &str) -> Result<&[String], LookupError> {
        let key = id.trim().to_lowercase();
        match self.student_courses.get(&key) {
            Some(codes) if !codes.is_empty() => Ok(codes.as_slice()),
            _ => Err(LookupError::StudentNotFound { id: key }),
        }
    }

    /// Students enrolled in a course; empty when the course is unknown.
    pub fn students_in_course(&self, code: &str) -> &[StudentRef] {
        self.course_students
            .get(code)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn student_count(&self) -> usize {
        self.student_courses.len()
    }

    /// Sorted copies of both tables, as written to disk.
    pub fn to_tables(
        &self,
    ) -> (
        BTreeMap<String, Vec<String>>,
        BTreeMap<String, Vec<StudentRef>>,
    ) {
        (
            self.student_courses
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            self.course_students
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

fn read_optional<T: serde::de::DeserializeOwned + Default>(path: &Path) -> Result<T, CatalogError> {
    if path.exists() {
        read_json(path)
    } else {
        info!("{} not found, starting with an empty table", path.display());
        Ok(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> StudentDirectory {
        StudentDirectory::new(
            [
                (
                    "CS1230456".to_string(),
                    vec!["COL106".to_string(), "MTL100".to_string()],
                ),
                ("ee1230001".to_string(), vec![]),
            ],
            [(
                "COL106".to_string(),
                vec![StudentRef {
                    id: "cs1230456".to_string(),
                    name: "Asha Rao".to_string(),
                }],
            )],
        )
    }

    #[test]
    fn test_lookup_ignores_case() {
        let directory = directory();
        assert_eq!(
            directory.lookup_student_courses("cs1230456").unwrap(),
            ["COL106", "MTL100"]
        );
        assert_eq!(
            directory.lookup_student_courses(" Cs1230456").unwrap().len(),
            2
        );
    }

    #[test]
    fn test_unknown_or_empty_student_is_not_found() {
        let directory = directory();
        assert_eq!(
            directory.lookup_student_courses("xx0000000"),
            Err(LookupError::StudentNotFound {
                id: "xx0000000".to_string()
            })
        );
        assert!(directory.lookup_student_courses("ee1230001").is_err());
    }

    #[test]
    fn test_reverse_index() {
        let directory = directory();
        assert_eq!(directory.students_in_course("COL106")[0].name, "Asha Rao");
        assert!(directory.students_in_course("MTL100").is_empty());
    }

    #[test]
    fn test_missing_files_load_empty() {
        let directory = StudentDirectory::load(
            Path::new("/nonexistent/studentCourses.json"),
            Path::new("/nonexistent/courseStudents.json"),
        )
        .unwrap();
        assert_eq!(directory.student_count(), 0);
    }
}
