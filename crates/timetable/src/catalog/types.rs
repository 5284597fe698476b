//! Catalog record types, in the JSON shape produced by the catalog exporter.
use crate::timing::{self, ClockTime, Day, Session};
use serde::{Deserialize, Serialize};

/// A course offered this semester. Read-only for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub course_code: String,
    pub course_name: String,
    #[serde(default)]
    pub semester_code: Option<String>,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(default)]
    pub total_credits: f32,
    /// Lecture-tutorial-lab weights, e.g. `"3-1-0"` or `"3.0-0.0-2.0"`
    pub credit_structure: String,
    #[serde(default)]
    pub current_strength: Option<String>,
    /// One or more comma-separated room names
    #[serde(default)]
    pub lecture_hall: Option<String>,
    pub slot: Slot,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    #[serde(default)]
    pub name: String,
    /// Comma-separated timing codes
    #[serde(default)]
    pub lecture_timing: Option<String>,
    /// Registrar text the codes were derived from (e.g. `"MTh 09:30-11:00"`)
    #[serde(default)]
    pub lecture_timing_str: Option<String>,
    #[serde(default)]
    pub tutorial_timing: Option<String>,
    #[serde(default)]
    pub lab_timing: Option<String>,
}

impl Course {
    pub fn lecture_sessions(&self) -> Vec<Session> {
        decode_optional(&self.slot.lecture_timing)
    }

    pub fn tutorial_sessions(&self) -> Vec<Session> {
        decode_optional(&self.slot.tutorial_timing)
    }

    pub fn lab_sessions(&self) -> Vec<Session> {
        decode_optional(&self.slot.lab_timing)
    }

    /// Room names from the `lectureHall` field, trimmed, blanks removed.
    pub fn rooms(&self) -> impl Iterator<Item = &str> {
        self.lecture_hall
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|room| !room.is_empty())
    }

    pub fn credits(&self) -> CreditStructure {
        CreditStructure::parse(&self.credit_structure).unwrap_or_default()
    }

    /// True when the catalog lists at least one lecture timing.
    pub fn has_lecture_timing(&self) -> bool {
        self.slot
            .lecture_timing
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
    }
}

fn decode_optional(list: &Option<String>) -> Vec<Session> {
    list.as_deref().map(timing::decode_all).unwrap_or_default()
}

/// Parsed lecture-tutorial-lab credit weights.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CreditStructure {
    pub lecture: f32,
    pub tutorial: f32,
    pub lab: f32,
}

impl CreditStructure {
    /// Parses `"L-T-P"`; every part must be a number.
    pub fn parse(text: &str) -> Option<Self> {
        let parts = text
            .split('-')
            .map(|p| p.trim().parse::<f32>().ok())
            .collect::<Option<Vec<_>>>()?;
        match parts.as_slice() {
            [lecture, tutorial, lab] => Some(Self {
                lecture: *lecture,
                tutorial: *tutorial,
                lab: *lab,
            }),
            _ => None,
        }
    }

    pub fn has_tutorial(&self) -> bool {
        self.tutorial > 0.0
    }

    pub fn has_lab(&self) -> bool {
        self.lab > 0.0
    }

    /// Lab hours count half.
    pub fn total(&self) -> f32 {
        self.lecture + self.tutorial + 0.5 * self.lab
    }
}

/// A manually curated booking that the catalog does not know about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraOccupiedEntry {
    /// 1 = Monday .. 5 = Friday
    pub day: u8,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub lecture_hall: String,
}

impl ExtraOccupiedEntry {
    /// The teaching day, or `None` when the entry uses an out-of-range index.
    pub fn teaching_day(&self) -> Option<Day> {
        Day::from_index(self.day)
    }

    pub fn covers(&self, day: Day, t: ClockTime) -> bool {
        self.teaching_day() == Some(day) && self.start_time <= t && t < self.end_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_structure_zero_is_numeric() {
        let integral = CreditStructure::parse("3-0-0").unwrap();
        assert!(!integral.has_tutorial());
        assert!(!integral.has_lab());

        let decimal = CreditStructure::parse("3.0-1.0-2.0").unwrap();
        assert!(decimal.has_tutorial());
        assert!(decimal.has_lab());
        assert_eq!(decimal.total(), 5.0);

        assert_eq!(CreditStructure::parse("3-1"), None);
        assert_eq!(CreditStructure::parse("x-1-0"), None);
    }

    #[test]
    fn test_course_from_exporter_json() {
        let course: Course = serde_json::from_value(serde_json::json!({
            "courseCode": "COL106",
            "courseName": "DATA STRUCTURES & ALGORITHMS",
            "semesterCode": "2502",
            "totalCredits": 5.0,
            "creditStructure": "3.0-0.0-4.0",
            "instructor": "Jane Doe",
            "currentStrength": "120",
            "slot": {
                "name": "A",
                "lectureTiming": "109301100,409301100",
                "lectureTimingStr": "MTh 09:30-11:00",
                "tutorialTiming": null,
                "labTiming": null
            },
            "lectureHall": "LH 108, LH 114"
        }))
        .unwrap();

        assert_eq!(course.lecture_sessions().len(), 2);
        assert!(course.tutorial_sessions().is_empty());
        assert_eq!(course.rooms().collect::<Vec<_>>(), vec!["LH 108", "LH 114"]);
        assert!(course.credits().has_lab());
        assert!(course.has_lecture_timing());
    }

    #[test]
    fn test_extra_occupied_day_range() {
        let entry: ExtraOccupiedEntry = serde_json::from_value(serde_json::json!({
            "day": 2,
            "startTime": "1400",
            "endTime": "1600",
            "lectureHall": "LH 202"
        }))
        .unwrap();
        let three_pm = ClockTime::from_hhmm(1500).unwrap();
        assert_eq!(entry.teaching_day(), Some(Day::Tuesday));
        assert!(entry.covers(Day::Tuesday, three_pm));
        assert!(!entry.covers(Day::Tuesday, ClockTime::from_hhmm(1600).unwrap()));

        let weekend = ExtraOccupiedEntry { day: 6, ..entry };
        assert_eq!(weekend.teaching_day(), None);
        assert!(!weekend.covers(Day::Tuesday, three_pm));
    }
}
