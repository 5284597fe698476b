//! Flattened session tuples for calendar/image exporters, and an iCalendar writer.

use super::SelectionManager;
use crate::schedule::SessionKind;
use crate::timing::{ClockTime, Day};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// One weekly session of a selected course, ready to be drawn or exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSession {
    pub course_code: String,
    pub kind: SessionKind,
    pub day: Day,
    pub start: ClockTime,
    pub end: ClockTime,
    pub location: Option<String>,
    pub label: String,
}

impl SelectionManager {
    /// Every session of every selected course, in selection order.
    ///
    /// Lectures are placed in the course's listed hall(s); tutorials and labs
    /// use the venue the student entered, if any.
    pub fn export_sessions(&self) -> Vec<ExportSession> {
        self.iter()
            .flat_map(|(entry, schedule)| {
                schedule.iter().map(move |(kind, session)| {
                    let location = match kind {
                        SessionKind::Lecture => entry.lecture_hall.clone(),
                        SessionKind::Tutorial | SessionKind::Lab => session.location.clone(),
                    }
                    .filter(|l| !l.trim().is_empty());

                    ExportSession {
                        course_code: entry.course_code.clone(),
                        kind,
                        day: session.day,
                        start: session.start,
                        end: session.end,
                        location,
                        label: format!("{} {}", entry.course_code, kind),
                    }
                })
            })
            .collect()
    }
}

/// Settings for the iCalendar export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarExport {
    /// Monday of the first teaching week; events recur weekly from here
    pub first_monday: NaiveDate,
    /// IANA zone written into `DTSTART;TZID=`
    pub tzid: String,
    pub prod_id: String,
}

impl Default for CalendarExport {
    fn default() -> Self {
        Self {
            first_monday: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap_or_default(),
            tzid: "Asia/Kolkata".to_string(),
            prod_id: "-//Timetable//EN".to_string(),
        }
    }
}

impl CalendarExport {
    /// Date of `day` in the first teaching week.
    fn first_date(&self, day: Day) -> NaiveDate {
        let monday = self.first_monday
            - Duration::days(self.first_monday.weekday().num_days_from_monday() as i64);
        monday + Duration::days(day.index() as i64 - 1)
    }

    /// Renders a `VCALENDAR` with one weekly `VEVENT` per session.
    pub fn to_ics(&self, sessions: &[ExportSession]) -> String {
        let mut lines = vec![
            "BEGIN:VCALENDAR".to_string(),
            "VERSION:2.0".to_string(),
            format!("PRODID:{}", self.prod_id),
        ];

        for (i, session) in sessions.iter().enumerate() {
            let date = self.first_date(session.day).format("%Y%m%d");
            lines.push("BEGIN:VEVENT".to_string());
            lines.push(format!(
                "UID:{}-{}-{}@timetable",
                session.course_code,
                session.kind.to_string().to_lowercase(),
                i
            ));
            lines.push(format!("SUMMARY:{}", escape(&session.label)));
            lines.push(format!(
                "RRULE:FREQ=WEEKLY;BYDAY={}",
                byday(session.day.weekday())
            ));
            lines.push(format!(
                "DTSTART;TZID={}:{}T{}00",
                self.tzid, date, session.start
            ));
            lines.push(format!("DTEND;TZID={}:{}T{}00", self.tzid, date, session.end));
            if let Some(location) = &session.location {
                lines.push(format!("LOCATION:{}", escape(location)));
            }
            lines.push("END:VEVENT".to_string());
        }

        lines.push("END:VCALENDAR".to_string());
        let mut ics = lines.join("\r\n");
        ics.push_str("\r\n");
        ics
    }
}

fn byday(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

/// Escapes iCalendar TEXT values.
fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}
