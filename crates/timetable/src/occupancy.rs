//! Empty lecture hall finder.
//!
//! A room is occupied at `(day, t)` when any catalog lecture held there, or
//! any manual override for it, satisfies `start <= t < end` on that day. Every
//! room in a multi-room listing is treated as occupied together.

use crate::catalog::{Catalog, ExtraOccupiedEntry};
use crate::timing::{ClockTime, Day};
use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Decides which room names are real bookable rooms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomFilter {
    prefixes: Vec<String>,
}

impl RoomFilter {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// "Online", "TBD" and lab names fall outside the recognised prefixes.
    pub fn accepts(&self, room: &str) -> bool {
        self.prefixes.iter().any(|p| room.starts_with(p.as_str()))
    }
}

impl Default for RoomFilter {
    fn default() -> Self {
        Self::new(["LH"])
    }
}

/// Every bookable room named anywhere in the catalog.
pub fn all_rooms(catalog: &Catalog, filter: &RoomFilter) -> BTreeSet<String> {
    catalog
        .courses()
        .iter()
        .flat_map(|course| course.rooms())
        .filter(|room| filter.accepts(room))
        .map(str::to_string)
        .collect()
}

/// Rooms in use at `t` on `day`, from catalog lectures and the override list.
pub fn occupied_rooms(
    catalog: &Catalog,
    extra_occupied: &[ExtraOccupiedEntry],
    filter: &RoomFilter,
    day: Day,
    t: ClockTime,
) -> BTreeSet<String> {
    let from_catalog = catalog
        .courses()
        .iter()
        .filter(|course| {
            course
                .lecture_sessions()
                .iter()
                .any(|session| session.covers(day, t))
        })
        .flat_map(|course| course.rooms());

    let from_overrides = extra_occupied
        .iter()
        .filter(|entry| entry.covers(day, t))
        .map(|entry| entry.lecture_hall.trim());

    from_catalog
        .chain(from_overrides)
        .filter(|room| filter.accepts(room))
        .map(str::to_string)
        .collect()
}

/// Catalog rooms not occupied at `t` on `day`, sorted and de-duplicated.
pub fn free_rooms(
    catalog: &Catalog,
    extra_occupied: &[ExtraOccupiedEntry],
    filter: &RoomFilter,
    day: Day,
    t: ClockTime,
) -> Vec<String> {
    let occupied = occupied_rooms(catalog, extra_occupied, filter, day, t);
    all_rooms(catalog, filter)
        .into_iter()
        .filter(|room| !occupied.contains(room))
        .collect()
}

/// Free rooms at one instant. Recomputed for every query, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupancySnapshot {
    pub query_time: ClockTime,
    pub query_day: chrono::Weekday,
    pub free_rooms: Vec<String>,
}

impl OccupancySnapshot {
    /// Snapshot for a teaching day and clock time.
    pub fn compute(
        catalog: &Catalog,
        extra_occupied: &[ExtraOccupiedEntry],
        filter: &RoomFilter,
        day: Day,
        t: ClockTime,
    ) -> Self {
        Self {
            query_time: t,
            query_day: day.weekday(),
            free_rooms: free_rooms(catalog, extra_occupied, filter, day, t),
        }
    }

    /// Snapshot for any weekday. Nothing is taught at weekends, so every
    /// room is free then.
    pub fn for_weekday(
        catalog: &Catalog,
        extra_occupied: &[ExtraOccupiedEntry],
        filter: &RoomFilter,
        weekday: chrono::Weekday,
        t: ClockTime,
    ) -> Self {
        match Day::from_weekday(weekday) {
            Some(day) => Self::compute(catalog, extra_occupied, filter, day, t),
            None => Self {
                query_time: t,
                query_day: weekday,
                free_rooms: all_rooms(catalog, filter).into_iter().collect(),
            },
        }
    }

    /// Snapshot for a wall-clock instant, truncated to the minute.
    pub fn at(
        catalog: &Catalog,
        extra_occupied: &[ExtraOccupiedEntry],
        filter: &RoomFilter,
        instant: NaiveDateTime,
    ) -> Self {
        let t = ClockTime::from_time(&instant.time());
        Self::for_weekday(catalog, extra_occupied, filter, instant.weekday(), t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::course;
    use chrono::NaiveDate;

    fn t(hhmm: u16) -> ClockTime {
        ClockTime::from_hhmm(hhmm).unwrap()
    }

    fn single_course_catalog() -> Catalog {
        Catalog::from_courses(vec![course(
            "COL106",
            "3-0-2",
            Some("LH 101"),
            Some("109301100"),
        )])
    }

    fn tuesday_override() -> Vec<ExtraOccupiedEntry> {
        vec![ExtraOccupiedEntry {
            day: 2,
            start_time: t(1400),
            end_time: t(1600),
            lecture_hall: "LH 202".to_string(),
        }]
    }

    #[test]
    fn test_half_open_lecture_interval() {
        let catalog = single_course_catalog();
        let filter = RoomFilter::default();

        let occupied = occupied_rooms(&catalog, &[], &filter, Day::Monday, t(1000));
        assert!(occupied.contains("LH 101"));

        for free_at in [1100, 900] {
            let occupied = occupied_rooms(&catalog, &[], &filter, Day::Monday, t(free_at));
            assert!(occupied.is_empty(), "LH 101 should be free at {free_at}");
        }

        assert!(occupied_rooms(&catalog, &[], &filter, Day::Tuesday, t(1000)).is_empty());
    }

    #[test]
    fn test_extra_occupied_marks_unknown_room() {
        let catalog = single_course_catalog();
        let filter = RoomFilter::default();
        let extra = tuesday_override();

        let occupied = occupied_rooms(&catalog, &extra, &filter, Day::Tuesday, t(1500));
        assert_eq!(occupied.into_iter().collect::<Vec<_>>(), vec!["LH 202"]);

        assert!(occupied_rooms(&catalog, &extra, &filter, Day::Tuesday, t(1600)).is_empty());
    }

    #[test]
    fn test_multi_room_listing_is_occupied_together() {
        let catalog = Catalog::from_courses(vec![
            course("MTL100", "3-1-0", Some("LH 108, LH 114, Online"), Some("208000850")),
            course("ELL201", "3-0-2", Some("LH 121"), Some("308000850")),
        ]);
        let filter = RoomFilter::default();

        let occupied = occupied_rooms(&catalog, &[], &filter, Day::Tuesday, t(830));
        assert_eq!(
            occupied.into_iter().collect::<Vec<_>>(),
            vec!["LH 108", "LH 114"]
        );
    }

    #[test]
    fn test_free_rooms_sorted_unique_and_filtered() {
        let catalog = Catalog::from_courses(vec![
            course("A1", "3-0-0", Some("LH 310,LH 108"), Some("109301100")),
            course("A2", "3-0-0", Some("LH 108"), Some("209301100")),
            course("A3", "3-0-0", Some("TBD"), None),
            course("A4", "3-0-0", Some(" LH 121 , Online"), Some("309301100")),
            course("A5", "3-0-0", None, None),
        ]);
        let filter = RoomFilter::default();

        assert_eq!(
            all_rooms(&catalog, &filter).into_iter().collect::<Vec<_>>(),
            vec!["LH 108", "LH 121", "LH 310"]
        );

        let free = free_rooms(&catalog, &[], &filter, Day::Monday, t(1000));
        assert_eq!(free, vec!["LH 121"]);

        let free = free_rooms(&catalog, &[], &filter, Day::Friday, t(1000));
        let mut sorted = free.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(free, sorted);
        assert_eq!(free.len(), 3);
    }

    #[test]
    fn test_custom_prefixes() {
        let catalog = Catalog::from_courses(vec![course(
            "COL333",
            "3-0-0",
            Some("LH 108, IIA 301, Online"),
            None,
        )]);
        let filter = RoomFilter::new(["LH", "IIA"]);
        assert_eq!(all_rooms(&catalog, &filter).len(), 2);
    }

    #[test]
    fn test_snapshot_at_instant() {
        let catalog = single_course_catalog();
        let filter = RoomFilter::default();

        // 2025-01-06 is a Monday
        let monday = NaiveDate::from_ymd_opt(2025, 1, 6)
            .unwrap()
            .and_hms_opt(10, 15, 42)
            .unwrap();
        let snapshot = OccupancySnapshot::at(&catalog, &[], &filter, monday);
        assert_eq!(snapshot.query_day, chrono::Weekday::Mon);
        assert_eq!(snapshot.query_time, t(1015));
        assert!(snapshot.free_rooms.is_empty());

        let saturday = NaiveDate::from_ymd_opt(2025, 1, 11)
            .unwrap()
            .and_hms_opt(10, 15, 0)
            .unwrap();
        let snapshot = OccupancySnapshot::at(&catalog, &[], &filter, saturday);
        assert_eq!(snapshot.free_rooms, vec!["LH 101"]);
    }
}
