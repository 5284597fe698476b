//! Per-course session lists: the lecture sessions from the catalog plus the
//! tutorial and lab sessions a student schedules for themselves.

use crate::timing::Session;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A component the student can (re)schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    Tutorial,
    Lab,
}

/// The kind of any scheduled session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Lecture,
    Tutorial,
    Lab,
}

impl From<Component> for SessionKind {
    fn from(component: Component) -> Self {
        match component {
            Component::Tutorial => SessionKind::Tutorial,
            Component::Lab => SessionKind::Lab,
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        SessionKind::from(*self).fmt(f)
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionKind::Lecture => "Lecture",
            SessionKind::Tutorial => "Tutorial",
            SessionKind::Lab => "Lab",
        })
    }
}

/// Why a session was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionFault {
    /// start >= end
    EmptyRange,
}

impl fmt::Display for SessionFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionFault::EmptyRange => f.write_str("session must end after it starts"),
        }
    }
}

/// Rejected edit. Nothing is applied when this is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid session at index {index}: {reason}")]
    InvalidSession { index: usize, reason: SessionFault },

    #[error("No session at index {index} (component has {len})")]
    NoSuchSession { index: usize, len: usize },
}

fn check(session: &Session) -> Result<(), SessionFault> {
    if session.has_valid_range() {
        Ok(())
    } else {
        Err(SessionFault::EmptyRange)
    }
}

/// The sessions of one selected course.
///
/// `tutorial` and `lab` are `None` rather than empty: a present component
/// always holds at least one session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CourseSchedule {
    pub lecture: Vec<Session>,
    pub tutorial: Option<Vec<Session>>,
    pub lab: Option<Vec<Session>>,
}

impl CourseSchedule {
    /// A schedule holding only catalog lectures; tutorial and lab are unscheduled.
    pub fn with_lectures(lecture: Vec<Session>) -> Self {
        Self {
            lecture,
            tutorial: None,
            lab: None,
        }
    }

    pub fn component(&self, component: Component) -> Option<&[Session]> {
        match component {
            Component::Tutorial => self.tutorial.as_deref(),
            Component::Lab => self.lab.as_deref(),
        }
    }

    fn slot_mut(&mut self, component: Component) -> &mut Option<Vec<Session>> {
        match component {
            Component::Tutorial => &mut self.tutorial,
            Component::Lab => &mut self.lab,
        }
    }

    /// Replaces a component wholesale. An empty list clears it.
    ///
    /// Every session is checked before anything is written; the first bad one
    /// is reported by index and the schedule is left untouched.
    pub fn set_component(
        &mut self,
        component: Component,
        sessions: Vec<Session>,
    ) -> Result<(), ValidationError> {
        for (index, session) in sessions.iter().enumerate() {
            check(session).map_err(|reason| ValidationError::InvalidSession { index, reason })?;
        }

        *self.slot_mut(component) = if sessions.is_empty() {
            None
        } else {
            Some(sessions)
        };
        Ok(())
    }

    /// Appends one session to a component, creating the component if needed.
    pub fn add_session(
        &mut self,
        component: Component,
        session: Session,
    ) -> Result<(), ValidationError> {
        let slot = self.slot_mut(component);
        let index = slot.as_ref().map_or(0, Vec::len);
        check(&session).map_err(|reason| ValidationError::InvalidSession { index, reason })?;

        slot.get_or_insert_with(Vec::new).push(session);
        Ok(())
    }

    /// Removes one session; removing the last one clears the component.
    pub fn remove_session(
        &mut self,
        component: Component,
        index: usize,
    ) -> Result<Session, ValidationError> {
        let slot = self.slot_mut(component);
        let len = slot.as_ref().map_or(0, Vec::len);
        let Some(sessions) = slot.as_mut().filter(|_| index < len) else {
            return Err(ValidationError::NoSuchSession { index, len });
        };

        let removed = sessions.remove(index);
        if sessions.is_empty() {
            *slot = None;
        }
        Ok(removed)
    }

    /// Every session with its kind, lectures first.
    pub fn iter(&self) -> impl Iterator<Item = (SessionKind, &Session)> {
        let lectures = self.lecture.iter().map(|s| (SessionKind::Lecture, s));
        let tutorials = self
            .tutorial
            .iter()
            .flatten()
            .map(|s| (SessionKind::Tutorial, s));
        let labs = self.lab.iter().flatten().map(|s| (SessionKind::Lab, s));
        lectures.chain(tutorials).chain(labs)
    }

    /// Checks the stored lists against the same rules edits enforce.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let lists = [
            Some(self.lecture.as_slice()),
            self.tutorial.as_deref(),
            self.lab.as_deref(),
        ];
        for sessions in lists.into_iter().flatten() {
            for (index, session) in sessions.iter().enumerate() {
                check(session)
                    .map_err(|reason| ValidationError::InvalidSession { index, reason })?;
            }
        }
        Ok(())
    }
}
