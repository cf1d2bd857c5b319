use chrono::{NaiveDate, NaiveTime};

use crate::{Event, EventDraft};

/// Anything that occupies a time range on one day
pub trait TimeSlot {
    /// Day the slot falls on
    fn date(&self) -> NaiveDate;
    /// Inclusive start
    fn start_time(&self) -> NaiveTime;
    /// Exclusive end
    fn end_time(&self) -> NaiveTime;
}

impl TimeSlot for Event {
    fn date(&self) -> NaiveDate {
        self.start_date
    }

    fn start_time(&self) -> NaiveTime {
        self.start_time
    }

    fn end_time(&self) -> NaiveTime {
        self.end_time
    }
}

impl TimeSlot for EventDraft {
    fn date(&self) -> NaiveDate {
        self.start_date
    }

    fn start_time(&self) -> NaiveTime {
        self.start_time
    }

    fn end_time(&self) -> NaiveTime {
        self.end_time
    }
}

/// Whether `[start, end)` of the candidate overlaps `[start, end)` of the existing slot.
///
/// Touching endpoints do not overlap; identical spans do.
pub fn times_overlap(
    candidate_start: NaiveTime,
    candidate_end: NaiveTime,
    existing_start: NaiveTime,
    existing_end: NaiveTime,
) -> bool {
    let starts_inside = candidate_start >= existing_start && candidate_start < existing_end;
    let ends_inside = candidate_end > existing_start && candidate_end <= existing_end;
    let contains = candidate_start <= existing_start && candidate_end >= existing_end;

    starts_inside || ends_inside || contains
}

/// Same day and overlapping times
pub fn slots_conflict(candidate: &impl TimeSlot, existing: &impl TimeSlot) -> bool {
    candidate.date() == existing.date()
        && times_overlap(
            candidate.start_time(),
            candidate.end_time(),
            existing.start_time(),
            existing.end_time(),
        )
}

/// Every event in `existing` that overlaps `candidate`, in input order.
///
/// Nothing is excluded: when checking an edit, leave the edited event out of
/// `existing` first.
pub fn find_conflicts<'a>(candidate: &impl TimeSlot, existing: &'a [Event]) -> Vec<&'a Event> {
    existing
        .iter()
        .filter(|event| slots_conflict(candidate, *event))
        .collect()
}

/// Titles of conflicting events, for user-facing messages
pub fn conflict_titles(conflicts: &[&Event]) -> Vec<String> {
    conflicts.iter().map(|e| e.title.clone()).collect()
}
