use chrono::{Datelike, Days, NaiveDate};

use crate::Event;

/// Number of entries shown in the upcoming and past lists
pub const DEFAULT_LIST_LIMIT: usize = 10;

/// Search box and category selector
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Case-insensitive substring of title or description
    pub query: String,
    /// Exact category, `None` for all categories
    pub category: Option<String>,
}

impl EventFilter {
    pub fn new(query: impl Into<String>, category: Option<String>) -> Self {
        Self {
            query: query.into(),
            category,
        }
    }

    pub fn matches(&self, event: &Event) -> bool {
        let query = self.query.to_lowercase();
        let matches_search = event.title.to_lowercase().contains(&query)
            || event.description.to_lowercase().contains(&query);
        let matches_category = self
            .category
            .as_deref()
            .is_none_or(|category| category.is_empty() || event.category == category);

        matches_search && matches_category
    }

    pub fn apply<'a>(&self, events: &'a [Event]) -> Vec<&'a Event> {
        events.iter().filter(|e| self.matches(e)).collect()
    }
}

/// Distinct categories in first-seen order
pub fn categories(events: &[Event]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for event in events {
        if !seen.contains(&event.category) {
            seen.push(event.category.clone());
        }
    }
    seen
}

pub fn events_on(events: &[Event], date: NaiveDate) -> Vec<&Event> {
    events.iter().filter(|e| e.start_date == date).collect()
}

/// Stable sort by date, then start time
pub fn sort_chronologically(events: &mut [Event]) {
    events.sort_by(|a, b| {
        a.start_date
            .cmp(&b.start_date)
            .then(a.start_time.cmp(&b.start_time))
    });
}

/// Events from `today` on, soonest first
pub fn upcoming(events: &[Event], today: NaiveDate, limit: usize) -> Vec<&Event> {
    let mut selected: Vec<&Event> = events.iter().filter(|e| e.start_date >= today).collect();
    selected.sort_by_key(|e| (e.start_date, e.start_time));
    selected.truncate(limit);
    selected
}

/// Events before `today`, most recent first
pub fn past(events: &[Event], today: NaiveDate, limit: usize) -> Vec<&Event> {
    let mut selected: Vec<&Event> = events.iter().filter(|e| e.start_date < today).collect();
    selected.sort_by_key(|e| std::cmp::Reverse((e.start_date, e.start_time)));
    selected.truncate(limit);
    selected
}

/// Dates shown on a month page: whole Sunday-to-Saturday weeks covering the month.
///
/// Returns `None` for an invalid year/month.
pub fn month_grid(year: i32, month: u32) -> Option<Vec<NaiveDate>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let last = next_month.pred_opt()?;

    let grid_start =
        first.checked_sub_days(Days::new(u64::from(first.weekday().num_days_from_sunday())))?;
    let grid_end =
        last.checked_add_days(Days::new(u64::from(6 - last.weekday().num_days_from_sunday())))?;

    Some(grid_start.iter_days().take_while(|d| *d <= grid_end).collect())
}
