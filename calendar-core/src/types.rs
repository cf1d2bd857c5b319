use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{Error, Result};

/// Categories offered by the event form. The field itself is free-form.
pub const SUGGESTED_CATEGORIES: [&str; 5] = ["work", "personal", "health", "social", "other"];

/// Category assigned when none is given
pub const DEFAULT_CATEGORY: &str = "other";

/// Recurrence type as stored on an event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceKind {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    /// Same stepping as `Daily`
    Custom,
    /// Any unrecognised type string; never expanded
    #[serde(other)]
    Unknown,
}

/// Recurrence settings embedded in every event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recurrence {
    /// Recurrence type
    #[serde(rename = "type", default)]
    pub kind: RecurrenceKind,
    /// Step size: days for daily/custom, weeks for weekly, months for monthly.
    /// Values below 1 are treated as 1.
    #[serde(default = "default_interval")]
    pub interval: i64,
    /// Weekday indices, 0 = Sunday. Only used by weekly recurrence.
    #[serde(default)]
    pub days_of_week: Vec<i64>,
    /// Last date an instance may fall on
    #[serde(default, deserialize_with = "de_opt_date")]
    pub end_date: Option<NaiveDate>,
}

fn default_interval() -> i64 {
    1
}

impl Default for Recurrence {
    fn default() -> Self {
        Self {
            kind: RecurrenceKind::None,
            interval: default_interval(),
            days_of_week: Vec::new(),
            end_date: None,
        }
    }
}

impl Recurrence {
    /// Every `interval` days
    pub fn daily(interval: i64) -> Self {
        Self {
            kind: RecurrenceKind::Daily,
            interval,
            ..Default::default()
        }
    }

    /// Every `interval` weeks on the start date's weekday
    pub fn weekly(interval: i64) -> Self {
        Self {
            kind: RecurrenceKind::Weekly,
            interval,
            ..Default::default()
        }
    }

    /// Weekly on the given weekday indices, 0 = Sunday
    pub fn weekly_on(days_of_week: impl IntoIterator<Item = i64>) -> Self {
        Self {
            kind: RecurrenceKind::Weekly,
            days_of_week: days_of_week.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Every `interval` months on the start date's day of month
    pub fn monthly(interval: i64) -> Self {
        Self {
            kind: RecurrenceKind::Monthly,
            interval,
            ..Default::default()
        }
    }

    /// Stop producing instances after `end_date`
    pub fn until(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// False for `none` and unrecognised types
    pub fn is_recurring(&self) -> bool {
        !matches!(self.kind, RecurrenceKind::None | RecurrenceKind::Unknown)
    }
}

/// A calendar event.
///
/// Base events are what the user authored and what gets stored. Expansion
/// produces instances, which are copies of the base event moved to another
/// date with `series_id` pointing back at the base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(deserialize_with = "de_date")]
    pub start_date: NaiveDate,
    /// Kept equal to `start_date`
    #[serde(deserialize_with = "de_date")]
    pub end_date: NaiveDate,
    #[serde(deserialize_with = "de_time")]
    pub start_time: NaiveTime,
    #[serde(deserialize_with = "de_time")]
    pub end_time: NaiveTime,
    pub category: String,
    #[serde(default)]
    pub recurrence: Recurrence,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Id of the base event this instance was generated from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_id: Option<String>,
}

impl Event {
    /// Build a stored event from a validated draft
    pub fn from_draft(id: impl Into<String>, draft: EventDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: draft.title,
            description: draft.description,
            start_date: draft.start_date,
            end_date: draft.end_date,
            start_time: draft.start_time,
            end_time: draft.end_time,
            category: draft.category,
            recurrence: draft.recurrence,
            created_at: now,
            updated_at: now,
            series_id: None,
        }
    }

    /// Replace every user-editable field, keeping identity and creation time
    pub fn apply_draft(&mut self, draft: EventDraft, now: DateTime<Utc>) {
        self.title = draft.title;
        self.description = draft.description;
        self.start_date = draft.start_date;
        self.end_date = draft.end_date;
        self.start_time = draft.start_time;
        self.end_time = draft.end_time;
        self.category = draft.category;
        self.recurrence = draft.recurrence;
        self.updated_at = now;
    }

    pub fn to_draft(&self) -> EventDraft {
        EventDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            start_time: self.start_time,
            end_time: self.end_time,
            category: self.category.clone(),
            recurrence: self.recurrence.clone(),
        }
    }

    /// Copy of this event placed on `date`
    pub fn occurrence_on(&self, date: NaiveDate) -> Self {
        Self {
            id: occurrence_id(&self.id, date),
            start_date: date,
            end_date: date,
            series_id: Some(self.id.clone()),
            ..self.clone()
        }
    }

    pub fn is_occurrence(&self) -> bool {
        self.series_id.is_some()
    }

    /// Id of the stored event this one comes from
    pub fn base_id(&self) -> &str {
        self.series_id.as_deref().unwrap_or(&self.id)
    }

    /// Whether this event is `id` itself or one of its generated instances
    pub fn in_series(&self, id: &str) -> bool {
        self.base_id() == id
    }
}

/// Dates are written as `YYYY-MM-DD`. Stores written by the browser app hold
/// full RFC 3339 timestamps instead; those are read in UTC.
fn parse_stored_date(s: &str) -> std::result::Result<NaiveDate, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(s) {
        Ok(ts) => Ok(ts.naive_utc().date()),
        Err(_) => NaiveDate::parse_from_str(s, "%Y-%m-%d"),
    }
}

/// Same as [`parse_stored_date`], keeping only the time of day
fn parse_stored_time(s: &str) -> std::result::Result<NaiveTime, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(s) {
        Ok(ts) => Ok(ts.naive_utc().time()),
        Err(_) => s.parse(),
    }
}

fn de_date<'de, D>(de: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(de)?;
    parse_stored_date(&s).map_err(serde::de::Error::custom)
}

fn de_opt_date<'de, D>(de: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(de)?
        .as_deref()
        .map(parse_stored_date)
        .transpose()
        .map_err(serde::de::Error::custom)
}

fn de_time<'de, D>(de: D) -> std::result::Result<NaiveTime, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(de)?;
    parse_stored_time(&s).map_err(serde::de::Error::custom)
}

/// Id of the instance of `base_id` that falls on `date`
pub fn occurrence_id(base_id: &str, date: NaiveDate) -> String {
    format!("{}-{}", base_id, date.format("%Y-%m-%d"))
}

/// User input for creating, editing or moving an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(deserialize_with = "de_date")]
    pub start_date: NaiveDate,
    #[serde(deserialize_with = "de_date")]
    pub end_date: NaiveDate,
    #[serde(deserialize_with = "de_time")]
    pub start_time: NaiveTime,
    #[serde(deserialize_with = "de_time")]
    pub end_time: NaiveTime,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub recurrence: Recurrence,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl EventDraft {
    /// Single-day, non-recurring draft in the default category
    pub fn new(
        title: impl Into<String>,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            start_date: date,
            end_date: date,
            start_time,
            end_time,
            category: default_category(),
            recurrence: Recurrence::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = recurrence;
        self
    }

    /// Move the draft to another day
    pub fn on(mut self, date: NaiveDate) -> Self {
        self.start_date = date;
        self.end_date = date;
        self
    }

    /// Checks the fields the event form marks as required
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation("title must not be empty".to_string()));
        }

        if self.end_time < self.start_time {
            return Err(Error::Validation(format!(
                "end time {} is before start time {}",
                self.end_time.format("%H:%M"),
                self.start_time.format("%H:%M")
            )));
        }

        if self.category.trim().is_empty() {
            return Err(Error::Validation("category must not be empty".to_string()));
        }

        Ok(())
    }
}
