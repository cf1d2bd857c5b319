use anyhow::{Context, Result};
use calendar_core::prelude::*;
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime};

use crate::store::JsonFileStore;

/// Fields of the event form. All optional so `edit` can change a subset.
#[derive(Debug, Default)]
pub struct EventFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub category: Option<String>,
    pub repeat: Option<RecurrenceKind>,
    pub interval: Option<i64>,
    pub days: Option<Vec<i64>>,
    pub until: Option<String>,
}

impl EventFields {
    /// Build a draft for a new event; date, times and title are required
    fn into_new_draft(self) -> Result<EventDraft> {
        let title = self.title.clone().context("--title is required")?;
        let date = parse_date(self.date.as_deref().context("--date is required")?)?;
        let start = parse_time(self.start.as_deref().context("--start is required")?)?;
        let end = parse_time(self.end.as_deref().context("--end is required")?)?;

        let draft = EventDraft::new(title, date, start, end);
        self.apply_to(draft)
    }

    /// Overlay the given fields on an existing draft
    fn apply_to(self, mut draft: EventDraft) -> Result<EventDraft> {
        if let Some(title) = self.title {
            draft.title = title;
        }
        if let Some(description) = self.description {
            draft.description = description;
        }
        if let Some(date) = self.date {
            draft = draft.on(parse_date(&date)?);
        }
        if let Some(start) = self.start {
            draft.start_time = parse_time(&start)?;
        }
        if let Some(end) = self.end {
            draft.end_time = parse_time(&end)?;
        }
        if let Some(category) = self.category {
            draft.category = category;
        }
        if let Some(kind) = self.repeat {
            draft.recurrence.kind = kind;
        }
        if let Some(interval) = self.interval {
            draft.recurrence.interval = interval;
        }
        if let Some(days) = self.days {
            draft.recurrence.days_of_week = days;
        }
        if let Some(until) = self.until {
            draft.recurrence.end_date = if until.is_empty() {
                None
            } else {
                Some(parse_date(&until)?)
            };
        }

        Ok(draft)
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(calendar_core::Error::from)
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", value))
}

pub fn parse_time(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(calendar_core::Error::from)
        .with_context(|| format!("Invalid time '{}', expected HH:MM", value))
}

/// Parse `YYYY-MM` into year and month
pub fn parse_month(value: &str) -> Result<(i32, u32)> {
    let date = parse_date(&format!("{}-01", value))
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", value))?;
    Ok((date.year(), date.month()))
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn describe(event: &Event) -> String {
    let mut line = format!(
        "{} {}-{}  [{}] {}",
        event.start_date.format("%Y-%m-%d"),
        event.start_time.format("%H:%M"),
        event.end_time.format("%H:%M"),
        event.category,
        event.title
    );
    if event.recurrence.is_recurring() {
        line.push_str(&format!(" (repeats {:?})", event.recurrence.kind).to_lowercase());
    }
    line.push_str(&format!("  id={}", event.id));
    line
}

fn report_conflicts(conflicts: &[Event]) {
    println!("✗ Conflicts with {} event(s):", conflicts.len());
    for event in conflicts {
        println!("  {}", describe(event));
    }
}

/// Run a mutation, turning a refused change into a readable report
fn finish(result: calendar_core::Result<Event>, verb: &str) -> Result<()> {
    match result {
        Ok(event) => {
            println!("✓ {} {}", verb, describe(&event));
            Ok(())
        }
        Err(calendar_core::Error::Conflict { titles }) => {
            anyhow::bail!("This event conflicts with: {}", titles.join(", "))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn add_command(planner: &Planner<JsonFileStore>, fields: EventFields) -> Result<()> {
    let draft = fields.into_new_draft()?;
    finish(planner.add(draft, now()).await, "Added")
}

pub async fn edit_command(
    planner: &Planner<JsonFileStore>,
    id: String,
    fields: EventFields,
) -> Result<()> {
    let events = planner.events().await?;
    let current = events
        .iter()
        .find(|e| e.id == id)
        .ok_or_else(|| calendar_core::Error::NotFound(id.clone()))?;

    let draft = fields.apply_to(current.to_draft())?;
    finish(planner.update(&id, draft, now()).await, "Updated")
}

pub async fn move_command(
    planner: &Planner<JsonFileStore>,
    id: String,
    date: String,
) -> Result<()> {
    let date = parse_date(&date)?;
    finish(planner.move_to(&id, date, now()).await, "Moved")
}

pub async fn delete_command(planner: &Planner<JsonFileStore>, id: String) -> Result<()> {
    let removed = planner.delete(&id).await?;
    println!("✓ Deleted {}", describe(&removed));
    Ok(())
}

pub async fn check_command(
    planner: &Planner<JsonFileStore>,
    mut fields: EventFields,
    exclude: Option<String>,
) -> Result<()> {
    if fields.title.is_none() {
        fields.title = Some("(candidate)".to_string());
    }
    let draft = fields.into_new_draft()?;
    let conflicts = planner.check(&draft, exclude.as_deref(), now()).await?;

    if conflicts.is_empty() {
        println!("✓ No conflicts");
    } else {
        report_conflicts(&conflicts);
    }
    Ok(())
}

pub async fn list_command(
    planner: &Planner<JsonFileStore>,
    search: Option<String>,
    category: Option<String>,
    date: Option<String>,
) -> Result<()> {
    let mut events = planner.visible(now()).await?;
    sort_chronologically(&mut events);

    let filter = EventFilter::new(search.unwrap_or_default(), category);
    let mut shown = filter.apply(&events);
    if let Some(date) = date {
        let date = parse_date(&date)?;
        shown.retain(|e| e.start_date == date);
    }

    if shown.is_empty() {
        println!("No events found");
    }
    for event in shown {
        println!("{}", describe(event));
    }
    Ok(())
}

pub async fn upcoming_command(planner: &Planner<JsonFileStore>, limit: usize) -> Result<()> {
    let events = planner.visible(now()).await?;
    let today = now().date();

    println!("Upcoming events:");
    let selected = upcoming(&events, today, limit);
    if selected.is_empty() {
        println!("  No upcoming events");
    }
    for event in selected {
        println!("  {}", describe(event));
    }
    Ok(())
}

pub async fn past_command(planner: &Planner<JsonFileStore>, limit: usize) -> Result<()> {
    let events = planner.visible(now()).await?;
    let today = now().date();

    println!("Past events:");
    let selected = past(&events, today, limit);
    if selected.is_empty() {
        println!("  No past events");
    }
    for event in selected {
        println!("  {}", describe(event));
    }
    Ok(())
}

pub async fn month_command(planner: &Planner<JsonFileStore>, month: Option<String>) -> Result<()> {
    let today = now().date();
    let (year, month) = match month {
        Some(value) => parse_month(&value)?,
        None => (today.year(), today.month()),
    };

    let grid = month_grid(year, month)
        .with_context(|| format!("Invalid month {}-{:02}", year, month))?;
    let events = planner.visible(now()).await?;

    println!("{}-{:02}", year, month);
    println!(" Sun  Mon  Tue  Wed  Thu  Fri  Sat");
    for week in grid.chunks(7) {
        let cells: Vec<String> = week
            .iter()
            .map(|day| {
                let count = events_on(&events, *day).len();
                let marker = if *day == today { '*' } else { ' ' };
                if day.month() != month {
                    "   .".to_string()
                } else if count > 0 {
                    format!("{}{:>2}{}", marker, day.day(), count.min(9))
                } else {
                    format!("{}{:>2} ", marker, day.day())
                }
            })
            .collect();
        println!("{}", cells.join(" "));
    }
    println!("(digit after a day = number of events, * = today)");
    Ok(())
}

pub async fn categories_command(planner: &Planner<JsonFileStore>) -> Result<()> {
    let events = planner.events().await?;
    let found = categories(&events);

    println!("Categories in use:");
    if found.is_empty() {
        println!("  none yet (suggested: {})", SUGGESTED_CATEGORIES.join(", "));
    }
    for category in found {
        println!("  {}", category);
    }
    Ok(())
}
