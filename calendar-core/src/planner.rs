use chrono::{NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::{
    Error, Event, EventDraft, Result,
    conflict::slots_conflict,
    recurrence::{ExpansionOptions, RecurrenceExpander},
    store::EventStore,
};

/// Add, edit, move and delete events, refusing changes that overlap
/// something already on the calendar
pub struct Planner<S: EventStore> {
    store: S,
    expander: RecurrenceExpander,
}

impl<S: EventStore> Planner<S> {
    /// Planner over `store`, expanding recurrences with `options`
    pub fn new(store: S, options: ExpansionOptions) -> Self {
        Self {
            store,
            expander: RecurrenceExpander::new(options),
        }
    }

    /// Backing store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Expander used for `visible` and conflict checks
    pub fn expander(&self) -> &RecurrenceExpander {
        &self.expander
    }

    /// Base events as stored
    pub async fn events(&self) -> Result<Vec<Event>> {
        self.store.load().await
    }

    /// Base events plus every recurring instance up to the horizon
    pub async fn visible(&self, now: NaiveDateTime) -> Result<Vec<Event>> {
        let events = self.store.load().await?;
        Ok(self.expander.expand(&events, now))
    }

    /// Events that `draft` would overlap. `exclude` leaves out a whole series,
    /// which is what an edit of that series needs.
    pub async fn check(
        &self,
        draft: &EventDraft,
        exclude: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<Vec<Event>> {
        let visible = self.visible(now).await?;
        Ok(conflicts_excluding(&visible, draft, exclude))
    }

    /// Store a new event unless it overlaps something visible at `now`
    pub async fn add(&self, draft: EventDraft, now: NaiveDateTime) -> Result<Event> {
        draft.validate()?;

        let mut events = self.store.load().await?;
        let visible = self.expander.expand(&events, now);
        ensure_no_conflicts(&visible, &draft, None)?;

        let event = Event::from_draft(Uuid::new_v4().to_string(), draft, Utc::now());
        events.push(event.clone());
        self.store.save(&events).await?;

        tracing::info!("Added event {} ({})", event.id, event.title);
        Ok(event)
    }

    /// Replace the fields of event `id`, ignoring overlaps with its own series
    pub async fn update(&self, id: &str, draft: EventDraft, now: NaiveDateTime) -> Result<Event> {
        draft.validate()?;

        let mut events = self.store.load().await?;
        let index = position_of(&events, id)?;
        let visible = self.expander.expand(&events, now);
        ensure_no_conflicts(&visible, &draft, Some(id))?;

        let event = &mut events[index];
        event.apply_draft(draft, Utc::now());
        let updated = event.clone();
        self.store.save(&events).await?;

        tracing::info!("Updated event {} ({})", updated.id, updated.title);
        Ok(updated)
    }

    /// Reschedule to another day, keeping the times
    pub async fn move_to(&self, id: &str, date: NaiveDate, now: NaiveDateTime) -> Result<Event> {
        let events = self.store.load().await?;
        let index = position_of(&events, id)?;
        let draft = events[index].to_draft().on(date);

        self.update(id, draft, now).await
    }

    /// Remove event `id` and with it every generated instance
    pub async fn delete(&self, id: &str) -> Result<Event> {
        let mut events = self.store.load().await?;
        let index = position_of(&events, id)?;
        let removed = events.remove(index);
        self.store.save(&events).await?;

        tracing::info!("Deleted event {} ({})", removed.id, removed.title);
        Ok(removed)
    }
}

fn position_of(events: &[Event], id: &str) -> Result<usize> {
    events.iter().position(|e| e.id == id).ok_or_else(|| {
        Error::NotFound(format!(
            "{} (recurring instances are edited through their base event)",
            id
        ))
    })
}

fn conflicts_excluding(visible: &[Event], draft: &EventDraft, exclude: Option<&str>) -> Vec<Event> {
    visible
        .iter()
        .filter(|e| exclude.is_none_or(|id| !e.in_series(id)))
        .filter(|e| slots_conflict(draft, *e))
        .cloned()
        .collect()
}

fn ensure_no_conflicts(visible: &[Event], draft: &EventDraft, exclude: Option<&str>) -> Result<()> {
    let conflicts = conflicts_excluding(visible, draft, exclude);
    if conflicts.is_empty() {
        return Ok(());
    }

    let titles: Vec<String> = conflicts.into_iter().map(|e| e.title).collect();
    tracing::warn!(
        "Refusing {} on {}: conflicts with {}",
        draft.title,
        draft.start_date,
        titles.join(", ")
    );
    Err(Error::Conflict { titles })
}
