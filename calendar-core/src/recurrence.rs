use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

use crate::{Event, Recurrence, RecurrenceKind};

/// Default look-ahead, in months from the moment of expansion
pub const DEFAULT_HORIZON_MONTHS: u32 = 12;

/// Default cap on generated instances per base event
pub const DEFAULT_MAX_INSTANCES: usize = 365;

/// Expansion limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionOptions {
    /// No instance is generated on or after `now + horizon_months`
    pub horizon_months: u32,
    /// Upper bound on loop iterations per base event
    pub max_instances: usize,
}

impl Default for ExpansionOptions {
    fn default() -> Self {
        Self {
            horizon_months: DEFAULT_HORIZON_MONTHS,
            max_instances: DEFAULT_MAX_INSTANCES,
        }
    }
}

/// Normalized form of a [`Recurrence`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceRule {
    /// Every n days
    EveryDays(u32),
    /// Every n weeks on the same weekday
    EveryWeeks(u32),
    /// Next listed weekday, scanning every week. Sorted Sunday first.
    OnWeekdays(Vec<Weekday>),
    /// Every n months, clamped to the end of shorter months
    EveryMonths(u32),
}

impl RecurrenceRule {
    /// Step from `cursor` to the next date of the rule, `None` on calendar overflow
    pub fn next_after(&self, cursor: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::EveryDays(n) => cursor.checked_add_days(Days::new(u64::from(*n))),
            Self::EveryWeeks(n) => cursor.checked_add_days(Days::new(u64::from(*n) * 7)),
            Self::OnWeekdays(days) => next_weekday_occurrence(cursor, days),
            Self::EveryMonths(n) => cursor.checked_add_months(Months::new(*n)),
        }
    }
}

impl Recurrence {
    /// Normalize into a rule. Returns `None` for non-recurring and unknown types.
    pub fn rule(&self) -> Option<RecurrenceRule> {
        let interval = self.effective_interval();

        match self.kind {
            RecurrenceKind::None | RecurrenceKind::Unknown => None,
            RecurrenceKind::Daily | RecurrenceKind::Custom => {
                Some(RecurrenceRule::EveryDays(interval))
            }
            RecurrenceKind::Weekly => {
                let days = self.weekdays();
                if days.is_empty() {
                    Some(RecurrenceRule::EveryWeeks(interval))
                } else {
                    Some(RecurrenceRule::OnWeekdays(days))
                }
            }
            RecurrenceKind::Monthly => Some(RecurrenceRule::EveryMonths(interval)),
        }
    }

    /// Interval clamped into `1..=u32::MAX`
    pub fn effective_interval(&self) -> u32 {
        u32::try_from(self.interval.max(1)).unwrap_or(u32::MAX)
    }

    /// Valid weekdays from `days_of_week`, deduplicated, Sunday first
    pub fn weekdays(&self) -> Vec<Weekday> {
        let mut indices: Vec<u32> = self
            .days_of_week
            .iter()
            .filter_map(|&d| u32::try_from(d).ok())
            .filter(|&d| d < 7)
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices.into_iter().map(weekday_from_sunday).collect()
    }
}

fn weekday_from_sunday(index: u32) -> Weekday {
    match index {
        0 => Weekday::Sun,
        1 => Weekday::Mon,
        2 => Weekday::Tue,
        3 => Weekday::Wed,
        4 => Weekday::Thu,
        5 => Weekday::Fri,
        _ => Weekday::Sat,
    }
}

/// Nearest later listed weekday in the current Sunday-started week, otherwise
/// the first listed weekday of the following week.
pub fn next_weekday_occurrence(cursor: NaiveDate, days: &[Weekday]) -> Option<NaiveDate> {
    let current = cursor.weekday().num_days_from_sunday();
    let mut offsets: Vec<u32> = days.iter().map(|d| d.num_days_from_sunday()).collect();
    offsets.sort_unstable();

    let step = match offsets.iter().find(|&&d| d > current) {
        Some(&later) => later - current,
        None => 7 - current + *offsets.first()?,
    };

    cursor.checked_add_days(Days::new(u64::from(step)))
}

fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Turns base events into the visible set of events
#[derive(Debug, Clone, Default)]
pub struct RecurrenceExpander {
    options: ExpansionOptions,
}

impl RecurrenceExpander {
    pub fn new(options: ExpansionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExpansionOptions {
        &self.options
    }

    /// First moment no instance may reach
    pub fn horizon(&self, now: NaiveDateTime) -> NaiveDateTime {
        now.checked_add_months(Months::new(self.options.horizon_months))
            .unwrap_or(NaiveDateTime::MAX)
    }

    /// Every base event followed by its instances, in input order.
    ///
    /// `now` anchors the horizon; the output for the same input changes as
    /// `now` moves forward.
    pub fn expand(&self, base_events: &[Event], now: NaiveDateTime) -> Vec<Event> {
        let horizon = self.horizon(now);
        let mut all_events = Vec::with_capacity(base_events.len());

        for base in base_events {
            all_events.push(base.clone());

            let Some(rule) = base.recurrence.rule() else {
                continue;
            };

            let before = all_events.len();
            self.expand_series(base, &rule, horizon, &mut all_events);
            tracing::debug!(
                "Expanded event {} ({:?}) into {} instances",
                base.id,
                rule,
                all_events.len() - before
            );
        }

        all_events
    }

    fn expand_series(
        &self,
        base: &Event,
        rule: &RecurrenceRule,
        horizon: NaiveDateTime,
        out: &mut Vec<Event>,
    ) {
        let mut cursor = base.start_date;
        let mut count = 0;

        while count < self.options.max_instances && start_of_day(cursor) < horizon {
            let Some(next) = rule.next_after(cursor) else {
                break;
            };

            if base.recurrence.end_date.is_some_and(|end| next > end) {
                break;
            }

            if start_of_day(next) < horizon {
                out.push(base.occurrence_on(next));
            }

            cursor = next;
            count += 1;
        }
    }
}

/// Expand with the default horizon and instance cap
pub fn expand(base_events: &[Event], now: NaiveDateTime) -> Vec<Event> {
    RecurrenceExpander::default().expand(base_events, now)
}

#[cfg(test)]
mod tests;
