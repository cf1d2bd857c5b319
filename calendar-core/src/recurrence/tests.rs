use super::*;
use crate::EventDraft;
use chrono::{NaiveTime, TimeZone, Utc};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(0, 0, 0).unwrap()
}

fn base_event(id: &str, start: NaiveDate, recurrence: Recurrence) -> Event {
    let draft = EventDraft::new(
        format!("event {}", id),
        start,
        NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
    )
    .with_recurrence(recurrence);
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Event::from_draft(id, draft, created)
}

fn instance_dates(events: &[Event]) -> Vec<NaiveDate> {
    events
        .iter()
        .filter(|e| e.is_occurrence())
        .map(|e| e.start_date)
        .collect()
}

#[test]
fn non_recurring_event_passes_through() {
    let event = base_event("a", date(2024, 6, 1), Recurrence::default());
    let expanded = expand(std::slice::from_ref(&event), midnight(2024, 6, 1));
    assert_eq!(expanded, vec![event]);
}

#[test]
fn unknown_recurrence_type_is_not_expanded() {
    let recurrence = Recurrence {
        kind: RecurrenceKind::Unknown,
        interval: 1,
        ..Default::default()
    };
    let event = base_event("a", date(2024, 6, 1), recurrence);
    let expanded = expand(std::slice::from_ref(&event), midnight(2024, 6, 1));
    assert_eq!(expanded.len(), 1);
    assert_eq!(expanded[0], event);
}

#[test]
fn daily_fills_the_horizon() {
    let event = base_event("a", date(2024, 6, 1), Recurrence::daily(1));
    let expanded = expand(&[event], midnight(2024, 6, 1));

    let dates = instance_dates(&expanded);
    // 2024-06-02 through 2025-05-31
    assert_eq!(dates.len(), 364);
    assert_eq!(dates.first(), Some(&date(2024, 6, 2)));
    assert_eq!(dates.last(), Some(&date(2025, 5, 31)));
}

#[test]
fn horizon_day_is_kept_when_now_is_after_midnight() {
    let event = base_event("a", date(2024, 6, 1), Recurrence::monthly(1));

    let morning = date(2024, 6, 1).and_hms_opt(8, 0, 0).unwrap();
    let dates = instance_dates(&expand(std::slice::from_ref(&event), morning));
    assert_eq!(dates.len(), 12);
    assert_eq!(dates.last(), Some(&date(2025, 6, 1)));

    let dates = instance_dates(&expand(&[event], midnight(2024, 6, 1)));
    assert_eq!(dates.len(), 11);
    assert_eq!(dates.last(), Some(&date(2025, 5, 1)));
}

#[test]
fn instance_cap_stops_old_series() {
    let event = base_event("old", date(2020, 1, 1), Recurrence::daily(1));
    let expanded = expand(&[event], midnight(2024, 6, 1));

    let dates = instance_dates(&expanded);
    assert_eq!(dates.len(), DEFAULT_MAX_INSTANCES);
    assert_eq!(dates.last(), Some(&date(2020, 12, 31)));
}

#[test]
fn expansion_terminates_for_every_kind() {
    let now = midnight(2024, 6, 1);
    let options = ExpansionOptions {
        horizon_months: 2,
        max_instances: 20,
    };
    let expander = RecurrenceExpander::new(options);
    let horizon = expander.horizon(now);

    let recurrences = [
        Recurrence::daily(1),
        Recurrence::weekly(1),
        Recurrence::weekly_on([0, 3, 6]),
        Recurrence::monthly(1),
        Recurrence {
            kind: RecurrenceKind::Custom,
            interval: 3,
            ..Default::default()
        },
    ];

    for recurrence in recurrences {
        let event = base_event("a", date(2024, 6, 1), recurrence.clone());
        let expanded = expander.expand(&[event], now);
        let dates = instance_dates(&expanded);

        assert!(dates.len() <= options.max_instances, "{:?}", recurrence);
        assert!(
            dates.iter().all(|d| d.and_hms_opt(0, 0, 0).unwrap() < horizon),
            "{:?} produced a date past the horizon",
            recurrence
        );
    }
}

#[test]
fn ids_are_stable_across_expansions() {
    let event = base_event("series", date(2024, 6, 1), Recurrence::weekly(1));
    let now = midnight(2024, 6, 1);

    let first = expand(std::slice::from_ref(&event), now);
    let second = expand(std::slice::from_ref(&event), now);

    let ids = |events: &[Event]| events.iter().map(|e| e.id.clone()).collect::<Vec<_>>();
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(first[1].id, "series-2024-06-08");
    assert_eq!(first[1].series_id.as_deref(), Some("series"));
}

#[test]
fn end_date_bounds_instances() {
    let recurrence = Recurrence::daily(1).until(date(2024, 6, 5));
    let event = base_event("a", date(2024, 6, 1), recurrence);
    let expanded = expand(&[event], midnight(2024, 6, 1));

    assert_eq!(
        instance_dates(&expanded),
        vec![
            date(2024, 6, 2),
            date(2024, 6, 3),
            date(2024, 6, 4),
            date(2024, 6, 5)
        ]
    );
}

#[test]
fn end_date_between_steps_drops_the_overshooting_date() {
    let recurrence = Recurrence::weekly(1).until(date(2024, 6, 20));
    let event = base_event("a", date(2024, 6, 1), recurrence);
    let expanded = expand(&[event], midnight(2024, 6, 1));

    assert_eq!(
        instance_dates(&expanded),
        vec![date(2024, 6, 8), date(2024, 6, 15)]
    );
}

#[test]
fn weekly_on_weekdays_scans_forward_then_wraps() {
    // 2024-06-05 is a Wednesday; repeat on Monday and Friday
    let event = base_event("a", date(2024, 6, 5), Recurrence::weekly_on([1, 5]));
    let expanded = expand(&[event], midnight(2024, 6, 1));

    let dates = instance_dates(&expanded);
    assert_eq!(dates[0], date(2024, 6, 7));
    assert_eq!(dates[1], date(2024, 6, 10));
    assert_eq!(dates[2], date(2024, 6, 14));
}

#[test]
fn weekly_on_weekdays_ignores_interval() {
    let mut recurrence = Recurrence::weekly_on([1, 5]);
    recurrence.interval = 3;
    let with_interval = base_event("a", date(2024, 6, 5), recurrence);
    let without_interval = base_event("a", date(2024, 6, 5), Recurrence::weekly_on([5, 1]));

    let now = midnight(2024, 6, 1);
    assert_eq!(
        instance_dates(&expand(&[with_interval], now)),
        instance_dates(&expand(&[without_interval], now))
    );
}

#[test]
fn weekly_without_weekdays_steps_whole_weeks() {
    let event = base_event("a", date(2024, 6, 1), Recurrence::weekly(2));
    let expanded = expand(&[event], midnight(2024, 6, 1));

    let dates = instance_dates(&expanded);
    assert_eq!(&dates[..2], &[date(2024, 6, 15), date(2024, 6, 29)]);
    assert!(dates.iter().all(|d| d.weekday() == Weekday::Sat));
}

#[test]
fn invalid_weekdays_are_ignored() {
    let event = base_event("a", date(2024, 6, 5), Recurrence::weekly_on([9, -1, 5, 5]));
    let expanded = expand(&[event], midnight(2024, 6, 1));

    let dates = instance_dates(&expanded);
    assert_eq!(&dates[..2], &[date(2024, 6, 7), date(2024, 6, 14)]);
}

#[test]
fn only_invalid_weekdays_fall_back_to_whole_weeks() {
    let recurrence = Recurrence::weekly_on([7, 12]);
    assert_eq!(recurrence.rule(), Some(RecurrenceRule::EveryWeeks(1)));
}

#[test]
fn monthly_clamps_to_month_end_and_keeps_clamped_day() {
    let event = base_event("a", date(2024, 1, 31), Recurrence::monthly(1));
    let expanded = expand(&[event], midnight(2024, 1, 1));

    let dates = instance_dates(&expanded);
    assert_eq!(
        &dates[..3],
        &[date(2024, 2, 29), date(2024, 3, 29), date(2024, 4, 29)]
    );
}

#[test]
fn monthly_clamps_in_common_years() {
    let rule = Recurrence::monthly(1).rule().unwrap();
    assert_eq!(rule.next_after(date(2023, 1, 31)), Some(date(2023, 2, 28)));
}

#[test]
fn non_positive_interval_is_treated_as_one() {
    for interval in [0, -4] {
        let event = base_event("a", date(2024, 6, 1), Recurrence::daily(interval));
        let expanded = expand(&[event], midnight(2024, 6, 1));
        let dates = instance_dates(&expanded);
        assert_eq!(&dates[..2], &[date(2024, 6, 2), date(2024, 6, 3)]);
    }
}

#[test]
fn custom_steps_like_daily() {
    let custom = Recurrence {
        kind: RecurrenceKind::Custom,
        interval: 3,
        ..Default::default()
    };
    assert_eq!(custom.rule(), Recurrence::daily(3).rule());
}

#[test]
fn instances_follow_their_base_in_input_order() {
    let options = ExpansionOptions {
        horizon_months: 12,
        max_instances: 2,
    };
    let events = [
        base_event("late", date(2024, 7, 1), Recurrence::daily(1)),
        base_event("single", date(2024, 6, 1), Recurrence::default()),
        base_event("early", date(2024, 6, 1), Recurrence::daily(1)),
    ];
    let expanded = RecurrenceExpander::new(options).expand(&events, midnight(2024, 6, 1));

    let ids: Vec<_> = expanded.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "late",
            "late-2024-07-02",
            "late-2024-07-03",
            "single",
            "early",
            "early-2024-06-02",
            "early-2024-06-03",
        ]
    );
}

#[test]
fn small_horizon_limits_instances() {
    let options = ExpansionOptions {
        horizon_months: 1,
        max_instances: DEFAULT_MAX_INSTANCES,
    };
    let event = base_event("a", date(2024, 6, 1), Recurrence::weekly(1));
    let expanded = RecurrenceExpander::new(options).expand(&[event], midnight(2024, 6, 1));

    assert_eq!(
        instance_dates(&expanded),
        vec![
            date(2024, 6, 8),
            date(2024, 6, 15),
            date(2024, 6, 22),
            date(2024, 6, 29)
        ]
    );
}
