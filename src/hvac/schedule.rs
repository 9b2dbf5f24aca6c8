//! Store-phase resolution: today's base hours, overridden by any matching
//! date-specific exception. Occupied iff not closed and the local time falls
//! within [open, close).

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::entities::{hours_exception, site, store_hours};
use crate::hvac::Phase;

/// Effective hours for one calendar date after exception overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySchedule {
    pub closed: bool,
    pub open: Option<NaiveTime>,
    pub close: Option<NaiveTime>,
}

impl DaySchedule {
    pub const CLOSED: DaySchedule = DaySchedule {
        closed: true,
        open: None,
        close: None,
    };
}

/// The site's wall clock, derived from its fixed UTC offset.
pub fn site_local_now(site: &site::Model, now_utc: DateTime<Utc>) -> NaiveDateTime {
    let offset = FixedOffset::east_opt(site.utc_offset_minutes * 60)
        .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap());
    now_utc.with_timezone(&offset).naive_local()
}

/// Resolve the schedule for `date`. Single-day exceptions are the most
/// specific and win over date-range rules; the base weekly row applies when
/// no exception matches.
pub fn schedule_for_date(
    date: NaiveDate,
    hours: &[store_hours::Model],
    exceptions: &[hours_exception::Model],
) -> DaySchedule {
    if let Some(e) = exceptions
        .iter()
        .find(|e| e.kind == "single_day" && e.start_date <= date && date <= e.end_date)
    {
        return DaySchedule {
            closed: e.closed,
            open: e.open_time,
            close: e.close_time,
        };
    }

    if let Some(e) = exceptions
        .iter()
        .find(|e| e.kind == "date_range" && e.start_date <= date && date <= e.end_date)
    {
        let (open, close) = if date == e.start_date {
            (e.first_open_time, e.first_close_time)
        } else if date == e.end_date {
            (e.last_open_time, e.last_close_time)
        } else {
            (e.middle_open_time, e.middle_close_time)
        };
        return DaySchedule {
            closed: e.closed,
            open,
            close,
        };
    }

    let dow = date.weekday().num_days_from_sunday() as i16;
    match hours.iter().find(|h| h.day_of_week == dow) {
        Some(h) => DaySchedule {
            closed: h.closed,
            open: h.open_time,
            close: h.close_time,
        },
        // No row for this weekday means the store never opens on it.
        None => DaySchedule::CLOSED,
    }
}

/// Occupied iff the schedule is open and now falls within [open, close).
pub fn phase_at(
    now_local: NaiveDateTime,
    hours: &[store_hours::Model],
    exceptions: &[hours_exception::Model],
) -> Phase {
    let schedule = schedule_for_date(now_local.date(), hours, exceptions);
    if schedule.closed {
        return Phase::Unoccupied;
    }
    match (schedule.open, schedule.close) {
        (Some(open), Some(close)) => {
            let t = now_local.time();
            if t >= open && t < close {
                Phase::Occupied
            } else {
                Phase::Unoccupied
            }
        }
        _ => Phase::Unoccupied,
    }
}

/// Minutes until today's opening, when the store has not yet opened.
/// Feeds the smart-start lead window; None outside the pre-open period.
pub fn minutes_until_open(
    now_local: NaiveDateTime,
    hours: &[store_hours::Model],
    exceptions: &[hours_exception::Model],
) -> Option<i64> {
    let schedule = schedule_for_date(now_local.date(), hours, exceptions);
    if schedule.closed {
        return None;
    }
    let open = schedule.open?;
    let t = now_local.time();
    if t >= open {
        return None;
    }
    Some((open - t).num_minutes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn weekday_hours() -> Vec<store_hours::Model> {
        (0..7)
            .map(|dow| store_hours::Model {
                id: dow as i32 + 1,
                site_id: 1,
                day_of_week: dow,
                open_time: Some(t(9, 0)),
                close_time: Some(t(21, 0)),
                closed: dow == 0,
            })
            .collect()
    }

    fn range_exception() -> hours_exception::Model {
        hours_exception::Model {
            id: 1,
            site_id: 1,
            kind: "date_range".to_string(),
            start_date: NaiveDate::from_ymd_opt(2026, 12, 24).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 12, 26).unwrap(),
            closed: false,
            open_time: None,
            close_time: None,
            first_open_time: Some(t(9, 0)),
            first_close_time: Some(t(15, 0)),
            middle_open_time: Some(t(11, 0)),
            middle_close_time: Some(t(14, 0)),
            last_open_time: Some(t(10, 0)),
            last_close_time: Some(t(18, 0)),
        }
    }

    #[test]
    fn occupied_within_base_hours_half_open_interval() {
        let hours = weekday_hours();
        // 2026-03-02 is a Monday.
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(phase_at(date.and_time(t(9, 0)), &hours, &[]), Phase::Occupied);
        assert_eq!(
            phase_at(date.and_time(t(20, 59)), &hours, &[]),
            Phase::Occupied
        );
        assert_eq!(
            phase_at(date.and_time(t(21, 0)), &hours, &[]),
            Phase::Unoccupied
        );
        assert_eq!(
            phase_at(date.and_time(t(8, 59)), &hours, &[]),
            Phase::Unoccupied
        );
    }

    #[test]
    fn closed_weekday_is_unoccupied() {
        let hours = weekday_hours();
        // Sunday row is flagged closed.
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(
            phase_at(date.and_time(t(12, 0)), &hours, &[]),
            Phase::Unoccupied
        );
    }

    #[test]
    fn single_day_exception_overrides_base_hours() {
        let hours = weekday_hours();
        let exceptions = vec![hours_exception::Model {
            id: 2,
            site_id: 1,
            kind: "single_day".to_string(),
            start_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            closed: true,
            open_time: None,
            close_time: None,
            first_open_time: None,
            first_close_time: None,
            middle_open_time: None,
            middle_close_time: None,
            last_open_time: None,
            last_close_time: None,
        }];
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(
            phase_at(date.and_time(t(12, 0)), &hours, &exceptions),
            Phase::Unoccupied
        );
    }

    #[test]
    fn date_range_exception_picks_positional_hours() {
        let hours = weekday_hours();
        let exceptions = vec![range_exception()];

        let first = NaiveDate::from_ymd_opt(2026, 12, 24).unwrap();
        let middle = NaiveDate::from_ymd_opt(2026, 12, 25).unwrap();
        let last = NaiveDate::from_ymd_opt(2026, 12, 26).unwrap();

        assert_eq!(
            schedule_for_date(first, &hours, &exceptions).close,
            Some(t(15, 0))
        );
        assert_eq!(
            schedule_for_date(middle, &hours, &exceptions).open,
            Some(t(11, 0))
        );
        assert_eq!(
            schedule_for_date(last, &hours, &exceptions).open,
            Some(t(10, 0))
        );
        assert_eq!(
            phase_at(middle.and_time(t(10, 0)), &hours, &exceptions),
            Phase::Unoccupied
        );
        assert_eq!(
            phase_at(middle.and_time(t(11, 30)), &hours, &exceptions),
            Phase::Occupied
        );
    }

    #[test]
    fn minutes_until_open_only_in_pre_open_window() {
        let hours = weekday_hours();
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(
            minutes_until_open(date.and_time(t(8, 15)), &hours, &[]),
            Some(45)
        );
        assert_eq!(minutes_until_open(date.and_time(t(9, 0)), &hours, &[]), None);
        assert_eq!(
            minutes_until_open(date.and_time(t(22, 0)), &hours, &[]),
            None
        );
    }

    #[test]
    fn site_local_now_applies_fixed_offset() {
        let site = site::Model {
            id: 1,
            name: "Store 12".to_string(),
            utc_offset_minutes: -300,
            notes: None,
            created_at: Utc::now(),
        };
        let now_utc = Utc.with_ymd_and_hms(2026, 3, 2, 14, 0, 0).unwrap();
        let local = site_local_now(&site, now_utc);
        assert_eq!(local.time(), t(9, 0));
    }
}
