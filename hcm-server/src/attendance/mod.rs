//! Attendance session rules
//!
//! One record per employee per business date. The record moves through
//! `checked in → (on break → checked in)* → checked out`; these helpers
//! derive status, worked hours and the session flags from a record.

use chrono::NaiveTime;
use chrono_tz::Tz;
use rust_decimal::prelude::*;
use shared::models::{Attendance, AttendanceStats, AttendanceStatus, SessionState, WorkLocation};

use crate::core::Config;
use crate::utils::time::millis_to_local;

/// Below this many hours a present/late day becomes a half day
pub const HALF_DAY_HOURS: f64 = 4.0;

const MILLIS_PER_MINUTE: i64 = 60_000;

/// Attendance settings taken from config
#[derive(Debug, Clone, Copy)]
pub struct AttendancePolicy {
    pub timezone: Tz,
    pub late_threshold: NaiveTime,
    pub standard_hours: f64,
}

impl AttendancePolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timezone: config.timezone,
            late_threshold: config.late_threshold,
            standard_hours: config.standard_work_hours,
        }
    }

    /// Status stamped at check-in
    pub fn status_at_check_in(&self, work_location: WorkLocation, at: i64) -> AttendanceStatus {
        if work_location == WorkLocation::Home {
            return AttendanceStatus::WorkFromHome;
        }
        match millis_to_local(at, self.timezone) {
            Some(local) if local.time() > self.late_threshold => AttendanceStatus::Late,
            _ => AttendanceStatus::Present,
        }
    }

    /// Close the day: fold any open break, then compute hours and final status
    pub fn close_day(&self, record: &Attendance, check_out: i64) -> WorkedTime {
        let break_minutes = record.break_minutes
            + record
                .break_start
                .map(|start| minutes_between(start, check_out))
                .unwrap_or(0);

        let check_in = record.check_in.unwrap_or(check_out);
        let (total_hours, overtime_hours) =
            self.worked_hours(check_in, check_out, break_minutes);

        let status = match record.status {
            AttendanceStatus::Present | AttendanceStatus::Late if total_hours < HALF_DAY_HOURS => {
                AttendanceStatus::HalfDay
            }
            other => other,
        };

        WorkedTime {
            break_minutes,
            total_hours,
            overtime_hours,
            status,
        }
    }

    /// Apply requested times to the record as it currently stands
    ///
    /// Requested times replace recorded ones. With both ends known the day
    /// is closed like a check-out (open break folded, hours recomputed);
    /// with only a check-in the session stays open and its break untouched.
    /// An absent day becomes present.
    pub fn correct(
        &self,
        record: &Attendance,
        requested_check_in: Option<i64>,
        requested_check_out: Option<i64>,
    ) -> Result<Correction, String> {
        let check_in = requested_check_in.or(record.check_in);
        let check_out = requested_check_out.or(record.check_out);
        let status = match record.status {
            AttendanceStatus::Absent => AttendanceStatus::Present,
            other => other,
        };

        match (check_in, check_out) {
            (Some(i), Some(o)) if o <= i => {
                Err("Corrected check-out must be after check-in".to_string())
            }
            (Some(i), Some(o)) => {
                let corrected = Attendance {
                    check_in: Some(i),
                    break_start: record.break_start.filter(|start| *start < o),
                    status,
                    ..record.clone()
                };
                let worked = self.close_day(&corrected, o);
                Ok(Correction {
                    check_in,
                    check_out,
                    break_start: None,
                    break_minutes: worked.break_minutes,
                    total_hours: worked.total_hours,
                    overtime_hours: worked.overtime_hours,
                    status: worked.status,
                })
            }
            (Some(_), None) => Ok(Correction {
                check_in,
                check_out: None,
                break_start: record.break_start,
                break_minutes: record.break_minutes,
                total_hours: record.total_hours,
                overtime_hours: record.overtime_hours,
                status,
            }),
            (None, _) => Err("A check-in time is required to regularize this day".to_string()),
        }
    }

    /// `(total_hours, overtime_hours)` for a span minus breaks
    pub fn worked_hours(&self, check_in: i64, check_out: i64, break_minutes: i64) -> (f64, f64) {
        let minutes = (minutes_between(check_in, check_out) - break_minutes).max(0);
        let hours = (Decimal::from(minutes) / Decimal::from(60)).round_dp(2);
        let standard = Decimal::from_f64(self.standard_hours).unwrap_or(Decimal::from(8));
        let overtime = (hours - standard).max(Decimal::ZERO);
        (
            hours.to_f64().unwrap_or_default(),
            overtime.to_f64().unwrap_or_default(),
        )
    }
}

/// Fields an approved regularization writes back to the record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correction {
    pub check_in: Option<i64>,
    pub check_out: Option<i64>,
    pub break_start: Option<i64>,
    pub break_minutes: i64,
    pub total_hours: f64,
    pub overtime_hours: f64,
    pub status: AttendanceStatus,
}

/// Result of closing a day
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkedTime {
    pub break_minutes: i64,
    pub total_hours: f64,
    pub overtime_hours: f64,
    pub status: AttendanceStatus,
}

/// Whole minutes from `start` to `end`, never negative
pub fn minutes_between(start: i64, end: i64) -> i64 {
    ((end - start) / MILLIS_PER_MINUTE).max(0)
}

/// Session flags for today's record. `checked_in` stays set after check-out;
/// `on_break` only holds while the day is still open
pub fn session_state(record: Option<&Attendance>) -> SessionState {
    let Some(record) = record else {
        return SessionState::default();
    };
    let checked_in = record.check_in.is_some();
    let checked_out = checked_in && record.check_out.is_some();
    SessionState {
        checked_in,
        on_break: checked_in && !checked_out && record.break_start.is_some(),
        checked_out,
    }
}

/// Totals over a set of records
pub fn summarize(records: &[Attendance]) -> AttendanceStats {
    let mut stats = AttendanceStats {
        total_days: records.len() as i64,
        ..Default::default()
    };
    let mut hours = Decimal::ZERO;
    let mut overtime = Decimal::ZERO;

    for record in records {
        match record.status {
            AttendanceStatus::Present => stats.present += 1,
            AttendanceStatus::Late => stats.late += 1,
            AttendanceStatus::Absent => stats.absent += 1,
            AttendanceStatus::HalfDay => stats.half_day += 1,
            AttendanceStatus::WorkFromHome => stats.work_from_home += 1,
            AttendanceStatus::OnLeave => stats.on_leave += 1,
        }
        hours += Decimal::from_f64(record.total_hours).unwrap_or_default();
        overtime += Decimal::from_f64(record.overtime_hours).unwrap_or_default();
    }

    stats.total_hours = hours.round_dp(2).to_f64().unwrap_or_default();
    stats.overtime_hours = overtime.round_dp(2).to_f64().unwrap_or_default();
    stats.attendance_rate = if stats.total_days == 0 {
        0.0
    } else {
        let attended = Decimal::from(stats.total_days - stats.absent) * Decimal::from(100);
        (attended / Decimal::from(stats.total_days))
            .round_dp(2)
            .to_f64()
            .unwrap_or_default()
    };
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::time::{date_time_to_millis, parse_date};

    fn policy() -> AttendancePolicy {
        AttendancePolicy {
            timezone: chrono_tz::Asia::Kolkata,
            late_threshold: NaiveTime::from_hms_opt(9, 15, 0).unwrap(),
            standard_hours: 8.0,
        }
    }

    fn at(hh: u32, mm: u32) -> i64 {
        date_time_to_millis(
            parse_date("2025-03-17").unwrap(),
            NaiveTime::from_hms_opt(hh, mm, 0).unwrap(),
            chrono_tz::Asia::Kolkata,
        )
    }

    fn record(check_in: Option<i64>, status: AttendanceStatus) -> Attendance {
        Attendance {
            id: 1,
            tenant_id: "acme".into(),
            employee_id: 7,
            date: "2025-03-17".into(),
            check_in,
            check_out: None,
            break_start: None,
            break_minutes: 0,
            total_hours: 0.0,
            overtime_hours: 0.0,
            status,
            work_location: WorkLocation::Office,
            location: None,
            notes: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_status_at_check_in() {
        let p = policy();
        assert_eq!(p.status_at_check_in(WorkLocation::Office, at(9, 15)), AttendanceStatus::Present);
        assert_eq!(p.status_at_check_in(WorkLocation::Office, at(9, 16)), AttendanceStatus::Late);
        assert_eq!(
            p.status_at_check_in(WorkLocation::Home, at(11, 0)),
            AttendanceStatus::WorkFromHome
        );
        assert_eq!(p.status_at_check_in(WorkLocation::Client, at(8, 0)), AttendanceStatus::Present);
    }

    #[test]
    fn test_close_day_with_overtime() {
        let mut r = record(Some(at(9, 0)), AttendanceStatus::Present);
        r.break_minutes = 30;
        let worked = policy().close_day(&r, at(18, 45));
        // 9h45m minus 30m break
        assert_eq!(worked.total_hours, 9.25);
        assert_eq!(worked.overtime_hours, 1.25);
        assert_eq!(worked.status, AttendanceStatus::Present);
    }

    #[test]
    fn test_close_day_folds_open_break() {
        let mut r = record(Some(at(9, 0)), AttendanceStatus::Late);
        r.break_start = Some(at(12, 0));
        let worked = policy().close_day(&r, at(12, 30));
        assert_eq!(worked.break_minutes, 30);
        assert_eq!(worked.total_hours, 3.0);
        assert_eq!(worked.status, AttendanceStatus::HalfDay);
    }

    #[test]
    fn test_worked_hours_never_negative() {
        let (hours, overtime) = policy().worked_hours(at(9, 0), at(9, 10), 60);
        assert_eq!(hours, 0.0);
        assert_eq!(overtime, 0.0);
    }

    #[test]
    fn test_session_state_phases() {
        assert_eq!(session_state(None), SessionState::default());

        let mut r = record(Some(at(9, 0)), AttendanceStatus::Present);
        let s = session_state(Some(&r));
        assert!(s.checked_in && !s.on_break && !s.checked_out);

        r.break_start = Some(at(12, 0));
        assert!(session_state(Some(&r)).on_break);

        r.check_out = Some(at(18, 0));
        let s = session_state(Some(&r));
        assert!(s.checked_out && !s.on_break);

        // Absent placeholder rows have no check-in
        let absent = record(None, AttendanceStatus::Absent);
        assert_eq!(session_state(Some(&absent)), SessionState::default());
    }

    #[test]
    fn test_correct_fills_absent_day() {
        let absent = record(None, AttendanceStatus::Absent);
        let c = policy().correct(&absent, Some(at(9, 0)), Some(at(17, 30))).unwrap();
        assert_eq!(c.check_in, Some(at(9, 0)));
        assert_eq!(c.total_hours, 8.5);
        assert_eq!(c.overtime_hours, 0.5);
        assert_eq!(c.status, AttendanceStatus::Present);
    }

    #[test]
    fn test_correct_folds_open_break() {
        let mut r = record(Some(at(9, 0)), AttendanceStatus::Present);
        r.break_minutes = 15;
        r.break_start = Some(at(13, 0));
        let c = policy().correct(&r, None, Some(at(18, 0))).unwrap();
        assert_eq!(c.break_start, None);
        assert_eq!(c.break_minutes, 15 + 300);
        assert_eq!(c.total_hours, 3.75);
        assert_eq!(c.status, AttendanceStatus::HalfDay);
    }

    #[test]
    fn test_correct_check_in_only_keeps_session_open() {
        let mut r = record(Some(at(10, 0)), AttendanceStatus::Late);
        r.break_start = Some(at(12, 0));
        let c = policy().correct(&r, Some(at(9, 0)), None).unwrap();
        assert_eq!(c.check_in, Some(at(9, 0)));
        assert_eq!(c.check_out, None);
        assert_eq!(c.break_start, Some(at(12, 0)));
        assert_eq!(c.status, AttendanceStatus::Late);
    }

    #[test]
    fn test_correct_rejects_inverted_times() {
        let mut r = record(Some(at(9, 0)), AttendanceStatus::Present);
        r.check_out = Some(at(17, 0));
        assert!(policy().correct(&r, Some(at(18, 0)), None).is_err());

        let absent = record(None, AttendanceStatus::Absent);
        assert!(policy().correct(&absent, None, Some(at(17, 0))).is_err());
    }

    #[test]
    fn test_summarize() {
        let mut a = record(Some(at(9, 0)), AttendanceStatus::Present);
        a.total_hours = 8.5;
        a.overtime_hours = 0.5;
        let mut b = record(Some(at(10, 0)), AttendanceStatus::Late);
        b.total_hours = 7.25;
        let c = record(None, AttendanceStatus::Absent);

        let stats = summarize(&[a, b, c]);
        assert_eq!(stats.total_days, 3);
        assert_eq!(stats.present, 1);
        assert_eq!(stats.late, 1);
        assert_eq!(stats.absent, 1);
        assert_eq!(stats.total_hours, 15.75);
        assert_eq!(stats.overtime_hours, 0.5);
        assert_eq!(stats.attendance_rate, 66.67);

        assert_eq!(summarize(&[]).attendance_rate, 0.0);
    }
}
