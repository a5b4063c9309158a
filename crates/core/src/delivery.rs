//! Delivery-time window rule.
//!
//! A requested `hh:mm` is placed on the current calendar date of a pinned
//! UTC offset (not the host's local zone) and must fall at least the
//! minimum lead time after "now" in that same zone. There is no next-day
//! rollover: at 23:50 a request for `00:10` is compared against today's
//! midnight and rejected as too soon.

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Offset, Utc};
use thiserror::Error;

pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 9;
pub const DEFAULT_MIN_LEAD_MINUTES: i64 = 30;

const TIME_FORMAT: &str = "%H:%M";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DeliveryTimeError {
    #[error("time must be in hh:mm format")]
    InvalidFormat,
    #[error("time should be at least {min_lead_minutes} minutes from now")]
    TooSoon { min_lead_minutes: i64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeliveryWindow {
    offset: FixedOffset,
    min_lead: Duration,
}

impl Default for DeliveryWindow {
    fn default() -> Self {
        Self {
            offset: hours_east(DEFAULT_UTC_OFFSET_HOURS).unwrap_or_else(|| Utc.fix()),
            min_lead: Duration::minutes(DEFAULT_MIN_LEAD_MINUTES),
        }
    }
}

impl DeliveryWindow {
    /// Returns `None` when the offset is not a valid UTC offset.
    pub fn new(utc_offset_hours: i32, min_lead_minutes: i64) -> Option<Self> {
        Some(Self {
            offset: hours_east(utc_offset_hours)?,
            min_lead: Duration::minutes(min_lead_minutes),
        })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn min_lead_minutes(&self) -> i64 {
        self.min_lead.num_minutes()
    }

    pub fn validate(
        &self,
        input: &str,
        now: DateTime<Utc>,
    ) -> Result<DateTime<FixedOffset>, DeliveryTimeError> {
        let time = NaiveTime::parse_from_str(input, TIME_FORMAT)
            .map_err(|_| DeliveryTimeError::InvalidFormat)?;

        let local_now = now.with_timezone(&self.offset);
        let requested = local_now
            .date_naive()
            .and_time(time)
            .and_local_timezone(self.offset)
            .single()
            .ok_or(DeliveryTimeError::InvalidFormat)?;

        if requested < local_now + self.min_lead {
            return Err(DeliveryTimeError::TooSoon { min_lead_minutes: self.min_lead_minutes() });
        }

        Ok(requested)
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

fn hours_east(hours: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(hours.checked_mul(3600)?)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, FixedOffset, TimeZone, Timelike, Utc};

    use super::{DeliveryTimeError, DeliveryWindow};

    fn tokyo_time(hour: u32, minute: u32) -> DateTime<Utc> {
        let offset = FixedOffset::east_opt(9 * 3600).expect("valid offset");
        offset
            .with_ymd_and_hms(2026, 10, 18, hour, minute, 0)
            .single()
            .expect("unambiguous instant")
            .with_timezone(&Utc)
    }

    fn too_soon() -> DeliveryTimeError {
        DeliveryTimeError::TooSoon { min_lead_minutes: 30 }
    }

    #[test]
    fn rejects_times_inside_the_lead_window() {
        let window = DeliveryWindow::default();
        assert_eq!(window.validate("10:29", tokyo_time(10, 0)), Err(too_soon()));
    }

    #[test]
    fn accepts_time_exactly_at_the_lead_boundary() {
        let window = DeliveryWindow::default();
        let accepted = window.validate("10:30", tokyo_time(10, 0)).expect("boundary is allowed");
        assert_eq!((accepted.hour(), accepted.minute()), (10, 30));
        assert_eq!(accepted.offset().local_minus_utc(), 9 * 3600);
    }

    #[test]
    fn rejects_malformed_input() {
        let window = DeliveryWindow::default();
        for input in ["25:00", "12:60", "noon", "", "10:30:00", "10-30"] {
            assert_eq!(
                window.validate(input, tokyo_time(10, 0)),
                Err(DeliveryTimeError::InvalidFormat),
                "input {input:?} should be malformed"
            );
        }
    }

    #[test]
    fn compares_in_pinned_zone_rather_than_utc() {
        // 10:00 in UTC+9 is 01:00 UTC; 01:45 must be judged against the UTC+9 clock.
        let window = DeliveryWindow::default();
        assert_eq!(window.validate("01:45", tokyo_time(10, 0)), Err(too_soon()));
        assert!(window.validate("18:00", tokyo_time(10, 0)).is_ok());
    }

    #[test]
    fn does_not_roll_over_to_the_next_day() {
        let window = DeliveryWindow::default();
        assert_eq!(window.validate("00:10", tokyo_time(23, 50)), Err(too_soon()));
        assert_eq!(window.validate("23:59", tokyo_time(23, 50)), Err(too_soon()));
    }

    #[test]
    fn custom_window_uses_its_own_offset_and_lead() {
        let window = DeliveryWindow::new(0, 10).expect("valid window");
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 8, 0, 0).single().expect("instant");
        assert!(window.validate("08:10", now).is_ok());
        assert_eq!(
            window.validate("08:09", now),
            Err(DeliveryTimeError::TooSoon { min_lead_minutes: 10 })
        );
    }

    #[test]
    fn rejects_out_of_range_offsets() {
        assert!(DeliveryWindow::new(30, 30).is_none());
    }

    #[test]
    fn error_messages_are_user_facing() {
        assert_eq!(DeliveryTimeError::InvalidFormat.to_string(), "time must be in hh:mm format");
        assert_eq!(too_soon().to_string(), "time should be at least 30 minutes from now");
    }
}
