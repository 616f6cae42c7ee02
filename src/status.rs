use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Urgency of a todo or task, derived from its due date at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Green,
    Amber,
    Red,
}

/// Classify a due date relative to `now`.
///
/// Three or more days remaining is green, one hour up to three days is amber,
/// anything less (including overdue) is red. Both thresholds belong to the
/// calmer bucket, so exactly three days is green and exactly one hour is amber.
pub fn status(now: DateTime<Utc>, due_at: Option<DateTime<Utc>>) -> Urgency {
    let Some(due_at) = due_at else {
        return Urgency::Green;
    };

    let remaining = due_at - now;
    if remaining >= Duration::days(3) {
        Urgency::Green
    } else if remaining >= Duration::hours(1) {
        Urgency::Amber
    } else {
        Urgency::Red
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn no_due_date_is_green() {
        assert_eq!(status(now(), None), Urgency::Green);
    }

    #[test]
    fn exactly_three_days_is_green() {
        assert_eq!(status(now(), Some(now() + Duration::days(3))), Urgency::Green);
        assert_eq!(status(now(), Some(now() + Duration::days(30))), Urgency::Green);
    }

    #[test]
    fn just_under_three_days_is_amber() {
        let due = now() + Duration::days(2) + Duration::hours(23) + Duration::minutes(59);
        assert_eq!(status(now(), Some(due)), Urgency::Amber);
    }

    #[test]
    fn exactly_one_hour_is_amber() {
        assert_eq!(status(now(), Some(now() + Duration::hours(1))), Urgency::Amber);
    }

    #[test]
    fn under_an_hour_is_red() {
        assert_eq!(status(now(), Some(now() + Duration::minutes(59))), Urgency::Red);
        assert_eq!(status(now(), Some(now() + Duration::seconds(1))), Urgency::Red);
    }

    #[test]
    fn overdue_is_red() {
        assert_eq!(status(now(), Some(now() - Duration::seconds(1))), Urgency::Red);
        assert_eq!(status(now(), Some(now())), Urgency::Red);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_value(Urgency::Amber).unwrap(), "amber");
        assert_eq!(serde_json::to_value(Urgency::Red).unwrap(), "red");
    }
}
