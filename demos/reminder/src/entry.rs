//! Stored reminders and delay parsing.

use serde::{Deserialize, Serialize};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Duration, OffsetDateTime};

const DUE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

/// One pending reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Short hex id, used by `<id> done`.
    pub id: String,
    #[serde(with = "time::serde::timestamp")]
    pub due: OffsetDateTime,
    pub text: String,
}

impl Entry {
    pub fn new(due: OffsetDateTime, text: impl Into<String>) -> Self {
        let id = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();
        Self {
            id,
            due,
            text: text.into(),
        }
    }

    /// Renders `id) YYYY-MM-DD HH:MM text` (UTC).
    pub fn listing_line(&self) -> Result<String, time::error::Format> {
        Ok(format!(
            "{}) {} {}",
            self.id,
            self.due.format(DUE_FORMAT)?,
            self.text
        ))
    }
}

/// Converts `amount` of `unit` (`s`, `min`, `hours`, ...) to a duration.
///
/// Returns `None` for an unknown unit or an amount that does not fit.
pub fn parse_delay(amount: &str, unit: &str) -> Option<Duration> {
    let amount: i64 = amount.parse().ok()?;
    let scale = match unit.chars().next()? {
        's' => 1,
        'm' => 60,
        'h' => 3600,
        _ => return None,
    };
    amount.checked_mul(scale).map(Duration::seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_parse_delay() {
        assert_eq!(parse_delay("90", "s"), Some(Duration::seconds(90)));
        assert_eq!(parse_delay("2", "minutes"), Some(Duration::minutes(2)));
        assert_eq!(parse_delay("1", "hour"), Some(Duration::hours(1)));
        assert_eq!(parse_delay("1", "days"), None);
        assert_eq!(parse_delay("99999999999999999999", "s"), None);
    }

    #[test]
    fn test_listing_line() {
        let entry = Entry {
            id: "16ab".into(),
            due: datetime!(2012-09-01 00:00 UTC),
            text: "Write a doc".into(),
        };
        assert_eq!(entry.listing_line().unwrap(), "16ab) 2012-09-01 00:00 Write a doc");
    }

    #[test]
    fn test_new_ids_are_eight_hex_digits() {
        let entry = Entry::new(OffsetDateTime::UNIX_EPOCH, "x");
        assert_eq!(entry.id.len(), 8);
        assert!(entry.id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
