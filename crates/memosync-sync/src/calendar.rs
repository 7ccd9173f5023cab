//! Local calendar conversion
//!
//! A memo's date key and wall-clock time are derived from its creation
//! instant exactly once, when it enters the pipeline. Everything
//! downstream reads the stored values.

use chrono::{DateTime, FixedOffset, Local, NaiveTime, Offset, Utc};
use memosync_core::config::DailyNotesConfig;
use memosync_core::domain::{DateKey, DomainError, Memo};

/// Timezone used to map instants onto daily notes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocalCalendar {
    /// The operating system's local zone (DST aware)
    #[default]
    System,
    /// A fixed UTC offset
    Fixed(FixedOffset),
}

impl LocalCalendar {
    /// Builds the calendar from `daily_notes.timezone`
    pub fn from_config(config: &DailyNotesConfig) -> Result<Self, DomainError> {
        Ok(match config.utc_offset()? {
            Some(offset) => Self::Fixed(offset),
            None => Self::System,
        })
    }

    pub fn utc() -> Self {
        Self::Fixed(Utc.fix())
    }

    /// Shifts an instant into local wall-clock time
    pub fn localize(&self, instant: &DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            Self::Fixed(offset) => instant.with_timezone(offset),
            Self::System => {
                let offset = *instant.with_timezone(&Local).offset();
                instant.with_timezone(&offset)
            }
        }
    }

    pub fn date_key(&self, instant: &DateTime<Utc>) -> DateKey {
        DateKey::from_local(&self.localize(instant))
    }
}

/// A memo together with its local date and time
#[derive(Debug, Clone, PartialEq)]
pub struct DatedMemo {
    pub memo: Memo,
    pub date: DateKey,
    pub local_time: NaiveTime,
}

impl DatedMemo {
    /// `HH:MM` label shown in front of the memo
    pub fn time_label(&self) -> String {
        self.local_time.format("%H:%M").to_string()
    }
}

/// Assigns memos to local calendar dates
#[derive(Debug, Clone, Copy, Default)]
pub struct DatePartitioner {
    calendar: LocalCalendar,
}

impl DatePartitioner {
    pub fn new(calendar: LocalCalendar) -> Self {
        Self { calendar }
    }

    pub fn calendar(&self) -> LocalCalendar {
        self.calendar
    }

    pub fn partition(&self, memo: Memo) -> DatedMemo {
        let local = self.calendar.localize(&memo.created_at);
        DatedMemo {
            date: DateKey::from_local(&local),
            local_time: local.time(),
            memo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memosync_core::domain::{MemoId, MemoStatus};

    fn memo_at(rfc3339: &str) -> Memo {
        Memo {
            id: MemoId::new("memos/1").unwrap(),
            created_at: DateTime::parse_from_rfc3339(rfc3339)
                .unwrap()
                .with_timezone(&Utc),
            content: "x".to_string(),
            visibility: "PRIVATE".to_string(),
            status: MemoStatus::Normal,
            creator: "users/1".to_string(),
            resources: vec![],
        }
    }

    fn fixed(hours: i32) -> LocalCalendar {
        LocalCalendar::Fixed(FixedOffset::east_opt(hours * 3600).unwrap())
    }

    #[test]
    fn test_partition_uses_local_midnight() {
        // 23:30 UTC is already the next day at +08:00
        let memo = memo_at("2024-03-01T23:30:00Z");

        let utc = DatePartitioner::new(LocalCalendar::utc()).partition(memo.clone());
        let east = DatePartitioner::new(fixed(8)).partition(memo);

        assert_eq!(utc.date.to_string(), "2024-03-01");
        assert_eq!(utc.time_label(), "23:30");
        assert_eq!(east.date.to_string(), "2024-03-02");
        assert_eq!(east.time_label(), "07:30");
    }

    #[test]
    fn test_equal_instants_from_different_zones_share_a_date() {
        let a = memo_at("2024-03-01T20:00:00-05:00");
        let b = memo_at("2024-03-02T09:00:00+08:00");
        assert_eq!(a.created_at, b.created_at);

        for calendar in [LocalCalendar::utc(), fixed(-5), fixed(8), LocalCalendar::System] {
            let partitioner = DatePartitioner::new(calendar);
            assert_eq!(
                partitioner.partition(a.clone()).date,
                partitioner.partition(b.clone()).date
            );
        }
    }

    #[test]
    fn test_from_config() {
        let mut config = DailyNotesConfig::default();
        assert_eq!(LocalCalendar::from_config(&config).unwrap(), LocalCalendar::System);

        config.timezone = Some("+05:30".to_string());
        assert_eq!(
            LocalCalendar::from_config(&config).unwrap(),
            LocalCalendar::Fixed(FixedOffset::east_opt(5 * 3600 + 1800).unwrap())
        );

        config.timezone = Some("Mars/Olympus".to_string());
        assert!(LocalCalendar::from_config(&config).is_err());
    }
}
