//! Derived views over a student's history.

use chrono::NaiveDate;

use crate::history::HistoryEntry;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttendanceStats {
    pub total: usize,
    pub present: usize,
    pub absent: usize,
    /// Percentage present, 0.0 when there is no history
    pub rate: f64,
}

impl AttendanceStats {
    pub fn from_history(history: &[HistoryEntry]) -> Self {
        let total = history.len();
        let present = history.iter().filter(|e| e.status.is_present()).count();
        let rate = if total == 0 {
            0.0
        } else {
            present as f64 / total as f64 * 100.0
        };
        Self {
            total,
            present,
            absent: total - present,
            rate,
        }
    }

    /// Rate with two decimals, e.g. "87.10"
    pub fn rate_label(&self) -> String {
        format!("{:.2}", self.rate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendPoint {
    pub date: NaiveDate,
    /// 1 = present, 0 = absent
    pub value: u8,
}

/// Oldest-to-newest points for the trend chart
pub fn trend(history: &[HistoryEntry]) -> Vec<TrendPoint> {
    history
        .iter()
        .rev()
        .map(|entry| TrendPoint {
            date: entry.date,
            value: u8::from(entry.status.is_present()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::AttendanceStatus;

    fn entry(day: u32, status: AttendanceStatus) -> HistoryEntry {
        HistoryEntry {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            status,
        }
    }

    #[test]
    fn test_stats() {
        let history = vec![
            entry(3, AttendanceStatus::Present),
            entry(2, AttendanceStatus::Absent),
            entry(1, AttendanceStatus::Present),
        ];
        let stats = AttendanceStats::from_history(&history);
        assert_eq!((stats.total, stats.present, stats.absent), (3, 2, 1));
        assert_eq!(stats.rate_label(), "66.67");
    }

    #[test]
    fn test_empty_history_rate() {
        assert_eq!(AttendanceStats::from_history(&[]).rate_label(), "0.00");
    }

    #[test]
    fn test_trend_is_chronological() {
        let history = vec![
            entry(3, AttendanceStatus::Absent),
            entry(2, AttendanceStatus::Present),
        ];
        let points = trend(&history);
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert_eq!(points.iter().map(|p| p.value).collect::<Vec<_>>(), vec![1, 0]);
    }
}
