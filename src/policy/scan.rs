//! Entry validation verdicts for scanned passes

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::enums::PassStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanVerdict {
    Admitted,
    AlreadyCheckedIn,
    NotApproved,
    Cancelled,
    WrongDate,
}

impl ScanVerdict {
    pub fn is_admitted(&self) -> bool {
        matches!(self, ScanVerdict::Admitted)
    }

    pub fn reason(&self) -> &'static str {
        match self {
            ScanVerdict::Admitted => "Entry granted",
            ScanVerdict::AlreadyCheckedIn => "Pass has already been used",
            ScanVerdict::NotApproved => "Pass is not approved yet",
            ScanVerdict::Cancelled => "Pass has been cancelled",
            ScanVerdict::WrongDate => "Pass is not valid for today",
        }
    }
}

/// Decide whether a pass grants entry today. Status is checked before date
/// so a cancelled pass is reported as cancelled on any day.
pub fn evaluate_scan(
    status: PassStatus,
    visit_date: NaiveDate,
    checked_in: bool,
    today: NaiveDate,
) -> ScanVerdict {
    match status {
        PassStatus::Cancelled => ScanVerdict::Cancelled,
        PassStatus::Pending => ScanVerdict::NotApproved,
        PassStatus::Approved if checked_in => ScanVerdict::AlreadyCheckedIn,
        PassStatus::Approved if visit_date != today => ScanVerdict::WrongDate,
        PassStatus::Approved => ScanVerdict::Admitted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, 14).unwrap()
    }

    #[test]
    fn test_approved_pass_on_visit_day() {
        let verdict = evaluate_scan(PassStatus::Approved, today(), false, today());
        assert_eq!(verdict, ScanVerdict::Admitted);
        assert!(verdict.is_admitted());
    }

    #[test]
    fn test_second_scan_rejected() {
        assert_eq!(
            evaluate_scan(PassStatus::Approved, today(), true, today()),
            ScanVerdict::AlreadyCheckedIn
        );
    }

    #[test]
    fn test_wrong_day() {
        let tomorrow = today().succ_opt().unwrap();
        assert_eq!(
            evaluate_scan(PassStatus::Approved, tomorrow, false, today()),
            ScanVerdict::WrongDate
        );
    }

    #[test]
    fn test_status_takes_precedence() {
        let tomorrow = today().succ_opt().unwrap();
        assert_eq!(
            evaluate_scan(PassStatus::Cancelled, tomorrow, false, today()),
            ScanVerdict::Cancelled
        );
        assert_eq!(
            evaluate_scan(PassStatus::Pending, today(), false, today()),
            ScanVerdict::NotApproved
        );
    }

    #[test]
    fn test_verdict_serializes_screaming_case() {
        let json = serde_json::to_string(&ScanVerdict::AlreadyCheckedIn).unwrap();
        assert_eq!(json, "\"ALREADY_CHECKED_IN\"");
    }
}
