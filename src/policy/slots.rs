//! Daily capacity accounting and slot assignment

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SlotError {
    #[error("At least one guest is required")]
    NoGuests,
    #[error("Not enough seats: {requested} requested, {remaining} remaining")]
    CapacityExceeded { requested: u32, remaining: u32 },
}

/// Seat status of a place for one visit date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub capacity: u32,
    pub booked: u32,
    pub remaining: u32,
}

impl DayAvailability {
    pub fn new(date: NaiveDate, capacity: u32, booked: u32) -> Self {
        Self {
            date,
            capacity,
            booked,
            remaining: capacity.saturating_sub(booked),
        }
    }
}

/// Assign `requested` slot numbers in `1..=capacity`, lowest free first.
///
/// `taken` holds the slot numbers of non-cancelled passes for the date;
/// numbers outside the capacity range still count against it.
pub fn allocate_slots(requested: u32, capacity: u32, taken: &[i32]) -> Result<Vec<i32>, SlotError> {
    if requested == 0 {
        return Err(SlotError::NoGuests);
    }

    let taken: BTreeSet<i32> = taken.iter().copied().collect();
    let booked = u32::try_from(taken.len()).unwrap_or(u32::MAX);
    let remaining = capacity.saturating_sub(booked);
    if requested > remaining {
        return Err(SlotError::CapacityExceeded { requested, remaining });
    }

    // Free in-range numbers are always >= remaining, so this yields `requested` slots.
    Ok((1..=capacity as i32)
        .filter(|slot| !taken.contains(slot))
        .take(requested as usize)
        .collect())
}

/// Availability for every date in `from..=to`, given booked counts per date
pub fn availability_range(
    from: NaiveDate,
    to: NaiveDate,
    capacity: u32,
    booked: &[(NaiveDate, u32)],
) -> Vec<DayAvailability> {
    from.iter_days()
        .take_while(|date| *date <= to)
        .map(|date| {
            let count = booked
                .iter()
                .find(|(d, _)| *d == date)
                .map(|(_, c)| *c)
                .unwrap_or(0);
            DayAvailability::new(date, capacity, count)
        })
        .collect()
}

/// Largest booked count among the given dates (0 if none)
pub fn peak_booked(booked: &[(NaiveDate, u32)]) -> u32 {
    booked.iter().map(|(_, c)| *c).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    #[test]
    fn test_allocate_empty_day() {
        assert_eq!(allocate_slots(3, 10, &[]).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_allocate_continues_after_taken() {
        assert_eq!(allocate_slots(2, 10, &[1, 2, 3]).unwrap(), vec![4, 5]);
    }

    #[test]
    fn test_allocate_reuses_cancelled_gaps() {
        assert_eq!(allocate_slots(3, 10, &[1, 3, 4, 6]).unwrap(), vec![2, 5, 7]);
    }

    #[test]
    fn test_allocate_exact_fill() {
        assert_eq!(allocate_slots(2, 4, &[2, 3]).unwrap(), vec![1, 4]);
    }

    #[test]
    fn test_allocate_rejects_over_capacity() {
        assert_eq!(
            allocate_slots(3, 5, &[1, 2, 3]),
            Err(SlotError::CapacityExceeded { requested: 3, remaining: 2 })
        );
        assert_eq!(
            allocate_slots(1, 0, &[]),
            Err(SlotError::CapacityExceeded { requested: 1, remaining: 0 })
        );
    }

    #[test]
    fn test_allocate_rejects_zero_guests() {
        assert_eq!(allocate_slots(0, 5, &[]), Err(SlotError::NoGuests));
    }

    #[test]
    fn test_allocate_after_capacity_reduced() {
        // Slot 9 was assigned before capacity dropped to 5
        assert_eq!(allocate_slots(2, 5, &[1, 9]).unwrap(), vec![2, 3]);
        assert_eq!(
            allocate_slots(4, 5, &[1, 9]),
            Err(SlotError::CapacityExceeded { requested: 4, remaining: 3 })
        );
    }

    #[test]
    fn test_sequential_bookings_never_exceed_capacity() {
        let capacity = 7;
        let mut taken: Vec<i32> = Vec::new();
        for requested in [2u32, 3, 1, 2, 1] {
            match allocate_slots(requested, capacity, &taken) {
                Ok(slots) => taken.extend(slots),
                Err(SlotError::CapacityExceeded { remaining, .. }) => {
                    assert!(requested > remaining);
                }
                Err(e) => panic!("unexpected error: {e}"),
            }
            assert!(taken.len() as u32 <= capacity);
            assert!(taken.iter().all(|s| (1..=capacity as i32).contains(s)));
        }
        let unique: BTreeSet<_> = taken.iter().collect();
        assert_eq!(unique.len(), taken.len());
        assert_eq!(taken.len(), 7);
    }

    #[test]
    fn test_day_availability() {
        let day = DayAvailability::new(date(1), 10, 4);
        assert_eq!(day.remaining, 6);

        let over = DayAvailability::new(date(1), 3, 5);
        assert_eq!(over.remaining, 0);
    }

    #[test]
    fn test_availability_range() {
        let days = availability_range(date(1), date(3), 5, &[(date(2), 5), (date(3), 1)]);
        assert_eq!(days.len(), 3);
        assert_eq!(days[0], DayAvailability::new(date(1), 5, 0));
        assert_eq!(days[1].remaining, 0);
        assert_eq!(days[2].remaining, 4);

        assert!(availability_range(date(3), date(1), 5, &[]).is_empty());
    }

    #[test]
    fn test_peak_booked() {
        assert_eq!(peak_booked(&[]), 0);
        assert_eq!(peak_booked(&[(date(1), 3), (date(2), 8), (date(3), 2)]), 8);
    }
}
