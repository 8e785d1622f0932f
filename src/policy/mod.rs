//! Booking and refund policy engine
//!
//! Pure functions only: callers pass "today" and the relevant counts, so
//! every rule here is testable without a database or clock.

pub mod qr;
pub mod refund;
pub mod scan;
pub mod slots;

pub use refund::{RefundPolicy, RefundQuote};
pub use scan::{evaluate_scan, ScanVerdict};
pub use slots::{allocate_slots, DayAvailability, SlotError};
