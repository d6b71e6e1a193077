use std::time::{Duration, Instant};

/// Checks if a deadline was exceeded.
pub fn deadline_exceeded(deadline: Option<Instant>) -> bool {
    match deadline {
        Some(deadline) => Instant::now() > deadline,
        None => false,
    }
}

/// Converts an optional time budget into a deadline.
pub fn duration_to_deadline(budget: Option<Duration>) -> Option<Instant> {
    budget.and_then(|add| Instant::now().checked_add(add))
}
