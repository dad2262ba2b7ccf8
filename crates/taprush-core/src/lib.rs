//! Pure game rules: round lifecycle evaluation and tap scoring.
//!
//! Nothing in here touches a clock or the database. `now` is always a
//! parameter so the rules stay independently testable.

pub mod lifecycle;
pub mod scoring;
