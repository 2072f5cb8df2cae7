mod roster;

pub use roster::{RollAssignment, RosterStudent};
