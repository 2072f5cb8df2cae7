mod roster_repository;

pub use roster_repository::{roll_update_failed, PgRosterRepository, RosterRepository};
