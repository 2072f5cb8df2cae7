mod roll_handler;

pub use roll_handler::*;
