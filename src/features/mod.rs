pub mod auth;
pub mod directory;
pub mod notices;
pub mod rolls;
