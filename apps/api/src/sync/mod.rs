pub mod diff;
pub mod handlers;
