pub mod career;
pub mod handlers;
