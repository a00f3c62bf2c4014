pub mod access;
pub mod handlers;
pub mod prompts;
pub mod token;
