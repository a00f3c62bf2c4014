pub mod handlers;
pub mod prompts;
pub mod reminder;
