pub mod challenge;
pub mod idea;
pub mod logs;
pub mod matching;
pub mod message;
pub mod skill;
pub mod user;
