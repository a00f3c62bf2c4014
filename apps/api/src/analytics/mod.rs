pub mod charts;
pub mod handlers;
pub mod prompts;
pub mod skill_gap;
pub mod skill_map;
pub mod synergy;
pub mod talent;
