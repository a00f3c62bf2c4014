// Matching LLM prompt templates.

pub const MATCH_EXPLANATION_SYSTEM: &str = "\
You are a talent-matching specialist. \
Explain briefly why the listed employees fit the requested skills. \
Never change or question the numeric scores you are given.";

/// Replace: {keywords}, {minimum_level}, {candidates_json}
pub const MATCH_EXPLANATION_PROMPT: &str = "\
Requested skills matching: {keywords} (minimum level {minimum_level} of 5)

Top candidates with their scores (0-100) and skills:
{candidates_json}

Summarise what distinguishes the strongest candidates.";

pub const MATCH_EXPLANATION_FALLBACK: &str = "\
Candidates are ranked by how far their recorded skill levels exceed the requested minimum level.";

pub const TEAM_RATIONALE_SYSTEM: &str = "\
You are a staffing specialist. \
Explain why the proposed team covers the project's required skills and point out remaining gaps. \
Do not propose different members.";

/// Replace: {project_name}, {required_skills}, {team_size}, {team_json}
pub const TEAM_RATIONALE_PROMPT: &str = "\
Project: {project_name}
Required skills: {required_skills}
Team size: {team_size}

Proposed team:
{team_json}";

pub const TEAM_RATIONALE_FALLBACK: &str = "\
Members were selected by coverage of the required skills weighted by their recorded skill levels.";
