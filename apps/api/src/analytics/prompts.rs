// Analytics LLM prompt templates.

pub const ANALYST_SYSTEM: &str = "\
You are an HR analytics advisor for an internal talent platform. \
You comment on aggregated skill and matching statistics for managers.";

/// Replace: {department}, {summary_json}, {gaps_json}
pub const SKILL_GAP_PROMPT: &str = "\
Department: {department}

Department summary:
{summary_json}

Per-skill gaps against the target level of 5:
{gaps_json}

Recommend how the department should close its most important gaps.";

pub const SKILL_GAP_FALLBACK: &str = "\
Focus training on the high-priority skills first; medium and low gaps can be closed with courses and self-learning.";

/// Replace: {department}, {category}, {chart_json}
pub const SKILL_MAP_PROMPT: &str = "\
Department filter: {department}
Skill category filter: {category}

Mean skill level (1-5) per category:
{chart_json}

Describe the strongest and weakest areas of this skill distribution.";

pub const SKILL_MAP_FALLBACK: &str = "\
The chart shows the mean recorded skill level per category; categories below 3 are candidates for training.";

pub const SYNERGY_PERSONA: &str = "\
You are an organisational analyst estimating collaboration between departments.";

/// Replace: {start}, {end}, {monthly_json}
pub const KPI_PROMPT: &str = "\
Window: {start} to {end}

Monthly mean match scores (0-100) observed in the window:
{monthly_json}

Return the monthly KPI achievement rate as JSON with this exact shape:
{\"labels\": [\"YYYY-MM\", ...], \"datasets\": [{\"label\": \"KPI achievement rate\", \"data\": [number, ...]}]}
The data array must have one value per label.";

/// Replace: {departments}, {overlap_json}
pub const SYNERGY_PROMPT: &str = "\
Departments: {departments}

Overlap of the matching targets per department pair (0-100):
{overlap_json}

Return a synergy score (0-100) per department pair as JSON with this exact shape:
{\"labels\": [\"A × B\", ...], \"datasets\": [{\"label\": \"Synergy score\", \"data\": [number, ...]}]}
The data array must have one value per label.";

/// Replace: {summary_json}, {departments_json}, {trend_json}
pub const TALENT_PROMPT: &str = "\
Organisation summary:
{summary_json}

Per-department utilization and skill growth:
{departments_json}

Organisation-wide monthly utilization:
{trend_json}

Give insights on how talent is being utilised and where growth is lagging.";

pub const TALENT_FALLBACK: &str = "\
Utilization reflects recent matching activity; departments with low utilization and high skill growth have untapped capacity.";
