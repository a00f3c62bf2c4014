// Reminder email prompt templates.

pub const REMINDER_SYSTEM: &str = "\
You write short, friendly internal emails for an HR skills platform. \
Return only the email body as plain text, without a subject line.";

/// Replace: {threshold_days}, {deadline}
pub const REMINDER_PROMPT: &str = "\
Write an email asking an employee to update their skill information. Include:
- why keeping skill information current matters
- that {threshold_days} days have passed since their last update
- the steps to update: log in, open My Page, choose \"Update skills\", enter current levels, save
- the deadline: {deadline}

Address the employee as {USER_NAME}; that placeholder is replaced with their name.";

/// Replace: {threshold_days}, {deadline}
pub const REMINDER_FALLBACK: &str = "\
Dear {USER_NAME},

It is time for the periodic update of your skill information.
{threshold_days} days have passed since your last update. Please refresh your entries so they reflect your current skills.

How to update:
1. Log in to the skills platform
2. Open My Page and choose \"Update skills\"
3. Enter the current level for each skill
4. Save

Please complete the update by {deadline}.

If you have any questions, feel free to contact us.";

pub const REMINDER_SUBJECT: &str = "Reminder: please update your skill information";
