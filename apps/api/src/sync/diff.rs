//! Diff between the HR system's employee list and the stored users.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;

/// One employee as served by the HR system.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HrEmployee {
    pub employee_id: String,
    pub name: String,
    pub department: String,
    pub position: String,
    pub email: String,
    pub hire_date: Option<NaiveDate>,
    /// Contact fields (phone, address, biography). Merged into `profile_data`.
    #[serde(default)]
    pub profile: Map<String, Value>,
}

/// The stored columns the HR system owns.
#[derive(Debug, Clone, FromRow)]
pub struct SyncedUser {
    pub employee_id: String,
    pub name: String,
    pub department: String,
    pub position: String,
    pub email: String,
    pub hire_date: Option<NaiveDate>,
    pub profile_data: Value,
}

#[derive(Debug, Default, PartialEq)]
pub struct SyncPlan {
    pub to_insert: Vec<HrEmployee>,
    pub to_update: Vec<HrEmployee>,
    pub unchanged: usize,
    /// Repeated `employeeId`s after the first occurrence.
    pub duplicates: usize,
}

/// Only the HR-owned profile keys are compared; other keys such as `career`
/// belong to the service and never trigger an update.
fn differs(employee: &HrEmployee, user: &SyncedUser) -> bool {
    employee.name != user.name
        || employee.department != user.department
        || employee.position != user.position
        || employee.email != user.email
        || employee.hire_date != user.hire_date
        || employee
            .profile
            .iter()
            .any(|(key, value)| user.profile_data.get(key) != Some(value))
}

pub fn plan_sync(incoming: Vec<HrEmployee>, existing: &[SyncedUser]) -> SyncPlan {
    let by_employee_id: HashMap<&str, &SyncedUser> = existing
        .iter()
        .map(|u| (u.employee_id.as_str(), u))
        .collect();
    let mut seen = HashSet::new();
    let mut plan = SyncPlan::default();

    for employee in incoming {
        if !seen.insert(employee.employee_id.clone()) {
            plan.duplicates += 1;
            continue;
        }
        match by_employee_id.get(employee.employee_id.as_str()) {
            None => plan.to_insert.push(employee),
            Some(user) if differs(&employee, user) => plan.to_update.push(employee),
            Some(_) => plan.unchanged += 1,
        }
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn employee(id: &str, position: &str) -> HrEmployee {
        serde_json::from_value(json!({
            "employeeId": id,
            "name": format!("Employee {id}"),
            "department": "Engineering",
            "position": position,
            "email": format!("{id}@example.com"),
            "hireDate": "2020-04-01",
            "profile": {"phone": "090-0000-0000"}
        }))
        .unwrap()
    }

    fn stored(e: &HrEmployee, profile_data: Value) -> SyncedUser {
        SyncedUser {
            employee_id: e.employee_id.clone(),
            name: e.name.clone(),
            department: e.department.clone(),
            position: e.position.clone(),
            email: e.email.clone(),
            hire_date: e.hire_date,
            profile_data,
        }
    }

    #[test]
    fn test_parses_hr_payload() {
        let e = employee("EMP001", "Engineer");
        assert_eq!(e.hire_date, NaiveDate::from_ymd_opt(2020, 4, 1));
        assert_eq!(e.profile.get("phone"), Some(&json!("090-0000-0000")));
    }

    #[test]
    fn test_plan_inserts_updates_and_skips() {
        let same = employee("EMP001", "Engineer");
        let promoted = employee("EMP002", "Senior Engineer");
        let existing = vec![
            stored(&same, json!({"phone": "090-0000-0000", "career": {"trainings": []}})),
            stored(&employee("EMP002", "Engineer"), json!({"phone": "090-0000-0000"})),
        ];
        let incoming = vec![same, promoted.clone(), employee("EMP003", "Designer")];

        let plan = plan_sync(incoming, &existing);
        assert_eq!(plan.unchanged, 1);
        assert_eq!(plan.to_update, vec![promoted]);
        assert_eq!(plan.to_insert.len(), 1);
        assert_eq!(plan.to_insert[0].employee_id, "EMP003");
    }

    #[test]
    fn test_profile_change_triggers_update() {
        let e = employee("EMP001", "Engineer");
        let existing = vec![stored(&e, json!({"phone": "080-1111-1111"}))];
        let plan = plan_sync(vec![e], &existing);
        assert_eq!(plan.to_update.len(), 1);
    }

    #[test]
    fn test_duplicate_employee_ids_are_skipped() {
        let plan = plan_sync(
            vec![employee("EMP009", "Engineer"), employee("EMP009", "Manager")],
            &[],
        );
        assert_eq!(plan.to_insert.len(), 1);
        assert_eq!(plan.to_insert[0].position, "Engineer");
        assert_eq!(plan.duplicates, 1);
    }
}
