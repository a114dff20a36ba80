use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::types::{DepartmentId, SubDepartmentId};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SubDepartment {
    pub id: SubDepartmentId,
    pub department_id: DepartmentId,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
/// Active department together with its active sub-departments.
pub struct DepartmentTree {
    #[serde(flatten)]
    pub department: Department,
    pub sub_departments: Vec<SubDepartment>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDepartmentRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required (max 255 characters)."))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSubDepartmentRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required (max 255 characters)."))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

/// Groups sub-departments under their department, keeping department order.
pub fn build_tree(departments: Vec<Department>, sub_departments: Vec<SubDepartment>) -> Vec<DepartmentTree> {
    departments
        .into_iter()
        .map(|department| {
            let children = sub_departments
                .iter()
                .filter(|sub| sub.department_id == department.id)
                .cloned()
                .collect();
            DepartmentTree {
                department,
                sub_departments: children,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn department(name: &str) -> Department {
        Department {
            id: DepartmentId::new(),
            name: name.into(),
            description: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sub(department_id: DepartmentId, name: &str) -> SubDepartment {
        SubDepartment {
            id: SubDepartmentId::new(),
            department_id,
            name: name.into(),
            description: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn build_tree_attaches_children_to_their_parent() {
        let engineering = department("Engineering");
        let sales = department("Sales");
        let subs = vec![
            sub(engineering.id, "Backend"),
            sub(sales.id, "Field Sales"),
            sub(engineering.id, "QA"),
        ];

        let tree = build_tree(vec![engineering, sales], subs);
        assert_eq!(tree.len(), 2);
        let names: Vec<_> = tree[0].sub_departments.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Backend", "QA"]);
        assert_eq!(tree[1].sub_departments.len(), 1);
    }

    #[test]
    fn tree_serializes_department_fields_inline() {
        let tree = build_tree(vec![department("Finance")], vec![]);
        let json = serde_json::to_value(&tree[0]).unwrap();
        assert_eq!(json["name"], "Finance");
        assert!(json["sub_departments"].as_array().unwrap().is_empty());
    }
}
