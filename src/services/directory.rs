//! Employees (ticket requesters) and engineers (assignable staff). Both are
//! keyed by a unique email address.

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use super::Confirmation;
use crate::{
    error::{AppError, AppResult},
    models::{
        Employee, EmployeeChangeset, Engineer, EngineerChangeset, NewEmployee, NewEngineer,
    },
    store::{StoreError, SupportStore},
    utils::{
        json::{classify_field, object_body},
        validation,
    },
};

const EMAIL_TAKEN: &str = "Email already registered";

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEmployee {
    #[validate(length(max = 255))]
    pub name: String,
    #[validate(email, length(max = 255))]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub department: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEngineer {
    #[validate(length(max = 255))]
    pub name: String,
    #[validate(email, length(max = 255))]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub specialization: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

pub async fn list_employees(store: &dyn SupportStore) -> AppResult<Vec<Employee>> {
    Ok(store.list_employees().await?)
}

pub async fn create_employee(
    store: &dyn SupportStore,
    request: CreateEmployee,
) -> AppResult<Employee> {
    validation::request(&request)?;
    let name = validation::non_blank("name", &request.name)?;
    let email = request.email;

    if store.find_employee_by_email(&email).await?.is_some() {
        return Err(AppError::conflict(EMAIL_TAKEN));
    }

    let employee = store
        .insert_employee(NewEmployee {
            name,
            email,
            department: request.department,
            created_at: Utc::now().naive_utc(),
        })
        .await
        .map_err(email_conflict)?;

    tracing::info!(employee_id = employee.id, "created employee");
    Ok(employee)
}

pub async fn get_employee(store: &dyn SupportStore, id: i32) -> AppResult<Employee> {
    store
        .find_employee(id)
        .await?
        .ok_or_else(employee_not_found)
}

/// Applies the fields present in `body`; `department: null` clears it.
pub async fn update_employee(
    store: &dyn SupportStore,
    id: i32,
    body: &Value,
) -> AppResult<Employee> {
    let existing = get_employee(store, id).await?;
    let changes = employee_changes(body)?;

    if let Some(email) = changes.email.as_deref() {
        if email != existing.email {
            let holder = store.find_employee_by_email(email).await?;
            if holder.is_some_and(|other| other.id != id) {
                return Err(AppError::conflict(EMAIL_TAKEN));
            }
        }
    }

    store
        .update_employee(id, changes)
        .await
        .map_err(email_conflict)?
        .ok_or_else(employee_not_found)
}

pub async fn delete_employee(store: &dyn SupportStore, id: i32) -> AppResult<Confirmation> {
    let deleted = store.delete_employee(id).await.map_err(|err| match err {
        StoreError::ForeignKeyViolation(_) => {
            AppError::bad_request("Employee is still referenced by tickets")
        }
        other => other.into(),
    })?;
    if !deleted {
        return Err(employee_not_found());
    }

    tracing::info!(employee_id = id, "deleted employee");
    Ok(Confirmation::new("Employee deleted successfully"))
}

pub fn employee_changes(body: &Value) -> AppResult<EmployeeChangeset> {
    let body = object_body(body).map_err(AppError::bad_request)?;
    let name = classify_field::<String>(body, "name")
        .and_then(|value| value.required("name"))
        .map_err(AppError::bad_request)?;
    let email = classify_field::<String>(body, "email")
        .and_then(|value| value.required("email"))
        .map_err(AppError::bad_request)?;
    let department = classify_field::<String>(body, "department")
        .map_err(AppError::bad_request)?
        .nullable();

    Ok(EmployeeChangeset {
        name: name.map(patched_name).transpose()?,
        email: email.map(validation::email).transpose()?,
        department: department
            .map(|value| value.map(|text| optional_text("department", text)).transpose())
            .transpose()?,
    })
}

pub async fn list_engineers(store: &dyn SupportStore) -> AppResult<Vec<Engineer>> {
    Ok(store.list_engineers().await?)
}

pub async fn create_engineer(
    store: &dyn SupportStore,
    request: CreateEngineer,
) -> AppResult<Engineer> {
    validation::request(&request)?;
    let name = validation::non_blank("name", &request.name)?;
    let email = request.email;

    if store.find_engineer_by_email(&email).await?.is_some() {
        return Err(AppError::conflict(EMAIL_TAKEN));
    }

    let engineer = store
        .insert_engineer(NewEngineer {
            name,
            email,
            specialization: request.specialization,
            is_active: request.is_active,
            created_at: Utc::now().naive_utc(),
        })
        .await
        .map_err(email_conflict)?;

    tracing::info!(engineer_id = engineer.id, "created engineer");
    Ok(engineer)
}

pub async fn get_engineer(store: &dyn SupportStore, id: i32) -> AppResult<Engineer> {
    store
        .find_engineer(id)
        .await?
        .ok_or_else(engineer_not_found)
}

pub async fn update_engineer(
    store: &dyn SupportStore,
    id: i32,
    body: &Value,
) -> AppResult<Engineer> {
    let existing = get_engineer(store, id).await?;
    let changes = engineer_changes(body)?;

    if let Some(email) = changes.email.as_deref() {
        if email != existing.email {
            let holder = store.find_engineer_by_email(email).await?;
            if holder.is_some_and(|other| other.id != id) {
                return Err(AppError::conflict(EMAIL_TAKEN));
            }
        }
    }

    store
        .update_engineer(id, changes)
        .await
        .map_err(email_conflict)?
        .ok_or_else(engineer_not_found)
}

/// Tickets and comments that reference the engineer keep the dangling id.
pub async fn delete_engineer(store: &dyn SupportStore, id: i32) -> AppResult<Confirmation> {
    if !store.delete_engineer(id).await? {
        return Err(engineer_not_found());
    }

    tracing::info!(engineer_id = id, "deleted engineer");
    Ok(Confirmation::new("Engineer deleted successfully"))
}

pub fn engineer_changes(body: &Value) -> AppResult<EngineerChangeset> {
    let body = object_body(body).map_err(AppError::bad_request)?;
    let name = classify_field::<String>(body, "name")
        .and_then(|value| value.required("name"))
        .map_err(AppError::bad_request)?;
    let email = classify_field::<String>(body, "email")
        .and_then(|value| value.required("email"))
        .map_err(AppError::bad_request)?;
    let specialization = classify_field::<String>(body, "specialization")
        .map_err(AppError::bad_request)?
        .nullable();
    let is_active = classify_field::<bool>(body, "is_active")
        .and_then(|value| value.required("is_active"))
        .map_err(AppError::bad_request)?;

    Ok(EngineerChangeset {
        name: name.map(patched_name).transpose()?,
        email: email.map(validation::email).transpose()?,
        specialization: specialization
            .map(|value| value.map(|text| optional_text("specialization", text)).transpose())
            .transpose()?,
        is_active,
    })
}

fn patched_name(value: String) -> AppResult<String> {
    let name = validation::non_blank("name", &value)?;
    validation::max_length("name", name, validation::TEXT_MAX)
}

fn optional_text(field: &str, value: String) -> AppResult<String> {
    validation::max_length(field, value, validation::TEXT_MAX)
}

fn email_conflict(err: StoreError) -> AppError {
    match err {
        StoreError::UniqueViolation(_) => AppError::conflict(EMAIL_TAKEN),
        other => other.into(),
    }
}

fn employee_not_found() -> AppError {
    AppError::not_found("Employee not found")
}

fn engineer_not_found() -> AppError {
    AppError::not_found("Engineer not found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn employee_changes_only_touch_present_fields() {
        let changes = employee_changes(&json!({ "department": "Finance" })).unwrap();
        assert!(changes.name.is_none());
        assert!(changes.email.is_none());
        assert_eq!(changes.department, Some(Some("Finance".to_string())));
    }

    #[test]
    fn employee_department_can_be_cleared() {
        let changes = employee_changes(&json!({ "department": null })).unwrap();
        assert_eq!(changes.department, Some(None));
    }

    #[test]
    fn null_name_is_rejected() {
        let err = employee_changes(&json!({ "name": null })).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn engineer_changes_validate_email_and_flag() {
        assert!(engineer_changes(&json!({ "email": "nope" })).is_err());
        assert!(engineer_changes(&json!({ "is_active": "no" })).is_err());

        let changes = engineer_changes(&json!({ "is_active": false })).unwrap();
        assert_eq!(changes.is_active, Some(false));
        assert!(changes.specialization.is_none());
    }

    #[test]
    fn patched_fields_respect_column_widths() {
        let long = "x".repeat(256);
        assert!(employee_changes(&json!({ "name": long })).is_err());
        assert!(employee_changes(&json!({ "department": long })).is_err());
        assert!(engineer_changes(&json!({ "specialization": long })).is_err());
        assert!(engineer_changes(&json!({ "email": "ada@example..com" })).is_err());

        let fits = employee_changes(&json!({ "department": "x".repeat(255) })).unwrap();
        assert_eq!(fits.department, Some(Some("x".repeat(255))));
    }

    #[test]
    fn empty_body_yields_empty_changeset() {
        assert!(employee_changes(&json!({})).unwrap().is_empty());
        assert!(engineer_changes(&json!({})).unwrap().is_empty());
    }
}
