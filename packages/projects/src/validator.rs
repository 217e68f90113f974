use crate::types::{ProjectCreateInput, ProjectUpdateInput};

/// Validation errors for project data
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validates project data for creation
pub fn validate_project_data(data: &ProjectCreateInput) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if data.name.trim().is_empty() {
        errors.push(ValidationError::new("name", "Project name is required"));
    }

    errors
}

/// Validates project update data
pub fn validate_project_update(data: &ProjectUpdateInput) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(ref name) = data.name {
        if name.trim().is_empty() {
            errors.push(ValidationError::new("name", "Project name cannot be empty"));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_project_data_valid() {
        let data = ProjectCreateInput {
            name: "Website Relaunch".to_string(),
            description: Some("A test project".to_string()),
            status: None,
            priority: None,
            client_id: None,
            manager_id: None,
            is_default: None,
        };

        assert!(validate_project_data(&data).is_empty());
    }

    #[test]
    fn test_validate_project_data_empty_name() {
        let data = ProjectCreateInput {
            name: "   ".to_string(),
            description: None,
            status: None,
            priority: None,
            client_id: None,
            manager_id: None,
            is_default: None,
        };

        let errors = validate_project_data(&data);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "name");
    }

    #[test]
    fn test_validate_project_update_empty_name() {
        let data = ProjectUpdateInput {
            name: Some("".to_string()),
            ..Default::default()
        };

        let errors = validate_project_update(&data);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "name");
    }
}
