//! Local input validation
//!
//! Validation failures are rejected synchronously, before any remote call
//! is issued.

use taskclient::{TaskDraft, TaskPatch};

use crate::state::TaskListError;

/// Validate a creation draft
///
/// The title must be non-empty after trimming; a provided description must
/// not be blank.
pub fn validate_draft(draft: &TaskDraft) -> Result<(), TaskListError> {
    if draft.title.trim().is_empty() {
        return Err(TaskListError::Validation("title must not be empty".to_string()));
    }
    if let Some(description) = &draft.description {
        if description.trim().is_empty() {
            return Err(TaskListError::Validation(
                "description must not be empty when provided".to_string(),
            ));
        }
    }
    Ok(())
}

/// Validate a partial update
///
/// Title and description may be omitted, but when present they must be
/// non-empty.
pub fn validate_patch(patch: &TaskPatch) -> Result<(), TaskListError> {
    if patch.is_empty() {
        return Err(TaskListError::Validation("patch contains no fields".to_string()));
    }
    if let Some(title) = &patch.title {
        if title.trim().is_empty() {
            return Err(TaskListError::Validation("title must not be empty".to_string()));
        }
    }
    if let Some(description) = &patch.description {
        if description.trim().is_empty() {
            return Err(TaskListError::Validation(
                "description must not be empty when provided".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_requires_title() {
        assert!(validate_draft(&TaskDraft::new("Buy milk")).is_ok());
        assert!(validate_draft(&TaskDraft::new("")).is_err());
        assert!(validate_draft(&TaskDraft::new("   ")).is_err());
    }

    #[test]
    fn test_draft_rejects_blank_description() {
        let draft = TaskDraft::new("Buy milk").with_description("  ");
        assert!(validate_draft(&draft).is_err());

        let draft = TaskDraft::new("Buy milk").with_description("from the corner shop");
        assert!(validate_draft(&draft).is_ok());
    }

    #[test]
    fn test_patch_rejects_empty_and_blank_fields() {
        assert!(validate_patch(&TaskPatch::new()).is_err());
        assert!(validate_patch(&TaskPatch::new().with_title(" ")).is_err());
        assert!(validate_patch(&TaskPatch::new().with_description("")).is_err());
        assert!(validate_patch(&TaskPatch::new().with_title("New title")).is_ok());
    }
}
