//! Submission progress tracking
//!
//! Long-running save/publish/update flows report discrete phases to the UI
//! through an ordered step sequence. This is a display helper, not a
//! workflow engine: nothing here enforces that steps fire in order, retries
//! failures or rolls anything back — the caller sequences the work.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    InProgress,
    Completed,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionStep {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubmissionStep {
    fn pending(id: &str, title: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            status: StepStatus::Pending,
            progress: None,
            error: None,
        }
    }
}

/// The operation a step sequence belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    EmailSave,
    EmailPublish,
    EmailUpdate,
    DesignCreate,
    DesignUpdate,
}

pub struct SubmissionManager;

impl SubmissionManager {
    /// Initial step sequence for an operation, every step pending.
    pub fn steps(kind: SubmissionKind) -> Vec<SubmissionStep> {
        match kind {
            SubmissionKind::EmailSave => Self::email_steps("Save email", "Save the email"),
            SubmissionKind::EmailPublish => {
                Self::email_steps("Publish email", "Publish the email")
            }
            SubmissionKind::EmailUpdate => {
                Self::email_steps("Update email", "Save the email changes")
            }
            SubmissionKind::DesignCreate => Self::design_steps(
                "Create design",
                "Save the new design to the library",
                "Generate the design thumbnail",
            ),
            SubmissionKind::DesignUpdate => Self::design_steps(
                "Update design",
                "Save the design changes",
                "Refresh the design thumbnail",
            ),
        }
    }

    fn email_steps(submit_title: &str, submit_description: &str) -> Vec<SubmissionStep> {
        vec![
            SubmissionStep::pending(
                "validation",
                "Validate",
                "Check the email title and editor state",
            ),
            SubmissionStep::pending(
                "export",
                "Export content",
                "Export the design and rendered HTML",
            ),
            SubmissionStep::pending("preview", "Generate preview", "Capture the preview image"),
            SubmissionStep::pending("submission", submit_title, submit_description),
            SubmissionStep::pending("completion", "Done", "Finish up and return"),
        ]
    }

    fn design_steps(
        submit_title: &str,
        submit_description: &str,
        thumbnail_description: &str,
    ) -> Vec<SubmissionStep> {
        vec![
            SubmissionStep::pending("validation", "Validate", "Check the submitted form data"),
            SubmissionStep::pending("thumbnail", "Thumbnail", thumbnail_description),
            SubmissionStep::pending("submission", submit_title, submit_description),
            SubmissionStep::pending("completion", "Done", "Finish up and return"),
        ]
    }

    /// Pure reducer: returns a new sequence where only the step with the
    /// matching id carries the new status/progress/error. Order and all
    /// other steps are untouched; an unknown id changes nothing.
    pub fn update_steps(
        steps: &[SubmissionStep],
        step_id: &str,
        status: StepStatus,
        progress: Option<u8>,
        error: Option<String>,
    ) -> Vec<SubmissionStep> {
        steps
            .iter()
            .map(|step| {
                if step.id == step_id {
                    SubmissionStep {
                        status,
                        progress,
                        error: error.clone(),
                        ..step.clone()
                    }
                } else {
                    step.clone()
                }
            })
            .collect()
    }

    pub fn current_step(steps: &[SubmissionStep]) -> Option<&SubmissionStep> {
        steps
            .iter()
            .find(|step| step.status == StepStatus::InProgress)
    }

    pub fn is_completed(steps: &[SubmissionStep]) -> bool {
        steps
            .iter()
            .all(|step| step.status == StepStatus::Completed)
    }

    pub fn has_error(steps: &[SubmissionStep]) -> bool {
        steps.iter().any(|step| step.status == StepStatus::Error)
    }
}
