//! Quiz, task, and capstone submissions
//!
//! Submissions are produced by students and graded by the grading
//! collaborator; a graded-and-accepted submission is the event that feeds
//! an item id into the enrollment's completed set.

use crate::{CourseId, EnrollmentId, ItemId, ModuleId, SubmissionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of work a submission carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionKind {
    Task,
    Quiz,
    Capstone,
}

impl std::fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Task => write!(f, "task"),
            Self::Quiz => write!(f, "quiz"),
            Self::Capstone => write!(f, "capstone"),
        }
    }
}

/// Review state of a submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SubmissionStatus {
    #[default]
    Submitted,
    Graded,
    Rejected,
}

/// The grading collaborator's verdict on a submission.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GradeResult {
    /// Whether the work is accepted; only accepted grades advance progress
    pub accepted: bool,
    /// Score for quizzes, out of 100
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

impl GradeResult {
    pub fn accepted() -> Self {
        Self {
            accepted: true,
            score: None,
            feedback: None,
        }
    }

    pub fn rejected(feedback: impl Into<String>) -> Self {
        Self {
            accepted: false,
            score: None,
            feedback: Some(feedback.into()),
        }
    }

    pub fn with_score(mut self, score: u32) -> Self {
        self.score = Some(score);
        self
    }
}

/// A student's attempt at a task, quiz, or capstone.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub enrollment_id: EnrollmentId,
    pub course_id: CourseId,
    /// The owning module; `None` for capstone submissions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_id: Option<ModuleId>,
    pub item_id: ItemId,
    pub kind: SubmissionKind,
    pub status: SubmissionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    pub submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graded_at: Option<DateTime<Utc>>,
}

impl Submission {
    pub fn new(
        enrollment_id: EnrollmentId,
        course_id: CourseId,
        module_id: Option<ModuleId>,
        item_id: ItemId,
        kind: SubmissionKind,
    ) -> Self {
        Self {
            id: SubmissionId::generate(),
            enrollment_id,
            course_id,
            module_id,
            item_id,
            kind,
            status: SubmissionStatus::Submitted,
            score: None,
            submitted_at: Utc::now(),
            graded_at: None,
        }
    }

    /// Apply the grader's verdict.
    pub fn apply_grade(&mut self, grade: &GradeResult) {
        self.status = if grade.accepted {
            SubmissionStatus::Graded
        } else {
            SubmissionStatus::Rejected
        };
        self.score = grade.score;
        self.graded_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_grade_marks_graded() {
        let mut s = Submission::new(
            EnrollmentId::new("e1"),
            CourseId::new("c1"),
            Some(ModuleId::new("m1")),
            ItemId::new("q1"),
            SubmissionKind::Quiz,
        );
        s.apply_grade(&GradeResult::accepted().with_score(85));
        assert_eq!(s.status, SubmissionStatus::Graded);
        assert_eq!(s.score, Some(85));
        assert!(s.graded_at.is_some());
    }

    #[test]
    fn test_rejected_grade_marks_rejected() {
        let mut s = Submission::new(
            EnrollmentId::new("e1"),
            CourseId::new("c1"),
            None,
            ItemId::new("cap1"),
            SubmissionKind::Capstone,
        );
        s.apply_grade(&GradeResult::rejected("incomplete"));
        assert_eq!(s.status, SubmissionStatus::Rejected);
    }
}
