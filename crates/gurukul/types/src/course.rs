//! Course definitions: the content structure enrollments progress through
//!
//! A course is an ordered sequence of modules, each holding lessons, tasks,
//! and quizzes, plus zero or more capstone projects. Module `order` values
//! are unique and define the unlock sequence. Published course versions are
//! immutable; to edit content, publish a new version.

use crate::{CourseId, EnrollmentError, EnrollmentResult, ItemId, ModuleId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Whether a gradable item gates progress as a task or a quiz.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Task,
    Quiz,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Task => write!(f, "task"),
            Self::Quiz => write!(f, "quiz"),
        }
    }
}

/// A single published version of a course.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Course {
    /// Course identifier, stable across versions
    pub id: CourseId,
    /// Version number; bumped on every content edit
    pub version: u32,
    /// Human-readable title
    pub title: String,
    /// Description shown to students
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Full course fee in minor currency units
    pub fee_minor: u64,
    /// Modules in unlock order
    pub modules: Vec<CourseModule>,
    /// Capstone projects unlocked once every module is complete
    pub capstones: Vec<CapstoneProject>,
    /// When this version was published
    pub created_at: DateTime<Utc>,
}

impl Course {
    /// Create a new course version with no content yet.
    pub fn new(id: CourseId, version: u32, title: impl Into<String>, fee_minor: u64) -> Self {
        Self {
            id,
            version,
            title: title.into(),
            description: String::new(),
            fee_minor,
            modules: Vec::new(),
            capstones: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a module, rejecting duplicate orders, module ids, and item ids.
    pub fn add_module(&mut self, module: CourseModule) -> EnrollmentResult<()> {
        if self.modules.iter().any(|m| m.order == module.order) {
            return Err(EnrollmentError::DuplicateModuleOrder {
                order: module.order,
            });
        }
        if self.modules.iter().any(|m| m.id == module.id) {
            return Err(EnrollmentError::DuplicateModuleId(module.id));
        }
        let mut seen: HashSet<&ItemId> = self.item_ids().collect();
        for item in module.gated_items() {
            if !seen.insert(item) {
                return Err(EnrollmentError::DuplicateItemId(item.clone()));
            }
        }
        self.modules.push(module);
        self.modules.sort_by_key(|m| m.order);
        Ok(())
    }

    /// Add a capstone project, rejecting duplicate item ids.
    pub fn add_capstone(&mut self, capstone: CapstoneProject) -> EnrollmentResult<()> {
        if self.item_ids().any(|i| *i == capstone.id) {
            return Err(EnrollmentError::DuplicateItemId(capstone.id));
        }
        self.capstones.push(capstone);
        Ok(())
    }

    /// Validate the whole definition. `add_module`/`add_capstone` enforce
    /// this incrementally; deserialized courses must be checked explicitly.
    pub fn validate(&self) -> EnrollmentResult<()> {
        if self.title.trim().is_empty() {
            return Err(EnrollmentError::validation(
                "title",
                "course title must not be empty",
            ));
        }
        let mut orders = HashSet::new();
        for module in &self.modules {
            if !orders.insert(module.order) {
                return Err(EnrollmentError::DuplicateModuleOrder {
                    order: module.order,
                });
            }
        }
        let mut module_ids = HashSet::new();
        for module in &self.modules {
            if !module_ids.insert(&module.id) {
                return Err(EnrollmentError::DuplicateModuleId(module.id.clone()));
            }
        }
        let mut items = HashSet::new();
        for item in self.item_ids() {
            if !items.insert(item) {
                return Err(EnrollmentError::DuplicateItemId(item.clone()));
            }
        }
        Ok(())
    }

    /// Modules sorted by unlock order (maintained by `add_module`).
    pub fn modules_in_order(&self) -> &[CourseModule] {
        &self.modules
    }

    /// Look up a module by id.
    pub fn module(&self, id: &ModuleId) -> Option<&CourseModule> {
        self.modules.iter().find(|m| &m.id == id)
    }

    /// Look up a capstone by item id.
    pub fn capstone(&self, id: &ItemId) -> Option<&CapstoneProject> {
        self.capstones.iter().find(|c| &c.id == id)
    }

    /// Total number of progress-gating items (tasks + quizzes) in the course.
    ///
    /// Lessons and capstones do not count toward the completion percentage.
    pub fn total_gated_items(&self) -> usize {
        self.modules.iter().map(|m| m.gated_item_count()).sum()
    }

    fn item_ids(&self) -> impl Iterator<Item = &ItemId> {
        self.modules
            .iter()
            .flat_map(|m| m.gated_items())
            .chain(self.capstones.iter().map(|c| &c.id))
    }
}

/// One module of a course: an ordered unlock unit.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CourseModule {
    pub id: ModuleId,
    /// Position in the unlock sequence; unique within a course
    pub order: u32,
    pub title: String,
    /// Lessons are content only; they never gate progress
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lessons: Vec<Lesson>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<TaskSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quizzes: Vec<QuizSpec>,
}

impl CourseModule {
    pub fn new(id: ModuleId, order: u32, title: impl Into<String>) -> Self {
        Self {
            id,
            order,
            title: title.into(),
            lessons: Vec::new(),
            tasks: Vec::new(),
            quizzes: Vec::new(),
        }
    }

    pub fn with_lesson(mut self, lesson: Lesson) -> Self {
        self.lessons.push(lesson);
        self
    }

    pub fn with_task(mut self, task: TaskSpec) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn with_quiz(mut self, quiz: QuizSpec) -> Self {
        self.quizzes.push(quiz);
        self
    }

    /// The items that must be completed for this module to count as done.
    pub fn gated_items(&self) -> impl Iterator<Item = &ItemId> {
        self.tasks
            .iter()
            .map(|t| &t.id)
            .chain(self.quizzes.iter().map(|q| &q.id))
    }

    pub fn gated_item_count(&self) -> usize {
        self.tasks.len() + self.quizzes.len()
    }

    /// Whether this module contains the given item of the given kind.
    pub fn contains_item(&self, id: &ItemId, kind: ItemKind) -> bool {
        match kind {
            ItemKind::Task => self.tasks.iter().any(|t| &t.id == id),
            ItemKind::Quiz => self.quizzes.iter().any(|q| &q.id == id),
        }
    }
}

/// A lesson: viewable content, never graded.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Lesson {
    pub id: ItemId,
    pub title: String,
}

impl Lesson {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(id),
            title: title.into(),
        }
    }
}

/// A gradable task within a module.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskSpec {
    pub id: ItemId,
    pub title: String,
}

impl TaskSpec {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(id),
            title: title.into(),
        }
    }
}

/// A gradable quiz within a module.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuizSpec {
    pub id: ItemId,
    pub title: String,
    /// Minimum score to pass, if the grader enforces one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass_score: Option<u32>,
}

impl QuizSpec {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(id),
            title: title.into(),
            pass_score: None,
        }
    }

    pub fn with_pass_score(mut self, score: u32) -> Self {
        self.pass_score = Some(score);
        self
    }
}

/// The final project, unlocked only after every module is complete.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CapstoneProject {
    pub id: ItemId,
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub brief: String,
}

impl CapstoneProject {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(id),
            title: title.into(),
            brief: String::new(),
        }
    }

    pub fn with_brief(mut self, brief: impl Into<String>) -> Self {
        self.brief = brief.into();
        self
    }
}
