//! Course catalog: the course-definition store
//!
//! Published course versions are immutable. Editing content means
//! publishing the next version; enrollments keep deriving progress from the
//! version they were created against, so mid-progress students never see a
//! course change under them.

use gurukul_types::{Course, CourseId, EnrollmentError, EnrollmentResult};
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::RwLock;

/// Thread-safe store of published course versions.
#[derive(Debug, Default)]
pub struct CourseCatalog {
    inner: RwLock<HashMap<CourseId, BTreeMap<u32, Course>>>,
}

impl CourseCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a course version. Validates the definition and refuses to
    /// overwrite an existing (id, version) pair.
    pub fn publish(&self, course: Course) -> EnrollmentResult<()> {
        course.validate()?;

        let mut catalog = self.inner.write().map_err(|_| EnrollmentError::StorePoisoned)?;
        let versions = catalog.entry(course.id.clone()).or_default();
        if versions.contains_key(&course.version) {
            return Err(EnrollmentError::CourseVersionExists {
                id: course.id,
                version: course.version,
            });
        }

        tracing::info!(course_id = %course.id, version = course.version, "Course version published");
        versions.insert(course.version, course);
        Ok(())
    }

    /// Fetch a specific published version.
    pub fn get(&self, id: &CourseId, version: u32) -> EnrollmentResult<Course> {
        let catalog = self.inner.read().map_err(|_| EnrollmentError::StorePoisoned)?;
        catalog
            .get(id)
            .and_then(|versions| versions.get(&version))
            .cloned()
            .ok_or_else(|| EnrollmentError::CourseNotFound {
                id: id.clone(),
                version,
            })
    }

    /// Fetch the newest published version, the one new enrollments bind to.
    pub fn latest(&self, id: &CourseId) -> EnrollmentResult<Course> {
        let catalog = self.inner.read().map_err(|_| EnrollmentError::StorePoisoned)?;
        catalog
            .get(id)
            .and_then(|versions| versions.values().next_back())
            .cloned()
            .ok_or_else(|| EnrollmentError::CourseNotFound {
                id: id.clone(),
                version: 0,
            })
    }

    /// Number of distinct courses (not versions).
    pub fn course_count(&self) -> usize {
        self.inner.read().map(|c| c.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gurukul_types::{CourseModule, ModuleId, TaskSpec};

    fn course(version: u32) -> Course {
        let mut c = Course::new(CourseId::new("rust-101"), version, "Rust Basics", 50_000);
        c.add_module(
            CourseModule::new(ModuleId::new("m1"), 0, "Ownership")
                .with_task(TaskSpec::new(format!("t1-v{version}"), "Task")),
        )
        .unwrap();
        c
    }

    #[test]
    fn test_publish_and_get() {
        let catalog = CourseCatalog::new();
        catalog.publish(course(1)).unwrap();

        let fetched = catalog.get(&CourseId::new("rust-101"), 1).unwrap();
        assert_eq!(fetched.version, 1);
        assert_eq!(catalog.course_count(), 1);
    }

    #[test]
    fn test_republish_same_version_rejected() {
        let catalog = CourseCatalog::new();
        catalog.publish(course(1)).unwrap();
        let err = catalog.publish(course(1)).unwrap_err();
        assert!(matches!(err, EnrollmentError::CourseVersionExists { .. }));
    }

    #[test]
    fn test_latest_prefers_highest_version() {
        let catalog = CourseCatalog::new();
        catalog.publish(course(2)).unwrap();
        catalog.publish(course(1)).unwrap();
        assert_eq!(catalog.latest(&CourseId::new("rust-101")).unwrap().version, 2);
    }

    #[test]
    fn test_prior_versions_survive_edits() {
        let catalog = CourseCatalog::new();
        catalog.publish(course(1)).unwrap();
        catalog.publish(course(2)).unwrap();

        // An enrollment bound to v1 still resolves v1 content.
        let v1 = catalog.get(&CourseId::new("rust-101"), 1).unwrap();
        assert!(v1.modules[0].tasks[0].id.0.ends_with("v1"));
    }

    #[test]
    fn test_missing_course() {
        let catalog = CourseCatalog::new();
        assert!(matches!(
            catalog.latest(&CourseId::new("nope")),
            Err(EnrollmentError::CourseNotFound { .. })
        ));
    }
}
