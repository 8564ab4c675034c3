//! Boundary traits for external collaborators
//!
//! File storage and notification delivery are owned by other systems; the
//! engine only needs these two seams. In-memory implementations are
//! provided for tests and local demos.

use async_trait::async_trait;
use gurukul_types::{
    EnrollmentError, EnrollmentResult, NotificationEvent, ScreenshotUpload, StudentId,
};
use std::sync::Mutex;

/// Stores an uploaded file and returns a URL for it.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn store(&self, upload: ScreenshotUpload) -> EnrollmentResult<String>;
}

/// Delivers a notification event to a student.
///
/// Delivery failures never roll back a committed state change; the engine
/// logs and moves on.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, student: &StudentId, event: NotificationEvent) -> EnrollmentResult<()>;
}

// ── In-memory implementations ────────────────────────────────────────

/// File store keeping uploads in memory, for tests and demos.
#[derive(Debug, Default)]
pub struct MemoryFileStore {
    stored: Mutex<Vec<String>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored_count(&self) -> usize {
        self.stored.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn store(&self, upload: ScreenshotUpload) -> EnrollmentResult<String> {
        let url = format!("mem://uploads/{}", upload.file_name);
        self.stored
            .lock()
            .map_err(|_| EnrollmentError::FileStorage("upload log poisoned".into()))?
            .push(url.clone());
        Ok(url)
    }
}

/// Notifier that records every event it is handed, for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(StudentId, NotificationEvent)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events delivered so far, in order.
    pub fn sent(&self) -> Vec<(StudentId, NotificationEvent)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, student: &StudentId, event: NotificationEvent) -> EnrollmentResult<()> {
        self.sent
            .lock()
            .map_err(|_| EnrollmentError::Notification("event log poisoned".into()))?
            .push((student.clone(), event));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gurukul_types::{CertificateId, EnrollmentId};

    #[tokio::test]
    async fn memory_file_store_hands_back_a_url() {
        let store = MemoryFileStore::new();
        let url = store
            .store(ScreenshotUpload::new("proof.png", "image/png", vec![1, 2]))
            .await
            .unwrap();
        assert_eq!(url, "mem://uploads/proof.png");
        assert_eq!(store.stored_count(), 1);
    }

    #[tokio::test]
    async fn recording_notifier_keeps_order() {
        let notifier = RecordingNotifier::new();
        let student = StudentId::new("s1");
        for n in 0..3 {
            notifier
                .notify(
                    &student,
                    NotificationEvent::CertificateIssued {
                        enrollment_id: EnrollmentId::new(format!("e{n}")),
                        certificate_id: CertificateId::new(format!("cert-{n}")),
                    },
                )
                .await
                .unwrap();
        }
        let sent = notifier.sent();
        assert_eq!(sent.len(), 3);
        assert!(matches!(
            &sent[0].1,
            NotificationEvent::CertificateIssued { enrollment_id, .. }
                if enrollment_id == &EnrollmentId::new("e0")
        ));
    }
}
