//! End-to-end scenarios across the tracker and the file registry

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::{sleep, timeout};

    use crate::core::config::AppConfig;
    use crate::core::extractor::mock::{MockBehavior, MockExtractor};
    use crate::core::models::{AppError, DownloadSession, SessionState};
    use crate::core::registry::FileRegistry;
    use crate::core::session::SessionTracker;

    fn tracker_with(extractor: Arc<MockExtractor>, dir: &Path) -> SessionTracker {
        let mut config = AppConfig::default();
        config.download.output_directory = dir.to_path_buf();
        config.download.max_download_seconds = 0;
        SessionTracker::new(extractor, Arc::new(tokio::sync::RwLock::new(config)))
    }

    async fn wait_terminal(tracker: &SessionTracker) -> DownloadSession {
        timeout(Duration::from_secs(3), async {
            loop {
                let snapshot = tracker.get_status();
                if snapshot.state.is_terminal() {
                    return snapshot;
                }
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("download did not finish in time")
    }

    #[tokio::test]
    async fn completed_download_appears_in_listing() {
        let dir = tempfile::tempdir().unwrap();
        let registry = FileRegistry::new(dir.path());
        assert!(registry.list_files().await.unwrap().is_empty());

        let tracker = tracker_with(
            Arc::new(MockExtractor::new(MockBehavior::Complete {
                progress_steps: vec![50.0, 100.0],
                filename: "clip.mp4".to_string(),
            })),
            dir.path(),
        );

        tracker
            .start_download("https://example.com/v/1", "best", None)
            .await
            .unwrap();

        let snapshot = wait_terminal(&tracker).await;
        assert_eq!(snapshot.state, SessionState::Completed);

        let files = registry.list_files().await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(
            Some(files[0].name.as_str()),
            snapshot.result_filename.as_deref()
        );
    }

    #[tokio::test]
    async fn immediate_second_start_is_busy_and_only_one_file_lands() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = Arc::new(MockExtractor::new(MockBehavior::CompleteOnRelease {
            progress_steps: vec![5.0],
            filename: "first.mp4".to_string(),
        }));
        let release = Arc::clone(&extractor.release);
        let tracker = tracker_with(extractor, dir.path());

        tracker
            .start_download("https://example.com/v/1", "best", None)
            .await
            .unwrap();
        let second = tracker
            .start_download("https://example.com/v/2", "best", None)
            .await;
        assert!(matches!(second, Err(AppError::SessionBusy)));

        release.notify_one();
        wait_terminal(&tracker).await;

        let files = FileRegistry::new(dir.path()).list_files().await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "first.mp4");
    }

    #[tokio::test]
    async fn failed_download_leaves_no_listing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker_with(
            Arc::new(MockExtractor::new(MockBehavior::FailAfter {
                progress_steps: vec![20.0],
                error: "This video is unavailable.".to_string(),
            })),
            dir.path(),
        );

        tracker
            .start_download("https://example.com/v/1", "best", None)
            .await
            .unwrap();

        let snapshot = wait_terminal(&tracker).await;
        assert_eq!(snapshot.state, SessionState::Failed);
        assert!(FileRegistry::new(dir.path())
            .list_files()
            .await
            .unwrap()
            .is_empty());
    }
}
