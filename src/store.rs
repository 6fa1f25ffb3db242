//! Persistence for locations, analysis results and report feedback

use async_trait::async_trait;
use chrono::Utc;
use fjall::{Database, Keyspace, OwnedWriteBatch};
use serde::{Serialize, de::DeserializeOwned};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task;
use tracing::{debug, info};

use crate::Result;
use crate::error::CitySenseError;
use crate::models::{
    AnalysisResult, FeedbackSubmission, Location, NewAnalysisResult, ReportFeedback,
};

const NEXT_ID_KEY: &str = "next_result_id";
const RESULT_INDEX_KEY: &str = "result_index";

#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Stored location for `address`, created with the given coordinates if absent
    async fn get_or_create_location(
        &self,
        address: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<Location>;

    async fn create_result(&self, new: NewAnalysisResult) -> Result<AnalysisResult>;

    /// A result owned by `user_id`; other users' results are reported as absent
    async fn get_result(&self, id: u64, user_id: &str) -> Result<Option<AnalysisResult>>;

    /// A user's results, newest first
    async fn results_for_user(&self, user_id: &str) -> Result<Vec<AnalysisResult>>;

    /// Every stored result, oldest first
    async fn all_results(&self) -> Result<Vec<AnalysisResult>>;

    /// Record (or replace) a user's feedback and refresh the report's average
    async fn submit_feedback(
        &self,
        report_id: u64,
        user_id: &str,
        submission: FeedbackSubmission,
    ) -> Result<(ReportFeedback, AnalysisResult)>;

    async fn feedback_for(&self, report_id: u64) -> Result<Vec<ReportFeedback>>;
}

#[derive(Clone)]
struct Keyspaces {
    db: Database,
    locations: Keyspace,
    results: Keyspace,
    feedback: Keyspace,
    meta: Keyspace,
}

fn read<T: DeserializeOwned>(space: &Keyspace, key: &[u8]) -> Result<Option<T>> {
    match space.get(key)? {
        Some(bytes) => Ok(Some(postcard::from_bytes(&bytes)?)),
        None => Ok(None),
    }
}

fn stage<T: Serialize>(
    batch: &mut OwnedWriteBatch,
    space: &Keyspace,
    key: &[u8],
    value: &T,
) -> Result<()> {
    let bytes = postcard::to_stdvec(value)?;
    batch.insert(space, key.to_vec(), bytes);
    Ok(())
}

fn result_key(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

fn mean_quality(feedback: &[ReportFeedback]) -> f64 {
    if feedback.is_empty() {
        return 0.0;
    }
    feedback.iter().map(ReportFeedback::quality_score).sum::<f64>() / feedback.len() as f64
}

/// [`ReportStore`] on an embedded fjall database
#[derive(Clone)]
pub struct FjallReportStore {
    spaces: Keyspaces,
    // serializes read-modify-write sequences
    write_lock: Arc<Mutex<()>>,
}

impl FjallReportStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = fjall::Database::builder(&path).open()?;
        let spaces = Keyspaces {
            db: db.clone(),
            locations: db.keyspace("locations", fjall::KeyspaceCreateOptions::default)?,
            results: db.keyspace("results", fjall::KeyspaceCreateOptions::default)?,
            feedback: db.keyspace("feedback", fjall::KeyspaceCreateOptions::default)?,
            meta: db.keyspace("meta", fjall::KeyspaceCreateOptions::default)?,
        };
        info!("Report store opened at {}", path.as_ref().display());
        Ok(Self {
            spaces,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Keyspaces) -> Result<T> + Send + 'static,
    {
        let spaces = self.spaces.clone();
        task::spawn_blocking(move || f(&spaces))
            .await
            .map_err(|e| CitySenseError::storage(format!("store task failed: {e}")))?
    }

    fn load_results(spaces: &Keyspaces) -> Result<Vec<AnalysisResult>> {
        let index: Vec<u64> = read(&spaces.meta, RESULT_INDEX_KEY.as_bytes())?.unwrap_or_default();
        let mut results = Vec::with_capacity(index.len());
        for id in index {
            if let Some(result) = read(&spaces.results, &result_key(id))? {
                results.push(result);
            }
        }
        Ok(results)
    }
}

#[async_trait]
impl ReportStore for FjallReportStore {
    async fn get_or_create_location(
        &self,
        address: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<Location> {
        let _guard = self.write_lock.lock().await;
        let address = address.to_string();
        self.blocking(move |spaces| {
            if let Some(existing) = read::<Location>(&spaces.locations, address.as_bytes())? {
                return Ok(existing);
            }
            let location = Location::new(address.clone(), latitude, longitude);
            let mut batch = spaces.db.batch();
            stage(&mut batch, &spaces.locations, address.as_bytes(), &location)?;
            batch.commit()?;
            debug!("Created location: {address}");
            Ok(location)
        })
        .await
    }

    async fn create_result(&self, new: NewAnalysisResult) -> Result<AnalysisResult> {
        let _guard = self.write_lock.lock().await;
        let result = self
            .blocking(move |spaces| {
                let id = read::<u64>(&spaces.meta, NEXT_ID_KEY.as_bytes())?.unwrap_or(1);
                let result = AnalysisResult::from_new(id, new, Utc::now());

                let mut index: Vec<u64> =
                    read(&spaces.meta, RESULT_INDEX_KEY.as_bytes())?.unwrap_or_default();
                index.push(id);

                // result, index and counter land together or not at all
                let mut batch = spaces.db.batch();
                stage(&mut batch, &spaces.results, &result_key(id), &result)?;
                stage(&mut batch, &spaces.meta, RESULT_INDEX_KEY.as_bytes(), &index)?;
                stage(&mut batch, &spaces.meta, NEXT_ID_KEY.as_bytes(), &(id + 1))?;
                batch.commit()?;
                Ok(result)
            })
            .await?;

        info!(
            "Analysis result created: {} for user: {}",
            result.id, result.user_id
        );
        Ok(result)
    }

    async fn get_result(&self, id: u64, user_id: &str) -> Result<Option<AnalysisResult>> {
        let user_id = user_id.to_string();
        self.blocking(move |spaces| {
            let result: Option<AnalysisResult> = read(&spaces.results, &result_key(id))?;
            Ok(result.filter(|r| r.user_id == user_id))
        })
        .await
    }

    async fn results_for_user(&self, user_id: &str) -> Result<Vec<AnalysisResult>> {
        let user_id = user_id.to_string();
        self.blocking(move |spaces| {
            let mut results: Vec<AnalysisResult> = Self::load_results(spaces)?
                .into_iter()
                .filter(|r| r.user_id == user_id)
                .collect();
            results.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            Ok(results)
        })
        .await
    }

    async fn all_results(&self) -> Result<Vec<AnalysisResult>> {
        self.blocking(Self::load_results).await
    }

    async fn submit_feedback(
        &self,
        report_id: u64,
        user_id: &str,
        submission: FeedbackSubmission,
    ) -> Result<(ReportFeedback, AnalysisResult)> {
        let submission = submission.validated()?;
        let _guard = self.write_lock.lock().await;
        let user_id = user_id.to_string();

        let (feedback, report) = self
            .blocking(move |spaces| {
                let key = result_key(report_id);
                let mut report: AnalysisResult = read(&spaces.results, &key)?.ok_or_else(|| {
                    CitySenseError::not_found(format!("Report {report_id} not found"))
                })?;

                let feedback = ReportFeedback {
                    report_id,
                    user_id: user_id.clone(),
                    accuracy: submission.accuracy,
                    usefulness: submission.usefulness,
                    clarity: submission.clarity,
                    comment: submission.comment,
                    created_at: Utc::now(),
                };

                let mut entries: Vec<ReportFeedback> =
                    read(&spaces.feedback, &key)?.unwrap_or_default();
                entries.retain(|f| f.user_id != user_id);
                entries.push(feedback.clone());
                report.avg_feedback_score = mean_quality(&entries);

                let mut batch = spaces.db.batch();
                stage(&mut batch, &spaces.feedback, &key, &entries)?;
                stage(&mut batch, &spaces.results, &key, &report)?;
                batch.commit()?;
                Ok((feedback, report))
            })
            .await?;

        info!(
            "Feedback submitted: user={}, report={report_id}",
            feedback.user_id
        );
        Ok((feedback, report))
    }

    async fn feedback_for(&self, report_id: u64) -> Result<Vec<ReportFeedback>> {
        self.blocking(move |spaces| {
            let mut entries: Vec<ReportFeedback> =
                read(&spaces.feedback, &result_key(report_id))?.unwrap_or_default();
            entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(entries)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Level, NarrativeAssessment, WaterQuality};

    fn store() -> (tempfile::TempDir, FjallReportStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FjallReportStore::open(dir.path()).unwrap();
        (dir, store)
    }

    fn narrative() -> NarrativeAssessment {
        NarrativeAssessment {
            city_name: None,
            overview: None,
            historical_landmarks: vec![],
            top_attractions: vec![],
            cultural_notes: None,
            tourism_score: None,
            safety_score: 7.5,
            noise_level: Level::Medium,
            rent_level: Level::High,
            water_quality: WaterQuality::Good,
            ai_score: 78.0,
            summary: "Test summary".to_string(),
        }
    }

    fn new_result(user: &str) -> NewAnalysisResult {
        NewAnalysisResult::new(
            user,
            Location::new("London, UK", 51.5074, -0.1278),
            &narrative(),
            None,
        )
    }

    fn submission(accuracy: u8, usefulness: u8, clarity: u8) -> FeedbackSubmission {
        FeedbackSubmission {
            accuracy,
            usefulness,
            clarity,
            comment: String::new(),
        }
    }

    #[tokio::test]
    async fn test_get_or_create_location_keeps_first_coordinates() {
        let (_dir, store) = store();
        let first = store
            .get_or_create_location("London, UK", 51.5074, -0.1278)
            .await
            .unwrap();
        let second = store
            .get_or_create_location("London, UK", 0.0, 0.0)
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(second.latitude, 51.5074);
    }

    #[tokio::test]
    async fn test_result_ids_increase() {
        let (_dir, store) = store();
        let a = store.create_result(new_result("alice")).await.unwrap();
        let b = store.create_result(new_result("alice")).await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(store.all_results().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_result_ids_continue_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FjallReportStore::open(dir.path()).unwrap();
            store.create_result(new_result("alice")).await.unwrap();
            store.create_result(new_result("alice")).await.unwrap();
        }

        let store = FjallReportStore::open(dir.path()).unwrap();
        let third = store.create_result(new_result("bob")).await.unwrap();
        assert_eq!(third.id, 3);

        let ids: Vec<u64> = store
            .all_results()
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(store.get_result(1, "alice").await.unwrap().unwrap().id, 1);
    }

    #[tokio::test]
    async fn test_feedback_and_average_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let report_id = {
            let store = FjallReportStore::open(dir.path()).unwrap();
            let result = store.create_result(new_result("alice")).await.unwrap();
            store
                .submit_feedback(result.id, "bob", submission(4, 4, 4))
                .await
                .unwrap();
            result.id
        };

        let store = FjallReportStore::open(dir.path()).unwrap();
        let report = store.get_result(report_id, "alice").await.unwrap().unwrap();
        assert_eq!(report.avg_feedback_score, 4.0);
        assert_eq!(store.feedback_for(report_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_result_visible_only_to_owner() {
        let (_dir, store) = store();
        let result = store.create_result(new_result("alice")).await.unwrap();

        assert!(store.get_result(result.id, "alice").await.unwrap().is_some());
        assert!(store.get_result(result.id, "bob").await.unwrap().is_none());
        assert!(store.get_result(999, "alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_results_for_user_newest_first() {
        let (_dir, store) = store();
        store.create_result(new_result("alice")).await.unwrap();
        store.create_result(new_result("bob")).await.unwrap();
        store.create_result(new_result("alice")).await.unwrap();

        let ids: Vec<u64> = store
            .results_for_user("alice")
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[tokio::test]
    async fn test_feedback_updates_average() {
        let (_dir, store) = store();
        let result = store.create_result(new_result("alice")).await.unwrap();

        let (_, report) = store
            .submit_feedback(result.id, "alice", submission(5, 4, 4))
            .await
            .unwrap();
        assert_eq!(report.avg_feedback_score, 4.33);

        let (_, report) = store
            .submit_feedback(result.id, "bob", submission(3, 3, 3))
            .await
            .unwrap();
        assert!((report.avg_feedback_score - 3.665).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_second_feedback_replaces_first() {
        let (_dir, store) = store();
        let result = store.create_result(new_result("alice")).await.unwrap();

        store
            .submit_feedback(result.id, "bob", submission(1, 1, 1))
            .await
            .unwrap();
        let (_, report) = store
            .submit_feedback(result.id, "bob", submission(5, 5, 5))
            .await
            .unwrap();

        assert_eq!(store.feedback_for(result.id).await.unwrap().len(), 1);
        assert_eq!(report.avg_feedback_score, 5.0);
    }

    #[tokio::test]
    async fn test_feedback_for_missing_report() {
        let (_dir, store) = store();
        let result = store.submit_feedback(42, "bob", submission(3, 3, 3)).await;
        assert!(matches!(result, Err(CitySenseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_invalid_feedback_rejected() {
        let (_dir, store) = store();
        let result = store.create_result(new_result("alice")).await.unwrap();
        let outcome = store
            .submit_feedback(result.id, "bob", submission(6, 3, 3))
            .await;
        assert!(matches!(outcome, Err(CitySenseError::Validation { .. })));
    }
}
