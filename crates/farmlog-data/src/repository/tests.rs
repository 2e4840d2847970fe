//! Repository Integration Tests
//!
//! Local repositories run against in-memory SQLite; remote repositories run
//! against an in-memory fake record store.

#[cfg(test)]
mod tests {
    use crate::client::{
        DeleteRequest, FetchParams, FetchResponse, GetResponse, MutationResponse, RecordClient, RecordResult,
        RecordsRequest,
    };
    use crate::domain::{
        AreaUnit, Crop, DomainError, DomainResult, Expense, ExpenseCategory, Farm, FieldError, Task, TaskStatus,
    };
    use crate::notify::{NotificationLevel, NotificationQueue};
    use crate::repository::{
        init_db, ExpenseRepository, GuardedFarmRepository, KvStore, LocalOptions, LocalRepository, RemoteRepository,
        Repository, TaskRepository,
    };
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    async fn setup_store() -> KvStore {
        // Use in-memory database for tests
        init_db(&PathBuf::from(":memory:")).await.expect("Failed to init test DB")
    }

    fn local<T: crate::domain::Entity>(store: &KvStore) -> LocalRepository<T> {
        LocalRepository::new(store.clone(), LocalOptions::default())
    }

    // ========================
    // Local repository
    // ========================

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let store = setup_store().await;
        let repo: LocalRepository<Farm> = local(&store);

        let first = repo
            .create(&Farm::new(0, "North", "Fresno", 40.0, AreaUnit::Acres))
            .await
            .expect("Failed to create");
        let second = repo
            .create(&Farm::new(0, "South", "Fresno", 12.5, AreaUnit::Hectares))
            .await
            .expect("Failed to create");

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert!(first.created_at.is_some());
    }

    #[tokio::test]
    async fn test_ids_are_never_reused() {
        let store = setup_store().await;
        let repo: LocalRepository<Farm> = local(&store);

        repo.create(&Farm::new(0, "A", "X", 1.0, AreaUnit::Acres)).await.unwrap();
        let second = repo.create(&Farm::new(0, "B", "X", 1.0, AreaUnit::Acres)).await.unwrap();
        assert!(repo.delete(second.id).await.unwrap());

        let third = repo.create(&Farm::new(0, "C", "X", 1.0, AreaUnit::Acres)).await.unwrap();
        assert_eq!(third.id, 3);
    }

    #[tokio::test]
    async fn test_delete_then_list() {
        let store = setup_store().await;
        let repo: LocalRepository<Crop> = local(&store);

        let crop = Crop::new(0, 1, "Roma", d(2024, 3, 1), d(2024, 7, 1), "A1");
        let created = repo.create(&crop).await.unwrap();

        assert!(repo.delete(created.id).await.expect("Delete failed"));
        assert!(repo.list().await.unwrap().iter().all(|c| c.id != created.id));
        assert!(repo.find_by_id(created.id).await.unwrap().is_none());

        // Nothing left to delete is not an error
        assert!(!repo.delete(created.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = setup_store().await;
        let repo: LocalRepository<Expense> = local(&store);

        let ghost = Expense::new(42, 1, 10.0, ExpenseCategory::Seeds, d(2024, 5, 1));
        let err = repo.update(&ghost).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_replaces_record_and_keeps_created_at() {
        let store = setup_store().await;
        let repo: LocalRepository<Farm> = local(&store);

        let created = repo
            .create(&Farm::new(0, "Original", "Fresno", 10.0, AreaUnit::Acres))
            .await
            .unwrap();

        let mut edited = Farm::new(created.id, "Renamed", "Visalia", 20.0, AreaUnit::Hectares);
        edited.created_at = None;
        let updated = repo.update(&edited).await.expect("Update failed");

        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.unit, AreaUnit::Hectares);
        assert_eq!(updated.created_at, created.created_at);

        let stored = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(stored.location, "Visalia");
    }

    #[tokio::test]
    async fn test_seeded_collection_continues_after_fixture_ids() {
        let store = setup_store().await;
        let repo: LocalRepository<Farm> = LocalRepository::new(
            store.clone(),
            LocalOptions {
                seed_fixtures: true,
                latency: None,
            },
        );

        let farms = repo.list().await.unwrap();
        assert_eq!(farms.len(), 3);

        let created = repo.create(&Farm::new(0, "New", "X", 1.0, AreaUnit::Acres)).await.unwrap();
        assert_eq!(created.id, 4);

        // Seeding happens once; a deleted fixture record stays deleted
        assert!(repo.delete(1).await.unwrap());
        assert_eq!(repo.list().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_unseeded_collection_starts_empty() {
        let store = setup_store().await;
        let repo: LocalRepository<Task> = local(&store);
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_complete_task() {
        let store = setup_store().await;
        let repo: LocalRepository<Task> = local(&store);

        let created = repo.create(&Task::new(0, 1, "Irrigate", d(2024, 5, 3))).await.unwrap();
        assert_eq!(created.status, TaskStatus::Open);

        let done = repo.complete(created.id).await.expect("Complete failed");
        assert!(done.is_completed());

        // Completing twice just writes the same state again
        let again = repo.complete(created.id).await.unwrap();
        assert!(again.is_completed());

        let missing = repo.complete(99).await.unwrap_err();
        assert!(matches!(missing, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_exhausted_id_space_is_an_error() {
        let store = setup_store().await;
        let repo: LocalRepository<Farm> = local(&store);

        let last = vec![Farm::new(u32::MAX, "Last", "X", 1.0, AreaUnit::Acres)];
        store
            .set("farmlog_farms", &serde_json::to_string(&last).unwrap())
            .await
            .unwrap();

        let err = repo
            .create(&Farm::new(0, "Overflow", "X", 1.0, AreaUnit::Acres))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Internal(_)));
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upcoming_with_huge_window() {
        let store = setup_store().await;
        let repo: LocalRepository<Task> = local(&store);
        repo.create(&Task::new(0, 1, "Far off", d(2090, 1, 1))).await.unwrap();

        let upcoming = repo.upcoming(u32::MAX, d(2024, 5, 1)).await.unwrap();
        assert_eq!(upcoming.len(), 1);
    }

    #[tokio::test]
    async fn test_upcoming_window_is_inclusive() {
        let store = setup_store().await;
        let repo: LocalRepository<Task> = local(&store);
        let today = d(2024, 5, 1);

        for (title, due) in [
            ("yesterday", d(2024, 4, 30)),
            ("today", d(2024, 5, 1)),
            ("last day", d(2024, 5, 8)),
            ("too late", d(2024, 5, 9)),
            ("done", d(2024, 5, 2)),
        ] {
            let created = repo.create(&Task::new(0, 1, title, due)).await.unwrap();
            if title == "done" {
                repo.complete(created.id).await.unwrap();
            }
        }

        let upcoming = repo.upcoming(7, today).await.unwrap();
        let titles: Vec<&str> = upcoming.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["today", "last day"]);
    }

    #[tokio::test]
    async fn test_monthly_total_only_counts_that_month() {
        let store = setup_store().await;
        let repo: LocalRepository<Expense> = local(&store);

        for (amount, date) in [(10.0, d(2024, 5, 31)), (20.0, d(2024, 4, 30)), (30.0, d(2024, 6, 1)), (5.5, d(2024, 5, 1))] {
            repo.create(&Expense::new(0, 1, amount, ExpenseCategory::Labor, date))
                .await
                .unwrap();
        }

        let total = repo.monthly_total(2024, 5).await.unwrap();
        assert!((total - 15.5).abs() < f64::EPSILON);
        assert_eq!(repo.monthly_total(2023, 5).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_list_by_farm() {
        let store = setup_store().await;
        let repo: LocalRepository<Crop> = local(&store);

        repo.create(&Crop::new(0, 1, "Roma", d(2024, 3, 1), d(2024, 7, 1), "A")).await.unwrap();
        repo.create(&Crop::new(0, 2, "Fuji", d(2024, 3, 1), d(2024, 9, 1), "B")).await.unwrap();
        repo.create(&Crop::new(0, 1, "Kale", d(2024, 3, 1), d(2024, 5, 1), "C")).await.unwrap();

        let crops = repo.list_by_farm(1).await.unwrap();
        assert_eq!(crops.len(), 2);
        assert!(crops.iter().all(|c| c.farm_id == 1));
    }

    #[tokio::test]
    async fn test_collections_are_independent() {
        let store = setup_store().await;
        let farms: LocalRepository<Farm> = local(&store);
        let tasks: LocalRepository<Task> = local(&store);

        farms.create(&Farm::new(0, "A", "X", 1.0, AreaUnit::Acres)).await.unwrap();
        let task = tasks.create(&Task::new(0, 1, "T", d(2024, 5, 1))).await.unwrap();
        assert_eq!(task.id, 1);
    }

    // ========================
    // Remote repository
    // ========================

    /// In-memory record store honoring `where` clauses
    #[derive(Default)]
    struct FakeClient {
        tables: Mutex<HashMap<String, Vec<Value>>>,
        next_id: Mutex<u32>,
        reject_reads: bool,
        scripted: Mutex<Option<MutationResponse>>,
        last_query: Mutex<Option<FetchParams>>,
    }

    impl FakeClient {
        fn rejecting_reads() -> Self {
            Self {
                reject_reads: true,
                ..Self::default()
            }
        }

        fn script(&self, response: MutationResponse) {
            *self.scripted.lock().unwrap() = Some(response);
        }

        fn insert(&self, table: &str, record: Value) -> Value {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            let mut record = record;
            record["Id"] = json!(*next);
            self.tables
                .lock()
                .unwrap()
                .entry(table.to_string())
                .or_default()
                .push(record.clone());
            record
        }

        fn raw(&self, table: &str) -> Vec<Value> {
            self.tables.lock().unwrap().get(table).cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl RecordClient for FakeClient {
        async fn fetch_records(&self, table: &str, params: &FetchParams) -> DomainResult<FetchResponse> {
            *self.last_query.lock().unwrap() = Some(params.clone());
            if self.reject_reads {
                return Ok(FetchResponse {
                    success: false,
                    data: vec![],
                    message: Some("Table is locked".to_string()),
                });
            }
            let data = self.raw(table).into_iter().filter(|r| params.matches(r)).collect();
            Ok(FetchResponse {
                success: true,
                data,
                message: None,
            })
        }

        async fn get_record_by_id(&self, table: &str, id: u32, _params: &FetchParams) -> DomainResult<GetResponse> {
            let data = self.raw(table).into_iter().find(|r| r["Id"] == json!(id));
            Ok(GetResponse { data })
        }

        async fn create_record(&self, table: &str, request: &RecordsRequest) -> DomainResult<MutationResponse> {
            if let Some(response) = self.scripted.lock().unwrap().take() {
                return Ok(response);
            }
            let results = request
                .records
                .iter()
                .map(|r| RecordResult {
                    success: true,
                    data: Some(self.insert(table, r.clone())),
                    ..RecordResult::default()
                })
                .collect();
            Ok(MutationResponse {
                success: true,
                results,
                message: None,
            })
        }

        async fn update_record(&self, table: &str, request: &RecordsRequest) -> DomainResult<MutationResponse> {
            let mut tables = self.tables.lock().unwrap();
            let rows = tables.entry(table.to_string()).or_default();
            let results = request
                .records
                .iter()
                .map(|r| match rows.iter_mut().find(|row| row["Id"] == r["Id"]) {
                    Some(row) => {
                        *row = r.clone();
                        RecordResult {
                            success: true,
                            data: Some(r.clone()),
                            ..RecordResult::default()
                        }
                    }
                    None => RecordResult {
                        success: false,
                        message: Some("Record not found".to_string()),
                        ..RecordResult::default()
                    },
                })
                .collect();
            Ok(MutationResponse {
                success: true,
                results,
                message: None,
            })
        }

        async fn delete_record(&self, table: &str, request: &DeleteRequest) -> DomainResult<MutationResponse> {
            let mut tables = self.tables.lock().unwrap();
            let rows = tables.entry(table.to_string()).or_default();
            let results = request
                .record_ids
                .iter()
                .map(|id| {
                    let before = rows.len();
                    rows.retain(|row| row["Id"] != json!(id));
                    RecordResult {
                        success: rows.len() != before,
                        message: (rows.len() == before).then(|| "Record not found".to_string()),
                        ..RecordResult::default()
                    }
                })
                .collect();
            Ok(MutationResponse {
                success: true,
                results,
                message: None,
            })
        }
    }

    fn remote<T: crate::domain::Entity>(client: &Arc<FakeClient>, queue: &Arc<NotificationQueue>) -> RemoteRepository<T> {
        let client: Arc<dyn RecordClient> = client.clone();
        RemoteRepository::new(Some(client), queue.clone())
    }

    #[tokio::test]
    async fn test_remote_create_and_list() {
        let client = Arc::new(FakeClient::default());
        let queue = Arc::new(NotificationQueue::new());
        let repo: RemoteRepository<Farm> = remote(&client, &queue);

        let created = repo
            .create(&Farm::new(77, "North", "Fresno", 40.0, AreaUnit::Acres))
            .await
            .expect("Failed to create");
        assert_eq!(created.id, 1, "collaborator assigns the id");

        let farms = repo.list().await.unwrap();
        assert_eq!(farms.len(), 1);
        assert_eq!(farms[0].name, "North");

        let query = client.last_query.lock().unwrap().clone().unwrap();
        assert!(query.fields.iter().any(|f| f == "Id"));
        assert!(query.where_clauses.is_empty());
    }

    #[tokio::test]
    async fn test_remote_without_client() {
        let queue = Arc::new(NotificationQueue::new());
        let repo: RemoteRepository<Crop> = RemoteRepository::new(None, queue.clone());

        assert!(repo.list().await.unwrap().is_empty());
        assert!(repo.find_by_id(1).await.unwrap().is_none());

        let crop = Crop::new(0, 1, "Roma", d(2024, 3, 1), d(2024, 7, 1), "A1");
        let err = repo.create(&crop).await.unwrap_err();
        assert!(matches!(err, DomainError::Unavailable(_)));
        assert!(queue.is_empty(), "unavailable is logged, not shown");
    }

    #[tokio::test]
    async fn test_remote_fetch_rejection_is_fail_soft() {
        let client = Arc::new(FakeClient::rejecting_reads());
        let queue = Arc::new(NotificationQueue::new());
        let repo: RemoteRepository<Task> = remote(&client, &queue);

        let tasks = repo.list().await.expect("reads never fail");
        assert!(tasks.is_empty());

        let notes = queue.drain();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, NotificationLevel::Error);
        assert_eq!(notes[0].message, "Table is locked");
    }

    #[tokio::test]
    async fn test_remote_partial_batch_takes_first_success() {
        let client = Arc::new(FakeClient::default());
        let queue = Arc::new(NotificationQueue::new());
        let repo: RemoteRepository<Expense> = remote(&client, &queue);

        client.script(MutationResponse {
            success: true,
            results: vec![
                RecordResult {
                    success: false,
                    errors: vec![
                        FieldError {
                            field_label: "amount".to_string(),
                            message: "must be positive".to_string(),
                        },
                        FieldError {
                            field_label: "date".to_string(),
                            message: "is required".to_string(),
                        },
                    ],
                    ..RecordResult::default()
                },
                RecordResult {
                    success: true,
                    data: Some(json!({"Id": 7, "farmId": 1, "amount": 12.0, "category": "Seeds", "date": "2024-05-01"})),
                    ..RecordResult::default()
                },
                RecordResult {
                    success: true,
                    data: Some(json!({"Id": 8, "farmId": 1, "amount": 99.0, "category": "Other", "date": "2024-05-02"})),
                    ..RecordResult::default()
                },
            ],
            message: None,
        });

        let expense = Expense::new(0, 1, 12.0, ExpenseCategory::Seeds, d(2024, 5, 1));
        let created = repo.create(&expense).await.expect("one record succeeded");
        assert_eq!(created.id, 7);

        let messages: Vec<String> = queue.drain().into_iter().map(|n| n.message).collect();
        assert_eq!(messages, vec!["amount: must be positive", "date: is required"]);
    }

    #[tokio::test]
    async fn test_remote_rejected_batch_is_persistence_error() {
        let client = Arc::new(FakeClient::default());
        let queue = Arc::new(NotificationQueue::new());
        let repo: RemoteRepository<Expense> = remote(&client, &queue);

        client.script(MutationResponse {
            success: true,
            results: vec![RecordResult {
                success: false,
                message: Some("Duplicate expense".to_string()),
                ..RecordResult::default()
            }],
            message: None,
        });

        let expense = Expense::new(0, 1, 12.0, ExpenseCategory::Seeds, d(2024, 5, 1));
        match repo.create(&expense).await.unwrap_err() {
            DomainError::Persistence { failures, .. } => assert_eq!(failures.len(), 1),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(queue.drain()[0].message, "Duplicate expense");

        client.script(MutationResponse {
            success: false,
            results: vec![],
            message: Some("Quota exceeded".to_string()),
        });
        let err = repo.create(&expense).await.unwrap_err();
        assert!(matches!(err, DomainError::Persistence { .. }));
        assert_eq!(queue.drain()[0].message, "Quota exceeded");
    }

    #[tokio::test]
    async fn test_remote_update_and_delete() {
        let client = Arc::new(FakeClient::default());
        let queue = Arc::new(NotificationQueue::new());
        let repo: RemoteRepository<Task> = remote(&client, &queue);

        let created = repo.create(&Task::new(0, 1, "Prune", d(2024, 5, 3))).await.unwrap();
        let done = repo.complete(created.id).await.expect("Complete failed");
        assert_eq!(done.status, TaskStatus::Completed);

        // The legacy flag is still written for older readers
        assert_eq!(client.raw("tasks")[0]["completed"], json!(true));

        assert!(repo.delete(created.id).await.unwrap());
        assert!(!repo.delete(created.id).await.unwrap());
        assert!(queue.is_empty(), "deleting a missing record is not reported");
        assert!(repo.find_by_id(created.id).await.unwrap().is_none());

        let ghost = Task::new(50, 1, "Ghost", d(2024, 5, 3));
        assert!(matches!(
            repo.update(&ghost).await.unwrap_err(),
            DomainError::Persistence { .. }
        ));
    }

    #[tokio::test]
    async fn test_remote_queries_use_where_clauses() {
        let client = Arc::new(FakeClient::default());
        let queue = Arc::new(NotificationQueue::new());
        let tasks: RemoteRepository<Task> = remote(&client, &queue);
        let expenses: RemoteRepository<Expense> = remote(&client, &queue);

        client.insert("tasks", json!({"farmId": 1, "title": "a", "dueDate": "2024-05-01", "status": "Open"}));
        client.insert("tasks", json!({"farmId": 2, "title": "b", "dueDate": "2024-05-08", "completed": false}));
        client.insert("tasks", json!({"farmId": 1, "title": "c", "dueDate": "2024-05-09", "status": "Open"}));
        client.insert("tasks", json!({"farmId": 1, "title": "d", "dueDate": "2024-05-02", "completed": true}));

        let by_farm = tasks.list_by_farm(1).await.unwrap();
        assert_eq!(by_farm.len(), 3);

        let upcoming = tasks.upcoming(7, d(2024, 5, 1)).await.unwrap();
        let titles: Vec<&str> = upcoming.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b"]);

        client.insert("expenses", json!({"farmId": 1, "amount": 10, "category": "Seeds", "date": "2024-02-29"}));
        client.insert("expenses", json!({"farmId": 1, "amount": 20, "category": "Labor", "date": "2024-03-01"}));
        let total = expenses.monthly_total(2024, 2).await.unwrap();
        assert_eq!(total, 10.0);
    }

    // ========================
    // Farm deletion guard
    // ========================

    #[tokio::test]
    async fn test_guard_blocks_farm_with_dependents() {
        let store = setup_store().await;
        let farms: Arc<LocalRepository<Farm>> = Arc::new(local(&store));
        let crops: Arc<LocalRepository<Crop>> = Arc::new(local(&store));
        let tasks: Arc<LocalRepository<Task>> = Arc::new(local(&store));
        let expenses: Arc<LocalRepository<Expense>> = Arc::new(local(&store));
        let guarded = GuardedFarmRepository::new(farms.clone(), crops.clone(), tasks, expenses);

        let busy = guarded.create(&Farm::new(0, "Busy", "X", 1.0, AreaUnit::Acres)).await.unwrap();
        let idle = guarded.create(&Farm::new(0, "Idle", "X", 1.0, AreaUnit::Acres)).await.unwrap();
        crops
            .create(&Crop::new(0, busy.id, "Roma", d(2024, 3, 1), d(2024, 7, 1), "A"))
            .await
            .unwrap();

        let err = guarded.delete(busy.id).await.unwrap_err();
        match err {
            DomainError::Conflict(msg) => assert!(msg.contains("1 crop(s)")),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(farms.find_by_id(busy.id).await.unwrap().is_some());

        assert!(guarded.delete(idle.id).await.unwrap());
        assert_eq!(guarded.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_guard_keeps_farm_when_dependents_cannot_be_read() {
        let client = Arc::new(FakeClient::rejecting_reads());
        let queue = Arc::new(NotificationQueue::new());
        client.insert("farms", json!({"name": "Busy", "location": "X", "size": 1.0, "unit": "acres"}));
        client.insert(
            "crops",
            json!({"farmId": 1, "variety": "Roma", "plantingDate": "2024-03-01",
                   "expectedHarvest": "2024-07-01", "field": "A", "status": "planted"}),
        );

        let farms: Arc<RemoteRepository<Farm>> = Arc::new(remote(&client, &queue));
        let crops: Arc<RemoteRepository<Crop>> = Arc::new(remote(&client, &queue));
        let tasks: Arc<RemoteRepository<Task>> = Arc::new(remote(&client, &queue));
        let expenses: Arc<RemoteRepository<Expense>> = Arc::new(remote(&client, &queue));
        let guarded = GuardedFarmRepository::new(farms, crops, tasks, expenses);

        let err = guarded.delete(1).await.unwrap_err();
        assert!(matches!(err, DomainError::Fetch(_)), "unexpected error: {:?}", err);
        assert_eq!(client.raw("farms").len(), 1);
        assert_eq!(client.raw("crops").len(), 1);
    }

    #[tokio::test]
    async fn test_guard_without_client_refuses_delete() {
        let queue = Arc::new(NotificationQueue::new());
        let guarded = GuardedFarmRepository::new(
            Arc::new(RemoteRepository::<Farm>::new(None, queue.clone())),
            Arc::new(RemoteRepository::<Crop>::new(None, queue.clone())),
            Arc::new(RemoteRepository::<Task>::new(None, queue.clone())),
            Arc::new(RemoteRepository::<Expense>::new(None, queue.clone())),
        );

        let err = guarded.delete(1).await.unwrap_err();
        assert!(matches!(err, DomainError::Unavailable(_)));
    }
}
