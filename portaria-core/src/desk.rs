//! Front desk operations: entry, exit, returning-visitor lookup and the
//! refresh policy that keeps the local list in step with the sheet.
//!
//! Local state is authoritative until the next snapshot lands; a snapshot
//! always replaces the list wholesale.

use std::collections::VecDeque;
use std::time::Duration;

use serde::Serialize;

use crate::format::{digits, now_br, CPF_DIGITS};
use crate::models::{EntryDraft, FieldErrors, SyncStatus, VisitorRecord};
use crate::storage::{LocalStorage, StorageError};
use crate::store::RecordStore;
use crate::sync::{CloudClient, PushOutcome, RefreshTimer, Snapshot, SyncError, TokioTimer};

/// An earlier visit matching the CPF being typed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturningVisitor {
    pub record: VisitorRecord,
    /// Some record with this CPF is still marked inside. Advisory only; the
    /// entry is not blocked.
    pub currently_inside: bool,
}

/// What applying a snapshot changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotSummary {
    /// Number of records now held, or `None` if the visitor list was kept.
    pub records: Option<usize>,
    /// Rows discarded for lacking a CPF.
    pub dropped_rows: usize,
    /// Number of cached responsible parties, or `None` if the cache was kept.
    pub responsibles: Option<usize>,
}

/// Result of a silent refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No webhook configured.
    Disabled,
    Applied(SnapshotSummary),
    /// The pull or the local write failed; the error was logged and the
    /// store left unchanged.
    Failed,
}

pub struct FrontDesk<T = TokioTimer> {
    store: RecordStore,
    cloud: CloudClient,
    timer: T,
    scheduled: VecDeque<Duration>,
}

impl FrontDesk<TokioTimer> {
    /// Loads local records. Works offline; call
    /// [`FrontDesk::startup_refresh`] afterwards to pull the sheet.
    pub fn open(storage: LocalStorage, cloud: CloudClient) -> Result<Self, DeskError> {
        Self::with_timer(storage, cloud, TokioTimer)
    }
}

impl<T: RefreshTimer> FrontDesk<T> {
    pub fn with_timer(storage: LocalStorage, cloud: CloudClient, timer: T) -> Result<Self, DeskError> {
        let store = RecordStore::load(storage)?;
        tracing::debug!("Loaded {} local record(s)", store.len());

        Ok(Self {
            store,
            cloud,
            timer,
            scheduled: VecDeque::new(),
        })
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn cloud(&self) -> &CloudClient {
        &self.cloud
    }

    /// Looks up an earlier visit once the CPF has exactly eleven digits.
    pub fn lookup_returning(&self, cpf: &str) -> Option<ReturningVisitor> {
        let cpf_digits = digits(cpf);
        if cpf_digits.len() != CPF_DIGITS {
            return None;
        }

        let record = self.store.find_by_identifier(&cpf_digits)?.clone();
        let currently_inside = self
            .store
            .records()
            .iter()
            .any(|r| r.is_inside() && digits(&r.identifier) == cpf_digits);

        Some(ReturningVisitor {
            record,
            currently_inside,
        })
    }

    /// Prefills name and phone from an earlier visit and sets the draft's
    /// `returning` flag accordingly.
    pub fn prefill(&self, draft: &mut EntryDraft) -> Option<ReturningVisitor> {
        match self.lookup_returning(&draft.cpf) {
            Some(found) => {
                draft.prefill_from(&found.record);
                Some(found)
            }
            None => {
                draft.returning = false;
                None
            }
        }
    }

    /// Registers a visitor entry and pushes it.
    ///
    /// Validation failures leave the store untouched. A visitor already
    /// marked inside is logged but not rejected.
    pub async fn register_entry(&mut self, draft: &EntryDraft) -> Result<VisitorRecord, DeskError> {
        let errors = draft.validate();
        if errors.any() {
            return Err(DeskError::Invalid(errors));
        }

        if let Some(found) = self.lookup_returning(&draft.cpf) {
            if found.currently_inside {
                tracing::warn!(
                    "CPF {} already has an open entry; registering another one",
                    found.record.identifier
                );
            }
        }

        let record = VisitorRecord::new_entry(
            &draft.full_name,
            &draft.cpf,
            &draft.phone,
            &draft.responsible,
            now_br(),
        );
        tracing::info!("Entry {} for {}", record.id, record.full_name);

        self.store.append(record.clone());
        self.store.persist()?;

        self.push(record).await
    }

    /// Marks a visitor as departed and pushes the updated record.
    pub async fn register_exit(&mut self, id: &str) -> Result<VisitorRecord, DeskError> {
        let current = self
            .store
            .get(id)
            .ok_or_else(|| DeskError::NotFound(id.to_string()))?;
        if !current.is_inside() {
            return Err(DeskError::AlreadyDeparted(id.to_string()));
        }

        let exit_time = now_br();
        let record = self
            .store
            .update_by_id(id, |r| r.mark_departed(exit_time))
            .ok_or_else(|| DeskError::NotFound(id.to_string()))?;
        tracing::info!("Exit {} for {}", record.id, record.full_name);
        self.store.persist()?;

        self.push(record).await
    }

    /// Pushes a record and schedules the follow-up pull. A push that cannot
    /// be sent marks the record as errored; it is not retried.
    async fn push(&mut self, record: VisitorRecord) -> Result<VisitorRecord, DeskError> {
        match self.cloud.push_event(&record).await {
            Ok(PushOutcome::Disabled) => Ok(record),
            Ok(PushOutcome::Dispatched { refresh_after }) => {
                self.scheduled.push_back(refresh_after);
                Ok(record)
            }
            Err(e) => {
                tracing::warn!("Push for {} failed: {}", record.id, e);
                let updated = self
                    .store
                    .update_by_id(&record.id, |r| r.sync_status = SyncStatus::Error)
                    .unwrap_or(record);
                self.store.persist()?;
                Ok(updated)
            }
        }
    }

    /// Silent pull performed when the desk starts.
    pub async fn startup_refresh(&mut self) -> RefreshOutcome {
        if !self.cloud.is_configured() {
            tracing::debug!("Cloud sync disabled, using local records only");
            return RefreshOutcome::Disabled;
        }
        self.refresh().await
    }

    /// Pulls the sheet and applies it. Failures are logged, never returned.
    pub async fn refresh(&mut self) -> RefreshOutcome {
        match self.fetch_snapshot().await {
            Ok(None) => RefreshOutcome::Disabled,
            Ok(Some(snapshot)) => match self.apply_snapshot(&snapshot) {
                Ok(summary) => RefreshOutcome::Applied(summary),
                Err(e) => {
                    tracing::error!("Failed to save snapshot locally: {}", e);
                    RefreshOutcome::Failed
                }
            },
            Err(e) => {
                tracing::warn!("Snapshot pull failed: {}", e);
                RefreshOutcome::Failed
            }
        }
    }

    /// First half of a refresh: fetch without touching the store.
    pub async fn fetch_snapshot(&self) -> Result<Option<Snapshot>, SyncError> {
        self.cloud.pull_snapshot().await
    }

    /// Second half of a refresh: replace the responsible cache and the
    /// record list with the snapshot's, then persist.
    ///
    /// The replacement is unconditional. Local records still pending are
    /// dropped if the snapshot does not contain them yet.
    pub fn apply_snapshot(&mut self, snapshot: &Snapshot) -> Result<SnapshotSummary, DeskError> {
        let mut summary = SnapshotSummary::default();

        if let Some(responsibles) = &snapshot.responsibles {
            self.store.replace_responsibles(responsibles.clone());
            summary.responsibles = Some(responsibles.len());
        }

        if let Some(decoded) = snapshot.decode_visitors() {
            let pending = self
                .store
                .records()
                .iter()
                .filter(|r| r.sync_status != SyncStatus::Synced)
                .count();
            if pending > 0 {
                tracing::debug!("Snapshot replaces {} unsynced local record(s)", pending);
            }

            summary.records = Some(decoded.records.len());
            summary.dropped_rows = decoded.dropped.len();
            self.store.replace_all(decoded.records);
        }

        self.store.persist()?;
        tracing::info!(
            "Applied snapshot: {:?} record(s), {} dropped row(s)",
            summary.records,
            summary.dropped_rows
        );

        Ok(summary)
    }

    /// Number of follow-up pulls waiting to run.
    pub fn scheduled_refreshes(&self) -> usize {
        self.scheduled.len()
    }

    /// Runs every scheduled follow-up pull in order, waiting out each delay
    /// on the timer. Returns how many ran.
    pub async fn run_scheduled_refreshes(&mut self) -> usize {
        let mut ran = 0;
        while let Some(delay) = self.scheduled.pop_front() {
            self.timer.wait(delay).await;
            self.refresh().await;
            ran += 1;
        }
        ran
    }
}

/// Errors returned by front desk operations.
#[derive(Debug)]
pub enum DeskError {
    /// The entry form failed validation
    Invalid(FieldErrors),
    /// No record with this id
    NotFound(String),
    /// The record is already marked as departed
    AlreadyDeparted(String),
    /// Local state could not be read or written
    Storage(StorageError),
}

impl std::fmt::Display for DeskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeskError::Invalid(errors) => write!(f, "{}", errors),
            DeskError::NotFound(id) => write!(f, "Visitor record not found: {}", id),
            DeskError::AlreadyDeparted(id) => {
                write!(f, "Visitor record {} is already marked as departed", id)
            }
            DeskError::Storage(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for DeskError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DeskError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StorageError> for DeskError {
    fn from(e: StorageError) -> Self {
        DeskError::Storage(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VisitorStatus;
    use crate::sync::mock_sheet::MockSheet;
    use serde_json::{json, Value};
    use std::future::Future;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Records requested delays instead of sleeping.
    #[derive(Clone, Default)]
    struct RecordingTimer {
        waits: Arc<Mutex<Vec<Duration>>>,
    }

    impl RefreshTimer for RecordingTimer {
        fn wait(&self, delay: Duration) -> impl Future<Output = ()> + Send {
            self.waits.lock().unwrap().push(delay);
            std::future::ready(())
        }
    }

    fn desk(cloud: CloudClient) -> (FrontDesk<RecordingTimer>, RecordingTimer, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let timer = RecordingTimer::default();
        let desk = FrontDesk::with_timer(
            LocalStorage::new(temp_dir.path().to_path_buf()),
            cloud,
            timer.clone(),
        )
        .unwrap();
        (desk, timer, temp_dir)
    }

    fn draft(cpf: &str) -> EntryDraft {
        EntryDraft::new()
            .with_full_name("joe")
            .with_cpf(cpf)
            .with_phone("11999998888")
            .with_responsible("Ana")
    }

    fn sheet_row(cpf: &str, status: &str) -> Value {
        json!(["2024-01-01 10:00", "JOE", cpf, "5511999999999", status, "", "Ana"])
    }

    fn sheet(rows: Vec<Value>) -> Value {
        let mut table = vec![json!(["Entrada", "Nome", "CPF", "Tel", "Status", "Saída", "Resp"])];
        table.extend(rows);
        json!({ "responsibles": ["Ana", "Bruno"], "visitors": table })
    }

    #[tokio::test]
    async fn test_entry_offline() {
        let (mut desk, _timer, _temp) = desk(CloudClient::disabled());

        let record = desk.register_entry(&draft("12345678901")).await.unwrap();

        assert_eq!(desk.store().len(), 1);
        assert_eq!(record.status, VisitorStatus::Inside);
        assert_eq!(record.sync_status, SyncStatus::Pending);
        assert_eq!(record.full_name, "JOE");
        assert!(record.exit_time.is_none());
        assert_eq!(desk.scheduled_refreshes(), 0);
    }

    #[tokio::test]
    async fn test_entry_is_persisted() {
        let (mut desk, _timer, temp) = desk(CloudClient::disabled());
        desk.register_entry(&draft("12345678901")).await.unwrap();

        let reopened = FrontDesk::open(
            LocalStorage::new(temp.path().to_path_buf()),
            CloudClient::disabled(),
        )
        .unwrap();
        assert_eq!(reopened.store().records(), desk.store().records());
    }

    #[tokio::test]
    async fn test_invalid_entry_does_not_mutate() {
        let (mut desk, _timer, temp) = desk(CloudClient::disabled());

        let missing_responsible = EntryDraft {
            responsible: String::new(),
            ..draft("12345678901")
        };
        for bad in [
            draft("1234567890"),
            draft("12345678901").with_phone("119999"),
            EntryDraft {
                full_name: " ".to_string(),
                ..draft("12345678901")
            },
            missing_responsible,
        ] {
            match desk.register_entry(&bad).await {
                Err(DeskError::Invalid(errors)) => assert!(errors.any()),
                other => panic!("expected validation error, got {:?}", other),
            }
        }

        assert!(desk.store().is_empty());
        assert!(!temp.path().join("access_control_visitors.json").exists());
    }

    #[tokio::test]
    async fn test_exit_flips_only_target() {
        let (mut desk, _timer, _temp) = desk(CloudClient::disabled());
        let first = desk.register_entry(&draft("11111111111")).await.unwrap();
        let second = desk.register_entry(&draft("22222222222")).await.unwrap();

        let exited = desk.register_exit(&first.id).await.unwrap();

        assert_eq!(exited.status, VisitorStatus::Departed);
        assert!(!exited.exit_time.as_deref().unwrap_or_default().is_empty());
        assert_eq!(exited.sync_status, SyncStatus::Pending);
        assert_eq!(desk.store().get(&second.id).unwrap(), &second);
        assert_eq!(desk.store().records()[1].id, first.id);
    }

    #[tokio::test]
    async fn test_exit_errors() {
        let (mut desk, _timer, _temp) = desk(CloudClient::disabled());
        assert!(matches!(
            desk.register_exit("missing").await,
            Err(DeskError::NotFound(_))
        ));

        let record = desk.register_entry(&draft("11111111111")).await.unwrap();
        desk.register_exit(&record.id).await.unwrap();
        assert!(matches!(
            desk.register_exit(&record.id).await,
            Err(DeskError::AlreadyDeparted(_))
        ));
    }

    #[tokio::test]
    async fn test_returning_lookup_requires_eleven_digits() {
        let (mut desk, _timer, _temp) = desk(CloudClient::disabled());
        let mut previous = draft("12345678901");
        previous.full_name = "MARIA".to_string();
        desk.register_entry(&previous).await.unwrap();

        assert!(desk.lookup_returning("1234567890").is_none());
        assert!(desk.lookup_returning("123456789012").is_none());

        let found = desk.lookup_returning("123.456.789-01").unwrap();
        assert_eq!(found.record.full_name, "MARIA");
        assert!(found.currently_inside);
    }

    #[tokio::test]
    async fn test_prefill_sets_and_clears_returning_flag() {
        let (mut desk, _timer, _temp) = desk(CloudClient::disabled());
        let record = desk.register_entry(&draft("12345678901")).await.unwrap();
        desk.register_exit(&record.id).await.unwrap();

        let mut form = EntryDraft::new().with_cpf("12345678901");
        let found = desk.prefill(&mut form).unwrap();
        assert!(form.returning);
        assert_eq!(form.full_name, "JOE");
        assert_eq!(form.phone, "(11) 99999-8888");
        assert!(!found.currently_inside);

        form.cpf = "123.456.789-0".to_string();
        assert!(desk.prefill(&mut form).is_none());
        assert!(!form.returning);
    }

    #[tokio::test]
    async fn test_prefill_ignores_twelve_digit_cpf() {
        let (mut desk, _timer, _temp) = desk(CloudClient::disabled());
        let mut previous = draft("12345678901");
        previous.full_name = "MARIA".to_string();
        desk.register_entry(&previous).await.unwrap();

        let mut form = EntryDraft::new().with_cpf("123456789012");
        assert!(desk.prefill(&mut form).is_none());
        assert!(!form.returning);
        assert!(form.full_name.is_empty());

        let overlong = draft("123456789012");
        assert!(matches!(
            desk.register_entry(&overlong).await,
            Err(DeskError::Invalid(errors)) if errors.cpf
        ));
        assert_eq!(desk.store().len(), 1);
    }

    #[tokio::test]
    async fn test_double_submit_is_allowed() {
        let (mut desk, _timer, _temp) = desk(CloudClient::disabled());

        let a = desk.register_entry(&draft("12345678901")).await.unwrap();
        let b = desk.register_entry(&draft("12345678901")).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(desk.store().active().len(), 2);
    }

    #[tokio::test]
    async fn test_startup_refresh_replaces_local_state() {
        let mock = MockSheet::new(sheet(vec![
            sheet_row("12345678901", "Dentro"),
            sheet_row("", "Dentro"),
            sheet_row("98765432100", "Saiu"),
        ]));
        let (mut desk, _timer, _temp) = desk(CloudClient::new(Some(mock.spawn().await)));

        let outcome = desk.startup_refresh().await;

        assert_eq!(
            outcome,
            RefreshOutcome::Applied(SnapshotSummary {
                records: Some(2),
                dropped_rows: 1,
                responsibles: Some(2),
            })
        );
        assert_eq!(desk.store().responsibles(), ["Ana".to_string(), "Bruno".to_string()]);
        assert_eq!(desk.store().active().len(), 1);
        assert!(desk
            .store()
            .records()
            .iter()
            .all(|r| r.sync_status == SyncStatus::Synced));
    }

    #[tokio::test]
    async fn test_startup_refresh_disabled() {
        let (mut desk, _timer, _temp) = desk(CloudClient::disabled());
        assert_eq!(desk.startup_refresh().await, RefreshOutcome::Disabled);
    }

    #[tokio::test]
    async fn test_failed_pull_leaves_store_unchanged() {
        let mock = MockSheet::new(sheet(vec![sheet_row("12345678901", "Dentro")]));
        mock.set_pull_status(axum::http::StatusCode::BAD_GATEWAY);
        let (mut desk, _timer, _temp) = desk(CloudClient::new(Some(mock.spawn().await)));
        desk.register_entry(&draft("22222222222")).await.unwrap();
        let before = desk.store().records().to_vec();

        assert_eq!(desk.refresh().await, RefreshOutcome::Failed);
        assert_eq!(desk.store().records(), &before[..]);
    }

    #[tokio::test]
    async fn test_header_only_snapshot_keeps_records() {
        let (mut desk, _timer, _temp) = desk(CloudClient::disabled());
        desk.register_entry(&draft("12345678901")).await.unwrap();

        let summary = desk
            .apply_snapshot(&Snapshot {
                responsibles: Some(vec!["Carla".to_string()]),
                visitors: Some(vec![vec![json!("header")]]),
            })
            .unwrap();

        assert_eq!(summary.records, None);
        assert_eq!(desk.store().len(), 1);
        assert_eq!(desk.store().responsibles(), ["Carla".to_string()]);
    }

    #[tokio::test]
    async fn test_push_schedules_one_follow_up_pull() {
        let mock = MockSheet::new(sheet(vec![sheet_row("12345678901", "Dentro")]));
        let cloud = CloudClient::new(Some(mock.spawn().await))
            .with_refresh_delay(Duration::from_millis(1500));
        let (mut desk, timer, _temp) = desk(cloud);

        desk.register_entry(&draft("12345678901")).await.unwrap();
        assert_eq!(mock.pushes().len(), 1);
        assert_eq!(mock.pushes()[0]["action"], "ENTRADA");
        assert_eq!(desk.scheduled_refreshes(), 1);
        assert_eq!(mock.pull_count(), 0);

        assert_eq!(desk.run_scheduled_refreshes().await, 1);
        assert_eq!(mock.pull_count(), 1);
        assert_eq!(*timer.waits.lock().unwrap(), vec![Duration::from_millis(1500)]);
        assert_eq!(desk.store().records()[0].sync_status, SyncStatus::Synced);

        assert_eq!(desk.run_scheduled_refreshes().await, 0);
        assert_eq!(mock.pull_count(), 1);
    }

    #[tokio::test]
    async fn test_exit_pushes_saida() {
        let mock = MockSheet::new(sheet(vec![]));
        let (mut desk, _timer, _temp) = desk(CloudClient::new(Some(mock.spawn().await)));

        let record = desk.register_entry(&draft("12345678901")).await.unwrap();
        desk.register_exit(&record.id).await.unwrap();

        let pushes = mock.pushes();
        assert_eq!(pushes.len(), 2);
        assert_eq!(pushes[1]["action"], "SAIDA");
        assert_eq!(pushes[1]["status"], "Saiu");
        assert_ne!(pushes[1]["exitTime"], "");
        assert_eq!(desk.scheduled_refreshes(), 2);
    }

    #[tokio::test]
    async fn test_failed_push_marks_error() {
        let cloud = CloudClient::new(Some("http://127.0.0.1:1/exec".to_string()));
        let (mut desk, _timer, _temp) = desk(cloud);

        let record = desk.register_entry(&draft("12345678901")).await.unwrap();

        assert_eq!(record.sync_status, SyncStatus::Error);
        assert_eq!(desk.store().records()[0].sync_status, SyncStatus::Error);
        assert_eq!(desk.scheduled_refreshes(), 0);
    }

    #[tokio::test]
    async fn test_stale_snapshot_overwrites_local_entry() {
        let mock = MockSheet::new(sheet(vec![sheet_row("98765432100", "Dentro")]));
        let (mut desk, _timer, _temp) = desk(CloudClient::new(Some(mock.spawn().await)));

        // Snapshot taken before the entry exists in the sheet.
        let stale = desk.fetch_snapshot().await.unwrap().unwrap();
        let entry = desk.register_entry(&draft("12345678901")).await.unwrap();
        assert!(desk.store().get(&entry.id).is_some());

        desk.apply_snapshot(&stale).unwrap();

        assert!(desk.store().get(&entry.id).is_none());
        assert_eq!(desk.store().len(), 1);
        assert_eq!(desk.store().records()[0].identifier, "98765432100");
    }
}
