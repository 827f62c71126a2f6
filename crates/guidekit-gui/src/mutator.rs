//! Optimistic list mutation with rollback.
//!
//! Every mutation is applied to the local list before the server call and
//! undone if the call fails:
//!
//! | mutation | local effect | on failure |
//! |----------|--------------|------------|
//! | create | append with `temp-N` id | remove the temporary record |
//! | update | apply patch | drop the patch, replay the rest |
//! | delete | remove | reinsert by natural sort key |
//!
//! Each record with mutations in flight keeps a ledger: the last state the
//! server confirmed plus the pending steps in issue order. The visible record
//! is always the confirmed state with the pending steps replayed, so a
//! rollback removes exactly its own step whatever order the outcomes arrive
//! in. Failures of steps that a newer step has since superseded are reported
//! as `MutationError::Stale` and not surfaced.

use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use guidekit_core::ports::EventEmitter;
use guidekit_core::{CoordinatorEvent, Entity, MutationError, RepositoryError};

use crate::error::GuiError;

/// Prefix of ids assigned to records the server has not confirmed.
pub const TEMP_ID_PREFIX: &str = "temp-";

/// Whether `id` was assigned locally by `begin_create`.
pub fn is_temp_id(id: &str) -> bool {
    id.starts_with(TEMP_ID_PREFIX)
}

/// Refuse server calls addressed to a record whose create is still in flight.
///
/// The server does not know the temporary id, and the record is renamed to
/// its server id once the create settles.
pub(crate) fn require_saved<T: Entity>(id: &str) -> Result<(), GuiError> {
    if is_temp_id(id) {
        return Err(GuiError::Conflict(format!(
            "{} {id} is still being saved",
            T::LABEL
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingKind {
    Create,
    Update,
    Delete,
}

/// An applied mutation awaiting its server outcome.
#[derive(Debug)]
#[must_use = "a pending mutation must be settled"]
pub struct PendingMutation<T> {
    kind: PendingKind,
    id: String,
    stamp: u64,
    failure_message: String,
    record: PhantomData<fn() -> T>,
}

impl<T> PendingMutation<T> {
    /// Id of the affected record (temporary for creates).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Version stamp minted for this mutation.
    pub const fn stamp(&self) -> u64 {
        self.stamp
    }
}

enum Step<P> {
    Patch(P),
    Delete { position: usize },
}

/// Mutations in flight for one record.
struct Ledger<T: Entity> {
    /// Last state the server confirmed; the draft while a create is pending.
    base: T,
    creating: Option<u64>,
    steps: Vec<(u64, Step<T::Patch>)>,
}

impl<T: Entity> Ledger<T> {
    fn confirmed(base: T) -> Self {
        Self {
            base,
            creating: None,
            steps: Vec::new(),
        }
    }

    fn latest(&self) -> Option<u64> {
        self.steps.last().map(|(stamp, _)| *stamp).or(self.creating)
    }

    fn tracks(&self, kind: PendingKind, stamp: u64) -> bool {
        match kind {
            PendingKind::Create => self.creating == Some(stamp),
            PendingKind::Update | PendingKind::Delete => {
                self.steps.iter().any(|(s, _)| *s == stamp)
            }
        }
    }

    fn take(&mut self, stamp: u64) -> Option<Step<T::Patch>> {
        let index = self.steps.iter().position(|(s, _)| *s == stamp)?;
        Some(self.steps.remove(index).1)
    }

    /// The record as it should be displayed, `None` while a delete is pending.
    fn project(&self) -> Option<T> {
        let mut record = self.base.clone();
        for (_, step) in &self.steps {
            match step {
                Step::Patch(patch) => record.apply_patch(patch),
                Step::Delete { .. } => return None,
            }
        }
        Some(record)
    }

    fn is_idle(&self) -> bool {
        self.creating.is_none() && self.steps.is_empty()
    }
}

struct MutatorState<T: Entity> {
    records: Vec<T>,
    ledgers: HashMap<String, Ledger<T>>,
    /// Temporary ids of confirmed creates, mapped to their server ids.
    aliases: HashMap<String, String>,
    next_stamp: u64,
    next_temp: u64,
}

impl<T: Entity> MutatorState<T> {
    fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id() == id)
    }

    fn mint(&mut self) -> u64 {
        self.next_stamp += 1;
        self.next_stamp
    }

    fn resolve(&self, id: &str) -> String {
        self.aliases
            .get(id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    /// Index at which `record` sorts among the current records.
    fn sorted_position(&self, record: &T) -> usize {
        let key = record.sort_key();
        self.records
            .iter()
            .position(|r| r.sort_key() > key)
            .unwrap_or(self.records.len())
    }

    /// Make the list entry for `id` match the ledger's projection.
    fn reconcile(&mut self, id: &str, ledger: &Ledger<T>, deleted_from: Option<usize>) {
        match (self.position(id), ledger.project()) {
            (Some(position), Some(record)) => self.records[position] = record,
            (Some(position), None) => {
                self.records.remove(position);
            }
            (None, Some(record)) => {
                let sorted = self.sorted_position(&record);
                if let Some(original) = deleted_from.filter(|p| *p != sorted) {
                    tracing::warn!(
                        entity = T::LABEL,
                        %id,
                        original,
                        reinserted = sorted,
                        "Delete rollback reinserted at a different position"
                    );
                }
                self.records.insert(sorted, record);
            }
            (None, None) => {}
        }
    }
}

/// An in-memory list of `T` mutated optimistically.
///
/// Critical sections are short and never span a server call; the async
/// wrappers drop the lock before awaiting `send`.
pub struct OptimisticMutator<T: Entity> {
    state: Mutex<MutatorState<T>>,
    emitter: Arc<dyn EventEmitter>,
}

impl<T: Entity> OptimisticMutator<T> {
    pub fn new(emitter: Arc<dyn EventEmitter>) -> Self {
        Self {
            state: Mutex::new(MutatorState {
                records: Vec::new(),
                ledgers: HashMap::new(),
                aliases: HashMap::new(),
                next_stamp: 0,
                next_temp: 0,
            }),
            emitter,
        }
    }

    fn state(&self) -> MutexGuard<'_, MutatorState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn changed(&self, count: usize) {
        self.emitter
            .emit(CoordinatorEvent::records_changed(T::LABEL, count));
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Current records in display order.
    pub fn records(&self) -> Vec<T> {
        self.state().records.clone()
    }

    pub fn get(&self, id: &str) -> Option<T> {
        let state = self.state();
        let id = state.resolve(id);
        state.position(&id).map(|i| state.records[i].clone())
    }

    pub fn len(&self) -> usize {
        self.state().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().records.is_empty()
    }

    /// The server id of a confirmed create, or `id` unchanged.
    pub fn resolve_id(&self, id: &str) -> String {
        self.state().resolve(id)
    }

    /// Replace the whole list with server data.
    ///
    /// In-flight mutations become stale: their rollbacks are discarded.
    pub fn replace_all(&self, records: Vec<T>) {
        let count = {
            let mut state = self.state();
            state.records = records;
            state.ledgers.clear();
            state.aliases.clear();
            state.records.len()
        };
        self.changed(count);
    }

    // =========================================================================
    // Two-phase API
    // =========================================================================

    /// Append `draft` under a fresh temporary id.
    ///
    /// Returns the pending mutation and the record as inserted.
    pub fn begin_create(&self, mut draft: T) -> (PendingMutation<T>, T) {
        let (pending, record, count) = {
            let mut state = self.state();
            state.next_temp += 1;
            let id = format!("{TEMP_ID_PREFIX}{}", state.next_temp);
            draft.set_id(id.clone());
            let stamp = state.mint();
            state.ledgers.insert(
                id.clone(),
                Ledger {
                    base: draft.clone(),
                    creating: Some(stamp),
                    steps: Vec::new(),
                },
            );
            state.records.push(draft.clone());
            let pending = PendingMutation {
                kind: PendingKind::Create,
                id,
                stamp,
                failure_message: format!("Error saving {}.", T::LABEL),
                record: PhantomData,
            };
            (pending, draft, state.records.len())
        };
        self.changed(count);
        (pending, record)
    }

    /// Apply `patch` to record `id`.
    ///
    /// Returns the pending mutation and the patched record.
    pub fn begin_update(
        &self,
        id: &str,
        patch: &T::Patch,
    ) -> Result<(PendingMutation<T>, T), MutationError> {
        self.begin_patch(id, patch, format!("Error saving {}.", T::LABEL))
    }

    /// Remove record `id`.
    pub fn begin_delete(&self, id: &str) -> Result<PendingMutation<T>, MutationError> {
        let (pending, count) = {
            let mut state = self.state();
            let id = state.resolve(id);
            let position = state.position(&id).ok_or_else(|| not_found::<T>(&id))?;
            let removed = state.records.remove(position);
            let stamp = state.mint();
            state
                .ledgers
                .entry(id.clone())
                .or_insert_with(|| Ledger::confirmed(removed))
                .steps
                .push((stamp, Step::Delete { position }));
            let pending = PendingMutation {
                kind: PendingKind::Delete,
                id,
                stamp,
                failure_message: format!("Error deleting {}.", T::LABEL),
                record: PhantomData,
            };
            (pending, state.records.len())
        };
        self.changed(count);
        Ok(pending)
    }

    fn begin_patch(
        &self,
        id: &str,
        patch: &T::Patch,
        failure_message: String,
    ) -> Result<(PendingMutation<T>, T), MutationError> {
        let mut state = self.state();
        let id = state.resolve(id);
        let position = state.position(&id).ok_or_else(|| not_found::<T>(&id))?;
        let confirmed = state.records[position].clone();
        let stamp = state.mint();
        state
            .ledgers
            .entry(id.clone())
            .or_insert_with(|| Ledger::confirmed(confirmed))
            .steps
            .push((stamp, Step::Patch(patch.clone())));
        state.records[position].apply_patch(patch);
        let patched = state.records[position].clone();
        let count = state.records.len();
        drop(state);

        self.changed(count);
        let pending = PendingMutation {
            kind: PendingKind::Update,
            id,
            stamp,
            failure_message,
            record: PhantomData,
        };
        Ok((pending, patched))
    }

    /// Apply the server outcome of a pending mutation.
    ///
    /// `result` carries the authoritative record for creates and updates,
    /// and `None` for deletes. On failure only this mutation's local change
    /// is rolled back; changes of other in-flight mutations are kept.
    pub fn settle(
        &self,
        pending: PendingMutation<T>,
        result: Result<Option<T>, RepositoryError>,
    ) -> Result<Option<T>, MutationError> {
        let PendingMutation {
            kind,
            id,
            stamp,
            failure_message,
            ..
        } = pending;

        let mut state = self.state();
        let key = state.resolve(&id);
        let ledger = match state.ledgers.remove(&key) {
            Some(ledger) if ledger.tracks(kind, stamp) => Some(ledger),
            Some(newer) => {
                state.ledgers.insert(key.clone(), newer);
                None
            }
            None => None,
        };

        let outcome = match (ledger, result) {
            // Retired by `replace_all` or a confirmed delete.
            (None, Ok(confirmed)) => Ok(confirmed),
            (None, Err(cause)) => {
                if kind == PendingKind::Create {
                    if let Some(position) = state.position(&key) {
                        state.records.remove(position);
                    }
                    Err(failed(failure_message, &cause))
                } else {
                    tracing::debug!(entity = T::LABEL, %id, stamp, "Discarding stale rollback");
                    Err(MutationError::Stale { id: id.clone(), stamp })
                }
            }
            (Some(mut ledger), Ok(confirmed)) => {
                // A confirmed delete retires the ledger: later outcomes for
                // this id find nothing to restore.
                if kind != PendingKind::Delete {
                    if kind == PendingKind::Create {
                        ledger.creating = None;
                    } else {
                        ledger.take(stamp);
                    }
                    if let Some(record) = &confirmed {
                        ledger.base = record.clone();
                    }
                    state.reconcile(&key, &ledger, None);

                    let mut key = key;
                    let server_id = ledger.base.id().to_string();
                    if server_id != key {
                        state.aliases.insert(key, server_id.clone());
                        key = server_id;
                    }
                    if !ledger.is_idle() {
                        state.ledgers.insert(key, ledger);
                    }
                }
                Ok(confirmed)
            }
            (Some(mut ledger), Err(cause)) => {
                let current = ledger.latest() == Some(stamp);
                let outcome = if kind == PendingKind::Create {
                    // A failed create never reached the server: always drop it.
                    if let Some(position) = state.position(&key) {
                        state.records.remove(position);
                    }
                    ledger.creating = None;
                    ledger.steps.clear();
                    Err(failed(failure_message, &cause))
                } else {
                    let deleted_from = match ledger.take(stamp) {
                        Some(Step::Delete { position }) => Some(position),
                        _ => None,
                    };
                    state.reconcile(&key, &ledger, deleted_from);
                    if current {
                        Err(failed(failure_message, &cause))
                    } else {
                        tracing::debug!(
                            entity = T::LABEL,
                            %id,
                            stamp,
                            "Superseded mutation failed; newer steps kept"
                        );
                        Err(MutationError::Stale { id: id.clone(), stamp })
                    }
                };
                if !ledger.is_idle() {
                    state.ledgers.insert(key, ledger);
                }
                outcome
            }
        };
        let count = state.records.len();
        drop(state);

        self.changed(count);
        if let Err(e) = &outcome {
            if e.should_surface() {
                tracing::warn!(entity = T::LABEL, %id, error = %e, "Mutation rolled back");
                self.emitter
                    .emit(CoordinatorEvent::mutation_failed(T::LABEL, &id, e.to_string()));
            }
        }
        outcome
    }

    // =========================================================================
    // Async wrappers
    // =========================================================================

    /// Create a record optimistically. `send` receives the temporary record.
    pub async fn create<F, Fut>(&self, draft: T, send: F) -> Result<T, MutationError>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Result<T, RepositoryError>>,
    {
        let (pending, record) = self.begin_create(draft);
        let result = send(record).await.map(Some);
        self.settle(pending, result)?
            .ok_or_else(|| not_found::<T>("created record"))
    }

    /// Patch a record optimistically. `send` receives the patched record.
    pub async fn update<F, Fut>(&self, id: &str, patch: &T::Patch, send: F) -> Result<T, MutationError>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Result<T, RepositoryError>>,
    {
        let (pending, patched) = self.begin_update(id, patch)?;
        let result = send(patched).await.map(Some);
        self.settle(pending, result)?
            .ok_or_else(|| not_found::<T>(id))
    }

    /// Delete a record optimistically. `send` receives the record's id.
    pub async fn delete<F, Fut>(&self, id: &str, send: F) -> Result<(), MutationError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<(), RepositoryError>>,
    {
        let pending = self.begin_delete(id)?;
        let result = send(id.to_string()).await.map(|()| None);
        self.settle(pending, result).map(|_| ())
    }

    /// Flip `published` on a record.
    pub async fn toggle_published<F, Fut>(&self, id: &str, send: F) -> Result<T, MutationError>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Result<T, RepositoryError>>,
    {
        let current = self.get(id).ok_or_else(|| not_found::<T>(id))?;
        let patch = T::published_patch(!current.is_published());
        self.toggle(id, &patch, send).await
    }

    /// Flip `premium` on a record.
    pub async fn toggle_premium<F, Fut>(&self, id: &str, send: F) -> Result<T, MutationError>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Result<T, RepositoryError>>,
    {
        let current = self.get(id).ok_or_else(|| not_found::<T>(id))?;
        let patch = T::premium_patch(!current.is_premium());
        self.toggle(id, &patch, send).await
    }

    async fn toggle<F, Fut>(&self, id: &str, patch: &T::Patch, send: F) -> Result<T, MutationError>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Result<T, RepositoryError>>,
    {
        let (pending, patched) =
            self.begin_patch(id, patch, format!("Error updating {}.", T::LABEL))?;
        let result = send(patched).await.map(Some);
        self.settle(pending, result)?
            .ok_or_else(|| not_found::<T>(id))
    }
}

fn not_found<T: Entity>(id: &str) -> MutationError {
    MutationError::NotFound {
        entity: T::LABEL.to_string(),
        id: id.to_string(),
    }
}

fn failed(message: String, cause: &RepositoryError) -> MutationError {
    MutationError::Failed {
        message,
        cause: cause.to_string(),
        cancelled: cause.is_cancelled(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guidekit_core::ports::NoopEmitter;
    use guidekit_core::{Category, CategoryPatch};

    fn category(id: &str, name: &str) -> Category {
        Category {
            id: id.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn mutator() -> OptimisticMutator<Category> {
        let mutator = OptimisticMutator::new(Arc::new(NoopEmitter::new()));
        mutator.replace_all(vec![
            category("a", "Anxiety"),
            category("m", "Morning"),
            category("s", "Sleep"),
        ]);
        mutator
    }

    fn rename(name: &str) -> CategoryPatch {
        CategoryPatch {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_assigns_sequential_temp_ids() {
        let mutator = mutator();
        let (first, record) = mutator.begin_create(Category::draft("Focus", ""));
        let (second, _) = mutator.begin_create(Category::draft("Calm", ""));
        assert_eq!(first.id(), "temp-1");
        assert_eq!(second.id(), "temp-2");
        assert_eq!(record.id, "temp-1");
        assert_eq!(mutator.records().last().unwrap().id, "temp-2");
        assert!(is_temp_id(first.id()));
    }

    #[test]
    fn test_create_success_replaces_in_place() {
        let mutator = mutator();
        let (pending, _) = mutator.begin_create(Category::draft("Focus", ""));
        let confirmed = mutator
            .settle(pending, Ok(Some(category("srv-9", "Focus"))))
            .unwrap();
        assert_eq!(confirmed.unwrap().id, "srv-9");
        assert_eq!(mutator.records()[3].id, "srv-9");
        assert_eq!(mutator.len(), 4);
    }

    #[test]
    fn test_create_failure_removes_temp_record() {
        let mutator = mutator();
        let before = mutator.records();
        let (pending, _) = mutator.begin_create(Category::draft("Focus", ""));
        let err = mutator
            .settle(pending, Err(RepositoryError::network("500")))
            .unwrap_err();
        assert_eq!(err.to_string(), "Error saving category.");
        assert_eq!(mutator.records(), before);
    }

    #[test]
    fn test_update_failure_restores_snapshot() {
        let mutator = mutator();
        let before = mutator.records();
        let (pending, patched) = mutator.begin_update("m", &rename("Mornings")).unwrap();
        assert_eq!(patched.name, "Mornings");
        assert_eq!(mutator.get("m").unwrap().name, "Mornings");

        let err = mutator
            .settle(pending, Err(RepositoryError::network("500")))
            .unwrap_err();
        assert!(err.should_surface());
        assert_eq!(mutator.records(), before);
    }

    #[test]
    fn test_superseded_update_rollback_is_stale() {
        let mutator = mutator();
        let (first, _) = mutator.begin_update("m", &rename("One")).unwrap();
        let (second, _) = mutator.begin_update("m", &rename("Two")).unwrap();

        let err = mutator
            .settle(first, Err(RepositoryError::network("500")))
            .unwrap_err();
        assert!(matches!(err, MutationError::Stale { .. }));
        assert!(!err.should_surface());
        assert_eq!(mutator.get("m").unwrap().name, "Two");

        mutator
            .settle(second, Ok(Some(category("m", "Two"))))
            .unwrap();
        assert_eq!(mutator.get("m").unwrap().name, "Two");
    }

    #[test]
    fn test_overlapping_failed_updates_restore_confirmed_record() {
        let mutator = mutator();
        let before = mutator.records();
        let (first, _) = mutator.begin_update("m", &rename("One")).unwrap();
        let published = Category::published_patch(true);
        let (second, _) = mutator.begin_update("m", &published).unwrap();

        let err = mutator
            .settle(first, Err(RepositoryError::network("500")))
            .unwrap_err();
        assert!(matches!(err, MutationError::Stale { .. }));
        let record = mutator.get("m").unwrap();
        assert_eq!(record.name, "Morning");
        assert!(record.published);

        let err = mutator
            .settle(second, Err(RepositoryError::network("500")))
            .unwrap_err();
        assert!(err.should_surface());
        assert_eq!(mutator.records(), before);
    }

    #[test]
    fn test_overlapping_failed_updates_newest_first() {
        let mutator = mutator();
        let before = mutator.records();
        let (first, _) = mutator.begin_update("m", &rename("One")).unwrap();
        let (second, _) = mutator.begin_update("m", &rename("Two")).unwrap();

        assert!(
            mutator
                .settle(second, Err(RepositoryError::network("500")))
                .unwrap_err()
                .should_surface()
        );
        assert_eq!(mutator.get("m").unwrap().name, "One");

        assert!(
            mutator
                .settle(first, Err(RepositoryError::network("500")))
                .unwrap_err()
                .should_surface()
        );
        assert_eq!(mutator.records(), before);
    }

    #[test]
    fn test_update_then_delete_both_fail() {
        let mutator = mutator();
        let before = mutator.records();
        let (update, _) = mutator.begin_update("m", &rename("One")).unwrap();
        let delete = mutator.begin_delete("m").unwrap();

        let err = mutator
            .settle(delete, Err(RepositoryError::network("500")))
            .unwrap_err();
        assert_eq!(err.to_string(), "Error deleting category.");
        assert_eq!(mutator.get("m").unwrap().name, "One");

        mutator
            .settle(update, Err(RepositoryError::network("500")))
            .unwrap_err();
        assert_eq!(mutator.records(), before);
    }

    #[test]
    fn test_update_then_delete_both_fail_update_first() {
        let mutator = mutator();
        let before = mutator.records();
        let (update, _) = mutator.begin_update("m", &rename("One")).unwrap();
        let delete = mutator.begin_delete("m").unwrap();

        let err = mutator
            .settle(update, Err(RepositoryError::network("500")))
            .unwrap_err();
        assert!(matches!(err, MutationError::Stale { .. }));
        assert!(mutator.get("m").is_none());

        mutator
            .settle(delete, Err(RepositoryError::network("500")))
            .unwrap_err();
        assert_eq!(mutator.records(), before);
    }

    #[test]
    fn test_failed_create_drops_record_and_its_local_edit() {
        let mutator = mutator();
        let before = mutator.records();
        let (create, _) = mutator.begin_create(Category::draft("Focus", ""));
        let (edit, _) = mutator.begin_update("temp-1", &rename("Deep focus")).unwrap();
        let (other, _) = mutator.begin_update("a", &rename("Worry")).unwrap();

        mutator
            .settle(create, Err(RepositoryError::network("500")))
            .unwrap_err();
        assert!(mutator.get("temp-1").is_none());
        assert_eq!(mutator.len(), 3);
        assert_eq!(mutator.get("a").unwrap().name, "Worry");

        // The edit's outcome arrives after its record is gone.
        assert!(
            mutator
                .settle(edit, Ok(Some(category("temp-1", "Deep focus"))))
                .is_ok()
        );
        assert!(mutator.get("temp-1").is_none());

        mutator
            .settle(other, Err(RepositoryError::network("500")))
            .unwrap_err();
        assert_eq!(mutator.records(), before);
    }

    #[test]
    fn test_create_success_keeps_pending_local_edit() {
        let mutator = mutator();
        let (create, _) = mutator.begin_create(Category::draft("Focus", ""));
        let (edit, _) = mutator.begin_update("temp-1", &rename("Deep focus")).unwrap();

        mutator
            .settle(create, Ok(Some(category("srv-9", "Focus"))))
            .unwrap();
        assert_eq!(mutator.resolve_id("temp-1"), "srv-9");
        assert_eq!(mutator.get("srv-9").unwrap().name, "Deep focus");

        mutator
            .settle(edit, Err(RepositoryError::network("500")))
            .unwrap_err();
        assert_eq!(mutator.get("srv-9").unwrap().name, "Focus");
        assert_eq!(mutator.get("temp-1").unwrap().id, "srv-9");
    }

    #[test]
    fn test_require_saved_rejects_temp_ids() {
        assert!(matches!(
            require_saved::<Category>("temp-3"),
            Err(GuiError::Conflict(_))
        ));
        assert!(require_saved::<Category>("srv-3").is_ok());
    }

    #[test]
    fn test_stale_success_does_not_clobber_newer_edit() {
        let mutator = mutator();
        let (first, _) = mutator.begin_update("m", &rename("One")).unwrap();
        let (_second, _) = mutator.begin_update("m", &rename("Two")).unwrap();
        mutator
            .settle(first, Ok(Some(category("m", "One"))))
            .unwrap();
        assert_eq!(mutator.get("m").unwrap().name, "Two");
    }

    #[test]
    fn test_delete_failure_reinserts_sorted() {
        let mutator = mutator();
        let before = mutator.records();
        let pending = mutator.begin_delete("m").unwrap();
        assert_eq!(mutator.len(), 2);

        let err = mutator
            .settle(pending, Err(RepositoryError::network("500")))
            .unwrap_err();
        assert_eq!(err.to_string(), "Error deleting category.");
        assert_eq!(mutator.records(), before);
    }

    #[test]
    fn test_update_success_after_delete_does_not_resurrect() {
        let mutator = mutator();
        let (update, _) = mutator.begin_update("s", &rename("Sleepy")).unwrap();
        let delete = mutator.begin_delete("s").unwrap();
        mutator.settle(delete, Ok(None)).unwrap();

        mutator
            .settle(update, Ok(Some(category("s", "Sleepy"))))
            .unwrap();
        assert!(mutator.get("s").is_none());
    }

    #[test]
    fn test_replace_all_makes_pending_stale() {
        let mutator = mutator();
        let (pending, _) = mutator.begin_update("a", &rename("Worry")).unwrap();
        mutator.replace_all(vec![category("a", "Anxiety")]);

        let err = mutator
            .settle(pending, Err(RepositoryError::network("500")))
            .unwrap_err();
        assert!(matches!(err, MutationError::Stale { .. }));
        assert_eq!(mutator.get("a").unwrap().name, "Anxiety");
    }

    #[test]
    fn test_cancelled_failure_rolls_back_silently() {
        let mutator = mutator();
        let (pending, _) = mutator.begin_update("a", &rename("Worry")).unwrap();
        let err = mutator
            .settle(pending, Err(RepositoryError::Cancelled))
            .unwrap_err();
        assert!(!err.should_surface());
        assert_eq!(mutator.get("a").unwrap().name, "Anxiety");
    }

    #[test]
    fn test_unknown_id() {
        let mutator = mutator();
        assert!(matches!(
            mutator.begin_delete("zzz"),
            Err(MutationError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_toggle_published_failure_message() {
        let mutator = mutator();
        let err = mutator
            .toggle_published("a", |_| async { Err(RepositoryError::network("down")) })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Error updating category.");
        assert!(!mutator.get("a").unwrap().published);
    }

    #[tokio::test]
    async fn test_toggle_premium_success() {
        let mutator = mutator();
        let updated = mutator
            .toggle_premium("s", |record| async move { Ok(record) })
            .await
            .unwrap();
        assert!(updated.premium);
        assert!(mutator.get("s").unwrap().premium);
    }
}
