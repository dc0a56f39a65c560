//! Undo/redo transaction log
//!
//! Transform edits are grouped into composite transactions so that one
//! gizmo drag over many entities undoes as a single step.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{HISTORY_LIMIT, INSPECTOR_TRANSFORM_LABEL};
use crate::scene::SceneAccess;
use crate::transform::{EntityId, Xform};

/// Misuse of the composite transaction protocol
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error("composite transaction '{0}' is already open")]
    AlreadyOpen(String),
    #[error("no composite transaction is open")]
    NotOpen,
}

/// Before/after transform of a single entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformRecord {
    pub id: EntityId,
    pub before: Xform,
    pub after: Xform,
}

/// Group of transform records undone and redone as one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeTransaction {
    pub label: String,
    pub records: Vec<TransformRecord>,
}

impl CompositeTransaction {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, record: TransformRecord) {
        self.records.push(record);
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    fn apply_before(&self, scene: &mut dyn SceneAccess) {
        for record in self.records.iter().rev() {
            if !scene.set_transform(record.id, record.before) {
                tracing::warn!("Undo skipped missing entity {}", record.id);
            }
        }
    }

    fn apply_after(&self, scene: &mut dyn SceneAccess) {
        for record in &self.records {
            if !scene.set_transform(record.id, record.after) {
                tracing::warn!("Redo skipped missing entity {}", record.id);
            }
        }
    }
}

/// Undo/redo stacks of composite transactions
#[derive(Debug)]
pub struct TransactionLog {
    undo_stack: Vec<CompositeTransaction>,
    redo_stack: Vec<CompositeTransaction>,
    open: Option<CompositeTransaction>,
    limit: usize,
}

impl Default for TransactionLog {
    fn default() -> Self {
        Self::with_limit(HISTORY_LIMIT)
    }
}

impl TransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a log keeping at most `limit` undo steps
    pub fn with_limit(limit: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            open: None,
            limit: limit.max(1),
        }
    }

    /// Open a composite transaction
    pub fn begin_composite(&mut self, label: impl Into<String>) -> Result<(), HistoryError> {
        if let Some(open) = &self.open {
            return Err(HistoryError::AlreadyOpen(open.label.clone()));
        }
        self.open = Some(CompositeTransaction::new(label));
        Ok(())
    }

    /// Append a record to the open composite
    pub fn push(&mut self, record: TransformRecord) -> Result<(), HistoryError> {
        let open = self.open.as_mut().ok_or(HistoryError::NotOpen)?;
        open.push(record);
        Ok(())
    }

    /// Close the open composite.
    ///
    /// Returns whether a transaction was pushed; empty composites are
    /// dropped.
    pub fn end_composite(&mut self) -> Result<bool, HistoryError> {
        let open = self.open.take().ok_or(HistoryError::NotOpen)?;
        if open.is_empty() {
            tracing::debug!("Dropped empty transaction '{}'", open.label);
            return Ok(false);
        }
        self.push_undo(open);
        Ok(true)
    }

    /// Push an already built transaction through the composite protocol
    pub fn commit(&mut self, transaction: CompositeTransaction) -> Result<bool, HistoryError> {
        self.begin_composite(transaction.label)?;
        for record in transaction.records {
            self.push(record)?;
        }
        self.end_composite()
    }

    /// Record a single transform edit made outside the viewport
    pub fn record_inspector_edit(
        &mut self,
        id: EntityId,
        before: Xform,
        after: Xform,
    ) -> Result<bool, HistoryError> {
        if before == after {
            return Ok(false);
        }
        let mut transaction = CompositeTransaction::new(INSPECTOR_TRANSFORM_LABEL);
        transaction.push(TransformRecord { id, before, after });
        self.commit(transaction)
    }

    fn push_undo(&mut self, transaction: CompositeTransaction) {
        tracing::debug!(
            "Recorded '{}' ({} entities)",
            transaction.label,
            transaction.len()
        );
        self.redo_stack.clear();
        self.undo_stack.push(transaction);
        if self.undo_stack.len() > self.limit {
            self.undo_stack.remove(0);
        }
    }

    /// Revert the latest transaction; returns its label
    pub fn undo(&mut self, scene: &mut dyn SceneAccess) -> Option<String> {
        let transaction = self.undo_stack.pop()?;
        transaction.apply_before(scene);
        let label = transaction.label.clone();
        self.redo_stack.push(transaction);
        Some(label)
    }

    /// Re-apply the latest undone transaction; returns its label
    pub fn redo(&mut self, scene: &mut dyn SceneAccess) -> Option<String> {
        let transaction = self.redo_stack.pop()?;
        transaction.apply_after(scene);
        let label = transaction.label.clone();
        self.undo_stack.push(transaction);
        Some(label)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_label(&self) -> Option<&str> {
        self.undo_stack.last().map(|t| t.label.as_str())
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.redo_stack.last().map(|t| t.label.as_str())
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Number of undoable transactions
    pub fn len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.open = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;
    use glam::Vec3;

    fn moved(id: EntityId, from: Vec3, to: Vec3) -> TransformRecord {
        TransformRecord {
            id,
            before: Xform::from_position(from),
            after: Xform::from_position(to),
        }
    }

    #[test]
    fn test_empty_composite_is_not_pushed() {
        let mut log = TransactionLog::new();
        log.begin_composite("Translate").unwrap();
        assert_eq!(log.end_composite(), Ok(false));
        assert!(!log.can_undo());
    }

    #[test]
    fn test_protocol_misuse_is_reported() {
        let mut log = TransactionLog::new();
        assert_eq!(log.push(moved(EntityId(1), Vec3::ZERO, Vec3::X)), Err(HistoryError::NotOpen));
        assert_eq!(log.end_composite(), Err(HistoryError::NotOpen));
        log.begin_composite("Rotate").unwrap();
        assert_eq!(
            log.begin_composite("Scale"),
            Err(HistoryError::AlreadyOpen("Rotate".into()))
        );
    }

    #[test]
    fn test_undo_redo_restores_transforms() {
        let mut scene = Scene::new();
        let a = scene.spawn("A", Xform::IDENTITY).unwrap();
        let b = scene.spawn("B", Xform::IDENTITY).unwrap();

        scene.set_transform(a, Xform::from_position(Vec3::X));
        scene.set_transform(b, Xform::from_position(Vec3::Y));
        let mut transaction = CompositeTransaction::new("Translate");
        transaction.push(moved(a, Vec3::ZERO, Vec3::X));
        transaction.push(moved(b, Vec3::ZERO, Vec3::Y));

        let mut log = TransactionLog::new();
        assert_eq!(log.commit(transaction), Ok(true));
        assert_eq!(log.undo_label(), Some("Translate"));

        assert_eq!(log.undo(&mut scene).as_deref(), Some("Translate"));
        assert_eq!(scene.transform(a).unwrap().position, Vec3::ZERO);
        assert_eq!(scene.transform(b).unwrap().position, Vec3::ZERO);
        assert!(log.can_redo());

        assert_eq!(log.redo(&mut scene).as_deref(), Some("Translate"));
        assert_eq!(scene.transform(a).unwrap().position, Vec3::X);
        assert_eq!(scene.transform(b).unwrap().position, Vec3::Y);
    }

    #[test]
    fn test_new_transaction_clears_redo() {
        let mut scene = Scene::new();
        let a = scene.spawn("A", Xform::IDENTITY).unwrap();
        let mut log = TransactionLog::new();
        log.record_inspector_edit(a, Xform::IDENTITY, Xform::from_position(Vec3::X))
            .unwrap();
        log.undo(&mut scene);
        assert!(log.can_redo());
        log.record_inspector_edit(a, Xform::IDENTITY, Xform::from_position(Vec3::Z))
            .unwrap();
        assert!(!log.can_redo());
        assert_eq!(log.undo_label(), Some(INSPECTOR_TRANSFORM_LABEL));
    }

    #[test]
    fn test_unchanged_inspector_edit_is_ignored() {
        let mut log = TransactionLog::new();
        assert_eq!(
            log.record_inspector_edit(EntityId(1), Xform::IDENTITY, Xform::IDENTITY),
            Ok(false)
        );
        assert!(log.is_empty());
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut log = TransactionLog::with_limit(2);
        for i in 0..3 {
            let mut transaction = CompositeTransaction::new(format!("Step {i}"));
            transaction.push(moved(EntityId(1), Vec3::ZERO, Vec3::X));
            log.commit(transaction).unwrap();
        }
        assert_eq!(log.len(), 2);
        let mut scene = Scene::new();
        assert_eq!(log.undo(&mut scene).as_deref(), Some("Step 2"));
        assert_eq!(log.undo(&mut scene).as_deref(), Some("Step 1"));
        assert_eq!(log.undo(&mut scene), None);
    }
}
