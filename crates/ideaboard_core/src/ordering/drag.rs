//! Drag session tracking.
//!
//! A session starts when a note is picked up and ends on drop or cancel.
//! At most one session is active; a second `start` either fails or replaces
//! the old session, depending on [`DragConflictPolicy`].

use super::{NoteOrdering, OrderingError};
use crate::model::category::CategoryId;
use crate::model::note::NoteId;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Policy applied when a drag starts while another is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragConflictPolicy {
    /// Fail the new session with `ConcurrentSession`.
    #[default]
    Reject,
    /// Drop the old session and start the new one.
    CancelPrevious,
}

impl DragConflictPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reject => "reject",
            Self::CancelPrevious => "cancel_previous",
        }
    }
}

/// Outcome of a successful `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragStart {
    Started,
    /// The named session was cancelled to make room.
    Replaced(NoteId),
}

/// Mutation a drop resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// Drop without a valid target; nothing changes.
    Nothing,
    /// Reorder inside one lane.
    Reorder {
        category_id: CategoryId,
        from: usize,
        to: usize,
    },
    /// Move into another lane at the over note's index.
    Move {
        from_category: CategoryId,
        to_category: CategoryId,
        index: usize,
    },
}

/// Single active drag session guard.
#[derive(Debug, Clone, Default)]
pub struct DragTracker {
    policy: DragConflictPolicy,
    active: Option<NoteId>,
}

impl DragTracker {
    pub fn new(policy: DragConflictPolicy) -> Self {
        Self {
            policy,
            active: None,
        }
    }

    /// Note id of the active session.
    pub fn active(&self) -> Option<NoteId> {
        self.active
    }

    /// Begins a session for `note_id`.
    ///
    /// Restarting the session that is already active is accepted as-is.
    pub fn start(&mut self, note_id: NoteId) -> Result<DragStart, OrderingError> {
        match self.active {
            None => {
                self.active = Some(note_id);
                Ok(DragStart::Started)
            }
            Some(active) if active == note_id => Ok(DragStart::Started),
            Some(active) => match self.policy {
                DragConflictPolicy::Reject => {
                    debug!(
                        "event=drag_start module=ordering status=rejected active={} requested={}",
                        active, note_id
                    );
                    Err(OrderingError::ConcurrentSession {
                        active,
                        requested: note_id,
                    })
                }
                DragConflictPolicy::CancelPrevious => {
                    info!(
                        "event=drag_start module=ordering status=replaced cancelled={} requested={}",
                        active, note_id
                    );
                    self.active = Some(note_id);
                    Ok(DragStart::Replaced(active))
                }
            },
        }
    }

    /// Ends the session owned by `note_id`.
    ///
    /// A mismatched id keeps the current session alive.
    pub fn finish(&mut self, note_id: NoteId) -> Result<(), OrderingError> {
        match self.active {
            None => Err(OrderingError::NoActiveSession),
            Some(active) if active != note_id => Err(OrderingError::SessionMismatch {
                active,
                requested: note_id,
            }),
            Some(_) => {
                self.active = None;
                Ok(())
            }
        }
    }

    /// Ends any session without a mutation.
    pub fn cancel(&mut self) -> Option<NoteId> {
        self.active.take()
    }
}

/// Resolves a drop of `active_id` over `over_id` against current lanes.
pub fn resolve_drop(
    ordering: &NoteOrdering,
    active_id: NoteId,
    over_id: Option<NoteId>,
) -> Result<DropTarget, OrderingError> {
    let over_id = match over_id {
        Some(over_id) if over_id != active_id => over_id,
        _ => return Ok(DropTarget::Nothing),
    };

    let (from_category, from) = ordering
        .position(active_id)
        .ok_or(OrderingError::NoteNotFound(active_id))?;
    let (to_category, to) = ordering
        .position(over_id)
        .ok_or(OrderingError::NoteNotFound(over_id))?;

    if from_category == to_category {
        Ok(DropTarget::Reorder {
            category_id: from_category,
            from,
            to,
        })
    } else {
        Ok(DropTarget::Move {
            from_category,
            to_category,
            index: to,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{resolve_drop, DragConflictPolicy, DragStart, DragTracker, DropTarget};
    use crate::ordering::{NoteOrdering, OrderingError};
    use uuid::Uuid;

    #[test]
    fn reject_policy_refuses_second_session() {
        let mut tracker = DragTracker::new(DragConflictPolicy::Reject);
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        assert_eq!(tracker.start(first), Ok(DragStart::Started));
        let err = tracker.start(second).expect_err("second session must fail");
        assert_eq!(
            err,
            OrderingError::ConcurrentSession {
                active: first,
                requested: second
            }
        );
        assert_eq!(tracker.active(), Some(first));
    }

    #[test]
    fn cancel_previous_policy_replaces_session() {
        let mut tracker = DragTracker::new(DragConflictPolicy::CancelPrevious);
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        tracker.start(first).expect("first session");
        assert_eq!(tracker.start(second), Ok(DragStart::Replaced(first)));
        assert_eq!(tracker.active(), Some(second));
        assert_eq!(
            tracker.finish(first),
            Err(OrderingError::SessionMismatch {
                active: second,
                requested: first
            })
        );
    }

    #[test]
    fn finish_without_session_fails() {
        let mut tracker = DragTracker::default();
        assert_eq!(
            tracker.finish(Uuid::new_v4()),
            Err(OrderingError::NoActiveSession)
        );
    }

    #[test]
    fn resolve_drop_without_target_is_nothing() {
        let ordering = NoteOrdering::new();
        let active = Uuid::new_v4();
        assert_eq!(
            resolve_drop(&ordering, active, None),
            Ok(DropTarget::Nothing)
        );
        assert_eq!(
            resolve_drop(&ordering, active, Some(active)),
            Ok(DropTarget::Nothing)
        );
    }

    #[test]
    fn resolve_drop_distinguishes_reorder_and_move() {
        let mut ordering = NoteOrdering::new();
        let left = Uuid::new_v4();
        let right = Uuid::new_v4();
        ordering.add_lane(left);
        ordering.add_lane(right);
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        ordering.insert(left, a, None).expect("insert a");
        ordering.insert(left, b, None).expect("insert b");
        ordering.insert(right, c, None).expect("insert c");

        assert_eq!(
            resolve_drop(&ordering, a, Some(b)),
            Ok(DropTarget::Reorder {
                category_id: left,
                from: 0,
                to: 1
            })
        );
        assert_eq!(
            resolve_drop(&ordering, b, Some(c)),
            Ok(DropTarget::Move {
                from_category: left,
                to_category: right,
                index: 0
            })
        );
    }
}
