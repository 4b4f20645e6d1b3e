//! Duplicate detection at creation time

use pbs_api::{Conflict, PbsError, Result, ShortcutId, TagId};

use crate::config::ConflictAction;

/// Decision for a single conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    MergeExisting,
    MergeIncoming,
    CancelOne,
    CancelAll,
}

impl Resolution {
    /// Fixed resolution for a configured action; `None` for `Ask`
    pub fn from_action(action: ConflictAction) -> Option<Self> {
        match action {
            ConflictAction::Ask => None,
            ConflictAction::MergeExisting => Some(Resolution::MergeExisting),
            ConflictAction::MergeIncoming => Some(Resolution::MergeIncoming),
            ConflictAction::CancelOne => Some(Resolution::CancelOne),
            ConflictAction::CancelAll => Some(Resolution::CancelAll),
        }
    }
}

/// Interactive collaborator consulted when the policy is `Ask`
pub trait ConflictResolver {
    fn resolve(&mut self, conflict: &Conflict) -> Resolution;
}

/// Resolver that always answers the same thing
#[derive(Debug, Clone, Copy)]
pub struct FixedResolver(pub Resolution);

impl ConflictResolver for FixedResolver {
    fn resolve(&mut self, _conflict: &Conflict) -> Resolution {
        self.0
    }
}

/// Result of a create call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<Id> {
    Created(Id),
    /// Resolved into this existing entity
    Merged(Id),
    Skipped,
}

impl<Id: Copy> Outcome<Id> {
    /// The entity now standing for the request, if any
    pub fn id(&self) -> Option<Id> {
        match self {
            Outcome::Created(id) | Outcome::Merged(id) => Some(*id),
            Outcome::Skipped => None,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Outcome::Created(_))
    }
}

pub(crate) enum Decision<Id> {
    Merge { existing: Id, incoming_wins: bool },
    Skip,
}

/// Turn a detected conflict into a decision, asking the resolver when required.
pub(crate) fn decide<Id: Copy>(
    conflict: Conflict,
    existing: Id,
    action: ConflictAction,
    resolver: Option<&mut Box<dyn ConflictResolver>>,
) -> Result<Decision<Id>> {
    tracing::warn!("Conflict: {}", conflict);
    let resolution = match Resolution::from_action(action) {
        Some(resolution) => resolution,
        None => match resolver {
            Some(resolver) => resolver.resolve(&conflict),
            None => return Err(PbsError::Conflict { conflict }),
        },
    };
    Ok(match resolution {
        Resolution::MergeExisting => Decision::Merge {
            existing,
            incoming_wins: false,
        },
        Resolution::MergeIncoming => Decision::Merge {
            existing,
            incoming_wins: true,
        },
        Resolution::CancelOne => Decision::Skip,
        Resolution::CancelAll => {
            return Err(PbsError::Cancelled {
                reason: conflict.to_string(),
            })
        }
    })
}

pub(crate) fn tag_conflict(parent: TagId, existing: TagId, name: &str) -> Conflict {
    Conflict::Tag {
        parent,
        existing,
        name: name.to_string(),
    }
}

pub(crate) fn shortcut_conflict(existing: ShortcutId, identity: String) -> Conflict {
    Conflict::Shortcut { existing, identity }
}
