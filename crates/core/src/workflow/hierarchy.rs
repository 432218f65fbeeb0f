//! Reporting lines between users.
//!
//! Manager links form a forest. Storage does not enforce that, so every
//! assignment is checked here before it is written.

use std::collections::{HashMap, HashSet};

use outlay_shared::types::UserId;

use crate::workflow::error::WorkflowError;

/// In-memory view of a company's `user -> manager` links.
#[derive(Debug, Clone, Default)]
pub struct ManagerHierarchy {
    managers: HashMap<UserId, UserId>,
}

impl ManagerHierarchy {
    /// Creates an empty hierarchy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a hierarchy from `(user, manager)` pairs as stored.
    ///
    /// Pairs are taken as-is; use [`Self::assign`] to add checked links.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (UserId, Option<UserId>)>) -> Self {
        let managers = pairs
            .into_iter()
            .filter_map(|(user, manager)| manager.map(|m| (user, m)))
            .collect();
        Self { managers }
    }

    /// Direct manager of `user`.
    #[must_use]
    pub fn manager_of(&self, user: UserId) -> Option<UserId> {
        self.managers.get(&user).copied()
    }

    /// Checks that giving `user` the manager `manager` keeps the forest acyclic.
    ///
    /// Clearing a manager (`None`) is always allowed.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::ManagerCycle` when `manager` is `user` itself
    /// or already reports to `user`, directly or transitively.
    pub fn validate_assignment(
        &self,
        user: UserId,
        manager: Option<UserId>,
    ) -> Result<(), WorkflowError> {
        let Some(manager) = manager else {
            return Ok(());
        };
        let cycle = WorkflowError::ManagerCycle {
            user_id: user,
            manager_id: manager,
        };
        if manager == user {
            return Err(cycle);
        }

        // Walk up from the proposed manager; meeting `user` closes a loop.
        let mut visited = HashSet::new();
        let mut current = manager;
        while let Some(next) = self.manager_of(current) {
            if next == user {
                return Err(cycle);
            }
            if !visited.insert(next) {
                // Pre-existing loop that does not involve `user`.
                break;
            }
            current = next;
        }
        Ok(())
    }

    /// Sets or clears the manager of `user` after validating it.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::ManagerCycle` and leaves the hierarchy
    /// unchanged when the assignment would create a loop.
    pub fn assign(&mut self, user: UserId, manager: Option<UserId>) -> Result<(), WorkflowError> {
        self.validate_assignment(user, manager)?;
        match manager {
            Some(manager) => self.managers.insert(user, manager),
            None => self.managers.remove(&user),
        };
        Ok(())
    }

    /// Managers above `user`, nearest first.
    #[must_use]
    pub fn chain_of(&self, user: UserId) -> Vec<UserId> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([user]);
        let mut current = user;
        while let Some(next) = self.manager_of(current) {
            if !seen.insert(next) {
                break;
            }
            chain.push(next);
            current = next;
        }
        chain
    }

    /// Users whose direct manager is `manager`.
    #[must_use]
    pub fn direct_reports(&self, manager: UserId) -> Vec<UserId> {
        self.managers
            .iter()
            .filter(|&(_, m)| *m == manager)
            .map(|(user, _)| *user)
            .collect()
    }

    /// Number of direct reports of `manager`.
    #[must_use]
    pub fn team_size(&self, manager: UserId) -> usize {
        self.managers.values().filter(|m| **m == manager).count()
    }
}
