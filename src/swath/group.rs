use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::swath::{SwathManager, SwathMode};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SwathGroup {
    pub id: String,
    pub name: String,
    pub mode: SwathMode,
    pub swath_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    members: HashSet<String>,
    #[serde(skip)]
    sequence: u64,
}

impl SwathGroup {
    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }

    fn link(&mut self, swath_id: &str) -> bool {
        if !self.members.insert(swath_id.to_string()) {
            return false;
        }
        self.swath_ids.push(swath_id.to_string());
        true
    }

    fn unlink(&mut self, swath_id: &str) -> bool {
        if !self.members.remove(swath_id) {
            return false;
        }
        // members are appended in order, so evictions hit the front
        if let Some(pos) = self.swath_ids.iter().position(|id| id == swath_id) {
            self.swath_ids.remove(pos);
        }
        true
    }
}

/// Outcome of a membership consistency pass.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SyncReport {
    pub linked: usize,
    pub orphaned: usize,
    pub pruned: usize,
}

/// Bookkeeping for swath groups. At most one realtime group is active.
#[derive(Debug, Default)]
pub struct SwathGroupManager {
    groups: HashMap<String, SwathGroup>,
    current_realtime: Option<String>,
    next_sequence: u64,
}

impl SwathGroupManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an active group. A realtime request joins the running realtime
    /// group when there is one.
    pub fn create_group(&mut self, mode: SwathMode, name: Option<String>) -> String {
        if mode == SwathMode::RealtimeTracking {
            return self.open_realtime_group(name);
        }
        self.insert_group(mode, name)
    }

    fn insert_group(&mut self, mode: SwathMode, name: Option<String>) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let name = name.unwrap_or_else(|| format!("{} {}", mode, created_at.format("%H:%M:%S")));

        self.groups.insert(
            id.clone(),
            SwathGroup {
                id: id.clone(),
                name,
                mode,
                swath_ids: Vec::new(),
                members: HashSet::new(),
                created_at,
                ended_at: None,
                sequence: self.next_sequence,
            },
        );
        self.next_sequence += 1;
        log::debug!("Created {} group {}", mode, id);
        id
    }

    /// Mark a group ended. Ending an ended group changes nothing; unknown ids
    /// return `false`.
    pub fn end_group(&mut self, id: &str) -> bool {
        let Some(group) = self.groups.get_mut(id) else {
            return false;
        };
        if group.ended_at.is_none() {
            group.ended_at = Some(Utc::now());
            log::debug!("Ended group {}", id);
        }
        if self.current_realtime.as_deref() == Some(id) {
            self.current_realtime = None;
        }
        true
    }

    /// Delete a group and every swath that belongs to it.
    pub fn remove_group(&mut self, id: &str, swaths: &mut SwathManager) -> bool {
        let Some(group) = self.groups.remove(id) else {
            return false;
        };

        let removed = swaths.remove_by_group(id);

        if self.current_realtime.as_deref() == Some(id) {
            self.current_realtime = None;
        }
        log::info!("Removed group {} ({}) with {} swaths", group.name, id, removed);
        true
    }

    /// Id of the active realtime group, creating one when none is active.
    pub fn start_realtime_group(&mut self) -> String {
        self.open_realtime_group(None)
    }

    fn open_realtime_group(&mut self, name: Option<String>) -> String {
        if let Some(id) = self.active_realtime_id() {
            self.current_realtime = Some(id.clone());
            return id;
        }
        let id = self.insert_group(SwathMode::RealtimeTracking, name);
        self.current_realtime = Some(id.clone());
        id
    }

    /// End the current realtime group, returning its id when there was one.
    pub fn end_realtime_group(&mut self) -> Option<String> {
        let id = self.current_realtime.take()?;
        self.end_group(&id);
        Some(id)
    }

    fn active_realtime_id(&self) -> Option<String> {
        if let Some(id) = &self.current_realtime {
            if self.groups.get(id).is_some_and(SwathGroup::is_active) {
                return Some(id.clone());
            }
        }
        self.groups
            .values()
            .find(|g| g.mode == SwathMode::RealtimeTracking && g.is_active())
            .map(|g| g.id.clone())
    }

    #[allow(dead_code)]
    pub fn current_realtime_group(&self) -> Option<&SwathGroup> {
        self.current_realtime
            .as_deref()
            .and_then(|id| self.groups.get(id))
    }

    pub fn get_group(&self, id: &str) -> Option<&SwathGroup> {
        self.groups.get(id)
    }

    /// Link a swath into a group on both sides, moving it out of the group
    /// it was in before. `false` when either is unknown.
    pub fn add_swath_to_group(
        &mut self,
        group_id: &str,
        swath_id: &str,
        swaths: &mut SwathManager,
    ) -> bool {
        if !self.groups.contains_key(group_id) {
            return false;
        }
        let Some(swath) = swaths.get(swath_id) else {
            return false;
        };
        if let Some(previous) = swath.group_id.clone() {
            if previous != group_id {
                if let Some(old) = self.groups.get_mut(&previous) {
                    old.unlink(swath_id);
                }
            }
        }

        swaths.set_group(swath_id, Some(group_id.to_string()));
        if let Some(group) = self.groups.get_mut(group_id) {
            group.link(swath_id);
        }
        true
    }

    /// Delete one swath and drop it from its group's member list.
    pub fn remove_swath(&mut self, swath_id: &str, swaths: &mut SwathManager) -> bool {
        let Some(group_id) = swaths.get(swath_id).map(|s| s.group_id.clone()) else {
            return false;
        };
        if let Some(group) = group_id.and_then(|id| self.groups.get_mut(&id)) {
            group.unlink(swath_id);
        }
        swaths.remove(swath_id)
    }

    /// Active groups first, newest first within each partition.
    pub fn list_groups(&self) -> Vec<&SwathGroup> {
        let mut groups: Vec<_> = self.groups.values().collect();
        groups.sort_by(|a, b| {
            b.is_active()
                .cmp(&a.is_active())
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| b.sequence.cmp(&a.sequence))
        });
        groups
    }

    /// Repair group membership from the group ids recorded on swaths: link
    /// missing members, drop members that are gone or now belong elsewhere,
    /// and count swaths pointing at unknown groups.
    pub fn sync_swaths_from_manager(&mut self, swaths: &SwathManager) -> SyncReport {
        let mut report = SyncReport::default();
        for group in self.groups.values_mut() {
            let stale: Vec<String> = group
                .swath_ids
                .iter()
                .filter(|id| {
                    !swaths
                        .get(id)
                        .is_some_and(|s| s.group_id.as_deref() == Some(group.id.as_str()))
                })
                .cloned()
                .collect();
            for id in stale {
                log::warn!("Group {} dropped stale member {}", group.id, id);
                group.unlink(&id);
                report.pruned += 1;
            }
        }

        for swath in swaths.list() {
            let Some(group_id) = swath.group_id.as_deref() else {
                continue;
            };
            match self.groups.get_mut(group_id) {
                Some(group) => {
                    if group.link(&swath.id) {
                        report.linked += 1;
                    }
                }
                None => {
                    log::warn!(
                        "Swath {} references unknown group {}",
                        swath.id,
                        group_id
                    );
                    report.orphaned += 1;
                }
            }
        }
        report
    }
}
