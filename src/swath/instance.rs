use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use utoipa::ToSchema;

use crate::swath::SwathGeometry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SwathMode {
    Static,
    RealtimeTracking,
    PredictedPath,
    Historical,
    BackendApi,
    CustomGeometry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VisualizationOptions {
    pub color: String,
    pub opacity: f32,
    pub outline: bool,
    pub show_label: bool,
}

impl Default for VisualizationOptions {
    fn default() -> Self {
        Self {
            color: "#00ffff".to_string(),
            opacity: 0.3,
            outline: true,
            show_label: false,
        }
    }
}

impl VisualizationOptions {
    pub fn for_mode(mode: SwathMode) -> Self {
        let color = match mode {
            SwathMode::RealtimeTracking => "#ff4040",
            SwathMode::PredictedPath => "#ffd040",
            SwathMode::Historical => "#8080a0",
            SwathMode::BackendApi => "#40ff80",
            SwathMode::Static | SwathMode::CustomGeometry => "#00ffff",
        };
        Self {
            color: color.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SwathInstance {
    pub id: String,
    pub mode: SwathMode,
    pub geometry: SwathGeometry,
    pub options: VisualizationOptions,
    pub group_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    sequence: u64,
}

/// Owner of every swath instance, grouped or not.
#[derive(Debug, Default)]
pub struct SwathManager {
    swaths: HashMap<String, SwathInstance>,
    next_sequence: u64,
}

impl SwathManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        mode: SwathMode,
        geometry: SwathGeometry,
        options: VisualizationOptions,
        group_id: Option<String>,
    ) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let instance = SwathInstance {
            id: id.clone(),
            mode,
            geometry,
            options,
            group_id,
            created_at: Utc::now(),
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;
        self.swaths.insert(id.clone(), instance);
        id
    }

    pub fn get(&self, id: &str) -> Option<&SwathInstance> {
        self.swaths.get(id)
    }

    /// Swaths in creation order.
    pub fn list(&self) -> Vec<&SwathInstance> {
        let mut swaths: Vec<_> = self.swaths.values().collect();
        swaths.sort_by_key(|s| s.sequence);
        swaths
    }

    pub fn len(&self) -> usize {
        self.swaths.len()
    }

    pub fn set_group(&mut self, id: &str, group_id: Option<String>) -> bool {
        match self.swaths.get_mut(id) {
            Some(swath) => {
                swath.group_id = group_id;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.swaths.remove(id).is_some()
    }

    /// Remove every swath whose group reference is `group_id`.
    pub fn remove_by_group(&mut self, group_id: &str) -> usize {
        let before = self.swaths.len();
        self.swaths
            .retain(|_, s| s.group_id.as_deref() != Some(group_id));
        before - self.swaths.len()
    }

}
