use super::store::Capacities;
use crate::schedule::types::Day;

use serde::{Deserialize, Serialize};

// --- API Endpoints ---

pub const ENDPOINT_CAPACITIES: &str = "/api/capacities";
/// Managers only.
pub const ENDPOINT_SET_CAPACITY: &str = "/api/admin/capacity";

// --- Data Transfer Objects ---

/// Days left out are not changed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SetCapacityRequest {
    #[serde(default)]
    pub wed: Option<u32>,
    #[serde(default)]
    pub fri: Option<u32>,
}

impl From<SetCapacityRequest> for Capacities {
    fn from(req: SetCapacityRequest) -> Self {
        Capacities {
            wed: req.wed,
            fri: req.fri,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityResponse {
    pub success: bool,
    pub wed: Option<u32>,
    pub fri: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub newly_confirmed: Vec<Day>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CapacityResponse {
    pub fn of(capacities: Capacities) -> Self {
        Self {
            success: true,
            wed: capacities.wed,
            fri: capacities.fri,
            newly_confirmed: Vec::new(),
            message: None,
        }
    }
}
