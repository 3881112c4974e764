use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_STEPS: usize = 50;
pub const DEFAULT_PLANNER_RETRIES: u32 = 3;
pub const DEFAULT_BUS_CAPACITY: usize = 128;

/// Tuning for the task loop. The step limit bounds runaway loops from an
/// unreliable planner; the retry budget is forwarded to the planner, which
/// enforces it internally.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_steps: usize,
    pub planner_retries: u32,
    pub bus_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            planner_retries: DEFAULT_PLANNER_RETRIES,
            bus_capacity: DEFAULT_BUS_CAPACITY,
        }
    }
}
