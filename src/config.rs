use serde::{Deserialize, Serialize};

use webpilot_debugger::DebuggerConfig;
use webpilot_task_engine::EngineConfig;

/// Application configuration; every field has a working default so a missing
/// config file is not an error.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PilotConfig {
    pub engine: EngineConfig,
    pub debugger: DebuggerConfig,
}
