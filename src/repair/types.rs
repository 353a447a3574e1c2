use crate::config::{ClusterName, Wiki};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maintenance script that re-indexes pages by id on a single cluster.
pub const REPAIR_SCRIPT: &str = "extensions/CirrusSearch/maintenance/ForceSearchIndex.php";

/// One document to re-synchronise on one cluster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepairDirective {
    pub wiki: Wiki,
    pub cluster: ClusterName,
    pub id: u64,
}

impl RepairDirective {
    /// Shell command performing this repair.
    pub fn command_line(&self) -> String {
        format!(
            "php {} --wiki {} --cluster {} --ids {}",
            REPAIR_SCRIPT, self.wiki, self.cluster, self.id
        )
    }
}

impl fmt::Display for RepairDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// How directives are written to the output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirectiveFormat {
    /// One maintenance script invocation per line.
    #[default]
    Command,
    /// One JSON object per line.
    Json,
}
