//! Workflow manager configuration.

use uuid::Uuid;

/// Settings the workflow managers need beyond the auth config.
/// Constructed at startup and passed in explicitly.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Group newly registered users are placed in.
    pub default_group_id: Uuid,
    /// Call deadline for the downstream project-provisioning RPC
    /// (default: 120 s).
    pub project_rpc_timeout_secs: u64,
    /// Soft-deleted users older than this are purged by the periodic
    /// cleanup job (default: 30 days).
    pub purge_retention_secs: u64,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            default_group_id: Uuid::nil(),
            project_rpc_timeout_secs: 120,
            purge_retention_secs: 30 * 24 * 3600,
        }
    }
}
