//! Boundary contracts consumed by workflows: one-way notification
//! dispatch and the downstream project-provisioning RPC.
//!
//! Implementations live outside this core (a gRPC-triggered mail
//! worker, a cloud-controller RPC client); workflows only depend on
//! these traits.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::GateResult;

/// Details for the compute-information confirmation mail sent after a
/// cloud account is provisioned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputeInfo {
    pub user_name: String,
    pub project_name: String,
}

/// One-way transactional mail dispatch. Each call returns `Ok(true)`
/// when the worker accepted the message and `Ok(false)` when it
/// reported a failure. Dispatch failures are logged and do not roll
/// back the triggering workflow, except where a workflow explicitly
/// treats them as fatal.
pub trait Notifier: Send + Sync {
    fn activate_user(
        &self,
        email: &str,
        token: &str,
    ) -> impl Future<Output = GateResult<bool>> + Send;

    fn reset_password(
        &self,
        email: &str,
        token: &str,
    ) -> impl Future<Output = GateResult<bool>> + Send;

    fn send_compute_info(
        &self,
        email: &str,
        compute: &ComputeInfo,
    ) -> impl Future<Output = GateResult<bool>> + Send;
}

/// Notifier that only records the dispatch in the log stream. Used
/// when no mail worker is wired up.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn activate_user(&self, email: &str, _token: &str) -> GateResult<bool> {
        info!(email, "activation mail dispatch (log only)");
        Ok(true)
    }

    async fn reset_password(&self, email: &str, _token: &str) -> GateResult<bool> {
        info!(email, "reset-password mail dispatch (log only)");
        Ok(true)
    }

    async fn send_compute_info(&self, email: &str, compute: &ComputeInfo) -> GateResult<bool> {
        info!(email, project = %compute.project_name, "compute-info mail dispatch (log only)");
        Ok(true)
    }
}

/// Result of a successful `create_project` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub project_name: String,
    pub domain_name: Option<String>,
    pub project_dn: Option<String>,
    pub user_dn: Option<String>,
}

/// Downstream cloud-project provisioning RPC. Synchronous from the
/// caller's point of view; the workflow applies the call timeout and
/// maps expiry to a typed `RpcTimeout`. Retries are the external
/// caller's responsibility.
pub trait ProjectProvisioner: Send + Sync {
    fn create_project(
        &self,
        project_name: &str,
        user_name: &str,
    ) -> impl Future<Output = GateResult<ProjectInfo>> + Send;
}
