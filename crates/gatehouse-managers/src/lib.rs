//! Gatehouse Managers — workflow orchestration over the identity
//! store, directory client, token codec, and notification boundary:
//! principal resolution and authorization, user and partner
//! lifecycle, cloud-account provisioning, and the periodic
//! maintenance runner.

pub mod config;
pub mod partners;
pub mod principal;
pub mod provisioning;
pub mod tasks;
pub mod users;
pub mod validate;

pub use config::ManagerConfig;
pub use partners::PartnerManager;
pub use principal::{UserIdentity, check_user};
pub use provisioning::ProvisioningManager;
pub use tasks::{PeriodicJob, PeriodicRunner, PurgeDeletedUsers};
pub use users::UserManager;
