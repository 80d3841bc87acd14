//! Per-operation request context.
//!
//! One context is constructed per inbound operation, carries the
//! resolved principals (request user and target user), accumulates
//! structured errors and warnings, and is discarded when the
//! operation completes. It is exclusively owned by the handling task
//! and never persisted.

use serde_json::json;

use crate::error::GateError;
use crate::models::user::User;
use crate::roles::Role;

/// A structured error attached to a context: the typed error plus the
/// HTTP-style status the boundary layer should surface.
#[derive(Debug)]
pub struct ContextError {
    pub error: GateError,
    pub status: u16,
}

impl ContextError {
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "message": self.error.to_string(),
            "code": self.status,
        })
    }
}

#[derive(Debug, Default)]
pub struct RequestContext {
    task: String,
    /// The authenticated caller, when token checking is required.
    pub request_user: Option<User>,
    /// The principal being acted upon.
    pub target_user: Option<User>,
    require_auth: bool,
    principals_resolved: bool,
    errors: Vec<ContextError>,
    warnings: Vec<ContextError>,
    status: Option<u16>,
}

impl RequestContext {
    pub fn new(task: impl Into<String>, require_auth: bool) -> Self {
        Self {
            task: task.into(),
            require_auth,
            ..Default::default()
        }
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn require_auth(&self) -> bool {
        self.require_auth
    }

    /// Mark principal resolution done. Called once by the workflow
    /// layer after `request_user`/`target_user` are loaded.
    pub fn principals_resolved(&mut self) {
        self.principals_resolved = true;
    }

    pub fn has_resolved_principals(&self) -> bool {
        self.principals_resolved
    }

    // -- error/warning accumulation ------------------------------------

    /// Replace the current error list with `error` and set the
    /// response status.
    pub fn set_error(&mut self, error: GateError, status: u16) {
        self.clear_error();
        self.add_error(error, status);
    }

    /// Append an error without clearing what is already attached.
    pub fn add_error(&mut self, error: GateError, status: u16) {
        self.errors.push(ContextError { error, status });
        self.status = Some(status);
    }

    /// Attach an error using its default status mapping.
    pub fn fail(&mut self, error: GateError) {
        let status = error.status();
        self.set_error(error, status);
    }

    pub fn clear_error(&mut self) {
        self.errors.clear();
        self.status = None;
    }

    pub fn set_warning(&mut self, warning: GateError) {
        let status = warning.status();
        self.warnings.push(ContextError { error: warning, status });
    }

    pub fn failed(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn succeeded(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = Some(status);
    }

    pub fn errors(&self) -> &[ContextError] {
        &self.errors
    }

    pub fn warnings(&self) -> &[ContextError] {
        &self.warnings
    }

    /// First attached error, for callers that short-circuit.
    pub fn error(&self) -> Option<&GateError> {
        self.errors.first().map(|e| &e.error)
    }

    /// Render accumulated errors as the structured response body.
    pub fn error_json(&self) -> Option<serde_json::Value> {
        if self.errors.is_empty() {
            return None;
        }
        Some(json!(self.errors.iter().map(ContextError::to_json).collect::<Vec<_>>()))
    }

    // -- principal predicates ------------------------------------------

    /// True when the request acts on a different principal than the
    /// caller. A missing side counts as a mismatch.
    pub fn is_cross_request(&self) -> bool {
        let request_id = self.request_user.as_ref().map(|u| u.id);
        let target_id = self.target_user.as_ref().map(|u| u.id);
        request_id != target_id
    }

    pub fn is_self_request(&self) -> bool {
        !self.is_cross_request()
    }

    /// Whether the request user's role is in the allow-list. `None`
    /// when no request user is resolved.
    pub fn request_user_has_role(&self, allowed: &[Role]) -> Option<bool> {
        self.request_user
            .as_ref()
            .map(|u| allowed.contains(&u.role))
    }

    pub fn is_admin_request(&self) -> bool {
        self.request_user
            .as_ref()
            .map(|u| u.role.is_admin())
            .unwrap_or(false)
    }

    /// True iff the request user strictly outranks the target user.
    /// `None` when either principal is missing — the caller decides
    /// what incomparability means for its operation.
    pub fn requester_outranks_target(&self) -> Option<bool> {
        let request = self.request_user.as_ref()?;
        let target = self.target_user.as_ref()?;
        Some(request.role > target.role)
    }
}
