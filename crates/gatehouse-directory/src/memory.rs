//! In-memory directory backend for tests.
//!
//! Tracks bind/unbind counts so tests can assert the unconditional
//! session-release discipline, and supports injected failures for
//! compensation paths.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::backend::{DirectoryBackend, DirectoryError, DirectorySession};

#[derive(Debug, Default)]
struct DirectoryState {
    /// dn -> password
    entries: HashMap<String, String>,
    /// group dn -> member dns
    groups: HashMap<String, HashSet<String>>,
    binds: u64,
    unbinds: u64,
    fail_bind: bool,
    fail_group_add: bool,
}

#[derive(Clone, Default)]
pub struct MemoryDirectory {
    state: Arc<Mutex<DirectoryState>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind_count(&self) -> u64 {
        self.state.lock().unwrap().binds
    }

    pub fn unbind_count(&self) -> u64 {
        self.state.lock().unwrap().unbinds
    }

    pub fn contains(&self, dn: &str) -> bool {
        self.state.lock().unwrap().entries.contains_key(dn)
    }

    pub fn password_of(&self, dn: &str) -> Option<String> {
        self.state.lock().unwrap().entries.get(dn).cloned()
    }

    pub fn group_members(&self, group_dn: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .groups
            .get(group_dn)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Make the next bind (and all following ones) fail.
    pub fn fail_binds(&self) {
        self.state.lock().unwrap().fail_bind = true;
    }

    /// Make group-add operations fail.
    pub fn fail_group_adds(&self) {
        self.state.lock().unwrap().fail_group_add = true;
    }

    /// Pre-seed an entry, e.g. to provoke an already-exists conflict.
    pub fn seed_entry(&self, dn: &str, password: &str) {
        self.state
            .lock()
            .unwrap()
            .entries
            .insert(dn.to_string(), password.to_string());
    }
}

pub struct MemorySession {
    state: Arc<Mutex<DirectoryState>>,
}

impl DirectoryBackend for MemoryDirectory {
    type Session = MemorySession;

    async fn bind(&self, _dn: &str, _password: &str) -> Result<MemorySession, DirectoryError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_bind {
            return Err(DirectoryError::Provider("bind refused".into()));
        }
        state.binds += 1;
        Ok(MemorySession {
            state: self.state.clone(),
        })
    }
}

impl DirectorySession for MemorySession {
    async fn create_user(
        &mut self,
        base: &str,
        username: &str,
        password: &str,
    ) -> Result<(), DirectoryError> {
        let dn = format!("cn={username},{base}");
        let mut state = self.state.lock().unwrap();
        if state.entries.contains_key(&dn) {
            return Err(DirectoryError::AlreadyExists);
        }
        state.entries.insert(dn, password.to_string());
        Ok(())
    }

    async fn change_password(
        &mut self,
        dn: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), DirectoryError> {
        let mut state = self.state.lock().unwrap();
        match state.entries.get_mut(dn) {
            Some(stored) if stored == old_password => {
                *stored = new_password.to_string();
                Ok(())
            }
            Some(_) => Err(DirectoryError::Provider("invalid credentials".into())),
            None => Err(DirectoryError::Provider("no such object".into())),
        }
    }

    async fn delete_user(&mut self, dn: &str) -> Result<(), DirectoryError> {
        let mut state = self.state.lock().unwrap();
        if state.entries.remove(dn).is_none() {
            return Err(DirectoryError::Provider("no such object".into()));
        }
        for members in state.groups.values_mut() {
            members.remove(dn);
        }
        Ok(())
    }

    async fn add_to_group(&mut self, user_dn: &str, group_dn: &str) -> Result<(), DirectoryError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_group_add {
            return Err(DirectoryError::Provider("group add refused".into()));
        }
        if !state.entries.contains_key(user_dn) {
            return Err(DirectoryError::Provider("no such object".into()));
        }
        state
            .groups
            .entry(group_dn.to_string())
            .or_default()
            .insert(user_dn.to_string());
        Ok(())
    }

    async fn unbind(self) -> Result<(), DirectoryError> {
        self.state.lock().unwrap().unbinds += 1;
        Ok(())
    }
}
