use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::engine::EngineProcess;

/// Live engine sessions keyed by configured engine name.
///
/// Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Arc<EngineProcess>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, name: &str) -> Option<Arc<EngineProcess>> {
        self.sessions.read().await.get(name).cloned()
    }

    /// Insert or replace; returns the replaced session.
    pub async fn put(
        &self,
        name: impl Into<String>,
        process: Arc<EngineProcess>,
    ) -> Option<Arc<EngineProcess>> {
        self.sessions.write().await.insert(name.into(), process)
    }

    /// Insert unless a session exists; returns the existing one otherwise.
    pub async fn insert_if_absent(
        &self,
        name: &str,
        process: Arc<EngineProcess>,
    ) -> Option<Arc<EngineProcess>> {
        let mut sessions = self.sessions.write().await;
        if let Some(existing) = sessions.get(name) {
            return Some(existing.clone());
        }
        sessions.insert(name.to_string(), process);
        None
    }

    pub async fn remove(&self, name: &str) -> Option<Arc<EngineProcess>> {
        self.sessions.write().await.remove(name)
    }

    /// Remove `name` only while it still maps to `process`.
    pub async fn remove_if_same(&self, name: &str, process: &Arc<EngineProcess>) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get(name) {
            Some(current) if Arc::ptr_eq(current, process) => {
                sessions.remove(name);
                true
            }
            _ => false,
        }
    }

    /// Session names, sorted.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
