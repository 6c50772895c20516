//! Shared application state

use std::sync::Arc;

use domain_retrieval::{RetrievalService, VectorIndex};

use crate::agent::ChatAgent;

/// State shared by app-level routes (the domain router carries its own).
pub struct AppState<I: VectorIndex> {
    pub service: Arc<RetrievalService<I>>,
    /// Present only when an LLM backend is configured
    pub agent: Option<Arc<ChatAgent>>,
}

impl<I: VectorIndex> Clone for AppState<I> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            agent: self.agent.clone(),
        }
    }
}
