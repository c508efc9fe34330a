use crate::core::config::{Config, SearchConfig};
use crate::core::error::Result;
use crate::core::models::{SearchOutcome, ValidatedLead};
use crate::core::search::CandidateSearchEngine;
use crate::verification::{ReacherClient, VerificationOracle};

use std::sync::Arc;
use std::time::Instant;

/// Ties a candidate search engine to the oracle it verifies against.
#[derive(Clone)]
pub struct LeadSleuth {
    engine: CandidateSearchEngine,
    oracle: Arc<dyn VerificationOracle>,
}

impl LeadSleuth {
    /// Creates a sleuth backed by the Reacher API described in `config`.
    pub fn new(config: &Config) -> Result<Self> {
        tracing::debug!("Initializing LeadSleuth components...");
        let oracle = ReacherClient::new(config)?;
        tracing::info!(
            "LeadSleuth initialized (reacher: {}, max patterns: {}, delay: {:?}, include risky: {}).",
            config.reacher_api_url,
            config.search.max_patterns_per_lead,
            config.search.validation_delay,
            config.search.include_risky
        );
        Ok(Self::with_oracle(config.search.clone(), Arc::new(oracle)))
    }

    /// Creates a sleuth around any oracle, e.g. a stub in tests.
    pub fn with_oracle(search: SearchConfig, oracle: Arc<dyn VerificationOracle>) -> Self {
        Self {
            engine: CandidateSearchEngine::new(search),
            oracle,
        }
    }

    pub fn engine(&self) -> &CandidateSearchEngine {
        &self.engine
    }

    /// Generates and searches the candidate addresses of one lead.
    pub async fn find_email(&self, lead: &ValidatedLead) -> SearchOutcome {
        let task_label = format!("{} {}@{}", lead.first_name, lead.last_name, lead.domain);
        tracing::info!(target: "search_task", "[{}] Starting email discovery", task_label);
        let start_time = Instant::now();

        let candidates = self
            .engine
            .candidates_for(&lead.first_name, &lead.last_name, &lead.domain);
        if candidates.is_empty() {
            tracing::warn!(target: "search_task", "[{}] No email candidates generated.", task_label);
            return SearchOutcome::default();
        }
        tracing::trace!(target: "search_task", "[{}] Candidate list (ordered): {:?}", task_label, candidates);

        let outcome = self.engine.search(&candidates, self.oracle.as_ref()).await;

        tracing::info!(target: "search_task",
            "[{}] Finished in {:.2?}: status={}, tested={}, hits={}",
            task_label,
            start_time.elapsed(),
            outcome.validation_status(),
            outcome.patterns_tested,
            outcome.patterns_hit
        );
        outcome
    }
}
