//! Candidate generation and the early-stopping verification search.

use crate::core::config::SearchConfig;
use crate::core::models::{Reachability, SearchOutcome, VerificationResult};
use crate::utils::names::generate_name_variants;
use crate::utils::patterns::generate_email_patterns;
use crate::verification::VerificationOracle;

use std::collections::HashSet;
use tokio::time::sleep;

/// The candidate currently held as best, with the result that put it there.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Best {
    pub candidate: String,
    pub result: VerificationResult,
}

/// Search progress between two oracle calls.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SearchState {
    /// Nothing kept yet.
    Searching,
    /// A risky fallback is kept while looking for a safe address.
    RiskyHeld(Best),
    /// A safe address was found; no further candidates are tried.
    Done(Best),
}

impl SearchState {
    fn is_done(&self) -> bool {
        matches!(self, SearchState::Done(_))
    }

    fn into_best(self) -> Option<Best> {
        match self {
            SearchState::Searching => None,
            SearchState::RiskyHeld(best) | SearchState::Done(best) => Some(best),
        }
    }
}

/// Folds one verification into the search state.
///
/// Rejected candidates leave the state untouched. A safe hit always finishes
/// the search. A risky hit is only kept when `accept_risky` is set and no
/// fallback is held yet, so the first risky candidate wins.
pub(crate) fn step(
    state: SearchState,
    candidate: &str,
    result: &VerificationResult,
    accept_risky: bool,
) -> SearchState {
    if state.is_done() || !result.is_hit() {
        return state;
    }
    let best = || Best {
        candidate: candidate.to_string(),
        result: result.clone(),
    };
    match (state, result.reachability) {
        (_, Reachability::Safe) => SearchState::Done(best()),
        (SearchState::Searching, Reachability::Risky) if accept_risky => {
            SearchState::RiskyHeld(best())
        }
        (state, _) => state,
    }
}

/// Builds a lead's candidate list and searches it against an oracle.
#[derive(Debug, Clone, Default)]
pub struct CandidateSearchEngine {
    config: SearchConfig,
}

impl CandidateSearchEngine {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Address patterns for one spelling of a name, capped at `max_patterns_per_lead`.
    pub fn patterns(&self, first: &str, last: &str, domain: &str) -> Vec<String> {
        generate_email_patterns(first, last, domain, self.config.max_patterns_per_lead)
    }

    /// The full candidate set for a lead: patterns of every name variant, in
    /// variant order, deduplicated by first occurrence.
    pub fn candidates_for(&self, first: &str, last: &str, domain: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let candidates: Vec<String> = generate_name_variants(first, last)
            .iter()
            .flat_map(|variant| self.patterns(&variant.first, &variant.last, domain))
            .filter(|candidate| seen.insert(candidate.clone()))
            .collect();
        tracing::debug!(target: "search_task",
            "Generated {} unique candidates for '{} {}' @ {}",
            candidates.len(), first, last, domain
        );
        candidates
    }

    /// Verifies candidates in order until a safe address is found or the list
    /// runs out, sleeping `validation_delay` between consecutive calls.
    ///
    /// Never fails: oracle problems count as rejected candidates.
    pub async fn search<O>(&self, candidates: &[String], oracle: &O) -> SearchOutcome
    where
        O: VerificationOracle + ?Sized,
    {
        let accept_risky = self.config.include_risky;
        let total = candidates.len();
        let mut state = SearchState::Searching;
        let mut outcome = SearchOutcome::default();

        for (idx, candidate) in candidates.iter().enumerate() {
            tracing::info!(target: "search_task", "Validating {}/{}: {}", idx + 1, total, candidate);
            let result = oracle.verify(candidate).await;
            outcome.patterns_tested += 1;

            if result.smtp_deliverable {
                outcome.patterns_hit += 1;
            }
            if let Some(ref error) = result.raw_error {
                tracing::debug!(target: "search_task", "Rejected {} after oracle failure: {}", candidate, error);
            }

            state = step(state, candidate, &result, accept_risky);
            if state.is_done() {
                tracing::info!(target: "search_task", "Found safe address {}, stopping early", candidate);
                break;
            }

            if idx + 1 < total {
                sleep(self.config.validation_delay).await;
            }
        }

        if let Some(best) = state.into_best() {
            outcome.best_candidate = Some(best.candidate);
            outcome.best_result = Some(best.result);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    fn result(reachability: Reachability, deliverable: bool) -> VerificationResult {
        VerificationResult {
            reachability,
            smtp_deliverable: deliverable,
            is_disposable: false,
            is_role_account: false,
            mx_records: Vec::new(),
            raw_error: None,
        }
    }

    /// Answers from a fixed table and records every address it was asked about.
    struct ScriptedOracle {
        answers: HashMap<String, VerificationResult>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedOracle {
        fn new(answers: &[(&str, VerificationResult)]) -> Self {
            Self {
                answers: answers
                    .iter()
                    .map(|(email, r)| (email.to_string(), r.clone()))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VerificationOracle for ScriptedOracle {
        async fn verify(&self, email: &str) -> VerificationResult {
            self.calls.lock().unwrap().push(email.to_string());
            self.answers
                .get(email)
                .cloned()
                .unwrap_or_else(|| VerificationResult::transport_failure("connection refused"))
        }
    }

    fn engine(include_risky: bool) -> CandidateSearchEngine {
        CandidateSearchEngine::new(SearchConfig {
            validation_delay: Duration::ZERO,
            include_risky,
            ..SearchConfig::default()
        })
    }

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_step_rejection_keeps_state() {
        let held = step(
            SearchState::Searching,
            "a@x.io",
            &result(Reachability::Risky, true),
            true,
        );
        let after = step(
            held.clone(),
            "b@x.io",
            &result(Reachability::Invalid, false),
            true,
        );
        assert_eq!(after, held);
        let undeliverable_safe = step(
            SearchState::Searching,
            "c@x.io",
            &result(Reachability::Safe, false),
            true,
        );
        assert_eq!(undeliverable_safe, SearchState::Searching);
    }

    #[test]
    fn test_step_safe_replaces_risky_fallback() {
        let held = step(
            SearchState::Searching,
            "a@x.io",
            &result(Reachability::Risky, true),
            true,
        );
        let done = step(held, "b@x.io", &result(Reachability::Safe, true), true);
        match done {
            SearchState::Done(best) => assert_eq!(best.candidate, "b@x.io"),
            other => panic!("expected Done, got {:?}", other),
        }
    }

    #[test]
    fn test_step_first_risky_wins() {
        let held = step(
            SearchState::Searching,
            "a@x.io",
            &result(Reachability::Risky, true),
            true,
        );
        let still = step(held, "b@x.io", &result(Reachability::Risky, true), true);
        match still {
            SearchState::RiskyHeld(best) => assert_eq!(best.candidate, "a@x.io"),
            other => panic!("expected RiskyHeld, got {:?}", other),
        }
    }

    #[test]
    fn test_step_risky_ignored_without_accept() {
        let state = step(
            SearchState::Searching,
            "a@x.io",
            &result(Reachability::Risky, true),
            false,
        );
        assert_eq!(state, SearchState::Searching);
    }

    #[test]
    fn test_candidates_merge_variants_without_duplicates() {
        let engine = engine(false);
        let candidates = engine.candidates_for("Jean-Pierre", "Dupont", "acme.fr");

        assert_eq!(candidates[0], "jean-pierre@acme.fr");
        assert_eq!(candidates[1], "jean-pierre.dupont@acme.fr");
        assert!(candidates.contains(&"jeanpierre.dupont@acme.fr".to_string()));
        assert!(candidates.contains(&"jean.dupont@acme.fr".to_string()));

        // "j.dupont" comes from every variant but appears once, at its first position.
        let j_dupont: Vec<usize> = candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| *c == "j.dupont@acme.fr")
            .map(|(i, _)| i)
            .collect();
        assert_eq!(j_dupont, vec![3]);

        let unique: HashSet<&String> = candidates.iter().collect();
        assert_eq!(unique.len(), candidates.len());
    }

    #[test]
    fn test_candidates_include_accent_folded_patterns() {
        let candidates = engine(false).candidates_for("María", "José", "empresa.es");
        assert_eq!(candidates[0], "maría@empresa.es");
        assert!(candidates.contains(&"maria.jose@empresa.es".to_string()));
    }

    #[test]
    fn test_candidates_empty_for_missing_domain() {
        assert!(engine(false).candidates_for("John", "Smith", " ").is_empty());
    }

    #[tokio::test]
    async fn test_search_stops_at_first_safe() {
        let oracle = ScriptedOracle::new(&[
            ("a@x.io", result(Reachability::Risky, true)),
            ("b@x.io", result(Reachability::Safe, true)),
            ("c@x.io", result(Reachability::Safe, true)),
        ]);
        let outcome = engine(false)
            .search(&list(&["a@x.io", "b@x.io", "c@x.io"]), &oracle)
            .await;

        assert_eq!(outcome.best_candidate.as_deref(), Some("b@x.io"));
        assert_eq!(outcome.patterns_tested, 2);
        assert_eq!(outcome.patterns_hit, 2);
        assert_eq!(outcome.validation_status(), "safe");
        assert_eq!(oracle.calls(), vec!["a@x.io", "b@x.io"]);
    }

    #[tokio::test]
    async fn test_search_all_risky_without_accept_finds_nothing() {
        let oracle = ScriptedOracle::new(&[
            ("a@x.io", result(Reachability::Risky, true)),
            ("b@x.io", result(Reachability::Risky, false)),
            ("c@x.io", result(Reachability::Risky, true)),
        ]);
        let outcome = engine(false)
            .search(&list(&["a@x.io", "b@x.io", "c@x.io"]), &oracle)
            .await;

        assert_eq!(outcome.best_candidate, None);
        assert_eq!(outcome.best_result, None);
        assert_eq!(outcome.validation_status(), "none_found");
        assert_eq!(outcome.patterns_tested, 3);
        assert_eq!(outcome.patterns_hit, 2);
    }

    #[tokio::test]
    async fn test_search_all_risky_with_accept_keeps_first() {
        let oracle = ScriptedOracle::new(&[
            ("a@x.io", result(Reachability::Invalid, false)),
            ("b@x.io", result(Reachability::Risky, true)),
            ("c@x.io", result(Reachability::Risky, true)),
        ]);
        let outcome = engine(true)
            .search(&list(&["a@x.io", "b@x.io", "c@x.io"]), &oracle)
            .await;

        assert_eq!(outcome.best_candidate.as_deref(), Some("b@x.io"));
        assert_eq!(outcome.validation_status(), "risky");
        assert_eq!(outcome.patterns_tested, 3);
        assert_eq!(outcome.patterns_hit, 2);
    }

    #[tokio::test]
    async fn test_search_transport_failure_does_not_abort() {
        // "down@x.io" is not scripted, so the oracle reports a transport failure.
        let oracle = ScriptedOracle::new(&[("ok@x.io", result(Reachability::Safe, true))]);
        let outcome = engine(false)
            .search(&list(&["down@x.io", "ok@x.io"]), &oracle)
            .await;

        assert_eq!(outcome.best_candidate.as_deref(), Some("ok@x.io"));
        assert_eq!(outcome.patterns_tested, 2);
        assert_eq!(outcome.patterns_hit, 1);
    }

    #[tokio::test]
    async fn test_search_counts_deliverable_invalid_as_hit() {
        let oracle = ScriptedOracle::new(&[
            ("a@x.io", result(Reachability::Invalid, true)),
            ("b@x.io", result(Reachability::Invalid, false)),
        ]);
        let outcome = engine(false).search(&list(&["a@x.io", "b@x.io"]), &oracle).await;
        assert_eq!(outcome.patterns_tested, 2);
        assert_eq!(outcome.patterns_hit, 1);
        assert_eq!(outcome.best_candidate, None);
        assert_eq!(outcome.validation_status(), "none_found");
    }

    #[tokio::test]
    async fn test_search_empty_list() {
        let oracle = ScriptedOracle::new(&[]);
        let outcome = engine(true).search(&[], &oracle).await;
        assert_eq!(outcome, SearchOutcome::default());
        assert!(oracle.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_delays_only_between_calls() {
        let engine = CandidateSearchEngine::new(SearchConfig {
            validation_delay: Duration::from_millis(1500),
            ..SearchConfig::default()
        });
        let oracle = ScriptedOracle::new(&[]);

        let start = tokio::time::Instant::now();
        engine
            .search(&list(&["a@x.io", "b@x.io", "c@x.io"]), &oracle)
            .await;
        assert_eq!(start.elapsed(), Duration::from_millis(3000));

        let start = tokio::time::Instant::now();
        engine.search(&list(&["a@x.io"]), &oracle).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_no_delay_after_safe_stop() {
        let engine = CandidateSearchEngine::new(SearchConfig {
            validation_delay: Duration::from_secs(2),
            ..SearchConfig::default()
        });
        let oracle = ScriptedOracle::new(&[("a@x.io", result(Reachability::Safe, true))]);

        let start = tokio::time::Instant::now();
        let outcome = engine
            .search(&list(&["a@x.io", "b@x.io", "c@x.io"]), &oracle)
            .await;
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(outcome.patterns_tested, 1);
    }
}
