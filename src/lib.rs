//! # Lead Sleuth Core Library
//!
//! Lead-enrichment pipelines: discovering verified work email addresses from
//! names and company domains, driving LinkedIn touchpoints through an
//! automation server, and writing personalized outreach with scraped
//! profile data and an LLM.
//!
//! It is designed to be used either directly as a library or via the `lead-sleuth`
//! command-line tool (which uses this library).

mod core;
mod outreach;
mod personalization;
mod utils;
mod verification;

pub use crate::core::config::{
    Config, ConfigBuilder, ConfigFile, LinkedInSettings, PersonalizationSettings, SearchConfig,
    SecretString,
};
pub use crate::core::error::{AppError, Result};
pub use crate::core::models::{
    EnrichedLead, Lead, LeadOutcome, NameVariant, Reachability, SearchOutcome, ValidatedLead,
    VerificationResult, ENRICHED_LEAD_COLUMNS, EXPORT_PRIORITY_COLUMNS, REQUIRED_LEAD_COLUMNS,
};
pub use crate::core::search::CandidateSearchEngine;
pub use crate::core::sleuth::LeadSleuth;
pub use crate::outreach::{
    Account, CampaignResult, LinkedInPipeline, NewAccount, OpenOutreachClient, RunResponse,
    Touchpoint, TouchpointOutcome, CAMPAIGN_RESULT_COLUMNS,
};
pub use crate::personalization::{
    build_prompt, merge_leads, BrightDataClient, LlmClient, PersonalizationPipeline, Prospect,
    Submission, PERSONALIZED_LEAD_COLUMNS,
};
pub use crate::utils::records::{export, load_rows, FlatRecord, InputRow, OutputFormat};
pub use crate::verification::{ReacherClient, VerificationOracle};

use crate::utils::domain::get_domain_from_url;

/// Initializes the Reacher-backed sleuth described by `config`.
pub fn initialize_sleuth(config: &Config) -> Result<LeadSleuth> {
    LeadSleuth::new(config)
}

/// Processes a single lead: validation, candidate search and result packaging.
///
/// Invalid input never fails the call; it comes back as [`LeadOutcome::Skipped`].
pub async fn enrich_single_lead(sleuth: &LeadSleuth, lead: Lead) -> LeadOutcome {
    let task_id = format!(
        "Lead {}: {} {} / {}",
        lead.row, lead.first_name, lead.last_name, lead.company_domain
    );
    tracing::info!(target: "lead_task", "[{}] Starting processing.", task_id);

    let validated = match validate_lead_input(&lead) {
        Ok(validated) => validated,
        Err(reason) => {
            tracing::warn!(target: "lead_task", "[{}] Skipping record. Reason: {}", task_id, reason);
            return LeadOutcome::Skipped { lead, reason };
        }
    };

    let outcome = sleuth.find_email(&validated).await;
    match outcome.best_candidate {
        Some(ref email) => tracing::info!(target: "lead_task",
            "[{}] ✓ Found email: {} ({})", task_id, email, outcome.validation_status()
        ),
        None => tracing::info!(target: "lead_task", "[{}] No deliverable email found.", task_id),
    }

    LeadOutcome::Enriched(EnrichedLead {
        lead: validated,
        outcome,
    })
}

/// Processes leads strictly one after another, in input order.
///
/// `on_progress` is called after each lead with the number done so far.
pub async fn process_leads<F>(sleuth: &LeadSleuth, leads: Vec<Lead>, mut on_progress: F) -> Vec<LeadOutcome>
where
    F: FnMut(usize),
{
    let mut results = Vec::with_capacity(leads.len());
    for lead in leads {
        results.push(enrich_single_lead(sleuth, lead).await);
        on_progress(results.len());
    }
    results
}

/// Loads the email pipeline's input file.
pub fn load_leads(path: &std::path::Path) -> Result<Vec<Lead>> {
    let rows = load_rows(path, &REQUIRED_LEAD_COLUMNS)?;
    Ok(rows.iter().map(Lead::from_row).collect())
}

fn validate_lead_input(lead: &Lead) -> std::result::Result<ValidatedLead, String> {
    let first_name = lead.first_name.trim();
    let last_name = lead.last_name.trim();
    let domain_input = lead.company_domain.trim();

    let mut missing_parts = Vec::new();
    if first_name.is_empty() {
        missing_parts.push("first name");
    }
    if last_name.is_empty() {
        missing_parts.push("last name");
    }
    if domain_input.is_empty() {
        missing_parts.push("domain");
    }
    if !missing_parts.is_empty() {
        return Err(format!("Missing {}", missing_parts.join(", ")));
    }

    let domain = match get_domain_from_url(domain_input) {
        Ok(domain) => domain,
        Err(e) => {
            tracing::warn!(target: "lead_task",
                "Cannot normalize domain '{}' ({}); searching it as given.", domain_input, e
            );
            domain_input.to_string()
        }
    };

    Ok(ValidatedLead {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        domain,
        original: lead.clone(),
    })
}
