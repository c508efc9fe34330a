//! LinkedIn touchpoints driven through an OpenOutreach automation server.

pub(crate) mod linkedin;
pub(crate) mod openoutreach;

pub use linkedin::{CampaignResult, LinkedInPipeline, TouchpointOutcome, CAMPAIGN_RESULT_COLUMNS};
pub use openoutreach::{Account, NewAccount, OpenOutreachClient, RunResponse, Touchpoint};
