//! Address verification oracles.

pub(crate) mod reacher;

use crate::core::models::VerificationResult;
use async_trait::async_trait;

pub use reacher::ReacherClient;

/// Something that can check whether one address is deliverable.
///
/// Implementations must never fail: transport problems are reported through
/// [`VerificationResult::transport_failure`] so a search can carry on.
#[async_trait]
pub trait VerificationOracle: Send + Sync {
    async fn verify(&self, email: &str) -> VerificationResult;
}
