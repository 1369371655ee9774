// src/robots/mod.rs
// =============================================================================
// Exclusion policy resolution (robots.txt).
//
// Submodules:
// - policy: parsing robots.txt and the ExclusionPolicy type
// - fetch: the HTTP side, ExclusionResolver
// - audit: the refusal log for domains we won't touch
// =============================================================================

mod audit;
mod fetch;
mod policy;

pub use audit::{RefusalLog, DEFAULT_REFUSAL_LOG};
pub use fetch::ExclusionResolver;
pub use policy::{ExclusionPolicy, RobotsFile};
