pub mod enrichment;
pub mod step_policy;

pub use enrichment::EnrichmentService;
pub use step_policy::{pending_steps, satisfied_steps};
