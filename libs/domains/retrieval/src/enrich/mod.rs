mod heuristic;
mod pricing_api;
mod provider;

pub use heuristic::HeuristicEnricher;
pub use pricing_api::{PricingApiConfig, PricingApiEnricher};
pub use provider::EnrichmentProvider;

#[cfg(test)]
pub(crate) use provider::MockEnrichmentProvider;
