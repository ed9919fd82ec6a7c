//! Provider registry, fallback resolution and the record store.
//!
//! - [`ProviderRegistry`] - the configured adapters and per-kind chains
//! - [`Resolver`] - tries a chain in order until one provider answers
//! - [`RecordStore`] - serves fresh records from cache, refreshing through
//!   the resolver when they go stale

pub mod registry;
pub mod resolver;
pub mod store;

pub use registry::ProviderRegistry;
pub use resolver::{Attempt, AttemptOutcome, LookupTarget, Resolution, Resolver, SkipReason};
pub use store::{RecordRepository, RecordStore};
