// Cache module
//
// Freshness decisions over stored responses. The store itself lives with
// the caller; everything here is read-only over a `CacheEntrySnapshot`.

pub mod control;
pub mod entry;
pub mod freshness;
pub mod policy;

pub use control::Directive;
pub use entry::CacheEntrySnapshot;
pub use policy::{Freshness, FreshnessPolicy};
