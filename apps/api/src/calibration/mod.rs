// Quota allocation & hierarchy aggregation engine.
// Everything here is read-only over the entity store; every call re-reads.

pub mod allocator;
pub mod cohort;
pub mod handlers;
pub mod ownership;
pub mod postgres;
pub mod service;
pub mod store;
pub mod summary;

#[cfg(test)]
pub mod test_support;
