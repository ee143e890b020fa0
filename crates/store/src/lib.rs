//! `curator-store` — in-memory transactional storage for the catalog.
//!
//! One relational-style store accessed by many request-handling workers.
//! All mutation goes through [`InMemoryStore::transact`], which is atomic:
//! either every row reaches its new state or none do. The store also owns
//! the logical-identity pair index (draft row / official row per key) and
//! the slug-resolution cache.

pub mod memory;
pub mod pair;


pub use memory::{InMemoryStore, Txn};
pub use pair::EntityPair;
