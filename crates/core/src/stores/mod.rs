pub mod memory;

pub use memory::{relevance_score, InMemoryVectorIndex};
