pub mod completion;
pub mod entries;
pub mod filter;
pub mod list;
pub mod stats;
