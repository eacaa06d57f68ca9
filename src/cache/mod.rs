//! Record cache keyed by input content hash
//!
//! Lookups hash the normalized call input and consult an in-memory mirror of
//! the bound record file. Recording upserts the mirror and writes through to
//! disk only when the stored output actually changes.
//!
//! # Output kinds
//!
//! | Kind | Stored as | Replayed as |
//! |------|-----------|-------------|
//! | scalar | value | the value |
//! | dict-of-streams | field map, streams drained | map with fresh streams |
//! | stream | drained sequence | fresh one-shot stream |

pub mod entry;

pub use entry::EntryCache;
