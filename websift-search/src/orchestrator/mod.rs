//! Search orchestrator: concurrent fan-out and URL deduplication.
//!
//! This module fans out every query variant to every configured backend
//! concurrently, isolates per-unit failures, and merges the surviving hits
//! into a single candidate set keyed by exact URL. It performs no
//! relevance judgment of its own.

pub mod dedup;
pub mod search;
