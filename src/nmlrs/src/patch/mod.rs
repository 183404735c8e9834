// nmlrs/src/patch/mod.rs

//! Patching: change sets and the text-preserving patch engine.

pub mod changes;
pub mod engine;

pub use changes::{Change, ChangeSet, MEMBER_INDEX_KEY};
pub use engine::{patch, patch_with_model};
