// nmlrs/src/namelist/mod.rs

//! Namelist data model.
//!
//! A [`Namelist`] is an ordered map with case-insensitive keys. The same
//! type serves as the root (holding groups), as a group (holding
//! variables) and as a derived-type value. Duplicated keys are kept as a
//! [`Cogroup`] so no assignment is lost.

pub mod core;
pub mod formatting;
pub mod group;
pub mod path;
pub mod tree;
pub mod value;

pub(crate) mod array;

pub use self::core::Namelist;
pub use path::{KeyPath, PathSegment};
pub use tree::{Tree, START_INDEX_KEY};
pub use value::{Cogroup, CogroupKey, Value};
