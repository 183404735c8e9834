// nmlrs/src/lib.rs

//! Read, edit and patch Fortran namelist files.
//!
//! This library provides functionality to:
//! - Tokenize and parse namelist text into an ordered, case-insensitive tree
//! - Handle Fortran types including arrays, derived types and complex numbers
//! - Keep duplicated groups and keys as cogroups instead of dropping them
//! - Write a tree back to namelist text, or to JSON and YAML
//! - Patch existing namelist text, changing only the values that differ and
//!   keeping comments, spacing and layout intact

pub mod config;
pub mod error;
pub mod findex;
pub mod fortran_types;
pub mod namelist;
pub mod parser;
pub mod patch;
pub mod scanner;

#[cfg(feature = "cli")]
pub mod cli;

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

pub use config::{ParserConfig, WriteOptions};
pub use error::{NmlError, Position, Result};
pub use fortran_types::Scalar;
pub use namelist::{Cogroup, KeyPath, Namelist, Tree, Value};
pub use parser::{Parser, SourceMap};
pub use patch::{Change, ChangeSet};

/// Parse a namelist file.
///
/// # Examples
///
/// ```no_run
/// fn main() -> Result<(), nmlrs::NmlError> {
///     let nml = nmlrs::read("param.nml")?;
///     println!("{:#?}", nml);
///     Ok(())
/// }
/// ```
pub fn read<P: AsRef<Path>>(path: P) -> Result<Namelist> {
    read_with(path, &ParserConfig::default())
}

/// Parse a namelist file with explicit parser settings.
pub fn read_with<P: AsRef<Path>>(path: P, config: &ParserConfig) -> Result<Namelist> {
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    reads_with(&contents, config)
}

/// Parse namelist text.
///
/// # Examples
///
/// ```
/// fn main() -> Result<(), nmlrs::NmlError> {
///     let nml = nmlrs::reads("&data_nml x=1 y=2.0 z=.true. /")?;
///     assert_eq!(nml.get_group("data_nml").and_then(|g| g.get_i64("x")), Some(1));
///     Ok(())
/// }
/// ```
pub fn reads(content: &str) -> Result<Namelist> {
    reads_with(content, &ParserConfig::default())
}

/// Parse namelist text with explicit parser settings.
pub fn reads_with(content: &str, config: &ParserConfig) -> Result<Namelist> {
    Parser::with_config(config.clone()).parse(content)
}

/// Write a namelist to a new file.
///
/// # Examples
///
/// ```no_run
/// # use nmlrs::Namelist;
/// # fn main() -> Result<(), nmlrs::NmlError> {
/// let mut nml = Namelist::new();
/// nml.insert_group("data_nml")
///    .insert("x", 1i64)
///    .insert("y", 2.0f64)
///    .insert("enabled", true);
///
/// nmlrs::write(&nml, "output.nml")?;
/// # Ok(())
/// # }
/// ```
pub fn write<P: AsRef<Path>>(nml: &Namelist, path: P) -> Result<()> {
    write_with_options(nml, path, &WriteOptions::default())
}

/// Write a namelist to a file with specific options.
///
/// An existing file is only replaced when `options.force` is set.
pub fn write_with_options<P: AsRef<Path>>(
    nml: &Namelist,
    path: P,
    options: &WriteOptions,
) -> Result<()> {
    let path = path.as_ref();

    if !options.force && path.exists() {
        return Err(NmlError::FileAlreadyExists(path.to_path_buf()));
    }

    let mut file = File::create(path)?;
    write_to_writer(nml, &mut file, options)
}

/// Write a namelist to any writer implementing the Write trait.
pub fn write_to_writer<W: Write>(
    nml: &Namelist,
    writer: &mut W,
    options: &WriteOptions,
) -> Result<()> {
    let formatted = nml.to_fortran_string(options);
    writer.write_all(formatted.as_bytes())?;
    Ok(())
}

/// Merge a partial namelist into a copy of `original`.
///
/// Groups of `changes` may carry an `_index` integer to select one member
/// of a duplicated group; otherwise every member is updated.
///
/// # Examples
///
/// ```
/// # use nmlrs::{reads, Namelist, patch};
/// # fn main() -> Result<(), nmlrs::NmlError> {
/// let original = reads("&data_nml x=1 y=2.0 /")?;
///
/// let mut changes = Namelist::new();
/// changes.insert_group("data_nml").insert("x", 42i64);
///
/// let patched = patch(&original, &changes)?;
/// assert_eq!(patched.get_group("data_nml").and_then(|g| g.get_i64("x")), Some(42));
/// # Ok(())
/// # }
/// ```
pub fn patch(original: &Namelist, changes: &Namelist) -> Result<Namelist> {
    let mut result = original.clone();
    result.apply_patch(changes)?;
    Ok(result)
}

/// Patch namelist text with a change set, using default settings.
pub fn patch_str(original: &str, changes: &ChangeSet) -> Result<String> {
    patch::patch(
        original,
        changes,
        &ParserConfig::default(),
        &WriteOptions::default(),
    )
}

/// Patch namelist text with a partial namelist and write the result.
///
/// Only values that change are rewritten; comments and layout of the
/// original are kept. Returns the patched tree.
///
/// # Examples
///
/// ```
/// # use nmlrs::Namelist;
/// # fn main() -> Result<(), nmlrs::NmlError> {
/// let original = "&data_nml x=1 y=2.0 /";
/// let mut changes = Namelist::new();
/// changes.insert_group("data_nml").insert("x", 42i64);
///
/// let mut output = Vec::new();
/// nmlrs::patch_to_writer(original, &changes, &mut output)?;
/// assert_eq!(String::from_utf8_lossy(&output), "&data_nml x=42 y=2.0 /");
/// # Ok(())
/// # }
/// ```
pub fn patch_to_writer<W: Write>(
    original_content: &str,
    changes: &Namelist,
    writer: &mut W,
) -> Result<Namelist> {
    patch_to_writer_with(
        original_content,
        changes,
        writer,
        &ParserConfig::default(),
        &WriteOptions::default(),
    )
}

/// Like [`patch_to_writer`], reading the original with `config` and
/// rendering new values with `options`.
pub fn patch_to_writer_with<W: Write>(
    original_content: &str,
    changes: &Namelist,
    writer: &mut W,
    config: &ParserConfig,
    options: &WriteOptions,
) -> Result<Namelist> {
    let set = ChangeSet::from_namelist(changes)?;
    let (text, nml) = patch::patch_with_model(original_content, &set, config, options)?;
    writer.write_all(text.as_bytes())?;
    Ok(nml)
}

/// Patch a namelist file into a new file.
///
/// The output must be a different file than the input. Nothing is written
/// unless the whole patch succeeds.
///
/// # Examples
///
/// ```no_run
/// # use nmlrs::Namelist;
/// # fn main() -> Result<(), nmlrs::NmlError> {
/// let mut changes = Namelist::new();
/// changes.insert_group("data_nml")
///      .insert("x", 42i64)
///      .insert("new_var", "hello");
///
/// nmlrs::patch_file("input.nml", &changes, "output.nml")?;
/// # Ok(())
/// # }
/// ```
pub fn patch_file<P1, P2>(input_path: P1, changes: &Namelist, output_path: P2) -> Result<Namelist>
where
    P1: AsRef<Path>,
    P2: AsRef<Path>,
{
    patch_file_with(
        input_path,
        changes,
        output_path,
        &ParserConfig::default(),
        &WriteOptions::default(),
    )
}

/// Like [`patch_file`], with explicit parser and output settings.
pub fn patch_file_with<P1, P2>(
    input_path: P1,
    changes: &Namelist,
    output_path: P2,
    config: &ParserConfig,
    options: &WriteOptions,
) -> Result<Namelist>
where
    P1: AsRef<Path>,
    P2: AsRef<Path>,
{
    let input_path = input_path.as_ref();
    let output_path = output_path.as_ref();
    if same_file(input_path, output_path) {
        return Err(NmlError::SamePath(output_path.to_path_buf()));
    }

    let mut input_file = File::open(input_path)?;
    let mut original_content = String::new();
    input_file.read_to_string(&mut original_content)?;

    let mut output = Vec::new();
    let nml = patch_to_writer_with(&original_content, changes, &mut output, config, options)?;
    File::create(output_path)?.write_all(&output)?;
    Ok(nml)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(feature = "json")]
/// Convert a namelist to a JSON string.
pub fn to_json(nml: &Namelist) -> Result<String> {
    serde_json::to_string_pretty(&nml.to_tree()).map_err(NmlError::from)
}

#[cfg(feature = "yaml")]
/// Convert a namelist to a YAML string.
pub fn to_yaml(nml: &Namelist) -> Result<String> {
    serde_yaml::to_string(&nml.to_tree()).map_err(NmlError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_simple() {
        let nml_str = "&data_nml x=1 y=2.0 z=.true. /";
        let nml = reads(nml_str).unwrap();

        let group = nml.get_group("data_nml").unwrap();
        assert_eq!(group.get_i32("x"), Some(1));
        assert_eq!(group.get_f64("y"), Some(2.0));
        assert_eq!(group.get_bool("z"), Some(true));
    }

    #[test]
    fn test_reads_with_comment_tokens() {
        let config = ParserConfig::default().with_comment_tokens(['#']);
        let nml = reads_with("&g x = 1 # note\n/", &config).unwrap();
        assert_eq!(nml.get_group("g").and_then(|g| g.get_i64("x")), Some(1));
    }

    #[test]
    fn test_write_simple() {
        let mut nml = Namelist::new();
        nml.insert_group("data_nml")
            .insert("x", 1i64)
            .insert("y", 2.0f64)
            .insert("enabled", true);

        let mut output = Vec::new();
        write_to_writer(&nml, &mut output, &WriteOptions::default()).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("&data_nml"));
        assert!(output.contains("x = 1"));
        assert!(output.contains("y = 2.0"));
        assert!(output.contains("enabled = .true."));
        assert!(output.ends_with("/\n"));
    }

    #[test]
    fn test_patch() {
        let original = reads("&data_nml x=1 y=2.0 /").unwrap();

        let mut changes = Namelist::new();
        changes.insert_group("data_nml").insert("x", 42i64);

        let patched = patch(&original, &changes).unwrap();
        let group = patched.get_group("data_nml").unwrap();

        assert_eq!(group.get_i64("x"), Some(42));
        assert_eq!(group.get_f64("y"), Some(2.0));
    }

    #[test]
    fn test_patch_to_writer_with_comments() {
        let original_content = r#"&data_nml  ! group comment
    x = 1,  ! inline comment
    y = 2.0
/"#;

        let mut changes = Namelist::new();
        changes
            .insert_group("data_nml")
            .insert("x", 42i64)
            .insert("new_var", "hello");

        let mut output = Vec::new();
        patch_to_writer(original_content, &changes, &mut output).unwrap();
        let result = String::from_utf8(output).unwrap();

        assert_eq!(
            result,
            "&data_nml  ! group comment\n    x = 42,  ! inline comment\n    y = 2.0\n    new_var = 'hello'\n/"
        );
    }

    #[test]
    fn test_patch_str() {
        let changes = ChangeSet::new().set("g.x", "two").unwrap();
        assert_eq!(patch_str("&g x = 'one' /", &changes).unwrap(), "&g x = 'two' /");
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_to_json() {
        let nml = reads("&data_nml x=1 y=2.0 z=.true. c=(1.0,2.0) /").unwrap();
        let json: serde_json::Value = serde_json::from_str(&to_json(&nml).unwrap()).unwrap();
        assert_eq!(json["data_nml"]["x"], 1);
        assert_eq!(json["data_nml"]["z"], true);
        assert_eq!(json["data_nml"]["c"], serde_json::json!([1.0, 2.0]));
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn test_to_yaml() {
        let nml = reads("&g name='abc' /").unwrap();
        let yaml = to_yaml(&nml).unwrap();
        assert!(yaml.contains("name: abc"));
    }
}
