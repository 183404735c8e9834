// nmlrs/src/cli.rs

//! Support code for the `nmlrs` command line tool.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::config::{ParserConfig, WriteOptions};
use crate::namelist::{KeyPath, Namelist, Value};
use crate::patch::{self, Change, ChangeSet};

/// Format of the tool's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Nml,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Guess the format from a file extension; anything unknown is a namelist.
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match extension.as_deref() {
            Some("json") => OutputFormat::Json,
            Some("yaml") | Some("yml") => OutputFormat::Yaml,
            _ => OutputFormat::Nml,
        }
    }
}

/// One invocation of the tool.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub group: Option<String>,
    /// `key=value` assignments
    pub assignments: Vec<String>,
    pub format: Option<OutputFormat>,
    /// Apply assignments to the tree and re-serialize instead of patching
    pub no_patch: bool,
}

/// Read the input, apply any assignments and write the result.
pub fn run(request: &Request) -> anyhow::Result<()> {
    if let Some(output) = &request.output {
        if output == &request.input {
            anyhow::bail!("refusing to overwrite the input file {}", output.display());
        }
    }

    let text = fs_err::read_to_string(&request.input)?;
    let config = ParserConfig::default();
    let options = WriteOptions::default();
    let format = request
        .format
        .or_else(|| request.output.as_deref().map(OutputFormat::from_path))
        .unwrap_or(OutputFormat::Nml);

    let (rendered, nml) = if request.assignments.is_empty() {
        let nml = crate::reads_with(&text, &config)
            .with_context(|| format!("Failed to parse {}", request.input.display()))?;
        (nml.to_fortran_string(&options), nml)
    } else {
        let parsed = crate::reads_with(&text, &config)
            .with_context(|| format!("Failed to parse {}", request.input.display()))?;
        let group = match &request.group {
            Some(group) => group.clone(),
            None => {
                let first = parsed
                    .group_names()
                    .first()
                    .map(|g| g.to_string())
                    .context("no group given and the input has no groups")?;
                log::warn!("no group given; applying assignments to '{}'", first);
                first
            }
        };
        let changes = parse_assignments(&group, &request.assignments)?;

        if request.no_patch {
            let mut nml = parsed;
            changes.apply(&mut nml, &config)?;
            (nml.to_fortran_string(&options), nml)
        } else {
            patch::patch_with_model(&text, &changes, &config, &options)?
        }
    };

    let output = match format {
        OutputFormat::Nml => rendered,
        OutputFormat::Json => crate::to_json(&nml)?,
        OutputFormat::Yaml => crate::to_yaml(&nml)?,
    };

    match &request.output {
        Some(path) => fs_err::write(path, output)
            .with_context(|| format!("Error writing file {}", path.display()))?,
        None => print!("{}", output),
    }
    Ok(())
}

/// Turn `key=value` strings into changes of `group`.
///
/// Keys may carry an index or a derived-type path (`x(3)`, `p%dt`); values
/// use namelist syntax (`1, 2, 3`, `'text'`, `.true.`).
pub fn parse_assignments(group: &str, assignments: &[String]) -> anyhow::Result<ChangeSet> {
    let mut changes = ChangeSet::new();
    for assignment in assignments {
        let (key, value) = assignment
            .split_once('=')
            .with_context(|| format!("expected key=value, got '{}'", assignment))?;
        let path: KeyPath = format!("{}.{}", group, key.trim()).parse()?;
        changes.push(Change::new(path, parse_value(value)?));
    }
    Ok(changes)
}

fn parse_value(text: &str) -> anyhow::Result<Value> {
    let nml: Namelist = crate::reads(&format!("&v v = {}\n/", text))
        .with_context(|| format!("invalid value '{}'", text.trim()))?;
    nml.get_group("v")
        .and_then(|g| g.get("v"))
        .cloned()
        .with_context(|| format!("invalid value '{}'", text.trim()))
}
