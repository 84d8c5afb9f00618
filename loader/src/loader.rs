//! Declaration library with builder pattern and fallback chains.
//!
//! Provides [`SpecLibrary`] for in-memory declaration lookup and
//! [`LibraryBuilder`] for constructing a library from multiple sources with
//! automatic fallback.
//!
//! # Loading patterns
//!
//! ```no_run
//! use argspec_loader::SpecLibrary;
//!
//! // Load from a directory of JSON/YAML declaration files
//! let library = SpecLibrary::from_dir("specs/").unwrap();
//! let mut spec = library.build("greet").unwrap();
//!
//! // Load from a single bundle file
//! let library = SpecLibrary::from_file("specs.yaml").unwrap();
//!
//! // Use the builder for a fallback chain
//! let library = SpecLibrary::builder()
//!     .from_dir("specs/")
//!     .from_file("specs.json")
//!     .build()
//!     .unwrap();
//! ```
//!
//! All lookups are O(1) via the internal `HashMap`.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs;
use std::path::{Path, PathBuf};

use argspec_core::CommandSpec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decl::{CommandDecl, Format, load_command};
use crate::error::{LoaderError, Result};

/// Several declarations in one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub commands: Vec<CommandDecl>,
}

/// Describes where a [`SpecLibrary`] was loaded from.
#[derive(Debug, Clone)]
pub enum LibrarySource {
    /// Loaded from a directory of individual declaration files.
    Directory(PathBuf),
    /// Loaded from a single [`SpecBundle`] file.
    Bundle(PathBuf),
    /// Assembled in memory.
    Memory,
    /// Loaded via a fallback chain of multiple sources.
    Multiple(Vec<LibrarySource>),
}

/// In-memory collection of command declarations with O(1) lookup by name.
///
/// The library holds declarations, not specs: [`build`](Self::build) returns
/// a fresh [`CommandSpec`] on every call, so values bound by one parse never
/// leak into the next.
///
/// # Examples
///
/// ```
/// use argspec_loader::{CommandDecl, SpecLibrary};
///
/// let mut library = SpecLibrary::new();
/// library.insert(CommandDecl { name: "greet".into(), ..Default::default() }).unwrap();
///
/// assert!(library.contains("greet"));
/// assert_eq!(library.build("greet").unwrap().name(), "greet");
/// assert!(library.build("missing").is_err());
/// ```
#[derive(Debug)]
pub struct SpecLibrary {
    commands: HashMap<String, CommandDecl>,
    source: LibrarySource,
}

impl SpecLibrary {
    /// Creates an empty in-memory library.
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
            source: LibrarySource::Memory,
        }
    }

    /// Returns a new [`LibraryBuilder`] for configuring a fallback chain.
    pub fn builder() -> LibraryBuilder {
        LibraryBuilder::new()
    }

    /// Loads every `*.json`, `*.yaml` and `*.yml` file in a directory, one
    /// declaration per file. Other files are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::IoError`] if the directory or a file cannot be
    /// read, a JSON/YAML error if a file fails to decode, or
    /// [`LoaderError::DuplicateCommand`] if two files declare the same name.
    pub fn from_dir(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut files = Vec::new();
        for entry in fs::read_dir(path)? {
            let file_path = entry?.path();
            if file_path.is_file() && Format::from_path(&file_path).is_some() {
                files.push(file_path);
            } else {
                debug!(path = %file_path.display(), "Skipping non-declaration entry");
            }
        }
        // read_dir order is platform-defined.
        files.sort();

        let mut library = Self::new();
        for file_path in files {
            library.insert(load_command(&file_path)?)?;
        }
        debug!(dir = %path.display(), commands = library.len(), "Loaded declaration directory");

        library.source = LibrarySource::Directory(path.to_path_buf());
        Ok(library)
    }

    /// Loads a [`SpecBundle`] file, choosing the format by extension.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::UnsupportedFormat`] for unknown extensions,
    /// [`LoaderError::IoError`] if the file cannot be read, a JSON/YAML error
    /// if decoding fails, or [`LoaderError::DuplicateCommand`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = Format::from_path(path)
            .ok_or_else(|| LoaderError::UnsupportedFormat(path.display().to_string()))?;
        let text = fs::read_to_string(path)?;
        let bundle: SpecBundle = match format {
            Format::Json => serde_json::from_str(&text)?,
            Format::Yaml => serde_yaml::from_str(&text)?,
        };

        let mut library = Self::from_bundle(bundle)?;
        debug!(file = %path.display(), commands = library.len(), "Loaded declaration bundle");

        library.source = LibrarySource::Bundle(path.to_path_buf());
        Ok(library)
    }

    /// Builds an in-memory library from an already decoded bundle.
    pub fn from_bundle(bundle: SpecBundle) -> Result<Self> {
        let mut library = Self::new();
        for decl in bundle.commands {
            library.insert(decl)?;
        }
        Ok(library)
    }

    /// Looks up a declaration by command name.
    pub fn get(&self, command: &str) -> Option<&CommandDecl> {
        self.commands.get(command)
    }

    /// Builds a fresh [`CommandSpec`] for `command`.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::UnknownCommand`] if no declaration has that
    /// name, or [`LoaderError::InvalidSpec`] if the declaration is invalid.
    pub fn build(&self, command: &str) -> Result<CommandSpec> {
        self.get(command)
            .ok_or_else(|| LoaderError::UnknownCommand(command.to_string()))?
            .to_command_spec()
    }

    /// Adds a declaration keyed by its name.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::DuplicateCommand`] if the name is already
    /// present; the library is left unchanged.
    pub fn insert(&mut self, decl: CommandDecl) -> Result<()> {
        match self.commands.entry(decl.name.clone()) {
            Entry::Occupied(entry) => Err(LoaderError::DuplicateCommand(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(decl);
                Ok(())
            }
        }
    }

    /// Returns `true` if the library holds a declaration for `command`.
    pub fn contains(&self, command: &str) -> bool {
        self.commands.contains_key(command)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Command names in no particular order.
    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(|s| s.as_str())
    }

    pub fn source(&self) -> &LibrarySource {
        &self.source
    }
}

impl Default for SpecLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing a [`SpecLibrary`] with a fallback chain.
///
/// Sources are tried in the order they are added. The first successful load
/// wins; if all fail, [`LoaderError::NoSourcesAvailable`] is returned.
pub struct LibraryBuilder {
    sources: Vec<LibrarySource>,
}

impl LibraryBuilder {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Adds a directory of declaration files as a source.
    pub fn from_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(LibrarySource::Directory(path.into()));
        self
    }

    /// Adds a bundle file as a source.
    pub fn from_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(LibrarySource::Bundle(path.into()));
        self
    }

    /// Attempts to load declarations from configured sources in order.
    pub fn build(self) -> Result<SpecLibrary> {
        if self.sources.is_empty() {
            return Err(LoaderError::NoSourcesAvailable);
        }

        for source in &self.sources {
            let result = match source {
                LibrarySource::Directory(path) => SpecLibrary::from_dir(path),
                LibrarySource::Bundle(path) => SpecLibrary::from_file(path),
                LibrarySource::Memory | LibrarySource::Multiple(_) => continue,
            };

            match result {
                Ok(mut library) => {
                    library.source = LibrarySource::Multiple(self.sources.clone());
                    return Ok(library);
                }
                Err(err) => debug!(?source, error = %err, "Library source failed, trying next"),
            }
        }

        Err(LoaderError::NoSourcesAvailable)
    }
}

impl Default for LibraryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::OptionDecl;

    fn decl(name: &str) -> CommandDecl {
        CommandDecl {
            name: name.into(),
            options: vec![OptionDecl {
                names: vec!["-v".into(), "--verbose".into()],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut library = SpecLibrary::new();
        library.insert(decl("git")).unwrap();
        let err = library.insert(decl("git")).unwrap_err();
        assert!(matches!(err, LoaderError::DuplicateCommand(ref name) if name == "git"));
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn test_build_unknown_command() {
        let library = SpecLibrary::new();
        assert!(matches!(
            library.build("nope"),
            Err(LoaderError::UnknownCommand(ref name)) if name == "nope"
        ));
    }

    #[test]
    fn test_from_bundle() {
        let bundle = SpecBundle {
            version: Some("1".into()),
            commands: vec![decl("git"), decl("docker")],
        };
        let library = SpecLibrary::from_bundle(bundle).unwrap();
        let mut names: Vec<&str> = library.commands().collect();
        names.sort();
        assert_eq!(names, vec!["docker", "git"]);
        assert!(library.build("git").unwrap().find_option("--verbose").is_some());
    }

    #[test]
    fn test_builder_without_sources() {
        assert!(matches!(
            SpecLibrary::builder().build(),
            Err(LoaderError::NoSourcesAvailable)
        ));
    }
}
