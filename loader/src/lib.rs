//! Declaration loading for argspec command specs.
//!
//! This crate reads command declarations from JSON or YAML documents and
//! turns them into [`argspec_core::CommandSpec`] values. Declarations leave
//! unset fields unset so the core's default inference decides them.
//!
//! # Quick start
//!
//! ```no_run
//! use argspec_core::Parser;
//! use argspec_loader::{SpecLibrary, load_command};
//!
//! // One declaration per file
//! let decl = load_command("greet.yaml").unwrap();
//! let mut spec = decl.to_command_spec().unwrap();
//! let result = Parser::new(decl.parser).parse(&mut spec, &["-c", "3"]).unwrap();
//!
//! // A library with a fallback chain
//! let library = SpecLibrary::builder()
//!     .from_dir("specs/")
//!     .from_file("specs.json")
//!     .build()
//!     .unwrap();
//! let spec = library.build("greet").unwrap();
//! ```

mod decl;
mod error;
mod loader;

pub use decl::{
    ArgDecl, CommandDecl, Format, Lines, OptionDecl, PositionalDecl, RangeText, load_command,
};
pub use error::{LoaderError, Result};
pub use loader::{LibraryBuilder, LibrarySource, SpecBundle, SpecLibrary};
