//! The bibliography data source: every record a page may cite, looked up by
//! citation key.

pub mod bibtex;
pub mod csljson;
mod latex;

use ansi_term::Color;
use csljson::CSLSource;
use slog::{debug, o, warn};
use std::{collections::HashMap, path::Path};

/// The formats a library file may be written in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LibraryFormat {
    BibTex,
    CslJson,
    CslYaml,
}

impl LibraryFormat {
    /// Determine the format from a file's extension.
    pub fn from_path(path: &Path) -> Result<LibraryFormat, String> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "bib" | "bibtex" => Ok(LibraryFormat::BibTex),
            "json" => Ok(LibraryFormat::CslJson),
            "yaml" | "yml" => Ok(LibraryFormat::CslYaml),
            _ => Err(format!(
                "the library file must have a .bib, .json, .yaml, or .yml extension. You used {}",
                path.to_string_lossy()
            )),
        }
    }
}

/// Every record in a library file, indexed by id.
#[derive(Debug, Default)]
pub struct Library {
    sources: Vec<CSLSource>,
    ids: HashMap<String, usize>,
}

impl Library {
    /// Create a library from its records.
    ///
    /// When two records share an id, the first one wins.
    pub fn new(sources: Vec<CSLSource>) -> Library {
        let mut kept: Vec<CSLSource> = Vec::with_capacity(sources.len());
        let mut ids: HashMap<String, usize> = HashMap::with_capacity(sources.len());

        for source in sources {
            if ids.contains_key(&source.id) {
                warn!(
                    slog_scope::logger(),
                    "Duplicate key {} in the library; keeping the first entry", source.id
                );
                eprintln!(
                    "  {} Duplicate key {} in the library; keeping the first entry",
                    Color::Yellow.paint("WARN"),
                    Color::Blue.paint(source.id.as_str())
                );
                continue;
            }
            ids.insert(source.id.clone(), kept.len());
            kept.push(source);
        }

        Library { sources: kept, ids }
    }

    /// Look up a record by citation key.
    pub fn get(&self, key: &str) -> Option<&CSLSource> {
        self.ids.get(key).map(|&i| &self.sources[i])
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Deserialize a library file.
pub fn build_library(contents: &str, format: LibraryFormat) -> Result<Library, String> {
    debug!(slog_scope::logger(), "Building {:?} library...", format);

    let sources = match format {
        LibraryFormat::BibTex => slog_scope::scope(
            &slog_scope::logger().new(o!("fn" => "build_bibtex_lib()")),
            || bibtex::build_bibtex_lib(contents),
        )?,
        LibraryFormat::CslJson => slog_scope::scope(
            &slog_scope::logger().new(o!("fn" => "build_csl_json_lib()")),
            || csljson::build_csl_json_lib(contents),
        )?,
        LibraryFormat::CslYaml => slog_scope::scope(
            &slog_scope::logger().new(o!("fn" => "build_csl_yaml_lib()")),
            || csljson::build_csl_yaml_lib(contents),
        )?,
    };

    let library = Library::new(sources);
    debug!(
        slog_scope::logger(),
        "Library built: {} sources",
        library.len()
    );
    Ok(library)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats() {
        assert_eq!(
            LibraryFormat::from_path(Path::new("movetk.bib")).unwrap(),
            LibraryFormat::BibTex
        );
        assert_eq!(
            LibraryFormat::from_path(Path::new("lib/My-Library.JSON")).unwrap(),
            LibraryFormat::CslJson
        );
        assert_eq!(
            LibraryFormat::from_path(Path::new("refs.yml")).unwrap(),
            LibraryFormat::CslYaml
        );
        assert!(LibraryFormat::from_path(Path::new("refs.ris")).is_err());
        assert!(LibraryFormat::from_path(Path::new("refs")).is_err());
    }

    #[test]
    fn lookup() {
        let library = build_library(
            "@article{BB2009, title={A Generic Geometry Library}, year={2009}}",
            LibraryFormat::BibTex,
        )
        .unwrap();

        assert_eq!(library.len(), 1);
        assert_eq!(
            library.get("BB2009").unwrap().title.as_deref(),
            Some("A Generic Geometry Library")
        );
        assert!(library.get("bb2009").is_none());
    }

    #[test]
    fn duplicates_keep_first() {
        let library = build_library(
            r#"[{"id": "a", "title": "First"}, {"id": "b"}, {"id": "a", "title": "Second"}]"#,
            LibraryFormat::CslJson,
        )
        .unwrap();

        assert_eq!(library.len(), 2);
        assert_eq!(library.get("a").unwrap().title.as_deref(), Some("First"));
    }

    #[test]
    fn parse_errors_propagate() {
        assert!(build_library("[{", LibraryFormat::CslJson).is_err());
        assert!(build_library("@book{x, title={", LibraryFormat::BibTex).is_err());
    }
}
