//! Functions for interacting with the file system.

use ansi_term::Color;
use slog::debug;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Load a file into a string.
///
/// This function is used to load both the pages and the library files into
/// strings, which can then be passed to the main function.
pub fn load_file(path: &Path) -> Result<String, String> {
    debug!(
        slog_scope::logger(),
        "Loading file {}...",
        path.to_string_lossy()
    );

    match fs::read_to_string(path) {
        Ok(r) => {
            debug!(
                slog_scope::logger(),
                "File {} loaded.",
                path.to_string_lossy()
            );
            Ok(r)
        }
        Err(e) => {
            let err_msg = format!("error reading the file {}—{}", path.to_string_lossy(), e);
            Err(err_msg)
        }
    }
}

/// Save a string in a file.
pub fn save_file(path: &Path, output: &str) -> Result<(), String> {
    debug!(slog_scope::logger(), "Saving {}...", path.to_string_lossy());
    eprintln!(
        "{} Saving {}...",
        Color::Green.paint("INFO"),
        Color::Blue.paint(path.to_string_lossy())
    );

    match fs::write(path, output) {
        Ok(_) => {
            debug!(
                slog_scope::logger(),
                "File {} saved.",
                path.to_string_lossy()
            );
            Ok(())
        }
        Err(e) => {
            let err_msg = format!("error writing the file {}—{}", path.to_string_lossy(), e);
            Err(err_msg)
        }
    }
}

/// The `.html` pages directly inside a directory, sorted by name.
pub fn html_files(dir: &Path) -> Result<Vec<PathBuf>, String> {
    debug!(
        slog_scope::logger(),
        "Listing pages in {}...",
        dir.to_string_lossy()
    );

    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            let err_msg = format!(
                "error reading the directory {}—{}",
                dir.to_string_lossy(),
                e
            );
            return Err(err_msg);
        }
    };

    let mut pages: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .map(|e| e.eq_ignore_ascii_case("html"))
                    .unwrap_or(false)
        })
        .collect();
    pages.sort();

    debug!(slog_scope::logger(), "Found {} pages", pages.len());
    Ok(pages)
}

/// Create the output directory if it does not exist.
pub fn create_dir(dir: &Path) -> Result<(), String> {
    if dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|e| {
        format!(
            "error creating the directory {}—{}",
            dir.to_string_lossy(),
            e
        )
    })
}

/// Create a blank settings file.
///
/// Creates a settings file with every option at its default value, which
/// users can then edit.
pub fn new_settings_ron(path: &Path) -> Result<(), String> {
    eprintln!(
        "{} Creating blank settings file ({})",
        Color::Green.paint("INFO"),
        Color::Blue.paint(path.to_string_lossy())
    );

    let blank_ron = r#"// Settings for docbib. Every option is optional; delete any line to use the
// default shown here. Pass the file with -s/--settings.
(
    // The class of the elements that mark a citation.
    marker_class: "citationjs",

    // The marker attribute holding the citation key.
    key_attribute: "data-citeid",

    // The class of the element inside a marker that shows its number. Markers
    // without one show the number themselves.
    slot_class: "ref-container",

    // The bibliography is appended to the first element with this class.
    contents_class: "contents",

    heading: "Bibliography",

    // "apa" or "ieee".
    style: "apa",

    // Make each marker number a link to its reference entry.
    link_markers: false,

    // The text for the element with the project_number_id. Use None to leave
    // the page's project number alone.
    project_number_id: "projectnumber",
    project_number: Some(" latest"),
)
"#;

    fs::write(path, blank_ron)
        .map_err(|e| format!("error writing the file {}—{}", path.to_string_lossy(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{build_settings, PageSettings};

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("docbib-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    mod test_load_file {
        use super::*;

        #[test]
        fn test_load() {
            let dir = scratch("load");
            let file = dir.join("page.html");
            save_file(&file, "<p>docbib</p>").unwrap();

            let load_result = load_file(&file);
            assert_eq!(load_result.unwrap(), "<p>docbib</p>");
        }

        #[test]
        fn fail_load() {
            let load_result = load_file(Path::new("./does-not-exist.html"));
            assert!(load_result
                .unwrap_err()
                .contains("error reading the file ./does-not-exist.html"));
        }
    }

    #[test]
    fn pages_in_directory() {
        let dir = scratch("pages");
        fs::write(dir.join("b.html"), "").unwrap();
        fs::write(dir.join("a.HTML"), "").unwrap();
        fs::write(dir.join("search.js"), "").unwrap();
        fs::create_dir(dir.join("sub.html")).unwrap();

        let pages = html_files(&dir).unwrap();
        let names: Vec<String> = pages
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.HTML", "b.html"]);

        assert!(html_files(&dir.join("missing")).is_err());
    }

    #[test]
    fn blank_settings_are_the_defaults() {
        let file = scratch("settings").join("blank-settings.ron");
        new_settings_ron(&file).unwrap();

        assert_eq!(
            build_settings(&load_file(&file).unwrap()).unwrap(),
            PageSettings::default()
        );
    }
}
