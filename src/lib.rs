//! Contains the main docbib function. Loads the settings and library, then
//! runs every input page through the citation pass.

pub mod bibliography;
pub mod config;
mod fs;
pub mod library;
pub mod page;

use ansi_term::Color;
use bibliography::formatter::{BibStyle, HtmlFormatter};
use config::{build_settings, DocbibCommand, DocbibConfig, Output, PageSettings};
use fs::load_file;
use library::{build_library, Library, LibraryFormat};
use slog::{debug, info, o};
use std::path::{Path, PathBuf};

/// The main docbib function.
///
/// Load errors are returned rather than ending the process, so the caller
/// can flush its logger before exiting.
pub fn docbib(config: DocbibConfig) -> Result<(), String> {
    // Check subcommands.
    if config.command == DocbibCommand::NewSettingsFile {
        debug!(slog_scope::logger(), "Creating blank settings file");
        return fs::new_settings_ron(Path::new("blank-settings.ron"));
    }

    let page_config = match config.page_config {
        Some(p) => p,
        None => return Err("no input page was given".to_string()),
    };
    let output = config.output.unwrap_or(Output::StandardOut);

    eprintln!("{} Starting docbib...", Color::Green.paint("INFO"));

    // Load the settings, if any
    let mut settings = match page_config.settings {
        Some(s) => {
            match slog_scope::scope(&slog_scope::logger().new(o!("fn" => "load_file()")), || {
                load_file(Path::new(s)).and_then(|contents| build_settings(&contents))
            }) {
                Ok(s) => s,
                Err(e) => return Err(format!("settings load error—{}", e)),
            }
        }
        None => PageSettings::default(),
    };
    settings.apply(&page_config);

    let style =
        BibStyle::from_name(&settings.style).map_err(|e| format!("settings error—{}", e))?;
    let formatter = HtmlFormatter::new(style);

    // Load the library
    let library = match slog_scope::scope(
        &slog_scope::logger().new(o!("fn" => "load_library()")),
        || load_library(Path::new(page_config.library)),
    ) {
        Ok(l) => l,
        Err(e) => return Err(format!("library load error—{}", e)),
    };

    // Pair each input page with where it goes
    let input = Path::new(page_config.input);
    let jobs: Vec<(PathBuf, Option<PathBuf>)> = match output {
        Output::StandardOut => vec![(input.to_path_buf(), None)],
        Output::File(f) => vec![(input.to_path_buf(), Some(PathBuf::from(f)))],
        Output::Directory(d) => {
            let dir = Path::new(d);
            fs::create_dir(dir)?;
            fs::html_files(input)?
                .into_iter()
                .map(|page| {
                    let target = page.file_name().map(|name| dir.join(name));
                    (page, target)
                })
                .collect()
        }
    };

    eprintln!(
        "{} Processing {} page(s) in {} style...",
        Color::Green.paint("INFO"),
        jobs.len(),
        style.name()
    );

    let mut incomplete = 0;
    for (source, target) in &jobs {
        info!(
            slog_scope::logger(),
            "Processing {}",
            source.to_string_lossy()
        );

        let contents = load_file(source)?;
        let processed = match slog_scope::scope(
            &slog_scope::logger().new(o!("fn" => "page()")),
            || page::page(&contents, &library, &formatter, &settings),
        ) {
            Ok(p) => p,
            Err(e) => {
                return Err(format!(
                    "page error in {}—{}",
                    source.to_string_lossy(),
                    e
                ))
            }
        };

        if processed.report.fault.is_some() {
            incomplete += 1;
        }

        match target {
            Some(t) => fs::save_file(t, &processed.html)?,
            None => print!("{}", processed.html),
        }
    }

    if incomplete > 0 {
        return Err(format!(
            "{} of {} page(s) were written without a complete bibliography",
            incomplete,
            jobs.len()
        ));
    }

    eprintln!("{} Done", Color::Green.paint("INFO"));
    Ok(())
}

/// Read and deserialize the library file.
fn load_library(path: &Path) -> Result<Library, String> {
    let format = LibraryFormat::from_path(path)?;
    let contents = load_file(path)?;
    build_library(&contents, format)
}
