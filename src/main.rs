//! `main.rs` contains the command-line interface for docbib. It collects the
//! values and options, sets up the logger, assembles the configuration, and
//! passes the configuration to the main function.
#[macro_use]
extern crate slog;

use ansi_term::Color;
use clap::{crate_version, App, Arg, ArgMatches, SubCommand};
use docbib::config::{DocbibCommand, DocbibConfig, Output, PageConfig};
use slog::{debug, Drain, Level};
use std::{fs::OpenOptions, path::Path, process, sync::Mutex};

fn main() {
    // Get the command-line arguments and options
    let matches = App::new("docbib")
        .version(crate_version!())
        .about("Numbers the citations in documentation pages and appends their bibliography")
        .subcommand_negates_reqs(true)
        .args_conflicts_with_subcommands(true)
        .arg(
            Arg::with_name("input")
                .value_name("INPUT")
                .help("The HTML page, or a directory of HTML pages, to process")
                .index(1)
                .required(true),
        )
        .arg(
            Arg::with_name("library")
                .value_name("LIBRARY FILE")
                .help("The bibliography in BibTeX, CSL JSON, or CSL YAML format")
                .index(2)
                .required(true),
        )
        .arg(
            Arg::with_name("output")
                .value_name("OUTPUT")
                .help("The output page or directory (blank outputs a page to terminal)")
                .index(3)
                .required(false),
        )
        .arg(
            Arg::with_name("settings")
                .short('s')
                .long("settings")
                .value_name("SETTINGS FILE")
                .help("A RON file with page settings"),
        )
        .arg(
            Arg::with_name("style")
                .long("style")
                .value_name("STYLE")
                .possible_values(["apa", "ieee"])
                .help("The bibliography style"),
        )
        .arg(
            Arg::with_name("heading")
                .long("heading")
                .value_name("TEXT")
                .help("The bibliography heading"),
        )
        .arg(
            Arg::with_name("link")
                .short('l')
                .long("link")
                .takes_value(false)
                .help("Links each citation number to its reference entry"),
        )
        .arg(
            Arg::with_name("force_overwrite")
                .short('W')
                .long("force_overwrite")
                .takes_value(false)
                .help("Required to overwrite the input with the output"),
        )
        .arg(
            Arg::with_name("debug")
                .short('d')
                .long("debug")
                .takes_value(false)
                .help("Outputs debug log to docbib-log.json")
                .hidden_short_help(true)
                .hidden_long_help(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short('v')
                .long("verbose")
                .value_name("NUMBER")
                .help("Verbosity level between 0 and 5")
                .hidden_short_help(true)
                .hidden_long_help(true)
                .default_value("1"),
        )
        .subcommand(SubCommand::with_name("settings").about("For creating a blank settings file"))
        .get_matches();

    // The guard is dropped before exiting so the async drain is flushed.
    let result = {
        let _guard = setup_logger(&matches);
        debug!(slog_scope::logger(), "Logger setup");

        let result = run(&matches);
        if let Err(e) = &result {
            error!(slog_scope::logger(), "{}", e);
        }
        result
    };

    if let Err(e) = result {
        eprintln!("{} {}", Color::Red.paint("ERRO"), e);
        process::exit(1);
    }
}

/// Setup the logger.
///
/// If the debug flag is set, the log is also output to a file
/// `docbib-log.json`.
fn setup_logger(matches: &ArgMatches) -> slog_scope::GlobalLoggerGuard {
    let debug = matches.is_present("debug");
    let min_log_level = match matches.value_of("verbose") {
        Some("0") => Level::Critical,
        Some("1") => Level::Error,
        Some("2") => Level::Warning,
        Some("3") => Level::Info,
        Some("4") => Level::Debug,
        Some("5") => Level::Trace,
        _ => Level::Info,
    };

    let term_decorator = slog_term::TermDecorator::new().build();
    let term_drain = slog_term::CompactFormat::new(term_decorator).build().fuse();
    let term_drain = slog_async::Async::new(term_drain).build().fuse();
    let term_drain = term_drain.filter_level(min_log_level).fuse();

    if debug {
        // Setup the file AND terminal loggers
        let log_file = match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open("./docbib-log.json")
        {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "{} Unable to create docbib-log.json: {}",
                    Color::Red.paint("ERRO"),
                    e
                );
                process::exit(1);
            }
        };
        let file_drain = slog_json::Json::new(log_file)
            .set_pretty(true)
            .add_default_keys()
            .build()
            .fuse();
        let file_drain = file_drain.filter_level(Level::Trace).fuse();
        let dual_logger = slog::Logger::root(
            Mutex::new(slog::Duplicate(term_drain, file_drain)).fuse(),
            o!("version" => crate_version!()),
        );
        slog_scope::set_global_logger(dual_logger)
    } else {
        // Setup just the terminal logger
        let term_logger = slog::Logger::root(term_drain, o!("version" => crate_version!()));
        slog_scope::set_global_logger(term_logger)
    }
}

/// Build the configuration from the command line and run docbib.
fn run(matches: &ArgMatches) -> Result<(), String> {
    // Setup the configuration variables.
    //
    // Subcommands
    if matches.subcommand_name() == Some("settings") {
        let config = DocbibConfig::new(DocbibCommand::NewSettingsFile, None, None);
        return docbib::docbib(config);
    }

    // Files. Clap has already required these.
    let (input, library) = match (matches.value_of("input"), matches.value_of("library")) {
        (Some(i), Some(l)) => (i, l),
        _ => return Err("an input and a library are required".to_string()),
    };
    let output = matches.value_of("output");

    // Page options
    let settings = matches.value_of("settings");
    let style = matches.value_of("style");
    let heading = matches.value_of("heading");
    let link = matches.is_present("link");
    let force_overwrite = matches.is_present("force_overwrite");

    // Deal with command-line errors.
    //
    // If the input and output are identical and force_overwrite has not been
    // used, return an error and exit.
    if output.map(|o| Path::new(o) == Path::new(input)).unwrap_or(false) && !force_overwrite {
        return Err(format!("The input ({}) and output ({}) are the same,\n     but the force overwrite option was not set.\n     If you want to overwrite the input, use -W/--force_overwrite.", Color::Blue.paint(input), Color::Blue.paint(output.unwrap_or_default())));
    }

    // Determine the output
    let output_option = if Path::new(input).is_dir() {
        match output {
            Some(d) => Output::Directory(d),
            None if force_overwrite => Output::Directory(input),
            None => {
                return Err(format!(
                    "The input {} is a directory, so an output directory is required.\n     If you want to overwrite the pages in place, use -W/--force_overwrite.",
                    Color::Blue.paint(input)
                ))
            }
        }
    } else {
        match output {
            Some(f) => Output::File(f),
            None => Output::StandardOut,
        }
    };

    // Create the configuration
    let page_config = PageConfig::new(input, library, settings, style, heading, link);
    let config = DocbibConfig::new(DocbibCommand::Main, Some(output_option), Some(page_config));

    // Run the program.
    docbib::docbib(config)
}
