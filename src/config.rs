//! The structures and functions for configuration. Must be accessible to main.

use ron::de::from_str;
use serde::Deserialize;
use slog::debug;

/// The overall options.
pub struct DocbibConfig<'a> {
    pub command: DocbibCommand,
    pub output: Option<Output<'a>>,
    pub page_config: Option<PageConfig<'a>>,
}

impl DocbibConfig<'_> {
    pub fn new<'a>(
        command: DocbibCommand,
        output: Option<Output<'a>>,
        page_config: Option<PageConfig<'a>>,
    ) -> DocbibConfig<'a> {
        DocbibConfig {
            command,
            output,
            page_config,
        }
    }
}

/// The types of subcommands.
#[derive(PartialEq, Eq, Debug)]
pub enum DocbibCommand {
    Main,
    NewSettingsFile,
}

/// Where processed pages go.
#[derive(PartialEq, Eq, Debug)]
pub enum Output<'a> {
    StandardOut,
    File(&'a str),
    Directory(&'a str),
}

/// Page-processing configuration.
pub struct PageConfig<'a> {
    pub input: &'a str,
    pub library: &'a str,
    pub settings: Option<&'a str>,
    pub style: Option<&'a str>,
    pub heading: Option<&'a str>,
    pub link_markers: bool,
}

impl PageConfig<'_> {
    pub fn new<'a>(
        input: &'a str,
        library: &'a str,
        settings: Option<&'a str>,
        style: Option<&'a str>,
        heading: Option<&'a str>,
        link_markers: bool,
    ) -> PageConfig<'a> {
        PageConfig {
            input,
            library,
            settings,
            style,
            heading,
            link_markers,
        }
    }
}

/// Settings for finding citations in a page and writing its bibliography.
///
/// Read from a RON file. Missing fields take the defaults, which match the
/// markup Doxygen pages use for citations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PageSettings {
    /// The class of citation-marker elements.
    pub marker_class: String,
    /// The marker attribute holding the citation key.
    pub key_attribute: String,
    /// The class of the element inside a marker that shows its number.
    pub slot_class: String,
    /// The class of the region the bibliography is appended to.
    pub contents_class: String,
    pub heading: String,
    pub style: String,
    /// Wrap marker numbers in links to their entries.
    pub link_markers: bool,
    pub project_number_id: String,
    /// Text for the project-number element, if any.
    pub project_number: Option<String>,
}

impl Default for PageSettings {
    fn default() -> Self {
        PageSettings {
            marker_class: "citationjs".to_string(),
            key_attribute: "data-citeid".to_string(),
            slot_class: "ref-container".to_string(),
            contents_class: "contents".to_string(),
            heading: "Bibliography".to_string(),
            style: "apa".to_string(),
            link_markers: false,
            project_number_id: "projectnumber".to_string(),
            project_number: Some(" latest".to_string()),
        }
    }
}

impl PageSettings {
    /// Apply the command-line overrides.
    pub fn apply(&mut self, config: &PageConfig) {
        if let Some(style) = config.style {
            self.style = style.to_string();
        }
        if let Some(heading) = config.heading {
            self.heading = heading.to_string();
        }
        if config.link_markers {
            self.link_markers = true;
        }
    }
}

/// Deserialize a settings file.
pub fn build_settings(input: &str) -> Result<PageSettings, String> {
    match from_str(input) {
        Ok(s) => {
            debug!(slog_scope::logger(), "Settings file parsed");
            Ok(s)
        }
        Err(e) => {
            let err_msg = format!("error deserializing the settings file—{}", e);
            Err(err_msg)
        }
    }
}
