//! The module contains functionality related to CSL JSON and CSL YAML
//! libraries, and the [`CSLSource`] record every library format is read into.

use serde::{de, Deserialize, Deserializer};
use slog::debug;

/// Struct holding metadata for a source.
///
/// This struct holds the data for each source deserialized from a CSL JSON or
/// CSL YAML library, or converted from a BibTeX entry. Only the fields that the
/// bibliography formatter uses are kept. Any other data is discarded.
///
/// Based on the [JSON schema for CSL data]. Where the schema allows a field
/// to be either a string or a number, both are accepted and stored as a
/// string.
///
/// [JSON schema for CSL data]:
/// (https://github.com/citation-style-language/schema/blob/master/schemas/input/csl-data.json).
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct CSLSource {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename(deserialize = "type"))]
    pub source_type: Option<String>,
    pub author: Option<Vec<NameVariable>>,
    pub editor: Option<Vec<NameVariable>>,
    pub translator: Option<Vec<NameVariable>>,
    pub issued: Option<DateVariable>,
    pub title: Option<String>,
    #[serde(rename(deserialize = "title-short"))]
    pub title_short: Option<String>,
    #[serde(rename(deserialize = "container-title"))]
    pub container_title: Option<String>,
    #[serde(rename(deserialize = "container-title-short"))]
    pub container_title_short: Option<String>,
    #[serde(rename(deserialize = "collection-title"))]
    pub collection_title: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub edition: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub volume: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub issue: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub number: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub page: Option<String>,
    pub publisher: Option<String>,
    #[serde(rename(deserialize = "publisher-place"))]
    pub publisher_place: Option<String>,
    pub genre: Option<String>,
    #[serde(rename(deserialize = "DOI"))]
    pub doi: Option<String>,
    #[serde(rename(deserialize = "ISBN"))]
    pub isbn: Option<String>,
    #[serde(rename(deserialize = "URL"))]
    pub url: Option<String>,
}

/// Struct holding the CSL JSON `name-variable` data.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct NameVariable {
    pub family: Option<String>,
    pub given: Option<String>,
    #[serde(rename(deserialize = "non-dropping-particle"))]
    pub non_dropping_particle: Option<String>,
    #[serde(rename(deserialize = "dropping-particle"))]
    pub dropping_particle: Option<String>,
    pub suffix: Option<String>,
    pub literal: Option<String>,
}

/// Struct holding the CSL JSON `date-variable` data.
///
/// Note, `date-parts` data is a collection of collections of one-to-three
/// integers indicating the year, month, and day. Zotero sometimes writes them
/// as strings.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct DateVariable {
    #[serde(
        rename(deserialize = "date-parts"),
        default,
        deserialize_with = "date_parts"
    )]
    pub date_parts: Option<Vec<Vec<i32>>>,
    pub literal: Option<String>,
    pub raw: Option<String>,
}

impl DateVariable {
    /// The year, from the first date part, the raw date, or the literal date.
    pub fn year(&self) -> Option<String> {
        if let Some(year) = self
            .date_parts
            .as_ref()
            .and_then(|parts| parts.first())
            .and_then(|part| part.first())
        {
            return Some(year.to_string());
        }

        if let Some(raw) = &self.raw {
            let digits: String = raw.chars().take_while(|c| c.is_ascii_digit()).collect();
            if digits.len() == 4 {
                return Some(digits);
            }
        }

        self.literal.clone()
    }
}

/// A field that may be written as a string or a number.
#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl StringOrNumber {
    fn into_string(self) -> String {
        match self {
            StringOrNumber::Integer(i) => i.to_string(),
            StringOrNumber::Float(f) => f.to_string(),
            StringOrNumber::Text(s) => s,
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    StringOrNumber::deserialize(deserializer).map(StringOrNumber::into_string)
}

fn optional_string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Option::<StringOrNumber>::deserialize(deserializer)
        .map(|value| value.map(StringOrNumber::into_string))
}

fn date_parts<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<Vec<i32>>>, D::Error> {
    let parts = match Option::<Vec<Vec<StringOrNumber>>>::deserialize(deserializer)? {
        Some(p) => p,
        None => return Ok(None),
    };

    let mut dates = Vec::with_capacity(parts.len());
    for part in parts {
        let mut date = Vec::with_capacity(part.len());
        for value in part {
            let value = value.into_string();
            let number = value
                .trim()
                .parse::<i32>()
                .map_err(|_| de::Error::custom(format!("invalid date part \"{}\"", value)))?;
            date.push(number);
        }
        dates.push(date);
    }

    Ok(Some(dates))
}

/// A CSL YAML library, either a bare list or a `references` mapping.
#[derive(Deserialize)]
#[serde(untagged)]
enum YamlLibrary {
    List(Vec<CSLSource>),
    References { references: Vec<CSLSource> },
}

/// Deserialize a CSL JSON library.
///
/// Deserialize a string of JSON into a collection of [`CSLSource`]s.
pub fn build_csl_json_lib(csl_string: &str) -> Result<Vec<CSLSource>, String> {
    debug!(slog_scope::logger(), "Starting CSL JSON parsing...");
    match serde_json::from_str(csl_string) {
        Ok(r) => {
            debug!(slog_scope::logger(), "CSL JSON parsed");
            Ok(r)
        }
        Err(e) => {
            let err_msg = format!("error deserializing the CSL JSON—{}", e);
            Err(err_msg)
        }
    }
}

/// Deserialize a CSL YAML library.
pub fn build_csl_yaml_lib(csl_string: &str) -> Result<Vec<CSLSource>, String> {
    debug!(slog_scope::logger(), "Starting CSL YAML parsing...");
    match serde_yaml::from_str(csl_string) {
        Ok(YamlLibrary::List(r)) | Ok(YamlLibrary::References { references: r }) => {
            debug!(slog_scope::logger(), "CSL YAML parsed");
            Ok(r)
        }
        Err(e) => {
            let err_msg = format!("error deserializing the CSL YAML—{}", e);
            Err(err_msg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSL_JSON: &str = r#"[
        {
            "id": "alewijnse2018model",
            "type": "article-journal",
            "author": [
                {"family": "Alewijnse", "given": "Sander P. A."},
                {"family": "Buchin", "given": "Kevin"}
            ],
            "container-title": "Algorithmica",
            "issued": {"date-parts": [[2018, "5"]]},
            "page": "2422-2452",
            "title": "Model-based segmentation and classification of trajectories",
            "volume": 80,
            "DOI": "10.1007/s00453-017-0329-x"
        },
        {
            "id": 42,
            "type": "book",
            "author": [{"literal": "World Health Organization"}],
            "edition": 2,
            "issued": {"raw": "2009-10"},
            "title": "A Numeric Id"
        }
    ]"#;

    #[test]
    fn basic() {
        let result = build_csl_json_lib(CSL_JSON).unwrap();

        assert_eq!(result.len(), 2);
        let article = &result[0];
        assert_eq!(article.id, "alewijnse2018model");
        assert_eq!(article.source_type.as_deref(), Some("article-journal"));
        assert_eq!(article.author.as_ref().unwrap().len(), 2);
        assert_eq!(
            article.author.as_ref().unwrap()[0].given.as_deref(),
            Some("Sander P. A.")
        );
        assert_eq!(article.container_title.as_deref(), Some("Algorithmica"));
        assert_eq!(
            article.issued.as_ref().unwrap().date_parts,
            Some(vec![vec![2018, 5]])
        );
        assert_eq!(article.volume.as_deref(), Some("80"));
        assert_eq!(article.page.as_deref(), Some("2422-2452"));
        assert_eq!(article.doi.as_deref(), Some("10.1007/s00453-017-0329-x"));
        assert!(article.editor.is_none());
    }

    #[test]
    fn numbers_as_strings() {
        let result = build_csl_json_lib(CSL_JSON).unwrap();
        let book = &result[1];

        assert_eq!(book.id, "42");
        assert_eq!(book.edition.as_deref(), Some("2"));
        assert_eq!(
            book.author.as_ref().unwrap()[0].literal.as_deref(),
            Some("World Health Organization")
        );
        assert_eq!(book.issued.as_ref().unwrap().year().as_deref(), Some("2009"));
    }

    #[test]
    fn years() {
        let literal = DateVariable {
            literal: Some("forthcoming".to_string()),
            ..Default::default()
        };
        assert_eq!(literal.year().as_deref(), Some("forthcoming"));
        assert_eq!(DateVariable::default().year(), None);
    }

    #[test]
    fn bad_json() {
        let result = build_csl_json_lib("[{\"title\": \"no id\"}]");
        assert!(result.unwrap_err().starts_with("error deserializing the CSL JSON"));
    }

    #[test]
    fn yaml_list_and_mapping() {
        let list = r#"
- id: BB2009
  type: article-journal
  title: A Generic Geometry Library
  author:
    - family: Gehrels
      given: Barend
  issued:
    date-parts:
      - [2009]
"#;
        let mapping = r#"
references:
  - id: BBM2010
    title: Generic Programming for Geometry
    volume: 10
"#;

        let list = build_csl_yaml_lib(list).unwrap();
        assert_eq!(list[0].id, "BB2009");
        assert_eq!(list[0].issued.as_ref().unwrap().year().as_deref(), Some("2009"));

        let mapping = build_csl_yaml_lib(mapping).unwrap();
        assert_eq!(mapping[0].id, "BBM2010");
        assert_eq!(mapping[0].volume.as_deref(), Some("10"));
    }
}
