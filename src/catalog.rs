use std::fs;
use std::path::Path;

use clap::ValueEnum;
use include_dir::{include_dir, Dir};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::typing_policy::InputMode;

static CATALOG_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/catalog");

const BUNDLED_FILE: &str = "questions.json";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PromptLength {
    Short,
    Long,
}

impl PromptLength {
    pub const ALL: [PromptLength; 2] = [PromptLength::Short, PromptLength::Long];

    pub fn label(self) -> &'static str {
        match self {
            PromptLength::Short => "short (about 30 characters, one small task)",
            PromptLength::Long => "long (a few hundred characters, settle in)",
        }
    }
}

/// A passage to type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Prompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            explanation: None,
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }
}

// catalogs may list prompts as bare strings
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum PromptEntry {
    Text(String),
    Full(Prompt),
}

impl From<PromptEntry> for Prompt {
    fn from(entry: PromptEntry) -> Self {
        match entry {
            PromptEntry::Text(text) => Prompt::new(text),
            PromptEntry::Full(prompt) => prompt,
        }
    }
}

fn prompt_list<'de, D>(deserializer: D) -> std::result::Result<Vec<Prompt>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let entries = Vec::<PromptEntry>::deserialize(deserializer)?;
    Ok(entries.into_iter().map(Prompt::from).collect())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionCollection {
    #[serde(default, deserialize_with = "prompt_list")]
    pub short: Vec<Prompt>,
    #[serde(default, deserialize_with = "prompt_list")]
    pub long: Vec<Prompt>,
}

impl QuestionCollection {
    pub fn get(&self, length: PromptLength) -> &[Prompt] {
        match length {
            PromptLength::Short => &self.short,
            PromptLength::Long => &self.long,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeQuestions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub japanese: Option<QuestionCollection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub english: Option<QuestionCollection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copy: Option<QuestionCollection>,
}

impl ThemeQuestions {
    pub fn get(&self, mode: InputMode) -> Option<&QuestionCollection> {
        match mode {
            InputMode::Japanese => self.japanese.as_ref(),
            InputMode::English => self.english.as_ref(),
            InputMode::Copy => self.copy.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeLabel {
    #[serde(default)]
    pub japanese: String,
    #[serde(default)]
    pub english: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copy: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeDefinition {
    pub id: String,
    #[serde(default)]
    pub label: ThemeLabel,
    #[serde(default)]
    pub available_languages: Vec<InputMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub questions: ThemeQuestions,
}

impl ThemeDefinition {
    /// Display label for a mode, falling back through the other labels to the id.
    pub fn label_for(&self, mode: InputMode) -> &str {
        let preferred = match mode {
            InputMode::Japanese => Some(self.label.japanese.as_str()),
            InputMode::English => Some(self.label.english.as_str()),
            InputMode::Copy => self.label.copy.as_deref(),
        };
        [
            preferred,
            Some(self.label.japanese.as_str()),
            Some(self.label.english.as_str()),
        ]
        .into_iter()
        .flatten()
        .find(|label| !label.is_empty())
        .unwrap_or(self.id.as_str())
    }

    pub fn supports(&self, mode: InputMode) -> bool {
        self.available_languages.contains(&mode)
    }

    pub fn prompts(&self, mode: InputMode, length: PromptLength) -> &[Prompt] {
        self.questions
            .get(mode)
            .map(|collection| collection.get(length))
            .unwrap_or(&[])
    }
}

/// Selection made on the mode-selection screen (or on the command line).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOptions {
    pub language: InputMode,
    pub length: PromptLength,
    pub theme_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionBank {
    #[serde(default)]
    pub themes: Vec<ThemeDefinition>,
}

impl QuestionBank {
    /// The catalog compiled into the binary.
    pub fn bundled() -> Result<Self> {
        let file = CATALOG_DIR
            .get_file(BUNDLED_FILE)
            .ok_or_else(|| Error::CatalogRead {
                path: BUNDLED_FILE.into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not bundled"),
            })?;
        let contents = file.contents_utf8().unwrap_or_default();
        Self::from_json_str(contents)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| Error::CatalogRead {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("loaded question catalog from {}", path.display());
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        let bank: QuestionBank = serde_json::from_str(contents)?;
        for theme in &bank.themes {
            if theme.available_languages.is_empty() {
                warn!("theme {} lists no available languages", theme.id);
            }
        }
        Ok(bank)
    }

    /// Loads `path` when given, the bundled catalog otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None => Self::bundled(),
        }
    }

    pub fn theme(&self, theme_id: &str) -> Result<&ThemeDefinition> {
        self.themes
            .iter()
            .find(|theme| theme.id == theme_id)
            .ok_or_else(|| Error::UnknownTheme {
                theme_id: theme_id.to_string(),
            })
    }

    pub fn themes_for(&self, mode: InputMode) -> impl Iterator<Item = &ThemeDefinition> {
        self.themes.iter().filter(move |theme| theme.supports(mode))
    }

    /// Prompts for a selection, in catalog order.
    pub fn prompts(&self, options: &GameOptions) -> Result<Vec<Prompt>> {
        let prompts = self
            .theme(&options.theme_id)?
            .prompts(options.language, options.length);
        if prompts.is_empty() {
            return Err(Error::NoPrompts {
                theme_id: options.theme_id.clone(),
                language: options.language,
                length: options.length,
            });
        }
        Ok(prompts.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const SAMPLE: &str = r#"
    {
        "themes": [
            {
                "id": "animals",
                "label": { "japanese": "どうぶつ", "english": "Animals" },
                "availableLanguages": ["japanese", "english"],
                "description": "short animal words",
                "questions": {
                    "japanese": { "short": ["ねこ", { "text": "いぬ" }], "long": [] },
                    "english": { "short": [{ "text": "cat" }] }
                }
            },
            {
                "id": "rust",
                "label": { "japanese": "", "english": "", "copy": "Rust snippets" },
                "availableLanguages": ["copy"],
                "questions": {
                    "copy": {
                        "short": [{ "text": "let x = 1;", "explanation": "binds x" }]
                    }
                }
            }
        ]
    }
    "#;

    fn sample() -> QuestionBank {
        QuestionBank::from_json_str(SAMPLE).unwrap()
    }

    #[test]
    fn bare_strings_normalize_to_prompts() {
        let bank = sample();
        let options = GameOptions {
            language: InputMode::Japanese,
            length: PromptLength::Short,
            theme_id: "animals".into(),
        };
        let prompts = bank.prompts(&options).unwrap();
        assert_eq!(prompts, vec![Prompt::new("ねこ"), Prompt::new("いぬ")]);
    }

    #[test]
    fn explanation_is_kept() {
        let bank = sample();
        let prompt = &bank.theme("rust").unwrap().prompts(InputMode::Copy, PromptLength::Short)[0];
        assert_eq!(prompt, &Prompt::new("let x = 1;").with_explanation("binds x"));
    }

    #[test]
    fn unknown_theme_is_reported() {
        let bank = sample();
        assert_matches!(bank.theme("space"), Err(Error::UnknownTheme { theme_id }) if theme_id == "space");
    }

    #[test]
    fn empty_selection_is_reported() {
        let bank = sample();
        let options = GameOptions {
            language: InputMode::Japanese,
            length: PromptLength::Long,
            theme_id: "animals".into(),
        };
        assert_matches!(bank.prompts(&options), Err(Error::NoPrompts { .. }));

        let missing_language = GameOptions {
            language: InputMode::Copy,
            length: PromptLength::Short,
            theme_id: "animals".into(),
        };
        assert_matches!(bank.prompts(&missing_language), Err(Error::NoPrompts { .. }));
    }

    #[test]
    fn themes_are_filtered_by_mode() {
        let bank = sample();
        let ids: Vec<&str> = bank
            .themes_for(InputMode::Copy)
            .map(|theme| theme.id.as_str())
            .collect();
        assert_eq!(ids, vec!["rust"]);
        assert_eq!(bank.themes_for(InputMode::English).count(), 1);
    }

    #[test]
    fn label_falls_back_through_languages() {
        let bank = sample();
        let animals = bank.theme("animals").unwrap();
        assert_eq!(animals.label_for(InputMode::English), "Animals");
        assert_eq!(animals.label_for(InputMode::Copy), "どうぶつ");

        let rust = bank.theme("rust").unwrap();
        assert_eq!(rust.label_for(InputMode::Copy), "Rust snippets");
        assert_eq!(rust.label_for(InputMode::English), "rust");
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert_matches!(
            QuestionBank::from_json_str("{ not json"),
            Err(Error::CatalogParse(_))
        );
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = QuestionBank::from_path("/definitely/not/here.json").unwrap_err();
        assert!(err.is_catalog_unavailable());
    }

    #[test]
    fn bundled_catalog_covers_every_mode() {
        let bank = QuestionBank::bundled().unwrap();
        for mode in InputMode::ALL {
            let theme = bank.themes_for(mode).next().expect("theme for mode");
            for length in PromptLength::ALL {
                assert!(
                    !theme.prompts(mode, length).is_empty(),
                    "{} {} {}",
                    theme.id,
                    mode,
                    length
                );
            }
        }
    }
}
