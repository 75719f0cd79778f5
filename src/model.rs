//! The note type cards are stored under.
//!
//! A [`NoteModel`] is an immutable value: build it once (usually with
//! [`NoteModel::default`]) and hand it to the packager.

use serde::Serialize;

/// Identifier of the default sentence-card note type.
pub const DEFAULT_MODEL_ID: i64 = 1_740_692_504;

/// Name of the default sentence-card note type.
pub const DEFAULT_MODEL_NAME: &str = "japanese + subs2srs";

/// Field names of the default note type, in card order.
pub const DEFAULT_FIELDS: [&str; 6] = [
    "SequenceMarker",
    "Expression",
    "Reading",
    "Meaning",
    "Audio",
    "Image",
];

const DEFAULT_QUESTION: &str = "<div class=jp> {{Expression}} </div>{{Audio}}{{Image}}";

const DEFAULT_ANSWER: &str = "{{FrontSide}}

<hr id=answer>

<div class=jp> {{furigana:Reading}} </div><br>
{{Meaning}}";

const DEFAULT_CSS: &str = r#".card {
 font-family: arial;
 font-size: 20px;
 text-align: center;
 color: black;
 background-color: white;
}
.jp { font-size: 30px }
.win .jp { font-family: "MS Mincho", "ＭＳ 明朝"; }
.mac .jp { font-family: "Hiragino Mincho Pro", "ヒラギノ明朝 Pro"; }
.linux .jp { font-family: "Kochi Mincho", "東風明朝"; }
.mobile .jp { font-family: "Hiragino Mincho ProN"; }"#;

/// One card template of a note type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardTemplate {
    /// Template name shown in Anki.
    pub name: String,
    /// Front side.
    pub question: String,
    /// Back side.
    pub answer: String,
}

/// An Anki note type: fields, templates and styling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteModel {
    /// Stable model identifier.
    pub id: i64,
    /// Model name shown in Anki.
    pub name: String,
    /// Field names in order.
    pub fields: Vec<String>,
    /// Card templates.
    pub templates: Vec<CardTemplate>,
    /// Shared stylesheet.
    pub css: String,
}

impl Default for NoteModel {
    fn default() -> Self {
        Self {
            id: DEFAULT_MODEL_ID,
            name: DEFAULT_MODEL_NAME.to_string(),
            fields: DEFAULT_FIELDS.iter().map(|name| name.to_string()).collect(),
            templates: vec![CardTemplate {
                name: "Card 1".to_string(),
                question: DEFAULT_QUESTION.to_string(),
                answer: DEFAULT_ANSWER.to_string(),
            }],
            css: DEFAULT_CSS.to_string(),
        }
    }
}

impl NoteModel {
    /// Ordinals of the fields the question side of `template` refers to.
    ///
    /// Anki generates a card when any of them is non-empty. `{{FrontSide}}`
    /// and unknown names are ignored; filters such as `furigana:` are
    /// stripped before lookup.
    pub fn required_fields(&self, template: &CardTemplate) -> Vec<usize> {
        let mut ordinals: Vec<usize> = template_references(&template.question)
            .filter_map(|name| self.fields.iter().position(|field| field == name))
            .collect();
        ordinals.sort_unstable();
        ordinals.dedup();
        ordinals
    }
}

fn template_references(template: &str) -> impl Iterator<Item = &str> {
    template
        .split("{{")
        .skip(1)
        .filter_map(|chunk| chunk.split_once("}}").map(|(inner, _)| inner))
        .map(|inner| {
            let inner = inner.trim_start_matches(['#', '^', '/']);
            inner.rsplit(':').next().unwrap_or(inner).trim()
        })
        .filter(|name| *name != "FrontSide")
}
