//! Flashcard records and the media manifest.
//!
//! The [`CardAssembler`] consumes cues in marker order together with their
//! [`CueOutcome`]s. Every extracted cue becomes one [`Card`]; skipped cues
//! leave a gap in the marker sequence and contribute nothing to the
//! manifest.

use std::path::Path;

use serde::Serialize;

use crate::artifact::MediaArtifact;
use crate::cue::LogicalCue;
use crate::extractor::{CueOutcome, SkipReason};

/// Reference to an audio file, as Anki expects it inside a field.
pub fn audio_ref(file_name: &str) -> String {
    format!("[sound:{file_name}]")
}

/// Reference to an image file, as Anki expects it inside a field.
pub fn image_ref(file_name: &str) -> String {
    format!("<img src=\"{file_name}\">")
}

/// One flashcard.
///
/// Field order matches [`NoteModel`](crate::NoteModel): marker, expression,
/// reading, meaning, audio, image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    /// Position of the cue in the normalized sequence, starting at 1.
    pub marker: usize,
    /// Cleaned subtitle text.
    pub expression: String,
    /// Left blank for manual entry.
    pub reading: String,
    /// Left blank for manual entry.
    pub meaning: String,
    /// `[sound:N.mp3]`
    pub audio_ref: String,
    /// `<img src="N.jpg">`
    pub image_ref: String,
}

impl Card {
    /// The note fields in model order.
    pub fn fields(&self) -> [String; 6] {
        [
            self.marker.to_string(),
            self.expression.clone(),
            self.reading.clone(),
            self.meaning.clone(),
            self.audio_ref.clone(),
            self.image_ref.clone(),
        ]
    }
}

/// What happened to one logical cue during a run.
#[derive(Debug, Clone, Serialize)]
pub struct CueReport {
    /// Marker assigned to the cue.
    pub marker: usize,
    /// Start of the cue in milliseconds, before offset.
    pub start: i64,
    /// End of the cue in milliseconds, before offset.
    pub end: i64,
    /// Cleaned text.
    pub text: String,
    /// Extraction result.
    pub outcome: CueOutcome,
}

/// The output of a run: cards, the media to embed, and a per-cue report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Deck {
    /// Cards in marker order.
    pub cards: Vec<Card>,
    /// Media referenced by `cards`, audio then image per card.
    pub manifest: Vec<MediaArtifact>,
    /// One entry per logical cue, extracted or not.
    pub report: Vec<CueReport>,
}

impl Deck {
    /// Returns `true` when no card was produced.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Paths of every manifest entry.
    pub fn media_paths(&self) -> impl Iterator<Item = &Path> {
        self.manifest.iter().map(|artifact| artifact.path.as_path())
    }

    /// Cues that produced no card, with the reason.
    pub fn skipped(&self) -> impl Iterator<Item = (usize, &SkipReason)> {
        self.report.iter().filter_map(|entry| {
            entry
                .outcome
                .skip_reason()
                .map(|reason| (entry.marker, reason))
        })
    }
}

/// Builds a [`Deck`] one cue at a time.
///
/// Markers are supplied by the caller and are expected to be the cue's
/// position in the normalized sequence; they are not renumbered here.
#[derive(Debug, Default)]
pub struct CardAssembler {
    deck: Deck,
}

impl CardAssembler {
    /// Start an empty deck.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome for `cue` and return the card, if one was made.
    ///
    /// Only an [`CueOutcome::Extracted`] cue produces a card and manifest
    /// entries. Artifacts listed by a skipped outcome stay out of the
    /// manifest.
    pub fn accept(&mut self, marker: usize, cue: &LogicalCue, outcome: CueOutcome) -> Option<&Card> {
        let card = match &outcome {
            CueOutcome::Extracted { audio, image } => {
                self.deck.manifest.push(audio.clone());
                self.deck.manifest.push(image.clone());
                Some(Card {
                    marker,
                    expression: cue.text.clone(),
                    reading: String::new(),
                    meaning: String::new(),
                    audio_ref: audio_ref(&audio.file_name()),
                    image_ref: image_ref(&image.file_name()),
                })
            }
            CueOutcome::Skipped { .. } => None,
        };

        self.deck.report.push(CueReport {
            marker,
            start: cue.start,
            end: cue.end,
            text: cue.text.clone(),
            outcome,
        });

        let card = card?;
        self.deck.cards.push(card);
        self.deck.cards.last()
    }

    /// Number of cards produced so far.
    pub fn card_count(&self) -> usize {
        self.deck.cards.len()
    }

    /// Finish assembling.
    pub fn finish(self) -> Deck {
        self.deck
    }
}
