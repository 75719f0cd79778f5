//! Anki package (`.apkg`) output.
//!
//! An `.apkg` file is a zip archive holding a SQLite collection named
//! `collection.anki2`, a `media` JSON index, and every media file stored
//! under its index position (`"0"`, `"1"`, ...). [`ApkgPackager`] writes the
//! same layout and collection schema as genanki, so the result imports into
//! any current Anki desktop or mobile client.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use subdeck::{ApkgPackager, Deck, DeckId, DeckPackager, NoteModel, PackageRequest};
//!
//! # fn demo(deck: &Deck) -> Result<(), subdeck::SubdeckError> {
//! let model = NoteModel::default();
//! let request = PackageRequest::new(DeckId::random(), "episode01", &model, deck);
//! ApkgPackager::new().package(&request, Path::new("episode01.apkg"))?;
//! # Ok(())
//! # }
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use rusqlite::{Connection, params};
use serde_json::{Map, Value, json};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::artifact::MediaArtifact;
use crate::card::{Card, Deck};
use crate::error::SubdeckError;
use crate::model::NoteModel;

const COLLECTION_ENTRY: &str = "collection.anki2";
const MEDIA_ENTRY: &str = "media";
const FIELD_SEPARATOR: char = '\x1f';

const BASE91_TABLE: &[u8; 91] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!#$%&()*+,-./:;<=>?@[]^_`{|}~";

const LATEX_PRE: &str = "\\documentclass[12pt]{article}\n\\special{papersize=3in,5in}\n\\usepackage[utf8]{inputenc}\n\\usepackage{amssymb,amsmath}\n\\pagestyle{empty}\n\\setlength{\\parindent}{0in}\n\\begin{document}\n";
const LATEX_POST: &str = "\\end{document}";

const SCHEMA: &str = r#"
    CREATE TABLE col (
        id      integer primary key,
        crt     integer not null,
        mod     integer not null,
        scm     integer not null,
        ver     integer not null,
        dty     integer not null,
        usn     integer not null,
        ls      integer not null,
        conf    text not null,
        models  text not null,
        decks   text not null,
        dconf   text not null,
        tags    text not null
    );
    CREATE TABLE notes (
        id      integer primary key,
        guid    text not null,
        mid     integer not null,
        mod     integer not null,
        usn     integer not null,
        tags    text not null,
        flds    text not null,
        sfld    integer not null,
        csum    integer not null,
        flags   integer not null,
        data    text not null
    );
    CREATE TABLE cards (
        id      integer primary key,
        nid     integer not null,
        did     integer not null,
        ord     integer not null,
        mod     integer not null,
        usn     integer not null,
        type    integer not null,
        queue   integer not null,
        due     integer not null,
        ivl     integer not null,
        factor  integer not null,
        reps    integer not null,
        lapses  integer not null,
        left    integer not null,
        odue    integer not null,
        odid    integer not null,
        flags   integer not null,
        data    text not null
    );
    CREATE TABLE revlog (
        id      integer primary key,
        cid     integer not null,
        usn     integer not null,
        ease    integer not null,
        ivl     integer not null,
        lastIvl integer not null,
        factor  integer not null,
        time    integer not null,
        type    integer not null
    );
    CREATE TABLE graves (
        usn     integer not null,
        oid     integer not null,
        type    integer not null
    );
    CREATE INDEX ix_notes_usn ON notes (usn);
    CREATE INDEX ix_cards_usn ON cards (usn);
    CREATE INDEX ix_revlog_usn ON revlog (usn);
    CREATE INDEX ix_cards_nid ON cards (nid);
    CREATE INDEX ix_cards_sched ON cards (did, queue, due);
    CREATE INDEX ix_revlog_cid ON revlog (cid);
    CREATE INDEX ix_notes_csum ON notes (csum);
"#;

/// Identifier of the deck inside the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeckId(i64);

impl DeckId {
    /// Lowest id handed out by [`DeckId::random`].
    pub const RANDOM_MIN: i64 = 1 << 30;
    /// Upper bound (exclusive) of [`DeckId::random`].
    pub const RANDOM_MAX: i64 = 1 << 31;

    /// Use a fixed id, so repeated builds update the same deck on import.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Pick an id uniformly from `[2^30, 2^31)`.
    pub fn random() -> Self {
        Self(rand::thread_rng().gen_range(Self::RANDOM_MIN..Self::RANDOM_MAX))
    }

    /// The raw id.
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl Display for DeckId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

/// Everything a packager needs to write one deck.
#[derive(Debug, Clone, Copy)]
pub struct PackageRequest<'a> {
    /// Deck identifier.
    pub deck_id: DeckId,
    /// Human-readable deck name.
    pub name: &'a str,
    /// Note type the cards use.
    pub model: &'a NoteModel,
    /// Cards in marker order.
    pub cards: &'a [Card],
    /// Media files referenced by `cards`.
    pub media: &'a [MediaArtifact],
}

impl<'a> PackageRequest<'a> {
    /// Request packaging of every card and manifest entry of `deck`.
    pub fn new(deck_id: DeckId, name: &'a str, model: &'a NoteModel, deck: &'a Deck) -> Self {
        Self {
            deck_id,
            name,
            model,
            cards: &deck.cards,
            media: &deck.manifest,
        }
    }
}

/// A sink that serializes cards and media into a distributable file.
pub trait DeckPackager {
    /// Write `request` to `output`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Any failure is fatal for the run and leaves `output` untouched.
    fn package(&self, request: &PackageRequest<'_>, output: &Path) -> Result<(), SubdeckError>;
}

/// Writes genanki-compatible `.apkg` archives.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApkgPackager;

impl ApkgPackager {
    /// Create a packager.
    pub fn new() -> Self {
        Self
    }
}

impl DeckPackager for ApkgPackager {
    fn package(&self, request: &PackageRequest<'_>, output: &Path) -> Result<(), SubdeckError> {
        if request.model.fields.is_empty() {
            return Err(SubdeckError::Package(format!(
                "note type {:?} has no fields",
                request.model.name
            )));
        }
        for artifact in request.media {
            if !artifact.exists() {
                return Err(SubdeckError::Package(format!(
                    "media file missing: {}",
                    artifact.path.display()
                )));
            }
        }

        let parent = output
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or(Path::new("."));

        let collection = NamedTempFile::new_in(parent)?;
        write_collection(collection.path(), request)?;

        let archive = NamedTempFile::new_in(parent)?;
        let mut zip = ZipWriter::new(archive.as_file());
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file(COLLECTION_ENTRY, options)?;
        copy_into(collection.path(), &mut zip)?;

        let mut index = Map::new();
        for (position, artifact) in request.media.iter().enumerate() {
            zip.start_file(position.to_string(), options)?;
            copy_into(&artifact.path, &mut zip)?;
            index.insert(position.to_string(), Value::String(artifact.file_name()));
        }

        zip.start_file(MEDIA_ENTRY, options)?;
        zip.write_all(serde_json::to_string(&Value::Object(index))?.as_bytes())?;
        zip.finish()?;

        archive.persist(output).map_err(|e| SubdeckError::IoError(e.error))?;
        log::info!(
            "Wrote {} note(s) and {} media file(s) to {}",
            request.cards.len(),
            request.media.len(),
            output.display()
        );
        Ok(())
    }
}

/// The note guid: base91 of the first eight bytes of SHA-256 over the
/// fields joined with `__`.
pub fn note_guid(fields: &[String]) -> String {
    let digest = Sha256::digest(fields.join("__").as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    base91(u64::from_be_bytes(prefix))
}

/// The note checksum: the first 32 bits of SHA-1 over the sort field.
pub fn field_checksum(sort_field: &str) -> i64 {
    let digest = Sha1::digest(sort_field.as_bytes());
    i64::from(u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]))
}

fn base91(mut value: u64) -> String {
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE91_TABLE[(value % 91) as usize]);
        value /= 91;
    }
    if digits.is_empty() {
        digits.push(BASE91_TABLE[0]);
    }
    digits.iter().rev().map(|&digit| digit as char).collect()
}

fn copy_into<W: Write>(path: &Path, writer: &mut W) -> Result<(), SubdeckError> {
    let mut file = File::open(path)?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;
    writer.write_all(&buffer)?;
    Ok(())
}

fn write_collection(path: &Path, request: &PackageRequest<'_>) -> Result<(), SubdeckError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| io::Error::other(e.to_string()))?;
    let now_secs = now.as_secs() as i64;
    let base_id = now.as_millis() as i64;

    let mut connection = Connection::open(path)?;
    connection.execute_batch(SCHEMA)?;

    let model = request.model;
    let deck_id = request.deck_id.value();
    connection.execute(
        "INSERT INTO col VALUES (NULL, ?1, ?2, ?3, 11, 0, 0, 0, ?4, ?5, ?6, ?7, '{}')",
        params![
            now_secs,
            base_id,
            base_id,
            collection_conf(model).to_string(),
            models_json(model, deck_id, now_secs).to_string(),
            decks_json(request.name, deck_id, now_secs).to_string(),
            deck_conf_json().to_string(),
        ],
    )?;

    let templates: Vec<(usize, Vec<usize>)> = model
        .templates
        .iter()
        .enumerate()
        .map(|(ordinal, template)| (ordinal, model.required_fields(template)))
        .collect();

    let transaction = connection.transaction()?;
    {
        let mut insert_note = transaction.prepare(
            "INSERT INTO notes VALUES (?1, ?2, ?3, ?4, -1, '', ?5, ?6, ?7, 0, '')",
        )?;
        let mut insert_card = transaction.prepare(
            "INSERT INTO cards VALUES (?1, ?2, ?3, ?4, ?5, -1, 0, 0, ?6, 0, 0, 0, 0, 0, 0, 0, 0, '')",
        )?;

        let mut card_id = base_id;
        for (index, card) in request.cards.iter().enumerate() {
            let fields = card.fields();
            let note_id = base_id + index as i64;
            let sort_field = &fields[0];
            let joined = fields.join(&FIELD_SEPARATOR.to_string());
            insert_note.execute(params![
                note_id,
                note_guid(&fields),
                model.id,
                now_secs,
                joined,
                sort_field,
                field_checksum(sort_field),
            ])?;

            for (ordinal, required) in &templates {
                let generates = required.is_empty()
                    || required
                        .iter()
                        .any(|&field| fields.get(field).is_some_and(|value| !value.is_empty()));
                if !generates {
                    continue;
                }
                insert_card.execute(params![
                    card_id,
                    note_id,
                    deck_id,
                    *ordinal as i64,
                    now_secs,
                    index as i64,
                ])?;
                card_id += 1;
            }
        }
    }
    transaction.commit()?;

    connection.close().map_err(|(_, e)| e)?;
    Ok(())
}

fn collection_conf(model: &NoteModel) -> Value {
    json!({
        "activeDecks": [1],
        "addToCur": true,
        "collapseTime": 1200,
        "curDeck": 1,
        "curModel": model.id.to_string(),
        "dueCounts": true,
        "estTimes": true,
        "newBury": true,
        "newSpread": 0,
        "nextPos": 1,
        "sortBackwards": false,
        "sortType": "noteFld",
        "timeLim": 0,
    })
}

fn models_json(model: &NoteModel, deck_id: i64, now_secs: i64) -> Value {
    let fields: Vec<Value> = model
        .fields
        .iter()
        .enumerate()
        .map(|(ordinal, name)| {
            json!({
                "font": "Liberation Sans",
                "media": [],
                "name": name,
                "ord": ordinal,
                "rtl": false,
                "size": 20,
                "sticky": false,
            })
        })
        .collect();

    let templates: Vec<Value> = model
        .templates
        .iter()
        .enumerate()
        .map(|(ordinal, template)| {
            json!({
                "afmt": template.answer,
                "bafmt": "",
                "bqfmt": "",
                "did": null,
                "name": template.name,
                "ord": ordinal,
                "qfmt": template.question,
            })
        })
        .collect();

    let requirements: Vec<Value> = model
        .templates
        .iter()
        .enumerate()
        .map(|(ordinal, template)| json!([ordinal, "any", model.required_fields(template)]))
        .collect();

    let mut models = Map::new();
    models.insert(
        model.id.to_string(),
        json!({
            "css": model.css,
            "did": deck_id,
            "flds": fields,
            "id": model.id.to_string(),
            "latexPost": LATEX_POST,
            "latexPre": LATEX_PRE,
            "mod": now_secs,
            "name": model.name,
            "req": requirements,
            "sortf": 0,
            "tags": [],
            "tmpls": templates,
            "type": 0,
            "usn": -1,
            "vers": [],
        }),
    );
    Value::Object(models)
}

fn deck_json(id: i64, name: &str, now_secs: i64) -> Value {
    json!({
        "collapsed": false,
        "conf": 1,
        "desc": "",
        "dyn": 0,
        "extendNew": 0,
        "extendRev": 50,
        "id": id,
        "lrnToday": [0, 0],
        "mod": now_secs,
        "name": name,
        "newToday": [0, 0],
        "revToday": [0, 0],
        "timeToday": [0, 0],
        "usn": -1,
    })
}

fn decks_json(name: &str, deck_id: i64, now_secs: i64) -> Value {
    let mut decks = Map::new();
    decks.insert("1".to_string(), deck_json(1, "Default", 0));
    decks.insert(deck_id.to_string(), deck_json(deck_id, name, now_secs));
    Value::Object(decks)
}

fn deck_conf_json() -> Value {
    json!({
        "1": {
            "autoplay": true,
            "dyn": false,
            "id": 1,
            "lapse": {
                "delays": [10],
                "leechAction": 0,
                "leechFails": 8,
                "minInt": 1,
                "mult": 0,
            },
            "maxTaken": 60,
            "mod": 0,
            "name": "Default",
            "new": {
                "bury": true,
                "delays": [1, 10],
                "initialFactor": 2500,
                "ints": [1, 4, 7],
                "order": 1,
                "perDay": 20,
                "separate": true,
            },
            "replayq": true,
            "rev": {
                "bury": true,
                "ease4": 1.3,
                "fuzz": 0.05,
                "ivlFct": 1,
                "maxIvl": 36500,
                "minSpace": 1,
                "perDay": 100,
            },
            "timer": 0,
            "usn": 0,
        }
    })
}

