//! Player-list rendering.
//!
//! Only the fixed-width table and the embed payload have renderers; the
//! other [`ListFormat`] members answer [`RenderError::UnsupportedFormat`].

use super::RosterEntry;
use chrono::{DateTime, Utc};
use comfy_table::presets::ASCII_FULL_CONDENSED;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Embed descriptions longer than this are rejected by chat clients.
pub const EMBED_DESCRIPTION_LIMIT: usize = 4096;

/// Output formats for player listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListFormat {
    /// Fixed-width text table, sent as an attachment
    #[default]
    Ascii,
    /// Rich display payload
    Embed,
    /// Bracket-tool import list
    Challonge,
    Csv,
    Json,
}

impl ListFormat {
    pub const ALL: [ListFormat; 5] = [
        ListFormat::Ascii,
        ListFormat::Embed,
        ListFormat::Challonge,
        ListFormat::Csv,
        ListFormat::Json,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ListFormat::Ascii => "ascii",
            ListFormat::Embed => "embed",
            ListFormat::Challonge => "challonge",
            ListFormat::Csv => "csv",
            ListFormat::Json => "json",
        }
    }
}

impl fmt::Display for ListFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ListFormat::ALL
            .iter()
            .copied()
            .find(|format| format.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown list format: {s}"))
    }
}

/// Rendering errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("Format not implemented yet: {0}")]
    UnsupportedFormat(ListFormat),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Chat embed contents, independent of any chat client library.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EmbedPayload {
    pub title: String,
    pub description: String,
    pub color: Option<u32>,
    pub thumbnail_url: Option<String>,
    pub fields: Vec<EmbedField>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl EmbedPayload {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    pub fn thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at);
        self
    }
}

/// A rendered player list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "lowercase")]
pub enum Rendered {
    Table(String),
    Embed(EmbedPayload),
}

/// Render an already ordered roster.
pub fn render(entries: &[RosterEntry], format: ListFormat, title: &str) -> Result<Rendered, RenderError> {
    match format {
        ListFormat::Ascii => Ok(Rendered::Table(full_table(entries))),
        ListFormat::Embed => Ok(Rendered::Embed(embed(entries, title))),
        other => Err(RenderError::UnsupportedFormat(other)),
    }
}

/// Code fences plus the overflow note.
const EMBED_OVERHEAD: usize = 64;

const FULL_HEADINGS: [&str; 6] = ["POS", "USERNAME", "RANK", "RATING", "APM", "PPS"];
const SHORT_HEADINGS: [&str; 4] = ["POS", "USERNAME", "RANK", "RATING"];

fn full_table(entries: &[RosterEntry]) -> String {
    let rows = entries.iter().enumerate().map(|(pos, entry)| {
        let mut row = position_cells(pos, entry);
        row.push(optional_stat(entry.apm));
        row.push(optional_stat(entry.pps));
        row
    });

    text_table(&FULL_HEADINGS, rows).to_string()
}

fn embed(entries: &[RosterEntry], title: &str) -> EmbedPayload {
    let fits = |shown: usize| short_table(entries, shown).len() + EMBED_OVERHEAD <= EMBED_DESCRIPTION_LIMIT;

    // Table length grows with the row count.
    let shown = if fits(entries.len()) {
        entries.len()
    } else {
        let (mut fitting, mut overflowing) = (0, entries.len());
        while overflowing - fitting > 1 {
            let mid = fitting + (overflowing - fitting) / 2;
            if fits(mid) {
                fitting = mid;
            } else {
                overflowing = mid;
            }
        }
        fitting
    };

    let mut description = format!("```\n{}\n```", short_table(entries, shown));
    if shown < entries.len() {
        description.push_str(&format!("\n...and {} more", entries.len() - shown));
    }

    EmbedPayload::new(title).description(description)
}

fn short_table(entries: &[RosterEntry], take: usize) -> String {
    let rows = entries
        .iter()
        .take(take)
        .enumerate()
        .map(|(pos, entry)| position_cells(pos, entry));

    text_table(&SHORT_HEADINGS, rows).to_string()
}

fn position_cells(pos: usize, entry: &RosterEntry) -> Vec<String> {
    vec![
        (pos + 1).to_string(),
        entry.username.clone(),
        entry.tier.label().to_uppercase(),
        format!("{:.2}", entry.rating),
    ]
}

fn optional_stat(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

/// Bordered table with centered headings. Positions and stats are right
/// aligned, names and ranks centered.
fn text_table(headings: &[&str], rows: impl IntoIterator<Item = Vec<String>>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_header(
            headings
                .iter()
                .map(|heading| Cell::new(heading).set_alignment(CellAlignment::Center)),
        );

    for row in rows {
        table.add_row(row);
    }

    for (index, heading) in headings.iter().enumerate() {
        let alignment = match *heading {
            "USERNAME" | "RANK" => CellAlignment::Center,
            "RATING" => CellAlignment::Left,
            _ => CellAlignment::Right,
        };
        if let Some(column) = table.column_mut(index) {
            column.set_cell_alignment(alignment);
        }
    }

    table
}
