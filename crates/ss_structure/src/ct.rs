//! CT (connectivity table) pair tables.
//!
//! A CT table extends BPSEQ by explicit neighbor links and the original
//! residue numbering:
//!
//! ```text
//! N
//! index seq before after pair original
//! ```
//!
//! `before` is 0 at the first residue of a strand and `after` is 0 at
//! the last one, so multiple strands can be laid out in one table.
//!

use std::fmt;
use log::{debug, trace, warn};

use crate::BpSeq;
use crate::Derivation;
use crate::Format;
use crate::RenderOptions;
use crate::StructureError;
use crate::SymbolSequence;
use crate::bpseq::validate_pairing;
use crate::render::split_comment;

/// One CT line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CtEntry {
    index: usize,
    pair: usize,
    before: usize,
    after: usize,
    original: i32,
    seq: char,
    comment: String,
}

impl CtEntry {
    pub fn new(index: usize, pair: usize, before: usize, after: usize, original: i32, seq: char) -> Self {
        Self::with_comment(index, pair, before, after, original, seq, String::new())
    }

    pub fn with_comment(
        index: usize,
        pair: usize,
        before: usize,
        after: usize,
        original: i32,
        seq: char,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            index,
            pair,
            before,
            after,
            original,
            seq,
            comment: comment.into(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn pair(&self) -> usize {
        self.pair
    }

    pub fn before(&self) -> usize {
        self.before
    }

    pub fn after(&self) -> usize {
        self.after
    }

    /// Residue number in the source numbering scheme.
    pub fn original(&self) -> i32 {
        self.original
    }

    pub fn seq(&self) -> char {
        self.seq
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    fn render(&self, options: &RenderOptions) -> String {
        let line = format!("{} {} {} {} {} {}",
            self.index, self.seq, self.before, self.after, self.pair, self.original);
        if options.comments && !self.comment.trim().is_empty() {
            format!("{} # {}", line, self.comment)
        } else {
            line
        }
    }
}

impl fmt::Display for CtEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(&RenderOptions::default()))
    }
}

/// A validated CT table, entries ordered by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ct {
    entries: Vec<CtEntry>,
}

impl Ct {
    /// Build a table from entries in any order.
    ///
    /// Besides the BPSEQ pairing invariants, neighbor columns must be in
    /// range and strand boundaries consistent: a zero `before` must follow
    /// a zero `after`. A non-zero `after` on the very last entry is
    /// repaired to 0 instead of rejected, since many producers omit the
    /// final terminator.
    pub fn new(entries: impl IntoIterator<Item = CtEntry>) -> Result<Self, StructureError> {
        let mut entries: Vec<CtEntry> = entries.into_iter().collect();
        entries.sort_by_key(|e| e.index);

        if log::log_enabled!(log::Level::Trace) {
            trace!("CT to be validated:\n{}", render_table(&entries, &RenderOptions::default()));
        }

        validate_pairing(Format::Ct, entries.iter().map(|e| (e.index, e.pair)))?;
        validate_neighbors(&entries)?;

        if let Some(last) = entries.last_mut() {
            if last.after != 0 {
                debug!("CT: resetting 'after' column of the last entry: {last}");
                last.after = 0;
            }
        }
        Ok(Self { entries })
    }

    /// Contiguous neighbors in a single strand; original numbering
    /// is the 1-based index.
    pub fn from_bpseq(bpseq: &BpSeq) -> Result<Self, StructureError> {
        let size = bpseq.len();
        let entries = bpseq.entries().iter().map(|e| {
            let index = e.index();
            CtEntry::with_comment(
                index,
                e.pair(),
                index - 1,
                (index + 1) % (size + 1),
                index as i32,
                e.seq(),
                e.comment(),
            )
        });
        Ct::new(entries).map_err(StructureError::derived(Derivation::FromBpSeq))
    }

    /// One strand per span of the sequence; neighbor columns are numbered
    /// locally within each strand.
    pub fn from_dot_bracket(db: &impl SymbolSequence) -> Result<Self, StructureError> {
        let symbols = db.symbols();
        let mut entries = Vec::with_capacity(symbols.len());

        for span in db.strand_spans() {
            for (i, pos) in span.range().enumerate() {
                let symbol = &symbols[pos];
                let after = if pos + 1 == span.end() { 0 } else { i + 2 };
                entries.push(CtEntry::new(
                    symbol.index() + 1,
                    symbol.pair().map_or(0, |p| p + 1),
                    i,
                    after,
                    db.original_number(pos),
                    symbol.sequence(),
                ));
            }
        }
        Ct::new(entries).map_err(StructureError::derived(Derivation::FromDotBracket))
    }

    pub fn entries(&self) -> &[CtEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries terminating a strand.
    pub fn strand_count(&self) -> usize {
        self.entries.iter().filter(|e| e.after == 0).count()
    }

    pub fn sequence(&self) -> String {
        self.entries.iter().map(|e| e.seq).collect()
    }

    pub fn to_text(&self, options: &RenderOptions) -> String {
        render_table(&self.entries, options)
    }
}

fn render_table(entries: &[CtEntry], options: &RenderOptions) -> String {
    let mut text = format!("{}\n", entries.len());
    for e in entries {
        text.push_str(&e.render(options));
        text.push('\n');
    }
    text
}

fn validate_neighbors(entries: &[CtEntry]) -> Result<(), StructureError> {
    let n = entries.len();

    for e in entries {
        if e.before >= n {
            return Err(StructureError::InvalidColumn { column: "before", entry: e.to_string() });
        }
        if e.after == 1 || e.after > n + 1 {
            return Err(StructureError::InvalidColumn { column: "after", entry: e.to_string() });
        }
    }

    let mut previous: Option<&CtEntry> = None;
    for e in entries {
        let expect_new_strand = previous.is_none_or(|p| p.after == 0);
        if expect_new_strand && e.before != 0 {
            return Err(StructureError::StrandBoundary { column: "before", entry: e.to_string() });
        }
        if !expect_new_strand && e.before == 0 {
            // previous is Some here, its strand was never terminated
            let entry = previous.map(CtEntry::to_string).unwrap_or_default();
            return Err(StructureError::StrandBoundary { column: "after", entry });
        }
        previous = Some(e);
    }
    Ok(())
}

impl TryFrom<&str> for Ct {
    type Error = StructureError;

    fn try_from(data: &str) -> Result<Self, Self::Error> {
        let mut entries = Vec::new();
        let mut header: Option<usize> = None;

        for raw in data.lines() {
            let (line, comment) = split_comment(raw);
            if line.is_empty() {
                continue;
            }
            let split: Vec<&str> = line.split_whitespace().collect();

            if header.is_none() {
                let count = split[0].parse::<usize>()
                    .map_err(|_| StructureError::malformed(Format::Ct, raw))?;
                header = Some(count);
                continue;
            }

            if split.len() != 6 || split[1].chars().count() != 1 {
                return Err(StructureError::malformed(Format::Ct, raw));
            }
            let number = |s: &str| s.parse::<usize>()
                .map_err(|_| StructureError::malformed(Format::Ct, raw));
            let index = number(split[0])?;
            let before = number(split[2])?;
            let after = number(split[3])?;
            let pair = number(split[4])?;
            let original = split[5].parse::<i32>()
                .map_err(|_| StructureError::malformed(Format::Ct, raw))?;
            let seq = split[1].chars().next()
                .ok_or_else(|| StructureError::malformed(Format::Ct, raw))?;

            entries.push(CtEntry::with_comment(
                index, pair, before, after, original, seq, comment.unwrap_or_default()));
        }

        if let Some(count) = header {
            if count != entries.len() {
                warn!("CT header announces {count} entries, found {}", entries.len());
            }
        }
        Ct::new(entries)
    }
}

impl fmt::Display for Ct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text(&RenderOptions::default()))
    }
}
