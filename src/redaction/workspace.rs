//! Working text with an offset-translation table.
//!
//! Detectors run one after another against the text as it stands after the
//! previous substitutions, but every event must point into the original input.
//! The workspace keeps the current text as a list of segments. Each segment is
//! either a verbatim slice of the original (with its original offset) or a
//! placeholder that was inserted for an earlier match. A match is translated
//! back to original coordinates through the segment it falls in; a match that
//! touches a placeholder has no original counterpart and is discarded, which is
//! also what stops later detectors from re-matching inside an earlier claim.
//!
//! Segments are tracked in bytes; events carry character offsets, converted
//! once per accepted match.

use super::types::{EntityType, RedactionEvent, Span};
use regex::Regex;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    /// Verbatim original text starting at this original offset.
    Original(usize),
    /// Placeholder standing in for this original character span.
    Placeholder(Span),
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    /// Offset in the current text.
    start: usize,
    len: usize,
    origin: Origin,
}

impl Segment {
    const fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Current text plus the mapping back to the original.
#[derive(Debug, Clone)]
pub(crate) struct Workspace<'a> {
    original: &'a str,
    text: String,
    segments: Vec<Segment>,
}

impl<'a> Workspace<'a> {
    pub(crate) fn new(original: &'a str) -> Self {
        let segments = if original.is_empty() {
            Vec::new()
        } else {
            vec![Segment {
                start: 0,
                len: original.len(),
                origin: Origin::Original(0),
            }]
        };
        Self {
            original,
            text: original.to_string(),
            segments,
        }
    }

    /// The text as it currently stands.
    pub(crate) fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn into_text(self) -> String {
        self.text
    }

    /// Maps a range of the current text to a byte range of the original.
    ///
    /// Returns `None` if the range is empty or is not fully inside one
    /// verbatim segment.
    fn translate(&self, range: &Range<usize>) -> Option<Range<usize>> {
        if range.is_empty() {
            return None;
        }
        let idx = self
            .segments
            .partition_point(|seg| seg.end() <= range.start);
        let seg = self.segments.get(idx)?;
        match seg.origin {
            Origin::Original(origin) if range.start >= seg.start && range.end <= seg.end() => {
                Some(origin + (range.start - seg.start)..origin + (range.end - seg.start))
            },
            _ => None,
        }
    }

    /// Original span of the first placeholder that `range` touches.
    fn claim_overlapping(&self, range: &Range<usize>) -> Option<Span> {
        self.segments
            .iter()
            .filter(|seg| seg.start < range.end && range.start < seg.end())
            .find_map(|seg| match seg.origin {
                Origin::Placeholder(span) => Some(span),
                Origin::Original(_) => None,
            })
    }

    /// Scans the current text once with `regex` and replaces every match
    /// that maps back to the original text with `tag`.
    ///
    /// Events come back in left-to-right order with character spans into the
    /// original text.
    pub(crate) fn redact_matches(
        &mut self,
        regex: &Regex,
        tag: &str,
        entity_type: EntityType,
    ) -> Vec<RedactionEvent> {
        let mut hits: Vec<(Range<usize>, Range<usize>)> = Vec::new();
        for m in regex.find_iter(&self.text) {
            let range = m.range();
            match self.translate(&range) {
                Some(original) => hits.push((range, original)),
                None => {
                    if let Some(claimed) = self.claim_overlapping(&range) {
                        tracing::trace!(
                            entity_type = %entity_type,
                            claimed = %claimed,
                            "match overlaps an earlier redaction; skipped"
                        );
                    }
                },
            }
        }

        if hits.is_empty() {
            return Vec::new();
        }

        // Hits are ascending in the current text, hence in the original too.
        let mut cursor = CharCursor::new(self.original);
        let events: Vec<RedactionEvent> = hits
            .iter()
            .map(|(_, original)| {
                let span = Span::new(cursor.seek(original.start), cursor.seek(original.end));
                RedactionEvent::new(entity_type, &self.original[original.clone()], span)
            })
            .collect();

        let claims: Vec<(Range<usize>, Span)> = hits
            .into_iter()
            .zip(&events)
            .map(|((range, _), event)| (range, event.span))
            .collect();
        self.substitute(&claims, tag);
        events
    }

    /// Rebuilds the text and segment table with `claims` replaced by `tag`.
    ///
    /// `claims` must be sorted, non-overlapping, and each inside a verbatim
    /// segment.
    fn substitute(&mut self, claims: &[(Range<usize>, Span)], tag: &str) {
        let mut builder =
            Builder::with_capacity(self.text.len(), self.segments.len() + claims.len() * 2);
        let mut pending = claims.iter().peekable();

        for seg in &self.segments {
            let piece = &self.text[seg.start..seg.end()];
            let Origin::Original(origin) = seg.origin else {
                builder.push(piece, seg.origin);
                continue;
            };

            let mut cursor = seg.start;
            while let Some((range, span)) = pending.next_if(|(r, _)| r.start < seg.end()) {
                if range.start > cursor {
                    builder.push(
                        &self.text[cursor..range.start],
                        Origin::Original(origin + (cursor - seg.start)),
                    );
                }
                builder.push(tag, Origin::Placeholder(*span));
                cursor = range.end;
            }
            if cursor < seg.end() {
                builder.push(
                    &self.text[cursor..seg.end()],
                    Origin::Original(origin + (cursor - seg.start)),
                );
            }
        }

        self.text = builder.text;
        self.segments = builder.segments;
    }
}

/// Forward-only byte to character offset conversion over one string.
struct CharCursor<'a> {
    text: &'a str,
    byte: usize,
    chars: usize,
}

impl<'a> CharCursor<'a> {
    const fn new(text: &'a str) -> Self {
        Self {
            text,
            byte: 0,
            chars: 0,
        }
    }

    /// Character offset of byte offset `byte`, which must not precede the
    /// previous call's.
    fn seek(&mut self, byte: usize) -> usize {
        if byte > self.byte {
            self.chars += self
                .text
                .get(self.byte..byte)
                .map_or(0, |s| s.chars().count());
            self.byte = byte;
        }
        self.chars
    }
}

struct Builder {
    text: String,
    segments: Vec<Segment>,
}

impl Builder {
    fn with_capacity(text: usize, segments: usize) -> Self {
        Self {
            text: String::with_capacity(text),
            segments: Vec::with_capacity(segments),
        }
    }

    fn push(&mut self, piece: &str, origin: Origin) {
        if piece.is_empty() {
            return;
        }
        self.segments.push(Segment {
            start: self.text.len(),
            len: piece.len(),
            origin,
        });
        self.text.push_str(piece);
    }
}
