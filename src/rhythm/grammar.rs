// Rhythm grammar - Text notation <-> Rhythm
//
// Format: every measure starts with a `{N/D}` header followed by element
// tokens, each terminated by `;`:
//
//   {4/4}Q;q;-q;[3:2](e;e;e);{3/4}h .;
//
// Note token: optional `-` for a rest, one duration glyph (uppercase =
// accented) and zero or more ` .` dot markers. Tuplet token:
// `[played:implied](note;note;...)`.
//
// Decoding is total: anything that cannot be understood becomes a malformed
// note (or an incomplete `(0,0)` time signature) and is reported later by
// validation, so an editor can point at the exact bad token.

use super::model::{
    Glyph, Measure, NoteKind, NoteValue, Rhythm, RhythmElement, RhythmNote, RhythmTuplet,
    TimeSignature, TupletRatio,
};
use std::convert::Infallible;
use std::fmt::{self, Write};
use std::str::FromStr;

/// Highest dot count accepted by the parser
pub const MAX_DOTS: u8 = 3;

const REST_MARKER: char = '-';
const DOT_MARKER: char = '.';
const ELEMENT_TERMINATOR: char = ';';

/// Parse rhythm notation. Never fails; see module docs for error handling.
pub fn deserialize(text: &str) -> Rhythm {
    let measures = split_measures(text)
        .into_iter()
        .map(|(header, body)| {
            let time_signature = header
                .map(parse_time_signature)
                .unwrap_or(TimeSignature::INCOMPLETE);
            let elements = split_tokens(body).into_iter().map(parse_element).collect();
            Measure::new(time_signature, elements)
        })
        .collect();

    Rhythm::new(measures)
}

/// Write a rhythm in the notation accepted by `deserialize`
pub fn serialize(rhythm: &Rhythm) -> String {
    let mut out = String::new();
    for measure in &rhythm.measures {
        let _ = write!(
            out,
            "{{{}/{}}}",
            measure.time_signature.numerator, measure.time_signature.denominator
        );
        for element in &measure.elements {
            write_element(&mut out, element);
            out.push(ELEMENT_TERMINATOR);
        }
    }
    out
}

/// Split into (header, body) pairs. Text before the first header becomes a
/// headerless chunk.
fn split_measures(text: &str) -> Vec<(Option<&str>, &str)> {
    let mut chunks = Vec::new();

    let first_header = text.find('{').unwrap_or(text.len());
    if !text[..first_header].trim().is_empty() {
        chunks.push((None, &text[..first_header]));
    }

    let mut rest = &text[first_header..];
    while !rest.is_empty() {
        let Some(close) = rest.find('}') else {
            // Unterminated header: incomplete measure, rest of input dropped
            chunks.push((None, ""));
            break;
        };

        let header = &rest[1..close];
        let after = &rest[close + 1..];
        let next = after.find('{').unwrap_or(after.len());
        chunks.push((Some(header), &after[..next]));
        rest = &after[next..];
    }

    chunks
}

fn parse_time_signature(header: &str) -> TimeSignature {
    let parsed = header.split_once('/').and_then(|(numerator, denominator)| {
        Some(TimeSignature::new(
            numerator.trim().parse().ok()?,
            denominator.trim().parse().ok()?,
        ))
    });
    parsed.unwrap_or(TimeSignature::INCOMPLETE)
}

/// Split on `;` outside of brackets/parentheses, dropping blank tokens
fn split_tokens(body: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;

    for (index, c) in body.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            ELEMENT_TERMINATOR if depth <= 0 => {
                tokens.push(&body[start..index]);
                start = index + c.len_utf8();
            }
            _ => {}
        }
    }
    tokens.push(&body[start..]);

    tokens
        .into_iter()
        .filter(|token| !token.trim().is_empty())
        .collect()
}

fn parse_element(token: &str) -> RhythmElement {
    let token = token.trim();
    if token.starts_with('[') {
        return match parse_tuplet(token) {
            Some(tuplet) => RhythmElement::Tuplet(tuplet),
            None => RhythmElement::Note(RhythmNote::malformed(token)),
        };
    }
    RhythmElement::Note(parse_note(token))
}

fn parse_tuplet(token: &str) -> Option<RhythmTuplet> {
    let inner = token.strip_prefix('[')?;
    let (ratio, rest) = inner.split_once(']')?;
    let (played, implied) = ratio.split_once(':')?;
    let ratio = TupletRatio::new(played.trim().parse().ok()?, implied.trim().parse().ok()?);

    let body = rest.trim().strip_prefix('(')?.strip_suffix(')')?;
    let notes = split_tokens(body).into_iter().map(parse_note).collect();

    Some(RhythmTuplet::new(ratio, notes))
}

fn parse_note(token: &str) -> RhythmNote {
    let source = token.trim();
    let (kind, glyph_part) = match source.strip_prefix(REST_MARKER) {
        Some(rest) => (NoteKind::Rest, rest),
        None => (NoteKind::Note, source),
    };

    let mut chars = glyph_part.chars();
    let Some(glyph) = chars.next() else {
        return RhythmNote::malformed(source);
    };
    let Some(value) = NoteValue::from_glyph(glyph) else {
        return RhythmNote::malformed(source);
    };

    let mut dots = 0u8;
    for c in chars {
        match c {
            DOT_MARKER => dots = dots.saturating_add(1),
            c if c.is_whitespace() => {}
            _ => return RhythmNote::malformed(source),
        }
    }
    if dots > MAX_DOTS {
        return RhythmNote::malformed(source);
    }

    RhythmNote::new(value, kind, glyph.is_ascii_uppercase(), dots)
}

fn write_element(out: &mut String, element: &RhythmElement) {
    match element {
        RhythmElement::Note(note) => write_note(out, note),
        RhythmElement::Tuplet(tuplet) => {
            let _ = write!(out, "[{}](", tuplet.ratio);
            for (index, note) in tuplet.notes.iter().enumerate() {
                if index > 0 {
                    out.push(ELEMENT_TERMINATOR);
                }
                write_note(out, note);
            }
            out.push(')');
        }
    }
}

fn write_note(out: &mut String, note: &RhythmNote) {
    match &note.glyph {
        Glyph::Value(_) => {
            if note.kind.is_rest() {
                out.push(REST_MARKER);
            }
            out.push_str(&note.display());
            for _ in 0..note.dots {
                out.push(' ');
                out.push(DOT_MARKER);
            }
        }
        Glyph::Malformed(source) => out.push_str(source),
    }
}

impl FromStr for Rhythm {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(deserialize(s))
    }
}

impl fmt::Display for Rhythm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serialize(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_measure() {
        let rhythm = deserialize("{4/4}Q;q;q;q;");
        assert_eq!(rhythm, Rhythm::four_on_the_floor());
    }

    #[test]
    fn test_parse_rests_and_dots() {
        let rhythm = deserialize("{4/4}-q;h . .;e;");
        let elements = &rhythm.measures[0].elements;

        assert_eq!(elements[0], RhythmElement::Note(RhythmNote::rest(NoteValue::Quarter)));
        assert_eq!(
            elements[1],
            RhythmElement::Note(RhythmNote::note(NoteValue::Half).dotted(2))
        );
        assert_eq!(elements.len(), 3);
    }

    #[test]
    fn test_parse_accented_rest() {
        let rhythm = deserialize("{1/4}-Q;");
        let RhythmElement::Note(note) = &rhythm.measures[0].elements[0] else {
            panic!("expected a note");
        };
        assert_eq!(note.kind, NoteKind::Rest);
        assert!(note.emphasized);
    }

    #[test]
    fn test_parse_compact_dots() {
        let rhythm = deserialize("{3/8}q.;");
        assert_eq!(
            rhythm.measures[0].elements[0],
            RhythmElement::Note(RhythmNote::note(NoteValue::Quarter).dotted(1))
        );
    }

    #[test]
    fn test_parse_tuplet() {
        let rhythm = deserialize("{2/4}[3:2](E;e;-e);q;");
        let RhythmElement::Tuplet(tuplet) = &rhythm.measures[0].elements[0] else {
            panic!("expected a tuplet");
        };
        assert_eq!(tuplet.ratio, TupletRatio::triplet());
        assert_eq!(tuplet.notes.len(), 3);
        assert!(tuplet.notes[0].emphasized);
        assert_eq!(tuplet.notes[2].kind, NoteKind::Rest);
        assert_eq!(rhythm.measures[0].elements.len(), 2);
    }

    #[test]
    fn test_parse_multiple_measures() {
        let rhythm = deserialize("{4/4}w;{3/4}h .;{6/8}Q .;q .;");
        assert_eq!(rhythm.measures.len(), 3);
        assert_eq!(rhythm.measures[1].time_signature, TimeSignature::three_four());
        assert_eq!(rhythm.measures[2].elements.len(), 2);
    }

    #[test]
    fn test_malformed_tokens_do_not_abort_parsing() {
        let rhythm = deserialize("{4/4}q;z;q . . . .;q;");
        let elements = &rhythm.measures[0].elements;
        assert_eq!(elements.len(), 4);

        let malformed: Vec<_> = elements
            .iter()
            .filter(|e| matches!(e, RhythmElement::Note(n) if n.is_malformed()))
            .collect();
        assert_eq!(malformed.len(), 2);
    }

    #[test]
    fn test_broken_tuplet_is_one_malformed_note() {
        let rhythm = deserialize("{4/4}[3:x](e;e;e);h .;");
        assert_eq!(
            rhythm.measures[0].elements[0],
            RhythmElement::Note(RhythmNote::malformed("[3:x](e;e;e)"))
        );
    }

    #[test]
    fn test_nested_tuplet_is_malformed() {
        let rhythm = deserialize("{1/4}[3:2]([3:2](s;s;s);e;e);");
        let RhythmElement::Tuplet(tuplet) = &rhythm.measures[0].elements[0] else {
            panic!("expected a tuplet");
        };
        assert!(tuplet.notes[0].is_malformed());
        assert!(!tuplet.notes[1].is_malformed());
    }

    #[test]
    fn test_bad_header_becomes_incomplete() {
        let rhythm = deserialize("{x/4}q;{4/4");
        assert_eq!(rhythm.measures.len(), 2);
        assert!(rhythm.measures[0].time_signature.is_incomplete());
        assert!(rhythm.measures[1].time_signature.is_incomplete());
    }

    #[test]
    fn test_leading_content_without_header() {
        let rhythm = deserialize("q;q;{2/4}q;q;");
        assert_eq!(rhythm.measures.len(), 2);
        assert!(rhythm.measures[0].time_signature.is_incomplete());
        assert_eq!(rhythm.measures[0].elements.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(deserialize("").is_empty());
        assert!(deserialize("   ").is_empty());
    }

    #[test]
    fn test_serialize_canonical_form() {
        let text = "{4/4}Q;-e;e . .;[3:2](e;E;-e);h;";
        assert_eq!(serialize(&deserialize(text)), text);
    }

    #[test]
    fn test_serialize_keeps_malformed_source() {
        let text = "{4/4}q;zz;h .;";
        assert_eq!(serialize(&deserialize(text)), text);
    }

    #[test]
    fn test_display_and_from_str() {
        let rhythm: Rhythm = "{3/4}Q;q;q;".parse().unwrap();
        assert_eq!(rhythm.to_string(), "{3/4}Q;q;q;");
    }
}
