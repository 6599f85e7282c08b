// Integration test: text notation, validation and duration math together
//
// Uses the public API only.

use approx::assert_abs_diff_eq;
use rhythm_engine::rhythm::{
    EPSILON, NoteKind, NoteValue, Rhythm, RhythmElement, TimeSignature, change_time_signature,
    deserialize, fill_with_rests, serialize, validate,
};

const GOLDEN: &[&str] = &[
    "{4/4}Q;q;q;q;",
    "{3/4}H;-q;",
    "{6/8}E;e;e;E;e;e;",
    "{4/4}Q;-e;e . .;[3:2](e;E;-e);h;",
    "{4/4}w;{3/4}h .;{5/8}E;e;E;e;e;",
    "{2/4}[3:2](s;s;s);[5:4](x;x;x;x;x);[3:2](e;e;e);",
    "{4/4}k;",
];

#[test]
fn test_golden_strings_round_trip() {
    for text in GOLDEN {
        let rhythm = deserialize(text);
        assert_eq!(&serialize(&rhythm), text, "round trip of {text}");
        assert_eq!(deserialize(&serialize(&rhythm)), rhythm);
    }
}

#[test]
fn test_display_and_from_str_agree_with_grammar() {
    let rhythm: Rhythm = "{3/4}H;q;".parse().unwrap();
    assert_eq!(rhythm.to_string(), "{3/4}H;q;");
    assert!(validate(&rhythm).is_empty());
}

#[test]
fn test_malformed_token_is_isolated() {
    let rhythm = deserialize("{4/4}q;z;q;{3/4}h;q;");
    let measures = rhythm.measures();
    assert_eq!(measures.len(), 2);
    assert_eq!(measures[0].elements.len(), 3);

    let RhythmElement::Note(bad) = &measures[0].elements[1] else {
        panic!("expected a note");
    };
    assert!(bad.is_malformed());
    assert_eq!(bad.duration(), 0.0);

    // Neighbors and the following measure parse normally
    let RhythmElement::Note(next) = &measures[0].elements[2] else {
        panic!("expected a note");
    };
    assert_eq!(next.value(), Some(NoteValue::Quarter));
    assert_eq!(measures[1].time_signature, TimeSignature::three_four());
    assert!(validate(&Rhythm::new(vec![measures[1].clone()])).is_empty());

    // Malformed text survives serialization untouched
    assert_eq!(serialize(&rhythm), "{4/4}q;z;q;{3/4}h;q;");

    let codes: Vec<&str> = validate(&rhythm).iter().map(|e| e.code()).collect();
    assert!(codes.contains(&"invalid_note"));
}

#[test]
fn test_rests_are_notes_with_rest_kind() {
    let rhythm = deserialize("{2/4}-q;Q;");
    let RhythmElement::Note(rest) = &rhythm.measures()[0].elements[0] else {
        panic!("expected a note");
    };
    assert_eq!(rest.kind, NoteKind::Rest);
    assert!(validate(&rhythm).is_empty());
}

#[test]
fn test_fill_with_rests_completes_a_measure() {
    let mut rhythm = deserialize("{4/4}q;e;");
    let measure = &rhythm.measures()[0];
    let remaining = measure.expected_length() - measure.content_length();
    assert_abs_diff_eq!(remaining, 0.625, epsilon = EPSILON);

    let rests = fill_with_rests(remaining, 1).unwrap();
    assert!(rests.iter().all(|note| note.kind == NoteKind::Rest));

    rhythm.measures[0]
        .elements
        .extend(rests.into_iter().map(RhythmElement::from));
    assert!(validate(&rhythm).is_empty(), "{}", serialize(&rhythm));
}

#[test]
fn test_time_signature_changes_keep_measures_full() {
    let rhythm = deserialize("{4/4}q;q;q;q;");
    let source = &rhythm.measures()[0];

    for target in [
        TimeSignature::three_four(),
        TimeSignature::six_eight(),
        TimeSignature::new(5, 4),
        TimeSignature::new(7, 16),
        TimeSignature::new(2, 2),
    ] {
        let changed = change_time_signature(source, target).unwrap();
        assert_eq!(changed.time_signature, target);
        assert_abs_diff_eq!(
            changed.content_length(),
            target.measure_length(),
            epsilon = EPSILON
        );
        assert!(validate(&Rhythm::new(vec![changed])).is_empty());
    }
}
