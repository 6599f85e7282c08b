// Integration test: sharing a complete metronome setup
//
// Metronome -> Preset -> text -> Preset -> another Metronome

use rhythm_engine::preset::{Preset, decode, encode, try_decode};
use rhythm_engine::rhythm::{Emphasis, SimpleRhythm, TimeSignature, deserialize, serialize};
use rhythm_engine::sequencer::{BeatValue, Metronome, TrackId};
use rhythm_engine::settings::{MemorySettings, SettingsStore};
use rhythm_engine::{EngineConfig, PresetError};

fn configured_metronome() -> Metronome {
    let mut metronome = Metronome::default();
    metronome.set_bpm(96);
    metronome
        .set_rhythm(
            TrackId::Primary,
            deserialize("{7/8}E;e;E;e;E;e;e;"),
        )
        .unwrap();
    metronome
        .set_simple_rhythm(
            TrackId::Secondary,
            SimpleRhythm::new(TimeSignature::three_four(), 8, Emphasis::Alternating),
        )
        .unwrap();
    metronome.set_beat_value(TrackId::Primary, BeatValue::note(8));
    metronome.set_secondary_enabled(true).unwrap();
    metronome
}

#[test]
fn test_preset_survives_text_sharing() {
    let source = configured_metronome();
    let preset = source.to_preset("Odd meters");

    let text = encode(&preset).unwrap();
    assert!(text.chars().all(|c| c.is_ascii_alphanumeric() || "+/=".contains(c)));

    let decoded = decode(&text).expect("preset decodes");
    assert_eq!(decoded, preset);

    let mut target = Metronome::default();
    target.apply_preset(&decoded).unwrap();

    assert_eq!(target.state(), source.state());
    assert_eq!(target.bpm(), 96);
    assert!(target.secondary_enabled());
    assert_eq!(
        serialize(&target.primary().rhythm()),
        "{7/8}E;e;E;e;E;e;e;"
    );
    assert_eq!(target.secondary().rhythm(), source.secondary().rhythm());
    assert_eq!(
        target.simple_rhythm(TrackId::Secondary),
        source.simple_rhythm(TrackId::Secondary)
    );
    assert_eq!(target.simple_rhythm(TrackId::Primary), None);
}

#[test]
fn test_preset_json_uses_camel_case_keys() {
    let preset = configured_metronome().to_preset("Keys");
    let json: serde_json::Value = serde_json::to_value(&preset).unwrap();

    for key in ["name", "timestamp", "state", "primaryRhythm", "secondaryRhythm"] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    for key in ["bpm", "beatValuePrimary", "beatValueSecondary", "secondaryEnabled"] {
        assert!(json["state"].get(key).is_some(), "missing state.{key}");
    }
    assert_eq!(json["state"]["bpm"], 96);
}

#[test]
fn test_garbage_never_panics() {
    for text in ["", "   ", "not base64 at all!", "AAAA", "H4sIAAAAAAAA"] {
        assert!(decode(text).is_none(), "{text:?} should not decode");
    }
    assert!(matches!(try_decode(""), Err(PresetError::Empty)));
}

#[test]
fn test_preset_with_unplayable_rhythm_is_refused_while_playing() {
    let mut metronome = Metronome::default();
    metronome.start().unwrap();

    let mut preset: Preset = metronome.to_preset("Broken");
    preset.primary_rhythm = "{4/4}q;".to_string();
    preset.state.bpm = 200;

    assert!(metronome.apply_preset(&preset).is_err());
    assert_eq!(metronome.bpm(), 120);
    assert!(metronome.is_playing());
    metronome.stop();
}

#[test]
fn test_rhythms_persist_through_settings() {
    let source = configured_metronome();
    let mut store = MemorySettings::new();
    source.save(&mut store);

    assert_eq!(
        store.load_string("primary_rhythm").as_deref(),
        Some("{7/8}E;e;E;e;E;e;e;")
    );
    assert!(store.load_string("secondary_rhythm").is_some());

    let mut restored = Metronome::new(EngineConfig::default());
    restored.restore(&store).unwrap();
    assert_eq!(restored.primary().rhythm(), source.primary().rhythm());
    assert_eq!(restored.secondary().rhythm(), source.secondary().rhythm());
}
