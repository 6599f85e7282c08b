// Example: editing a rhythm, then sharing the whole setup as text
// This shows the flow a UI goes through between the editor and the metronome

use rhythm_engine::command::{ChangeTimeSignatureCommand, ToggleEmphasisCommand};
use rhythm_engine::preset::{decode, encode};
use rhythm_engine::rhythm::TimeSignature;
use rhythm_engine::{Metronome, RhythmEditor, TrackId};

fn main() {
    // Start from text typed by the user
    let mut editor = RhythmEditor::from_text("{4/4}Q;q;q;q;");

    // Every edit is validated; the last valid rhythm stays available
    editor
        .apply(Box::new(ChangeTimeSignatureCommand::new(0, TimeSignature::new(5, 4))))
        .expect("measure 0 exists");
    editor
        .apply(Box::new(ToggleEmphasisCommand::new(0, 3, None)))
        .expect("element 3 exists");
    println!("Edited rhythm: {}", editor.text());

    if !editor.is_valid() {
        for error in editor.errors() {
            println!("  {error}");
        }
        editor.revert();
    }

    // Hand the rhythm to the metronome
    let mut metronome = Metronome::default();
    metronome
        .set_rhythm(TrackId::Primary, editor.working().clone())
        .expect("rhythm is playable");
    metronome.set_bpm(132);

    // Share it
    let text = encode(&metronome.to_preset("Five")).expect("preset encodes");
    println!("Share this: {text}");

    // Somebody else pastes it
    let mut other = Metronome::default();
    if let Some(preset) = decode(&text) {
        other.apply_preset(&preset).expect("preset applies");
        println!(
            "Loaded '{}' at {} BPM: {}",
            preset.name,
            other.bpm(),
            other.primary().rhythm()
        );
    }
}
