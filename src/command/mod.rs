// Command Pattern for rhythm editing with undo/redo
//
// Architecture:
// - EditCommand trait: execute(), undo(), description() on a Rhythm
// - CommandManager: bounded undo/redo stacks
// - Concrete commands: insert/remove/replace element, accents, dots,
//   measures, time signature changes
// - RhythmEditor: working rhythm, last valid rhythm and current errors

pub mod commands;
pub mod editor;
pub mod manager;
pub mod trait_def;

pub use commands::{
    AddMeasureCommand, ChangeTimeSignatureCommand, InsertElementCommand, RemoveElementCommand,
    RemoveMeasureCommand, ReplaceElementCommand, SetDotsCommand, ToggleEmphasisCommand,
};
pub use editor::RhythmEditor;
pub use manager::CommandManager;
pub use trait_def::{CommandError, CommandResult, EditCommand};
