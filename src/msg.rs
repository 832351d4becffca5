use crossterm::event::KeyEvent;

use crate::runner::TaskEvent;

/// All possible messages that drive state transitions.
#[derive(Debug)]
pub enum Msg {
    // -- Input events (raw)
    Key(KeyEvent),
    Resize(u16, u16),

    // -- Task runner
    Task(TaskEvent),
    /// Worker thread exited.
    RunFinished,

    // -- System
    Tick,
}
