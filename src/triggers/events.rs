use crate::triggers::TriggerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    /// A qualifying edge on an input line.
    FallingEdge(TriggerId),
    /// Operator asked the looper to stop.
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSourceKind {
    Gpio,
    Hotkeys,
    Console,
}

impl TriggerSourceKind {
    pub fn name(self) -> &'static str {
        match self {
            TriggerSourceKind::Gpio => "gpio",
            TriggerSourceKind::Hotkeys => "hotkeys",
            TriggerSourceKind::Console => "console",
        }
    }
}
