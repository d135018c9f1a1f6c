//! Global hotkeys standing in for the input lines on a desktop machine.
//!
//! Only works under X11. On macOS and Windows global-hotkey delivers events
//! only to a thread running a platform event loop, and nothing here runs one.

use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use global_hotkey::hotkey::HotKey;
use std::collections::HashMap;
use std::sync::mpsc;
use std::thread;

use crate::core::TriggerLineConfig;
use crate::triggers::{TriggerEvent, TriggerId, TriggerRouter};

/// Keyboard stand-in for the input lines: one global hotkey per bound line,
/// a key press counting as the falling edge.
pub struct HotkeyTriggerSource {
    _manager: GlobalHotKeyManager, // Keep reference alive
    lines: HashMap<u32, TriggerId>,
}

impl HotkeyTriggerSource {
    /// Registers only the lines the router has bound; unbound lines stay
    /// unconfigured.
    pub fn new(lines: &[TriggerLineConfig], router: &TriggerRouter) -> anyhow::Result<Self> {
        let manager = GlobalHotKeyManager::new()?;
        let mut registered = HashMap::new();

        for line in lines.iter().filter(|line| router.is_bound(line.id)) {
            let (modifiers, code) = line.hotkey.to_global_hotkey()?;
            let hotkey = HotKey::new(modifiers, code);
            let hotkey_id = hotkey.id();
            manager.register(hotkey)
                .map_err(|e| anyhow::anyhow!("Failed to register {} for {}: {}", line.hotkey.key, line.id, e))?;
            registered.insert(hotkey_id, line.id);
            log::info!("Trigger {} on {}+{}", line.id, line.hotkey.modifiers, line.hotkey.key);
        }

        Ok(HotkeyTriggerSource {
            _manager: manager,
            lines: registered,
        })
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Forwards presses of registered hotkeys until the receiving side goes away.
    pub fn spawn_forwarder(&self, sender: mpsc::Sender<TriggerEvent>) -> thread::JoinHandle<()> {
        let lines = self.lines.clone();
        let receiver = GlobalHotKeyEvent::receiver().clone();

        thread::spawn(move || {
            while let Ok(event) = receiver.recv() {
                if let Some(event) = translate(&lines, event.id, event.state) {
                    if sender.send(event).is_err() {
                        log::debug!("Trigger receiver dropped, stopping hotkey forwarder");
                        break;
                    }
                }
            }
            log::warn!("Hotkey event channel closed");
        })
    }
}

fn translate(lines: &HashMap<u32, TriggerId>, hotkey_id: u32, state: HotKeyState) -> Option<TriggerEvent> {
    if state != HotKeyState::Pressed {
        return None;
    }
    lines.get(&hotkey_id).map(|&trigger| TriggerEvent::FallingEdge(trigger))
}
