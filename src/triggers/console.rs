use std::io::BufRead;
use std::sync::mpsc;
use std::thread;

use crate::triggers::{TriggerEvent, TriggerId};

/// Reads line ids from stdin, one per line. `q` or `quit` stops the looper.
pub struct ConsoleTriggerSource;

impl ConsoleTriggerSource {
    pub fn spawn(sender: mpsc::Sender<TriggerEvent>) -> thread::JoinHandle<()> {
        thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        log::error!("Failed to read console input: {}", e);
                        break;
                    }
                };
                match parse_console_line(&line) {
                    Some(event) => {
                        if sender.send(event).is_err() {
                            break;
                        }
                    }
                    None if line.trim().is_empty() => {}
                    None => log::warn!("Ignoring console input {:?}", line.trim()),
                }
            }
            log::info!("Console trigger input closed");
        })
    }
}

pub fn parse_console_line(line: &str) -> Option<TriggerEvent> {
    let input = line.trim();
    match input {
        "q" | "quit" => Some(TriggerEvent::Shutdown),
        _ => {
            let id = input.strip_prefix("GPIO").unwrap_or(input);
            id.parse::<u8>().ok().map(|id| TriggerEvent::FallingEdge(TriggerId(id)))
        }
    }
}
