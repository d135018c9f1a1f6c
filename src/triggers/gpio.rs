//! Raspberry Pi input lines, read through the kernel GPIO interrupt interface.
//!
//! Line ids are BCM pin numbers. Pins are left floating (no pull resistor)
//! and only falling edges are reported; bounce filtering happens later in
//! the `Debouncer`, same as for every other source.

use std::sync::mpsc;

#[cfg(feature = "gpio")]
use rppal::gpio::{Event, Gpio, InputPin, Trigger};

use crate::triggers::{TriggerEvent, TriggerRouter};
#[cfg(feature = "gpio")]
use crate::triggers::TriggerId;

#[cfg(feature = "gpio")]
pub struct GpioTriggerSource {
    // Interrupts are cleared when a pin is dropped
    pins: Vec<InputPin>,
}

#[cfg(feature = "gpio")]
impl GpioTriggerSource {
    /// Watches the pins of every bound line. Unbound lines are left alone.
    pub fn new(router: &TriggerRouter, sender: mpsc::Sender<TriggerEvent>) -> anyhow::Result<Self> {
        let gpio = Gpio::new()?;
        let mut pins = Vec::with_capacity(router.bindings().len());

        for binding in router.bindings() {
            let line = binding.trigger;
            let mut pin = gpio
                .get(line.0)
                .map_err(|e| anyhow::anyhow!("Failed to open {}: {}", line, e))?
                .into_input();

            let sender = sender.clone();
            pin.set_async_interrupt(Trigger::FallingEdge, None, move |event: Event| {
                if let Some(event) = translate(line, event.trigger) {
                    if sender.send(event).is_err() {
                        log::debug!("Trigger receiver dropped, ignoring edge on {}", line);
                    }
                }
            })?;
            log::info!("Trigger {} on BCM pin {}", line, line.0);
            pins.push(pin);
        }

        Ok(GpioTriggerSource { pins })
    }

    pub fn line_count(&self) -> usize {
        self.pins.len()
    }
}

#[cfg(feature = "gpio")]
fn translate(line: TriggerId, trigger: Trigger) -> Option<TriggerEvent> {
    match trigger {
        Trigger::FallingEdge => Some(TriggerEvent::FallingEdge(line)),
        _ => None,
    }
}

#[cfg(not(feature = "gpio"))]
pub struct GpioTriggerSource;

#[cfg(not(feature = "gpio"))]
impl GpioTriggerSource {
    pub fn new(_router: &TriggerRouter, _sender: mpsc::Sender<TriggerEvent>) -> anyhow::Result<Self> {
        Err(anyhow::anyhow!("built without the `gpio` feature"))
    }

    pub fn line_count(&self) -> usize {
        0
    }
}
