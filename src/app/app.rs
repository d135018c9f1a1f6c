use std::ops::ControlFlow;
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;

use crate::core::{AppConfig, MediaAssets, SegmentTable};
use crate::playback::{DeadlineTimer, PlaybackPort, SwitchCause, SwitchCoordinator, TokioDeadlineTimer};
use crate::triggers::{
    ConsoleTriggerSource, Debouncer, GpioTriggerSource, HotkeyTriggerSource, TriggerEvent, TriggerRouter,
    TriggerSourceKind,
};
use crate::video::MpvPlayer;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriggerStats {
    pub accepted: u64,
    pub debounced: u64,
    pub unknown: u64,
}

/// Everything the looper owns at runtime, built once at startup.
pub struct LooperApp<P, T> {
    pub config: AppConfig,
    pub router: TriggerRouter,
    pub coordinator: SwitchCoordinator<P, T>,
    pub debouncer: Debouncer,
    pub trigger_stats: TriggerStats,
}

impl LooperApp<MpvPlayer, TokioDeadlineTimer> {
    /// Validates everything that can be validated before the player starts or
    /// any deadline is armed.
    pub fn new(config: AppConfig, runtime: Handle) -> anyhow::Result<Self> {
        config.validate()?;

        let assets = MediaAssets::from_config(&config);
        let durations = assets.load()?;
        let segments = SegmentTable::build(&durations, config.debounce_delay_secs)?;
        let router = TriggerRouter::build(&config.available_triggers(), segments.len())?;
        log::info!(
            "{} segments, {:.1}s of footage, {} trigger lines bound",
            segments.len(),
            segments.total_duration(),
            router.bindings().len()
        );
        for binding in router.bindings() {
            log::info!("{} -> segment {}", binding.trigger, binding.segment);
        }

        let player = MpvPlayer::launch(&config.player, &assets.media_path)?;
        let timer = TokioDeadlineTimer::new(runtime);

        Ok(Self::assemble(config, segments, router, player, timer))
    }
}

impl<P, T> LooperApp<P, T>
where
    P: PlaybackPort + 'static,
    T: DeadlineTimer + 'static,
{
    pub fn assemble(config: AppConfig, segments: SegmentTable, router: TriggerRouter, port: P, timer: T) -> Self {
        let debouncer = Debouncer::new(Duration::from_millis(config.bounce_time_ms));
        let coordinator = SwitchCoordinator::start(segments, config.over_time_margin_secs, port, timer);
        Self {
            config,
            router,
            coordinator,
            debouncer,
            trigger_stats: TriggerStats::default(),
        }
    }

    /// Starts the configured trigger sources and processes their events until
    /// shutdown is requested or every source has gone away.
    pub fn run(mut self) -> anyhow::Result<()> {
        let (sender, receiver) = mpsc::channel();
        let mut sources = Vec::new();

        // Sources must outlive the loop, they stop listening on drop
        let _gpio = if self.config.gpio_triggers {
            match GpioTriggerSource::new(&self.router, sender.clone()) {
                Ok(gpio) => {
                    sources.push(TriggerSourceKind::Gpio);
                    log::info!("Listening on {} GPIO lines", gpio.line_count());
                    Some(gpio)
                }
                Err(e) => {
                    log::error!("GPIO triggers unavailable: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let _hotkeys = if self.config.hotkey_triggers {
            match HotkeyTriggerSource::new(&self.config.trigger_lines, &self.router) {
                Ok(hotkeys) => {
                    hotkeys.spawn_forwarder(sender.clone());
                    sources.push(TriggerSourceKind::Hotkeys);
                    log::info!("Listening for {} hotkey triggers", hotkeys.line_count());
                    Some(hotkeys)
                }
                Err(e) => {
                    log::error!("Hotkey triggers unavailable: {}", e);
                    None
                }
            }
        } else {
            None
        };

        if self.config.console_triggers {
            ConsoleTriggerSource::spawn(sender.clone());
            sources.push(TriggerSourceKind::Console);
        }
        drop(sender);

        if sources.is_empty() {
            self.coordinator.shutdown();
            return Err(anyhow::anyhow!("No trigger source could be started"));
        }
        let names: Vec<&str> = sources.iter().map(|kind| kind.name()).collect();
        log::info!("Looper running, trigger sources: {}", names.join(", "));

        while let Ok(event) = receiver.recv() {
            if self.handle_event(event, Instant::now()).is_break() {
                break;
            }
        }

        self.coordinator.shutdown();
        log::info!(
            "Looper stopped: {:?}, {:?}",
            self.trigger_stats,
            self.coordinator.stats()
        );
        Ok(())
    }

    pub fn handle_event(&mut self, event: TriggerEvent, now: Instant) -> ControlFlow<()> {
        let trigger = match event {
            TriggerEvent::Shutdown => {
                log::info!("Shutdown requested");
                return ControlFlow::Break(());
            }
            TriggerEvent::FallingEdge(trigger) => trigger,
        };

        if !self.debouncer.accept(trigger, now) {
            self.trigger_stats.debounced += 1;
            log::debug!("Debounced edge on {}", trigger);
            return ControlFlow::Continue(());
        }

        let segment = match self.router.resolve(trigger) {
            Ok(segment) => segment,
            Err(e) => {
                self.trigger_stats.unknown += 1;
                log::warn!("{} (ignored, {} so far)", e, self.trigger_stats.unknown);
                return ControlFlow::Continue(());
            }
        };

        self.trigger_stats.accepted += 1;
        if let Err(e) = self.coordinator.switch_to(segment, SwitchCause::ExplicitTrigger) {
            log::error!("Switch to segment {} for {} failed: {}", segment, trigger, e);
        }
        ControlFlow::Continue(())
    }
}
