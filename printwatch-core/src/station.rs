//! Station context
//!
//! Owns everything the outer loop needs: the scheduler, the configuration
//! broker, the display state machine, polled status and the platform
//! collaborators. The board firmware builds one [`Station`] at boot and
//! calls [`Station::run_once`] from its main loop.
//!
//! # Tasks
//!
//! | Task              | Interval                       |
//! |-------------------|--------------------------------|
//! | `Time`            | 5 s                            |
//! | `CurrentWeather`  | weather interval setting       |
//! | `WifiStrength`    | 10 s                           |
//! | `SettingsChanged` | every tick                     |
//! | `ScreenGrab`      | 10 s                           |
//! | `PrinterMonitor`  | print monitor interval setting |
//! | `DisplayCycle`    | current dwell, only when cycling |

use printwatch_hal::{Clock, ConfigStore, SerialPort};
use printwatch_protocol::DEFAULT_FILENAME;

use crate::config::{ConfigChangeBroker, ConfigEvent, ConfigSnapshot, SECONDS_MULT};
use crate::display::{DisplayModeController, RenderTarget};
use crate::push::PushHub;
use crate::scheduler::{Scheduler, SchedulerError, Task, TaskRunner};
use crate::screenshot::{serve_screenshot, FrameSource};
use crate::status::{PrinterPoll, StatusAggregator};
use crate::traits::{NetworkServices, PrinterSource, PushChannel, Renderer, WeatherSource};

pub const TIME_INTERVAL_MS: u32 = 5 * SECONDS_MULT;
pub const WIFI_STRENGTH_INTERVAL_MS: u32 = 10 * SECONDS_MULT;
pub const SETTINGS_CHANGED_INTERVAL_MS: u32 = 0;
pub const SCREEN_GRAB_INTERVAL_MS: u32 = 10 * SECONDS_MULT;

/// Station tasks, in dispatch order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskId {
    Time,
    CurrentWeather,
    WifiStrength,
    SettingsChanged,
    ScreenGrab,
    PrinterMonitor,
    DisplayCycle,
}

/// Concrete collaborator types of a board
pub trait Platform {
    type Store: ConfigStore;
    type Display: Renderer + FrameSource;
    type Weather: WeatherSource;
    type Printers: PrinterSource;
    type Network: NetworkServices;
    type Push: PushChannel;
    type Serial: SerialPort;
    type Clock: Clock;
}

/// Board collaborators
pub struct Peripherals<B: Platform> {
    pub display: B::Display,
    pub weather: B::Weather,
    pub printers: B::Printers,
    pub network: B::Network,
    pub push: B::Push,
    pub serial: B::Serial,
    pub clock: B::Clock,
}

/// Task-facing half of the station
///
/// Kept apart from the scheduler so the scheduler can hand itself to the
/// running task.
pub struct StationCore<B: Platform> {
    broker: ConfigChangeBroker<B::Store>,
    /// Snapshot the tasks read; replaced only by the settings task
    config: ConfigSnapshot,
    display: DisplayModeController,
    status: StatusAggregator,
    push: PushHub,
    screenshot_requested: bool,
    io: Peripherals<B>,
}

/// Owned station context
pub struct Station<B: Platform> {
    scheduler: Scheduler<TaskId>,
    core: StationCore<B>,
}

fn log_scheduler_error(result: Result<(), SchedulerError>) {
    if let Err(e) = result {
        warn!("Scheduler rejected request: {:?}", e);
    }
}

impl<B: Platform> Station<B> {
    /// Boot the station
    ///
    /// Loads the stored configuration, pushes it to the collaborators and
    /// registers the task table. Every enabled task runs on the first tick.
    pub fn new(store: B::Store, io: Peripherals<B>) -> Result<Self, SchedulerError> {
        let broker = ConfigChangeBroker::load(store);
        let config = broker.snapshot().clone();
        let display = DisplayModeController::from_config(&config);

        let mut core = StationCore {
            broker,
            config,
            display,
            status: StatusAggregator::new(),
            push: PushHub::new(),
            screenshot_requested: false,
            io,
        };
        core.apply_device_settings();

        let mut scheduler = Scheduler::new();
        let c = &core.config;
        scheduler.add_task(Task::new(TaskId::Time, TIME_INTERVAL_MS))?;
        scheduler.add_task(Task::new(
            TaskId::CurrentWeather,
            c.current_weather_interval_ms,
        ))?;
        scheduler.add_task(Task::new(TaskId::WifiStrength, WIFI_STRENGTH_INTERVAL_MS))?;
        scheduler.add_task(Task::new(
            TaskId::SettingsChanged,
            SETTINGS_CHANGED_INTERVAL_MS,
        ))?;
        scheduler.add_task(Task::new(TaskId::ScreenGrab, SCREEN_GRAB_INTERVAL_MS))?;
        scheduler.add_task(Task::new(
            TaskId::PrinterMonitor,
            c.print_monitor_interval_ms,
        ))?;

        let dwell = core
            .display
            .cycle_dwell_ms(c)
            .unwrap_or(c.display_cycle_interval_ms);
        scheduler.add_task(Task::disabled(TaskId::DisplayCycle, dwell))?;

        let mut station = Self { scheduler, core };
        let now = station.core.io.clock.now_ms();
        station.core.sync_cycle_task(now, &mut station.scheduler);

        info!(
            "Station started: {} printers, display {:?}",
            station.core.config.printers.len(),
            station.core.display.mode()
        );
        Ok(station)
    }

    /// Run every due task at `now_ms`
    pub fn tick(&mut self, now_ms: u64) -> usize {
        self.scheduler.tick(now_ms, &mut self.core)
    }

    /// Read the clock and run every due task
    pub fn run_once(&mut self) -> usize {
        let now = self.core.io.clock.now_ms();
        self.tick(now)
    }

    /// Milliseconds until the next task is due
    pub fn next_due_in(&mut self) -> Option<u64> {
        let now = self.core.io.clock.now_ms();
        self.scheduler.next_due_in(now)
    }

    /// Settings write path for the web layer
    pub fn settings(&mut self) -> &mut ConfigChangeBroker<B::Store> {
        &mut self.core.broker
    }

    /// Snapshot the tasks are currently using
    pub fn active_config(&self) -> &ConfigSnapshot {
        &self.core.config
    }

    pub fn display(&self) -> &DisplayModeController {
        &self.core.display
    }

    pub fn status(&self) -> &StatusAggregator {
        &self.core.status
    }

    pub fn scheduler(&self) -> &Scheduler<TaskId> {
        &self.scheduler
    }

    pub fn peripherals(&mut self) -> &mut Peripherals<B> {
        &mut self.core.io
    }

    /// Ask for a screenshot on the next screen grab check
    pub fn request_screenshot(&mut self) {
        self.core.screenshot_requested = true;
    }

    pub fn screenshot_requested(&self) -> bool {
        self.core.screenshot_requested
    }

    /// A web client connected: replay the last status payloads
    pub fn client_connected(&mut self) {
        self.core.push.replay(&mut self.core.io.push);
    }
}

impl<B: Platform> TaskRunner<TaskId> for StationCore<B> {
    fn run(&mut self, id: TaskId, now_ms: u64, scheduler: &mut Scheduler<TaskId>) {
        match id {
            TaskId::Time => self.update_time(),
            TaskId::CurrentWeather => self.update_weather(),
            TaskId::WifiStrength => self.update_wifi_strength(),
            TaskId::SettingsChanged => self.check_settings_changed(now_ms, scheduler),
            TaskId::ScreenGrab => self.check_screen_grab(),
            TaskId::PrinterMonitor => self.update_printer(),
            TaskId::DisplayCycle => self.advance_display_cycle(now_ms, scheduler),
        }
    }
}

impl<B: Platform> StationCore<B> {
    /// Push clock, unit and backlight settings to the collaborators
    fn apply_device_settings(&mut self) {
        self.io.network.set_utc_offset(self.config.utc_offset_seconds);
        self.io.display.set_metric(self.config.display_metric);
        self.io.display.set_brightness(self.config.display_brightness);
        self.io.display.restart();
    }

    fn update_time(&mut self) {
        let now = self.io.network.local_time();
        self.io
            .display
            .draw_time(now, self.config.clock_format, self.config.date_format);
    }

    fn update_wifi_strength(&mut self) {
        let rssi = self.io.network.rssi_dbm();
        self.io.display.draw_wifi_strength(rssi);
    }

    /// Weather is switched on and has credentials
    fn weather_active(&self) -> bool {
        self.config.weather_enabled && self.config.weather_configured()
    }

    fn update_weather(&mut self) {
        let enabled = self.weather_active();

        if enabled {
            let result = self.io.weather.fetch(
                self.config.open_weather_api_key.as_str(),
                self.config.open_weather_location_id.as_str(),
                self.config.display_metric,
            );
            self.status.record_weather(result);
            self.push.publish_weather(
                &mut self.io.push,
                self.status.current_weather(),
                self.config.display_metric,
            );
        }

        if self.display.current_render_target() == RenderTarget::Weather {
            self.io
                .display
                .draw_weather(self.status.current_weather(), enabled);
        }
    }

    fn update_printer(&mut self) {
        let RenderTarget::Printer(index) = self.display.current_render_target() else {
            return;
        };
        let Ok(printer) = self.config.printers.get(index) else {
            return;
        };

        if printer.enabled {
            let poll = PrinterPoll {
                job: self.io.printers.fetch_job(printer),
                state: self.io.printers.fetch_state(printer),
            };
            self.status.record_printer(index, poll);
        }

        let record = self.status.printer(index);
        let title = record.title(printer.title_name());
        self.io.display.draw_printer(&title, record, printer.enabled);
        self.push
            .publish_monitor(&mut self.io.push, record, printer.enabled);
    }

    fn check_screen_grab(&mut self) {
        if !self.screenshot_requested {
            return;
        }

        // A failed transfer is not retried; the client asks again
        if let Err(e) = serve_screenshot(
            &mut self.io.serial,
            &mut self.io.clock,
            &mut self.io.display,
            DEFAULT_FILENAME,
        ) {
            warn!("Screenshot request dropped: {:?}", e);
        }
        self.screenshot_requested = false;
    }

    fn check_settings_changed(&mut self, now_ms: u64, scheduler: &mut Scheduler<TaskId>) {
        while let Some(event) = self.broker.take_event() {
            debug!("Config event: {:?}", event);
            match event {
                ConfigEvent::PrinterDeleted {
                    index,
                    was_selected,
                } => {
                    if self.display.current_render_target() == RenderTarget::Printer(index) {
                        self.push.clear_monitor();
                    }
                    self.status.on_printer_deleted(index);
                    self.display.on_printer_deleted(
                        index,
                        was_selected,
                        &self.broker.snapshot().printers,
                    );
                }
                ConfigEvent::PrinterEdited { index } => self.status.reset_printer(index),
                ConfigEvent::RosterCleared => {
                    self.status.clear_printers();
                    self.push.clear_monitor();
                }
            }
        }

        let Some(config) = self.broker.drain_if_changed() else {
            return;
        };

        info!("Settings changed, re-applying");
        let weather_was_active = self.weather_active();
        self.config = config;

        if weather_was_active && !self.weather_active() {
            self.status.reset_weather();
            self.push.clear_weather();
        }

        self.display
            .apply_config(self.config.display_selector(), &self.config.printers);
        self.apply_device_settings();

        log_scheduler_error(scheduler.set_interval(
            TaskId::CurrentWeather,
            self.config.current_weather_interval_ms,
        ));
        log_scheduler_error(scheduler.set_interval(
            TaskId::PrinterMonitor,
            self.config.print_monitor_interval_ms,
        ));

        for id in [
            TaskId::Time,
            TaskId::CurrentWeather,
            TaskId::WifiStrength,
            TaskId::PrinterMonitor,
        ] {
            log_scheduler_error(scheduler.force_next_iteration(id));
        }

        self.sync_cycle_task(now_ms, scheduler);
    }

    /// Match the rotation task to the display mode
    ///
    /// Entering the rotation starts a full dwell from `now_ms`.
    fn sync_cycle_task(&mut self, now_ms: u64, scheduler: &mut Scheduler<TaskId>) {
        match self.display.cycle_dwell_ms(&self.config) {
            Some(dwell) => {
                log_scheduler_error(scheduler.set_interval(TaskId::DisplayCycle, dwell));
                let running = scheduler
                    .task(TaskId::DisplayCycle)
                    .is_some_and(|t| t.is_enabled());
                if !running {
                    log_scheduler_error(scheduler.enable(TaskId::DisplayCycle));
                    log_scheduler_error(scheduler.restart(TaskId::DisplayCycle, now_ms));
                }
            }
            None => log_scheduler_error(scheduler.disable(TaskId::DisplayCycle)),
        }
    }

    /// Step the rotation
    ///
    /// Only a change of render target redraws. A printer is polled right
    /// away; weather is drawn from the last poll while that poll is valid,
    /// so the weather source keeps its own cadence.
    fn advance_display_cycle(&mut self, now_ms: u64, scheduler: &mut Scheduler<TaskId>) {
        let previous = self.display.current_render_target();
        let Some(target) = self.display.advance_cycle(&self.config.printers) else {
            self.sync_cycle_task(now_ms, scheduler);
            return;
        };

        if let Some(dwell) = self.display.cycle_dwell_ms(&self.config) {
            log_scheduler_error(scheduler.set_interval(TaskId::DisplayCycle, dwell));
        }

        if target == previous {
            return;
        }
        debug!("Display cycle: {:?}", target);

        self.io.display.restart();
        match target {
            RenderTarget::Weather if self.status.current_weather().valid => {
                let enabled = self.weather_active();
                self.io
                    .display
                    .draw_weather(self.status.current_weather(), enabled);
            }
            RenderTarget::Weather => {
                log_scheduler_error(scheduler.force_next_iteration(TaskId::CurrentWeather))
            }
            RenderTarget::Printer(_) => {
                log_scheduler_error(scheduler.force_next_iteration(TaskId::PrinterMonitor))
            }
        }
    }
}
