//! Web UI push hub
//!
//! Encodes status updates as push events, broadcasts them and keeps the
//! last payloads so a newly connected page starts with current data.

use alloc::string::String;

use printwatch_protocol::{MonitorInfo, PushEvent, WeatherReadings};

use crate::status::{PrinterRecord, StatusRecord, WeatherData};
use crate::traits::PushChannel;

/// Last pushed payloads
#[derive(Debug, Clone, Default)]
pub struct PushHub {
    weather: Option<String>,
    monitor: Option<String>,
}

impl PushHub {
    pub const fn new() -> Self {
        Self {
            weather: None,
            monitor: None,
        }
    }

    /// Publish a weather poll
    ///
    /// An invalid record clears the cached weather payload and sends
    /// nothing.
    pub fn publish_weather<C: PushChannel>(
        &mut self,
        channel: &mut C,
        record: &StatusRecord<WeatherData>,
        metric: bool,
    ) {
        let Some(data) = record.current() else {
            self.weather = None;
            return;
        };

        let event = PushEvent::CurrentWeather {
            current_readings: WeatherReadings {
                temp: data.temperature,
                humidity: data.humidity,
                wind_speed: data.wind_speed,
                wind_direction: data.wind_direction,
                description: data.description.as_str(),
                time: data.observation_time,
                metric,
            },
        };

        match event.to_json() {
            Ok(json) => {
                Self::send(channel, &json);
                self.weather = Some(json);
            }
            Err(e) => warn!("Failed to encode weather push: {:?}", e),
        }
    }

    /// Publish a printer poll
    pub fn publish_monitor<C: PushChannel>(
        &mut self,
        channel: &mut C,
        record: &PrinterRecord,
        enabled: bool,
    ) {
        let event = PushEvent::MonitorInfo(MonitorInfo {
            enabled,
            valid_job_data: record.valid_job_data(),
            valid_print_data: record.valid_print_data(),
            print_state: record.state_text(),
        });

        match event.to_json() {
            Ok(json) => {
                Self::send(channel, &json);
                self.monitor = Some(json);
            }
            Err(e) => warn!("Failed to encode monitor push: {:?}", e),
        }
    }

    /// Re-send cached payloads after a client connects
    pub fn replay<C: PushChannel>(&self, channel: &mut C) {
        for payload in [&self.weather, &self.monitor].into_iter().flatten() {
            Self::send(channel, payload);
        }
    }

    /// Forget the weather payload once its source is switched off
    pub fn clear_weather(&mut self) {
        self.weather = None;
    }

    /// Forget the monitor payload once its printer is gone
    pub fn clear_monitor(&mut self) {
        self.monitor = None;
    }

    pub fn cached_weather(&self) -> Option<&str> {
        self.weather.as_deref()
    }

    pub fn cached_monitor(&self) -> Option<&str> {
        self.monitor.as_deref()
    }

    fn send<C: PushChannel>(channel: &mut C, payload: &str) {
        if channel.client_count() > 0 {
            channel.broadcast(payload);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{PrinterPoll, PrinterState, StatusAggregator};
    use crate::traits::SourceError;
    use alloc::vec::Vec;

    #[derive(Default)]
    struct Channel {
        clients: usize,
        sent: Vec<String>,
    }

    impl PushChannel for Channel {
        fn client_count(&self) -> usize {
            self.clients
        }

        fn broadcast(&mut self, text: &str) {
            self.sent.push(String::from(text));
        }
    }

    fn valid_weather() -> StatusRecord<WeatherData> {
        let mut record = StatusRecord::new();
        record.update(Ok(WeatherData {
            temperature: 18.0,
            humidity: 55,
            ..Default::default()
        }));
        record
    }

    #[test]
    fn test_weather_broadcast_and_cache() {
        let mut hub = PushHub::new();
        let mut channel = Channel {
            clients: 1,
            ..Default::default()
        };

        hub.publish_weather(&mut channel, &valid_weather(), true);
        assert_eq!(channel.sent.len(), 1);
        assert!(channel.sent[0].starts_with("{\"type\":\"currentWeather\""));
        assert_eq!(hub.cached_weather(), Some(channel.sent[0].as_str()));
    }

    #[test]
    fn test_no_clients_still_caches() {
        let mut hub = PushHub::new();
        let mut channel = Channel::default();

        hub.publish_weather(&mut channel, &valid_weather(), false);
        assert!(channel.sent.is_empty());
        assert!(hub.cached_weather().is_some());
    }

    #[test]
    fn test_invalid_weather_clears_cache() {
        let mut hub = PushHub::new();
        let mut channel = Channel {
            clients: 1,
            ..Default::default()
        };

        let mut record = valid_weather();
        hub.publish_weather(&mut channel, &record, true);
        record.update(Err(SourceError::Transport));
        hub.publish_weather(&mut channel, &record, true);

        assert_eq!(channel.sent.len(), 1);
        assert_eq!(hub.cached_weather(), None);
    }

    #[test]
    fn test_cleared_payloads_not_replayed() {
        let mut hub = PushHub::new();
        let mut channel = Channel::default();
        let agg = StatusAggregator::new();

        hub.publish_weather(&mut channel, &valid_weather(), true);
        hub.publish_monitor(&mut channel, agg.printer(0), false);
        hub.clear_weather();

        channel.clients = 1;
        hub.replay(&mut channel);
        assert_eq!(channel.sent.len(), 1);
        assert!(channel.sent[0].contains("monitorInfo"));

        hub.clear_monitor();
        hub.replay(&mut channel);
        assert_eq!(channel.sent.len(), 1);
    }

    #[test]
    fn test_replay_on_connect() {
        let mut hub = PushHub::new();
        let mut channel = Channel::default();

        let mut agg = StatusAggregator::new();
        agg.record_printer(
            0,
            PrinterPoll {
                job: Err(SourceError::Transport),
                state: Ok(PrinterState {
                    state_text: heapless::String::try_from("Operational").unwrap(),
                    ..Default::default()
                }),
            },
        );

        hub.publish_weather(&mut channel, &valid_weather(), true);
        hub.publish_monitor(&mut channel, agg.printer(0), true);
        assert!(channel.sent.is_empty());

        channel.clients = 1;
        hub.replay(&mut channel);
        assert_eq!(channel.sent.len(), 2);
        assert_eq!(
            channel.sent[1],
            "{\"type\":\"monitorInfo\",\"enabled\":true,\"validJobData\":false,\
             \"validPrintData\":true,\"printState\":\"Operational\"}"
        );
    }
}
