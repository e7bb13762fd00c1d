//! RadarTelemetryBridge - Main entry point
//!
//! Startup order:
//! 1. Log drain thread (console now, diagnostic topic once connected)
//! 2. Cloud connection: Wi-Fi, gateway ping, TLS, broker. A network stack
//!    that fails to start leaves the node offline, never without radars
//! 3. Radar UARTs, bring-up of each channel in index order
//! 4. One acquisition worker thread per channel, whatever bring-up reported
//! 5. Idle forever

#[cfg(target_os = "espidf")]
fn main() {
    esp_idf_svc::sys::link_patches();

    if let Err(e) = firmware::run() {
        println!("bridge setup failed: {}", e);
    }

    // No shutdown path: workers run for the device lifetime
    loop {
        std::thread::park();
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    println!(
        "{} targets ESP-IDF; build with an espidf target to run it",
        env!("VERSION_STRING")
    );
}

#[cfg(target_os = "espidf")]
mod firmware {
    use std::sync::{Arc, OnceLock};
    use std::thread;

    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::gpio::Pins;
    use esp_idf_svc::hal::modem::Modem;
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::hal::uart::{UART0, UART1, UART2};
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::sys::EspError;

    use radar_telemetry_bridge::bringup::{adapt_reporting_rate, bring_up_all};
    use radar_telemetry_bridge::config::{secrets, BridgeConfig};
    use radar_telemetry_bridge::hal::{EspClock, EspTransport, UartPort};
    use radar_telemetry_bridge::ld2410::Ld2410Link;
    use radar_telemetry_bridge::log_drain::log_drain_task;
    use radar_telemetry_bridge::{
        diag_error, diag_info, diag_warn, AcquisitionWorker, ChannelId, Clock, CloudConnection,
        Offline, PublishSink, SensorChannel, Transport, WorkerConfig, DIAG_LOG,
    };

    type RadarLink = Ld2410Link<UartPort>;
    type Mirror = Arc<OnceLock<Box<dyn Fn(&str) + Send + Sync>>>;

    const LOG_DRAIN_STACK_SIZE: usize = 6 * 1024;

    /// Radar UART peripherals, in channel order.
    struct RadarUarts {
        pins: Pins,
        uart0: UART0,
        uart1: UART1,
        uart2: UART2,
    }

    pub fn run() -> Result<(), EspError> {
        let config = BridgeConfig::default();
        let clock = EspClock;

        let peripherals = Peripherals::take()?;

        diag_info!(DIAG_LOG, clock.now_us(), "{}", env!("VERSION_STRING"));

        // Mirror target for the log drain, filled once the broker is up
        let mirror: Mirror = Arc::new(OnceLock::new());
        {
            let mirror = Arc::clone(&mirror);
            let mirror_level = config.mirror_level;
            let spawned = thread::Builder::new()
                .name("log-drain".into())
                .stack_size(LOG_DRAIN_STACK_SIZE)
                .spawn(move || {
                    log_drain_task(&DIAG_LOG, EspClock, mirror_level, |line| {
                        if let Some(send) = mirror.get() {
                            send(line);
                        }
                    });
                });
            if let Err(e) = spawned {
                println!("log drain not started: {}", e);
            }
        }

        let uarts = RadarUarts {
            pins: peripherals.pins,
            uart0: peripherals.uart0,
            uart1: peripherals.uart1,
            uart2: peripherals.uart2,
        };

        // Cloud first: failures leave the connection publish-disabled
        match open_network(peripherals.modem) {
            Ok(transport) => {
                let sink = connect(transport, &config, &clock);
                let mirror_sink = sink.clone();
                let _ = mirror.set(Box::new(move |line: &str| {
                    mirror_sink.send_log(line);
                }));
                start_channels(uarts, sink, &config, clock);
            }
            Err(e) => {
                diag_error!(
                    DIAG_LOG,
                    clock.now_us(),
                    "network stack: {}; continuing publish-disabled",
                    e
                );
                let sink = PublishSink::new(CloudConnection::new(Offline, config.diagnostic_topic));
                start_channels(uarts, sink, &config, clock);
            }
        }

        Ok(())
    }

    fn open_network(modem: Modem) -> Result<EspTransport, EspError> {
        let sysloop = EspSystemEventLoop::take()?;
        let nvs = EspDefaultNvsPartition::take().ok();
        EspTransport::new(modem, sysloop, nvs)
    }

    fn connect(transport: EspTransport, config: &BridgeConfig, clock: &EspClock) -> PublishSink<EspTransport> {
        let mut connection = CloudConnection::new(transport, config.diagnostic_topic);
        match connection.establish(
            &secrets::credentials(),
            &secrets::endpoint(),
            &config.connect,
            clock,
            &DIAG_LOG,
        ) {
            Ok(ready) => diag_info!(
                DIAG_LOG,
                clock.now_us(),
                "cloud ready (join attempts {}, broker attempts {})",
                ready.join_attempts,
                ready.broker_attempts
            ),
            Err(e) => diag_error!(
                DIAG_LOG,
                clock.now_us(),
                "{}: {}; continuing publish-disabled",
                e.code(),
                e
            ),
        }
        PublishSink::new(connection)
    }

    /// Open the radar UARTs, bring every channel up, then hand each to its worker.
    fn start_channels<T: Transport + 'static>(
        uarts: RadarUarts,
        sink: PublishSink<T>,
        config: &BridgeConfig,
        clock: EspClock,
    ) {
        // UART1 on 32/33, UART2 on 25/26, UART0 on 23/22 (shared with the boot console)
        let RadarUarts { pins, uart0, uart1, uart2 } = uarts;
        let ports = [
            UartPort::open(uart1, pins.gpio33, pins.gpio32, config.channels[0].baud),
            UartPort::open(uart2, pins.gpio26, pins.gpio25, config.channels[1].baud),
            UartPort::open(uart0, pins.gpio22, pins.gpio23, config.channels[2].baud),
        ];

        let mut channels: Vec<SensorChannel<RadarLink>> = Vec::with_capacity(ports.len());
        for (channel, port) in config.channels.iter().zip(ports) {
            let Some(id) = ChannelId::new(channel.id) else {
                continue;
            };
            match port {
                Ok(port) => channels.push(SensorChannel::new(id, Ld2410Link::new(port))),
                Err(e) => diag_error!(DIAG_LOG, clock.now_us(), "radar {} uart: {}", id, e),
            }
        }

        // Sequential bring-up, before any worker exists
        let outcomes = bring_up_all(&mut channels, &config.bringup, &clock, &DIAG_LOG);
        for (channel, outcome) in channels.iter().zip(&outcomes) {
            if let Err(e) = outcome {
                diag_warn!(DIAG_LOG, clock.now_us(), "radar {} {}: {}", channel.id(), e.code(), e);
            }
        }

        match config.reporting_rate() {
            Some(Ok(code)) => {
                for channel in channels.iter_mut() {
                    let _ = adapt_reporting_rate(channel, code, &config.bringup, &clock, &DIAG_LOG);
                }
            }
            Some(Err(baud)) => {
                diag_warn!(DIAG_LOG, clock.now_us(), "reporting baud {} not supported", baud)
            }
            None => {}
        }

        // Workers start regardless of bring-up outcome
        let worker_config = WorkerConfig {
            topic: config.telemetry_topic,
            period: config.sample_period,
        };
        for channel in channels {
            let id = channel.id();
            let worker = AcquisitionWorker::new(channel, sink.clone(), clock, worker_config, &DIAG_LOG);
            match worker.spawn(config.worker_stack_size) {
                Ok(_) => diag_info!(DIAG_LOG, clock.now_us(), "radar {} worker started", id),
                Err(e) => diag_error!(DIAG_LOG, clock.now_us(), "radar {} worker: {}", id, e),
            }
        }
    }
}
