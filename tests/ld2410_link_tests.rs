//! LD2410 link tests against a simulated sensor on the serial port

mod common;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::VirtualClock;
use radar_telemetry_bridge::config::BringupPolicy;
use radar_telemetry_bridge::ld2410::frame::{cmd, encode_command, ACK_FLAG, DATA_HEADER, DATA_TAIL};
use radar_telemetry_bridge::ld2410::{baud_index, Ld2410Link, SerialPort};
use radar_telemetry_bridge::logging::DiagStream;
use radar_telemetry_bridge::{
    adapt_reporting_rate, bring_up, BringupError, ChannelId, ChannelLink, LinkError, SensorChannel,
    SensorFrame, TargetStatus,
};

/// Simulated LD2410: answers every command frame with an ACK.
#[derive(Default)]
struct FakeSensor {
    rx: VecDeque<u8>,
    /// Command words received, in order.
    commands: Arc<Mutex<Vec<u16>>>,
    /// Commands answered with a non-zero status.
    rejected: Vec<u16>,
    /// Never answer anything.
    silent: bool,
    /// Push a data report ahead of every ACK.
    chatter: bool,
}

fn params_ack_data() -> Vec<u8> {
    // AA, max gate 2, max moving 2, max stationary 2, thresholds, idle time
    vec![0xAA, 0x02, 0x02, 0x02, 5, 5, 5, 7, 7, 7, 0x05, 0x00]
}

fn firmware_ack_data() -> Vec<u8> {
    vec![0x00, 0x00, 0x07, 0x01, 0x16, 0x15, 0x09, 0x22]
}

fn data_frame(body: &[u8]) -> Vec<u8> {
    let mut out = DATA_HEADER.to_vec();
    out.extend_from_slice(&(body.len() as u16).to_le_bytes());
    out.extend_from_slice(body);
    out.extend_from_slice(&DATA_TAIL);
    out
}

/// Engineering report: moving target at 85 cm, gates [10, 20, 30].
fn engineering_report() -> Vec<u8> {
    data_frame(&[
        0x01, 0xAA, 0x01, 85, 0x00, 64, 0x00, 0x00, 0x00, 85, 0x00, // basic part
        0x02, 0x02, // max moving / stationary gate
        10, 20, 30, // moving gate energies
        1, 2, 3, // stationary gate energies
        0x55, 0x00,
    ])
}

/// Basic report: stationary target at 120 cm.
fn basic_report() -> Vec<u8> {
    data_frame(&[
        0x02, 0xAA, 0x02, 0x00, 0x00, 0x00, 120, 0x00, 40, 120, 0x00, 0x55, 0x00,
    ])
}

impl FakeSensor {
    fn answer(&mut self, word: u16) {
        if self.silent {
            return;
        }
        if self.chatter {
            self.rx.extend(basic_report());
        }
        let status: u16 = if self.rejected.contains(&word) { 1 } else { 0 };
        let mut value = status.to_le_bytes().to_vec();
        if status == 0 {
            match word {
                cmd::READ_PARAMS => value.extend(params_ack_data()),
                cmd::READ_FIRMWARE => value.extend(firmware_ack_data()),
                cmd::ENABLE_CONFIG => value.extend([0x01, 0x00, 0x40, 0x00]),
                _ => {}
            }
        }
        self.rx.extend(encode_command(word | ACK_FLAG, &value));
    }
}

impl SerialPort for FakeSensor {
    fn bytes_available(&mut self) -> usize {
        self.rx.len()
    }

    fn read(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize, LinkError> {
        let n = buf.len().min(self.rx.len());
        for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        assert!(bytes.len() >= 10, "short command frame");
        let word = u16::from_le_bytes([bytes[6], bytes[7]]);
        self.commands.lock().unwrap().push(word);
        self.answer(word);
        Ok(())
    }
}

#[test]
fn test_handshake_reads_firmware_and_thresholds() {
    let sensor = FakeSensor::default();
    let commands = Arc::clone(&sensor.commands);
    let mut link = Ld2410Link::new(sensor);

    assert!(link.handshake());

    assert_eq!(
        *commands.lock().unwrap(),
        vec![cmd::ENABLE_CONFIG, cmd::READ_FIRMWARE, cmd::READ_PARAMS, cmd::END_CONFIG]
    );
    assert_eq!(link.firmware(), Some((0x0000, 0x0107, 0x2209_1516)));
    assert_eq!(link.thresholds().moving, vec![5, 5, 5]);
    assert_eq!(link.thresholds().stationary, vec![7, 7, 7]);
}

#[test]
fn test_enhanced_mode_enables_engineering_reports() {
    let sensor = FakeSensor::default();
    let commands = Arc::clone(&sensor.commands);
    let mut link = Ld2410Link::new(sensor);

    assert!(link.negotiate_enhanced_mode());
    assert!(commands.lock().unwrap().contains(&cmd::ENABLE_ENGINEERING));
}

#[test]
fn test_engineering_report_carries_gates_and_thresholds() {
    let mut link = Ld2410Link::new(FakeSensor::default());
    assert!(link.handshake());

    link.port_mut().rx.extend(engineering_report());
    assert!(link.has_data());

    match link.read_frame().unwrap() {
        SensorFrame::Data(reading) => {
            assert_eq!(reading.status, TargetStatus::MOVING);
            assert!(reading.presence_detected);
            assert!(reading.enhanced_mode);
            assert_eq!(reading.distance, Some(85));
            let moving = reading.moving.unwrap();
            assert_eq!(moving.signal, 64);
            assert_eq!(moving.signals, vec![10, 20, 30]);
            assert_eq!(moving.thresholds, vec![5, 5, 5]);
            assert!(reading.stationary.is_none());
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(!link.has_data());
}

#[test]
fn test_basic_report_has_no_gate_arrays() {
    let mut link = Ld2410Link::new(FakeSensor::default());
    link.port_mut().rx.extend(basic_report());

    match link.read_frame().unwrap() {
        SensorFrame::Data(reading) => {
            assert!(!reading.enhanced_mode);
            let stationary = reading.stationary.unwrap();
            assert_eq!(stationary.distance, 120);
            assert_eq!(stationary.signal, 40);
            assert!(stationary.signals.is_empty());
            assert!(stationary.thresholds.is_empty());
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_unknown_report_type_is_unrecognized() {
    let mut link = Ld2410Link::new(FakeSensor::default());
    link.port_mut().rx.extend(data_frame(&[0x03, 0xAA, 0x00, 0x55, 0x00]));

    assert_eq!(link.read_frame(), Ok(SensorFrame::Unrecognized { code: 0x03 }));
}

#[test]
fn test_garbage_before_report_is_skipped() {
    let mut link = Ld2410Link::new(FakeSensor::default());
    link.port_mut().rx.extend([0x13, 0x37, 0xF4, 0x00]);
    link.port_mut().rx.extend(basic_report());

    assert!(matches!(link.read_frame(), Ok(SensorFrame::Data(_))));
}

#[test]
fn test_silent_sensor_times_out() {
    let sensor = FakeSensor {
        silent: true,
        ..FakeSensor::default()
    };
    let mut link = Ld2410Link::new(sensor);

    assert!(!link.has_data());
    assert_eq!(link.read_frame(), Err(LinkError::NoData));
    assert!(!link.handshake());
}

#[test]
fn test_line_noise_leaves_channel_idle() {
    let mut link = Ld2410Link::new(FakeSensor::default());
    link.port_mut().rx.extend([0x13, 0x37, 0x00, 0x01, 0x02]);

    assert!(link.has_data());
    assert_eq!(link.read_frame(), Err(LinkError::Timeout));
    assert!(!link.has_data());
    assert_eq!(link.read_frame(), Err(LinkError::NoData));
}

#[test]
fn test_split_header_completes_on_next_read() {
    let mut link = Ld2410Link::new(FakeSensor::default());
    let report = basic_report();
    link.port_mut().rx.extend([0x13, 0x37]);
    link.port_mut().rx.extend(&report[..2]);

    assert_eq!(link.read_frame(), Err(LinkError::Timeout));
    assert!(!link.has_data());

    link.port_mut().rx.extend(&report[2..]);
    assert!(link.has_data());
    assert!(matches!(link.read_frame(), Ok(SensorFrame::Data(_))));
}

#[test]
fn test_back_to_back_reports_in_one_read() {
    let mut link = Ld2410Link::new(FakeSensor::default());
    link.port_mut().rx.extend(basic_report());
    link.port_mut().rx.extend(basic_report());

    assert!(matches!(link.read_frame(), Ok(SensorFrame::Data(_))));
    // Second report sits in the assembler, the port is drained
    assert_eq!(link.port_mut().rx.len(), 0);
    assert!(link.has_data());
    assert!(matches!(link.read_frame(), Ok(SensorFrame::Data(_))));
    assert!(!link.has_data());
}

#[test]
fn test_reports_between_command_and_ack_are_ignored() {
    let sensor = FakeSensor {
        chatter: true,
        ..FakeSensor::default()
    };
    let mut link = Ld2410Link::new(sensor);

    assert!(link.handshake());
    assert_eq!(link.thresholds().moving, vec![5, 5, 5]);
}

#[test]
fn test_rejected_baud_is_bounded() {
    let sensor = FakeSensor {
        rejected: vec![cmd::SET_BAUD],
        ..FakeSensor::default()
    };
    let commands = Arc::clone(&sensor.commands);
    let mut channel = SensorChannel::new(ChannelId::new(1).unwrap(), Ld2410Link::new(sensor));
    let clock = VirtualClock::default();
    let log: DiagStream = DiagStream::new();
    let code = baud_index(256_000).unwrap();

    let err = adapt_reporting_rate(&mut channel, code, &BringupPolicy::default(), &clock, &log)
        .unwrap_err();

    assert_eq!(err, BringupError::BaudRejected { attempts: 5 });
    let commands = commands.lock().unwrap();
    assert_eq!(commands.iter().filter(|&&w| w == cmd::SET_BAUD).count(), 5);
    // Configuration mode is always left, and no restart follows a rejection
    assert_eq!(
        commands.iter().filter(|&&w| w == cmd::END_CONFIG).count(),
        5
    );
    assert!(!commands.contains(&cmd::RESTART));
}

#[test]
fn test_accepted_baud_restarts_sensor() {
    let sensor = FakeSensor::default();
    let commands = Arc::clone(&sensor.commands);
    let mut link = Ld2410Link::new(sensor);

    assert!(link.set_reporting_rate(7));
    assert_eq!(
        *commands.lock().unwrap(),
        vec![cmd::ENABLE_CONFIG, cmd::SET_BAUD, cmd::END_CONFIG, cmd::RESTART]
    );
}

#[test]
fn test_bring_up_over_serial() {
    let mut channel = SensorChannel::new(ChannelId::new(2).unwrap(), Ld2410Link::new(FakeSensor::default()));
    let clock = VirtualClock::default();
    let log: DiagStream = DiagStream::new();

    let report = bring_up(&mut channel, &BringupPolicy::default(), &clock, &log).unwrap();

    assert!(report.is_complete());
    assert_eq!(report.handshake_attempts, 1);
    assert_eq!(report.enhanced_attempts, 1);
}
