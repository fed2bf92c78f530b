//! Live capture: read analyzer output straight from its serial port.

use crate::error::{ReplayError, Result};
use crate::source::LineSource;
use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{info, warn};
use std::io::{ErrorKind, Read};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SerialConfig {
    pub port_name: String,
    pub baud_rate: u32,
    pub data_bits: serialport::DataBits,
    pub parity: serialport::Parity,
    pub stop_bits: serialport::StopBits,
    pub flow_control: serialport::FlowControl,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: 115_200,
            data_bits: serialport::DataBits::Eight,
            parity: serialport::Parity::None,
            stop_bits: serialport::StopBits::One,
            flow_control: serialport::FlowControl::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerialEvent {
    Opened(String),
    /// One complete line, terminator included.
    Line(Vec<u8>),
    Error(String),
    Closed,
}

enum Command {
    Close,
}

/// Owns the port on a reader thread and hands complete lines to the caller.
pub struct SerialService {
    cfg: SerialConfig,
    tx_cmd: Sender<Command>,
    rx_evt: Receiver<SerialEvent>,
}

impl SerialService {
    pub fn open(cfg: SerialConfig) -> Self {
        let (tx_cmd, rx_cmd) = unbounded::<Command>();
        let (tx_evt, rx_evt) = unbounded::<SerialEvent>();
        let cfg_clone = cfg.clone();

        std::thread::spawn(move || {
            match serialport::new(&cfg_clone.port_name, cfg_clone.baud_rate)
                .data_bits(cfg_clone.data_bits)
                .parity(cfg_clone.parity)
                .stop_bits(cfg_clone.stop_bits)
                .flow_control(cfg_clone.flow_control)
                .timeout(Duration::from_millis(50))
                .open()
            {
                Ok(mut port) => {
                    let _ = tx_evt.send(SerialEvent::Opened(cfg_clone.port_name.clone()));
                    let mut pending = Vec::new();
                    let mut buf = [0u8; 4096];
                    loop {
                        match port.read(&mut buf) {
                            Ok(n) if n > 0 => {
                                pending.extend_from_slice(&buf[..n]);
                                for line in split_lines(&mut pending) {
                                    if tx_evt.send(SerialEvent::Line(line)).is_err() {
                                        return;
                                    }
                                }
                            }
                            Ok(_) => {}
                            Err(e) if e.kind() == ErrorKind::TimedOut => {}
                            Err(e) => {
                                if !pending.is_empty() {
                                    let _ = tx_evt.send(SerialEvent::Line(std::mem::take(&mut pending)));
                                }
                                let _ = tx_evt.send(SerialEvent::Error(e.to_string()));
                                let _ = tx_evt.send(SerialEvent::Closed);
                                return;
                            }
                        }
                        if let Ok(Command::Close) = rx_cmd.try_recv() {
                            let _ = tx_evt.send(SerialEvent::Closed);
                            return;
                        }
                    }
                }
                Err(e) => {
                    let _ = tx_evt.send(SerialEvent::Error(format!("open failed: {e}")));
                    let _ = tx_evt.send(SerialEvent::Closed);
                }
            }
        });

        Self { cfg, tx_cmd, rx_evt }
    }

    pub fn close(&self) {
        let _ = self.tx_cmd.send(Command::Close);
    }
}

impl LineSource for SerialService {
    fn read_line(&mut self, buf: &mut Vec<u8>) -> Result<bool> {
        loop {
            // A dropped sender means the reader thread is gone.
            let Ok(event) = self.rx_evt.recv() else {
                return Ok(false);
            };
            match event {
                SerialEvent::Line(line) => {
                    *buf = line;
                    return Ok(true);
                }
                SerialEvent::Opened(name) => {
                    info!("listening on {name} at {} baud", self.cfg.baud_rate)
                }
                SerialEvent::Error(e) => {
                    warn!("{}: {e}", self.cfg.port_name);
                    return Err(ReplayError::Serial(e));
                }
                SerialEvent::Closed => return Ok(false),
            }
        }
    }
}

impl Drop for SerialService {
    fn drop(&mut self) {
        self.close();
    }
}

/// Drain every complete line out of `pending`, leaving any partial tail.
fn split_lines(pending: &mut Vec<u8>) -> Vec<Vec<u8>> {
    let mut lines = Vec::new();
    while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
        lines.push(pending.drain(..=pos).collect());
    }
    lines
}
