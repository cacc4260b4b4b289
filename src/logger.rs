//! `log` backend
//!
//! `KernelLogger` formats records as `[LEVEL] target: message` lines into any
//! `core::fmt::Write` sink. On bare metal `init_serial` installs one over COM1.

use core::fmt::Write;
use log::{LevelFilter, Log, Metadata, Record};
use spin::Mutex;

pub struct KernelLogger<W> {
    out: Mutex<W>,
    level: LevelFilter,
}

impl<W: Write + Send> KernelLogger<W> {
    pub const fn new(out: W, level: LevelFilter) -> Self {
        Self {
            out: Mutex::new(out),
            level,
        }
    }

    /// Inspect the sink, e.g. to read back what was logged
    pub fn with_output<R>(&self, f: impl FnOnce(&W) -> R) -> R {
        f(&self.out.lock())
    }
}

impl<W: Write + Send> Log for KernelLogger<W> {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut out = self.out.lock();
        // A failing sink has nowhere to report to
        let _ = writeln!(
            out,
            "[{:<5}] {}: {}",
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {}
}

#[cfg(all(target_arch = "x86_64", target_os = "none"))]
pub use serial::init_serial;

#[cfg(all(target_arch = "x86_64", target_os = "none"))]
mod serial {
    use super::KernelLogger;
    use core::fmt;
    use lazy_static::lazy_static;
    use log::{LevelFilter, SetLoggerError};
    use uart_16550::SerialPort;

    /// COM1 with interrupts masked around every write
    pub struct Com1(SerialPort);

    impl fmt::Write for Com1 {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            x86_64::instructions::interrupts::without_interrupts(|| self.0.write_str(s))
        }
    }

    lazy_static! {
        static ref SERIAL_LOGGER: KernelLogger<Com1> = {
            let mut port = unsafe { SerialPort::new(0x3F8) };
            port.init();
            KernelLogger::new(Com1(port), LevelFilter::Trace)
        };
    }

    /// Route `log` records to the first serial port
    pub fn init_serial(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_logger(&*SERIAL_LOGGER)?;
        log::set_max_level(level);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use log::Level;

    fn emit(logger: &KernelLogger<String>, level: Level, message: &str) {
        logger.log(
            &Record::builder()
                .args(format_args!("{}", message))
                .level(level)
                .target("rustrial_netstack::net::dispatch")
                .build(),
        );
    }

    #[test]
    fn formats_level_target_and_message() {
        let logger = KernelLogger::new(String::new(), LevelFilter::Debug);
        emit(&logger, Level::Warn, "RX: packet data null");

        logger.with_output(|out| {
            assert_eq!(
                out.as_str(),
                "[WARN ] rustrial_netstack::net::dispatch: RX: packet data null\n"
            );
        });
    }

    #[test]
    fn records_above_level_are_skipped() {
        let logger = KernelLogger::new(String::new(), LevelFilter::Info);
        emit(&logger, Level::Debug, "RX: 60 bytes from CA:FE:BA:BE:00:02, type 0x0806");
        emit(&logger, Level::Info, "NET: lo configured 127.0.0.1/8 gw none");

        logger.with_output(|out| {
            assert_eq!(out.lines().count(), 1);
            assert!(out.contains("127.0.0.1/8"));
        });
    }
}
