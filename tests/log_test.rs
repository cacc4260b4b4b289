mod common;

use std::net::Ipv4Addr;

use common::{MockDevice, frame};
use log::LevelFilter;
use rustrial_netstack::logger::KernelLogger;
use rustrial_netstack::net::ethernet::ETHERTYPE_ARP;
use rustrial_netstack::{IpConfig, NetworkStack, StackSettings};

static LOGGER: KernelLogger<String> = KernelLogger::new(String::new(), LevelFilter::Debug);

fn install() {
    // Every test in this binary shares the one logger
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(LevelFilter::Debug);
}

fn logged() -> String {
    LOGGER.with_output(|out| out.clone())
}

#[test]
fn log_config_lists_devices_and_addresses() {
    install();
    let stack = NetworkStack::new(StackSettings::default()).unwrap();
    let eth0 = MockDevice::new("eth0");
    let config = IpConfig::new(
        Ipv4Addr::new(10, 0, 0, 5),
        Ipv4Addr::new(255, 255, 255, 0),
        Some(Ipv4Addr::new(10, 0, 0, 1)),
    );
    stack.config_ip(eth0.into(), config).unwrap();

    stack.log_config();

    let out = logged();
    assert!(out.contains("net::stack: eth0: MAC 52:54:00:12:34:56 link Up"));
    assert!(out.contains("  inet 10.0.0.5/24 gw 10.0.0.1"));
}

#[test]
fn unconfigured_stack_says_so() {
    install();
    NetworkStack::new(StackSettings::default()).unwrap().log_config();

    assert!(logged().contains("Network: Not configured"));
}

#[test]
fn received_frames_are_logged_with_their_source() {
    install();
    let stack = NetworkStack::new(StackSettings::default()).unwrap();

    stack.handle_packet(Some(frame(ETHERTYPE_ARP).as_slice())).unwrap();

    assert!(logged().contains("RX: 60 bytes from CA:FE:BA:BE:00:02, type 0x0806 (broadcast)"));
}
