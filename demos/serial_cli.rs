//! Opens a real serial port and issues a single "boot info" command to one
//! peer. This is illustrative glue for the external collaborator boundary
//! (the command-line tool proper is out of scope for this crate) — no
//! argument-parsing framework is pulled in, just enough `main` to show the
//! stack wired end to end against real hardware.

use std::env;

use log::LevelFilter;
use trainlink::bus::Bus;
use trainlink::message_bus::MessageBus;
use trainlink::{Device, SerialConfig, SerialTransport};

const BOOT_INFO: u16 = 0x0041;

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .init();

    let device_path = env::args().nth(1).unwrap_or_else(|| "/dev/ttyUSB0".to_string());
    let source_id: u8 = 14;
    let peer_id: u8 = 0;

    let config = SerialConfig::new(device_path);
    let transport = SerialTransport::open(&config).expect("could not open serial port");
    let bus = Bus::new(transport, Some(source_id));
    let mut message_bus = MessageBus::new(bus, Some(source_id));
    let mut device = Device::new(&mut message_bus, Some(peer_id));

    let response = device
        .send_command(BOOT_INFO, &[])
        .expect("boot-info command failed");
    println!("boot-info response: {}", hex(&response));
}

fn hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect::<Vec<_>>().join(" ")
}
