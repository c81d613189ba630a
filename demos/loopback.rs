//! Two in-process peers talking over an mpsc-backed loopback transport: a
//! host issuing a boot-info request, and a device answering it with a
//! single-fragment reply.

use std::sync::mpsc::{channel, Receiver, Sender};

use trainlink::bus::Bus;
use trainlink::error::TransportError;
use trainlink::message::Message;
use trainlink::message_bus::MessageBus;
use trainlink::transport::Transport;

struct ChannelTransport {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
}

impl Transport for ChannelTransport {
    fn read(&mut self) -> Result<Vec<u8>, TransportError> {
        Ok(self.rx.try_iter().flatten().collect())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let _ = self.tx.send(data.to_vec());
        Ok(())
    }
}

fn main() {
    env_logger::init();

    let (host_tx, device_rx) = channel();
    let (device_tx, host_rx) = channel();

    let device = std::thread::spawn(move || {
        let transport = ChannelTransport {
            tx: device_tx,
            rx: device_rx,
        };
        let mut bus = Bus::new(transport, Some(0));
        loop {
            let request = match bus.recv_message(Some(0xf), |_| true) {
                Ok(Some(data)) => data,
                Ok(None) => continue,
                Err(_) => break,
            };
            let Ok(message) = Message::unpack(&request) else {
                continue;
            };
            if message.command != 0x0041 {
                continue;
            }
            let reply = Message {
                src: Some(0),
                dest: message.src,
                command: message.command,
                payload: b"FA101130".to_vec(),
            };
            let _ = bus.send_message(message.src, &reply.pack().unwrap());
            break;
        }
    });

    let transport = ChannelTransport {
        tx: host_tx,
        rx: host_rx,
    };
    let bus = Bus::new(transport, Some(0xf));
    let mut message_bus = MessageBus::new(bus, Some(0xf));
    let response = message_bus.send_command(Some(0), 0x0041, &[]).unwrap();
    println!("boot-info payload: {}", hex(&response));

    device.join().unwrap();
}

fn hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect::<Vec<_>>().join(" ")
}
