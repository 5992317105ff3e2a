use ledwash_dmx::{DmxReceiver, DmxUart, FRAME_LEN};

struct IdleUart;

impl DmxUart for IdleUart {
    fn arm_byte_receive(&mut self) {}
}

fn main() {
    let rx = DmxReceiver::new();
    let mut uart = IdleUart;
    rx.init(10, &mut uart).unwrap();

    // Start code 0, fixture slots on channels 10..14.
    let mut wire = [0u8; FRAME_LEN];
    wire[10..15].copy_from_slice(&[200, 150, 100, 128, 7]);

    rx.on_break(&mut uart);
    for &byte in wire.iter() {
        rx.on_byte(byte, &mut uart);
    }

    assert!(rx.take_frame_ready());
    let raw = rx.decode().unwrap();
    println!("raw    {:?}", raw);
    println!("dimmed {:?}", raw.apply_dimmer());
    println!("stats  {:?}", rx.stats());
}
