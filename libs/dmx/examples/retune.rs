use ledwash_dmx::{DmxReceiver, DmxUart, FRAME_LEN};

struct IdleUart;

impl DmxUart for IdleUart {
    fn arm_byte_receive(&mut self) {}
}

fn main() {
    let rx = DmxReceiver::new();
    let mut uart = IdleUart;
    rx.init(1, &mut uart).unwrap();

    // Two fixtures worth of slots on one wire image.
    let mut wire = [0u8; FRAME_LEN];
    wire[1..6].copy_from_slice(&[255, 0, 0, 255, 0]);
    wire[6..11].copy_from_slice(&[0, 0, 255, 64, 12]);

    rx.on_break(&mut uart);
    for &byte in wire.iter() {
        rx.on_byte(byte, &mut uart);
    }
    assert!(rx.take_frame_ready());

    // Retuning takes effect on the next decode; the buffered frame is reread.
    for base in [1u16, 6] {
        rx.set_base_channel(base).unwrap();
        println!("base {:3}: {:?}", base, rx.decode().unwrap());
    }
}
