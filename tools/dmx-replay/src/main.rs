use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use ledwash_dmx::{DmxReceiver, DmxUart};

/// dmx-replay – run a captured DMX byte stream through the ledwash receive core.
///
/// Capture format: whitespace-separated tokens; `BREAK` marks a break event,
/// everything else is a hex byte (`00`, `ff`, ...). `#` starts a comment that
/// runs to the end of the line.
#[derive(Parser, Debug)]
#[command(name = "dmx-replay", version)]
struct Cli {
    /// Capture file to replay.
    capture: PathBuf,
    /// Base channel to decode at (1..=506).
    #[arg(long, default_value_t = 1)]
    channel: u16,
    /// Print dimmer-scaled values next to the raw slots.
    #[arg(long, default_value_t = false)]
    scaled: bool,
}

struct IdleUart;

impl DmxUart for IdleUart {
    fn arm_byte_receive(&mut self) {}
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let text = fs::read_to_string(&cli.capture)
        .with_context(|| format!("reading {}", cli.capture.display()))?;

    let rx = DmxReceiver::new();
    let mut uart = IdleUart;
    rx.init(cli.channel, &mut uart)
        .map_err(|err| anyhow::anyhow!("base channel rejected: {err:?}"))?;

    let mut frame_no = 0u32;
    for (line_no, line) in text.lines().enumerate() {
        for token in line.split_whitespace() {
            if token.starts_with('#') {
                break;
            }
            if token.eq_ignore_ascii_case("break") {
                rx.on_break(&mut uart);
            } else {
                let byte = u8::from_str_radix(token, 16)
                    .with_context(|| format!("bad token {token:?} on line {}", line_no + 1))?;
                rx.on_byte(byte, &mut uart);
            }
            if rx.take_frame_ready() {
                frame_no += 1;
                match rx.decode() {
                    Ok(data) if cli.scaled => {
                        println!("frame {frame_no}: {data:?} -> {:?}", data.apply_dimmer())
                    }
                    Ok(data) => println!("frame {frame_no}: {data:?}"),
                    Err(err) => println!("frame {frame_no}: rejected ({err:?})"),
                }
            }
        }
    }

    let stats = rx.stats();
    println!(
        "frames decoded {} rejected {}",
        stats.frames_decoded, stats.frames_rejected
    );
    if frame_no == 0 {
        bail!("capture contained no complete frame");
    }
    Ok(())
}
