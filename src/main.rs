// Separately:
// CPU: 700 times per second (configurable)
// Timer: 60 times per second
// Display: ~60 times per second, on the main thread

use std::path::PathBuf;
use std::sync::PoisonError;

use anyhow::Context;
use clap::Parser;
use emuchip::config::DEFAULT_INSTRUCTIONS_PER_SECOND;
use emuchip::display::{HEIGHT, WIDTH};
use emuchip::scheduler::Mute;
use emuchip::{Audio, Config, Emulator, Quirks, Scheduler};
use log::{error, warn};
use minifb::Key;

use frontend::beeper::Beeper;
use frontend::window::{self, SharedFrame};

mod frontend;

#[derive(Parser, Debug)]
#[command(version, about = "CHIP-8 interpreter", long_about = None)]
struct Args {
    /// Path to the ROM file to run
    rom: PathBuf,

    #[arg(short, long, default_value_t = DEFAULT_INSTRUCTIONS_PER_SECOND, help = "Instructions per second")]
    ips: u32,

    #[arg(short, long, default_value_t = 16, help = "Window scale: 1, 2, 4, 8, 16 or 32")]
    scale: u8,

    #[arg(long, help = "8XY6/8XYE shift VY into VX (COSMAC VIP)")]
    shift_quirk: bool,

    #[arg(long, help = "FX55/FX65 advance I (COSMAC VIP)")]
    load_store_quirk: bool,

    #[arg(long, help = "Seed for the CXNN random number generator")]
    seed: Option<u64>,

    #[arg(long, help = "Disable sound")]
    mute: bool,
}

impl Args {
    fn config(&self) -> Config {
        let mut config = Config::default().with_ips(self.ips).with_quirks(Quirks {
            shift_uses_vy: self.shift_quirk,
            load_store_increments_index: self.load_store_quirk,
        });
        config.rng_seed = self.seed;
        config
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let rom = std::fs::read(&args.rom)
        .with_context(|| format!("reading ROM {}", args.rom.display()))?;
    let mut emu = Emulator::new(args.config());
    emu.load_rom(&rom)?;

    let mut window = window::open(args.scale)?;
    let frame = SharedFrame::new();
    let audio: Box<dyn Audio> = if args.mute {
        Box::new(Mute)
    } else {
        match Beeper::new() {
            Ok(beeper) => Box::new(beeper),
            Err(err) => {
                warn!("Running without sound: {err:#}");
                Box::new(Mute)
            }
        }
    };

    let mut scheduler = Scheduler::new(emu, frame.clone(), audio);
    let machine = scheduler.machine();
    scheduler.run().context("starting clocks")?;

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let keys = frontend::keypad::read_keys(&window);
        machine
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set_keys(keys);
        window.update_with_buffer(&frame.pixels(), WIDTH, HEIGHT)?;
    }

    scheduler.stop();
    if let Some(fault) = scheduler.fault() {
        error!("Machine halted: {fault}");
    }
    Ok(())
}
