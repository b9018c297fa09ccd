use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use emuchip::scheduler::{Mute, NullRenderer};
use emuchip::{Audio, Chip8Error, Config, Emulator, FrameBuffer, Renderer, Scheduler};

#[derive(Clone, Default)]
struct CountingRenderer {
    frames: Arc<AtomicUsize>,
}

impl Renderer for CountingRenderer {
    fn publish(&mut self, _frame: &FrameBuffer) {
        self.frames.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Clone, Default)]
struct RecordingAudio {
    levels: Arc<Mutex<Vec<bool>>>,
}

impl Audio for RecordingAudio {
    fn set_beeping(&mut self, on: bool) {
        self.levels.lock().unwrap().push(on);
    }
}

struct FailingRenderer {
    after: usize,
}

impl Renderer for FailingRenderer {
    fn publish(&mut self, _frame: &FrameBuffer) {
        if self.after == 0 {
            panic!("display went away");
        }
        self.after -= 1;
    }
}

fn boot(rom: &[u8], ips: u32) -> Emulator {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut emu = Emulator::new(Config::default().with_ips(ips).with_seed(3));
    emu.load_rom(rom).unwrap();
    emu
}

fn wait_until(timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    done()
}

// 200: V0 += 1, 202: JP 200
const COUNTER: [u8; 4] = [0x70, 0x01, 0x12, 0x00];

#[test]
fn publishes_frames_and_stops_cleanly() {
    let renderer = CountingRenderer::default();
    let mut scheduler = Scheduler::new(boot(&COUNTER, 1000), renderer.clone(), Mute);
    scheduler.run().unwrap();
    assert!(wait_until(Duration::from_secs(2), || {
        renderer.frames.load(Ordering::SeqCst) >= 20
    }));
    scheduler.stop();
    assert!(!scheduler.is_running());

    let frames = renderer.frames.load(Ordering::SeqCst);
    let machine = scheduler.machine();
    let (pc, v0) = {
        let emu = machine.lock().unwrap();
        (emu.pc.0, emu.regs.get(0))
    };
    thread::sleep(Duration::from_millis(100));
    let emu = machine.lock().unwrap();
    assert_eq!((emu.pc.0, emu.regs.get(0)), (pc, v0));
    assert_eq!(renderer.frames.load(Ordering::SeqCst), frames);
}

#[test]
fn stop_is_idempotent() {
    let mut scheduler = Scheduler::new(boot(&COUNTER, 500), NullRenderer, Mute);
    scheduler.run().unwrap();
    thread::sleep(Duration::from_millis(20));
    scheduler.stop();
    scheduler.stop();
    assert!(!scheduler.is_running());
}

#[test]
fn run_after_stop_resumes_without_reset() {
    let renderer = CountingRenderer::default();
    let mut scheduler = Scheduler::new(boot(&COUNTER, 1000), renderer.clone(), Mute);
    scheduler.run().unwrap();
    assert!(wait_until(Duration::from_secs(2), || {
        renderer.frames.load(Ordering::SeqCst) >= 5
    }));
    scheduler.stop();

    // a reset would wipe this register
    scheduler.machine().lock().unwrap().regs.set_register(0x5, 0x42);
    let before = renderer.frames.load(Ordering::SeqCst);

    scheduler.run().unwrap();
    assert!(wait_until(Duration::from_secs(2), || {
        renderer.frames.load(Ordering::SeqCst) >= before + 5
    }));
    scheduler.stop();
    assert_eq!(scheduler.machine().lock().unwrap().regs.get(0x5), 0x42);
}

#[test]
fn sound_level_reported_once_per_tick_while_running() {
    // V0 = 4, ST = V0, then spin
    let audio = RecordingAudio::default();
    let rom = [0x60, 0x04, 0xF0, 0x18, 0x12, 0x04];
    let mut scheduler = Scheduler::new(boot(&rom, 1000), NullRenderer, audio.clone());
    scheduler.run().unwrap();
    assert!(wait_until(Duration::from_secs(3), || {
        audio.levels.lock().unwrap().len() >= 12
    }));
    scheduler.stop();

    let levels = audio.levels.lock().unwrap();
    assert_eq!(levels.iter().filter(|&&on| on).count(), 4);
    // once the timer has run out it stays quiet
    assert!(levels.iter().skip_while(|&&on| !on).skip_while(|&&on| on).all(|&on| !on));
    assert!(!scheduler.machine().lock().unwrap().is_beeping());
}

#[test]
fn timers_keep_60hz_when_instructions_are_slow() {
    // V0 = FF, DT = V0; at 2 instructions per second the load lands within a second
    let rom = [0x60, 0xFF, 0xF0, 0x15, 0x12, 0x04];
    let mut scheduler = Scheduler::new(boot(&rom, 2), NullRenderer, Mute);
    let machine = scheduler.machine();
    scheduler.run().unwrap();
    assert!(wait_until(Duration::from_secs(3), || {
        machine.lock().unwrap().pc.0 == 0x204
    }));
    thread::sleep(Duration::from_millis(500));
    scheduler.stop();

    let delay = machine.lock().unwrap().timers().delay;
    // ~30 ticks in 500ms; the instruction clock only ran a couple of times
    assert!(delay < 0xFF - 10, "delay timer barely moved: {delay}");
}

#[test]
fn memory_fault_halts_both_clocks() {
    // I = FFF, draw 2 rows -> reads past the end of memory
    let audio = RecordingAudio::default();
    let rom = [0xAF, 0xFF, 0xD0, 0x02];
    let mut scheduler = Scheduler::new(boot(&rom, 1000), NullRenderer, audio.clone());
    scheduler.run().unwrap();
    assert!(wait_until(Duration::from_secs(2), || !scheduler.is_running()));
    assert_eq!(
        scheduler.fault(),
        Some(Chip8Error::OutOfBounds { offset: 0xFFF, len: 2 })
    );

    thread::sleep(Duration::from_millis(50));
    let ticks = audio.levels.lock().unwrap().len();
    thread::sleep(Duration::from_millis(100));
    assert_eq!(audio.levels.lock().unwrap().len(), ticks);
    assert_eq!(scheduler.machine().lock().unwrap().pc.0, 0x202);
    scheduler.stop();
}

#[test]
fn collaborator_panic_halts_both_clocks() {
    let audio = RecordingAudio::default();
    let mut scheduler = Scheduler::new(
        boot(&COUNTER, 1000),
        FailingRenderer { after: 10 },
        audio.clone(),
    );
    scheduler.run().unwrap();
    assert!(wait_until(Duration::from_secs(2), || !scheduler.is_running()));
    assert_eq!(scheduler.fault(), None);

    thread::sleep(Duration::from_millis(50));
    let ticks = audio.levels.lock().unwrap().len();
    thread::sleep(Duration::from_millis(150));
    assert_eq!(audio.levels.lock().unwrap().len(), ticks);

    // the panicked thread is reaped and the machine is still usable
    scheduler.stop();
    let machine = scheduler.machine();
    let v0 = machine.lock().unwrap_or_else(|e| e.into_inner()).regs.get(0);
    assert!(v0 >= 5);
}

#[test]
fn unknown_opcodes_keep_the_clock_going() {
    // 200: unknown, 202: V0 += 1, 204: JP 200
    let rom = [0xFF, 0xFF, 0x70, 0x01, 0x12, 0x00];
    let mut scheduler = Scheduler::new(boot(&rom, 1000), NullRenderer, Mute);
    let machine = scheduler.machine();
    scheduler.run().unwrap();
    assert!(wait_until(Duration::from_secs(2), || {
        machine.lock().unwrap().regs.get(0) >= 5
    }));
    scheduler.stop();
    assert_eq!(scheduler.fault(), None);
}

#[test]
fn machines_run_side_by_side() {
    let mut a = Scheduler::new(boot(&COUNTER, 1000), NullRenderer, Mute);
    let mut b = Scheduler::new(boot(&[0x61, 0x09, 0x12, 0x02], 1000), NullRenderer, Mute);
    a.run().unwrap();
    b.run().unwrap();
    thread::sleep(Duration::from_millis(50));
    a.stop();
    b.stop();
    assert_eq!(a.machine().lock().unwrap().regs.get(1), 0);
    assert_eq!(b.machine().lock().unwrap().regs.get(0), 0);
    assert_eq!(b.machine().lock().unwrap().regs.get(1), 9);
}
