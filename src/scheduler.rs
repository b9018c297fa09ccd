use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{error, info, warn};

use crate::display::FrameBuffer;
use crate::emulator::Emulator;
use crate::error::Chip8Error;
use crate::memory::TypeAddr;
use crate::timer::TIMER_HZ;

/// Receives the screen after every instruction tick.
pub trait Renderer: Send {
    fn publish(&mut self, frame: &FrameBuffer);
}

/// Receives the beep level once per timer tick.
pub trait Audio: Send {
    fn set_beeping(&mut self, on: bool);
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn publish(&mut self, frame: &FrameBuffer) {
        (**self).publish(frame)
    }
}

impl<A: Audio + ?Sized> Audio for Box<A> {
    fn set_beeping(&mut self, on: bool) {
        (**self).set_beeping(on)
    }
}

// for headless runs
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn publish(&mut self, _frame: &FrameBuffer) {}
}

pub struct Mute;

impl Audio for Mute {
    fn set_beeping(&mut self, _on: bool) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    Continue,
    Halt(Chip8Error),
}

/// Instruction clock body: one `step`, then publish the screen. Recoverable
/// errors are logged and execution goes on; memory faults halt.
///
/// A stack error leaves the PC on the failing instruction, so it comes back
/// every tick. Only the first of a run of identical errors is logged.
#[derive(Debug, Default)]
pub struct InstructionClock {
    repeating: Option<(TypeAddr, Chip8Error)>,
    suppressed: usize,
}

impl InstructionClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick<R: Renderer + ?Sized>(&mut self, emu: &mut Emulator, renderer: &mut R) -> Tick {
        let at = emu.pc.0;
        let result = emu.step();
        renderer.publish(emu.frame_buffer());

        match result {
            Ok(()) => {
                self.end_repeat();
                Tick::Continue
            }
            Err(err) if err.is_fatal() => {
                self.end_repeat();
                error!("Halting at {:03x}: {}", at, err);
                Tick::Halt(err)
            }
            Err(err) => {
                self.report(at, err);
                Tick::Continue
            }
        }
    }

    /// Repeats of the current error that were not logged.
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }

    fn report(&mut self, at: TypeAddr, err: Chip8Error) {
        if matches!(&self.repeating, Some((addr, last)) if *addr == at && *last == err) {
            self.suppressed += 1;
            return;
        }
        self.end_repeat();
        warn!("{:03x}: {}", at, err);
        self.repeating = Some((at, err));
    }

    fn end_repeat(&mut self) {
        if let Some((at, err)) = self.repeating.take() {
            if self.suppressed > 0 {
                warn!("{:03x}: {} (repeated {} more times)", at, err, self.suppressed);
            }
        }
        self.suppressed = 0;
    }
}

/// Timer clock body: one decrement of both timers and one beep level sample.
pub fn timer_tick<A: Audio + ?Sized>(emu: &mut Emulator, audio: &mut A) {
    let beeping = emu.tick_timers();
    audio.set_beeping(beeping);
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drives a machine with two independent clocks on their own threads: the
/// instruction clock at the configured rate and the timer clock at 60 Hz.
/// Both take the machine lock for a whole tick, so their effects never
/// interleave.
pub struct Scheduler<R: Renderer + 'static, A: Audio + 'static> {
    machine: Arc<Mutex<Emulator>>,
    renderer: Arc<Mutex<R>>,
    audio: Arc<Mutex<A>>,
    running: Arc<AtomicBool>,
    fault: Arc<Mutex<Option<Chip8Error>>>,
    workers: Vec<JoinHandle<()>>,
    instruction_period: Duration,
}

impl<R: Renderer + 'static, A: Audio + 'static> Scheduler<R, A> {
    pub fn new(emu: Emulator, renderer: R, audio: A) -> Self {
        let ips = emu.config().instructions_per_second.max(1);

        Self {
            machine: Arc::new(Mutex::new(emu)),
            renderer: Arc::new(Mutex::new(renderer)),
            audio: Arc::new(Mutex::new(audio)),
            running: Arc::new(AtomicBool::new(false)),
            fault: Arc::new(Mutex::new(None)),
            workers: Vec::new(),
            instruction_period: Duration::from_secs_f64(1.0 / ips as f64),
        }
    }

    /// Shared handle to the machine, for keypad input and inspection.
    pub fn machine(&self) -> Arc<Mutex<Emulator>> {
        Arc::clone(&self.machine)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// The memory fault that halted the clocks, if any.
    pub fn fault(&self) -> Option<Chip8Error> {
        lock(&self.fault).clone()
    }

    /// Start both clocks. Resumes from whatever state the machine is in; a
    /// no-op while already running.
    pub fn run(&mut self) -> io::Result<()> {
        if self.is_running() {
            return Ok(());
        }
        // clocks that wound down on their own after a fault
        self.join_workers();
        *lock(&self.fault) = None;
        self.running.store(true, Ordering::SeqCst);

        let instructions = {
            let machine = Arc::clone(&self.machine);
            let renderer = Arc::clone(&self.renderer);
            let fault = Arc::clone(&self.fault);
            let mut clock = InstructionClock::new();
            spawn_clock(
                "chip8-cpu",
                self.instruction_period,
                Arc::clone(&self.running),
                move || {
                    let mut emu = lock(&machine);
                    match clock.tick(&mut *emu, &mut *lock(&renderer)) {
                        Tick::Continue => true,
                        Tick::Halt(err) => {
                            *lock(&fault) = Some(err);
                            false
                        }
                    }
                },
            )
        };
        self.track(instructions)?;

        let timers = {
            let machine = Arc::clone(&self.machine);
            let audio = Arc::clone(&self.audio);
            spawn_clock(
                "chip8-timers",
                Duration::from_secs_f64(1.0 / TIMER_HZ as f64),
                Arc::clone(&self.running),
                move || {
                    timer_tick(&mut *lock(&machine), &mut *lock(&audio));
                    true
                },
            )
        };
        self.track(timers)?;

        info!(
            "Started [ips: {}] [timer hz: {}]",
            (1.0 / self.instruction_period.as_secs_f64()).round(),
            TIMER_HZ
        );
        Ok(())
    }

    /// Halt both clocks and wait for them. The machine keeps the state of the
    /// last completed tick. Safe to call any number of times.
    pub fn stop(&mut self) {
        let was_running = self.running.swap(false, Ordering::SeqCst);
        self.join_workers();
        if was_running {
            info!("Stopped");
        }
    }

    fn track(&mut self, spawned: io::Result<JoinHandle<()>>) -> io::Result<()> {
        match spawned {
            Ok(handle) => {
                self.workers.push(handle);
                Ok(())
            }
            Err(err) => {
                self.stop();
                Err(err)
            }
        }
    }

    fn join_workers(&mut self) {
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                error!("Clock thread panicked");
            }
        }
    }
}

impl<R: Renderer + 'static, A: Audio + 'static> Drop for Scheduler<R, A> {
    fn drop(&mut self) {
        self.stop();
    }
}

// Clears the shared run flag when a clock thread exits, including by panic,
// so the other clock winds down too.
struct HaltOnExit(Arc<AtomicBool>);

impl Drop for HaltOnExit {
    fn drop(&mut self) {
        if thread::panicking() {
            error!("{} panicked, halting", thread::current().name().unwrap_or("clock"));
        }
        self.0.store(false, Ordering::SeqCst);
    }
}

// Runs `tick` every `period` until `running` goes false or `tick` asks to
// stop. Sleeps to a deadline so time spent inside the tick is not added on.
fn spawn_clock<F>(
    name: &str,
    period: Duration,
    running: Arc<AtomicBool>,
    mut tick: F,
) -> io::Result<JoinHandle<()>>
where
    F: FnMut() -> bool + Send + 'static,
{
    thread::Builder::new().name(name.to_string()).spawn(move || {
        let _halt = HaltOnExit(Arc::clone(&running));
        let mut deadline = Instant::now();
        while running.load(Ordering::SeqCst) {
            if !tick() {
                break;
            }
            deadline += period;
            let now = Instant::now();
            match deadline.checked_duration_since(now) {
                Some(delay) => thread::sleep(delay),
                // fell behind, don't burst to catch up
                None => deadline = now,
            }
        }
    })
}
