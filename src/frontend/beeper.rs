use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{anyhow, Context};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use emuchip::Audio;
use log::{error, info};

const TONE_HZ: f32 = 440.0;

/// 440 Hz tone gated by the sound timer level.
///
/// cpal streams can't move between threads, so the stream lives on its own
/// thread for the life of the beeper and the timer clock only flips a flag.
pub struct Beeper {
    beeping: Arc<AtomicBool>,
    alive: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl Beeper {
    pub fn new() -> anyhow::Result<Self> {
        let beeping = Arc::new(AtomicBool::new(false));
        let alive = Arc::new(AtomicBool::new(true));
        let (ready_tx, ready_rx) = mpsc::channel();

        let worker = {
            let beeping = Arc::clone(&beeping);
            let alive = Arc::clone(&alive);
            thread::Builder::new()
                .name("beeper".to_string())
                .spawn(move || match open_stream(beeping) {
                    Ok(stream) => {
                        let _ = ready_tx.send(Ok(()));
                        while alive.load(Ordering::SeqCst) {
                            thread::sleep(Duration::from_millis(50));
                        }
                        drop(stream);
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                    }
                })
                .context("spawning audio thread")?
        };

        ready_rx
            .recv()
            .map_err(|_| anyhow!("audio thread exited early"))??;
        info!("Audio ready");

        Ok(Self {
            beeping,
            alive,
            worker: Some(worker),
        })
    }
}

impl Audio for Beeper {
    fn set_beeping(&mut self, on: bool) {
        self.beeping.store(on, Ordering::Relaxed);
    }
}

impl Drop for Beeper {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Audio thread panicked");
            }
        }
    }
}

fn open_stream(beeping: Arc<AtomicBool>) -> anyhow::Result<cpal::Stream> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow!("no output device available"))?;
    let supported_config = device
        .default_output_config()
        .context("querying output config")?;
    let sample_format = supported_config.sample_format();
    let config: cpal::StreamConfig = supported_config.into();

    match sample_format {
        cpal::SampleFormat::I8 => run::<i8>(&device, &config, beeping),
        cpal::SampleFormat::I16 => run::<i16>(&device, &config, beeping),
        cpal::SampleFormat::I32 => run::<i32>(&device, &config, beeping),
        cpal::SampleFormat::I64 => run::<i64>(&device, &config, beeping),
        cpal::SampleFormat::U8 => run::<u8>(&device, &config, beeping),
        cpal::SampleFormat::U16 => run::<u16>(&device, &config, beeping),
        cpal::SampleFormat::U32 => run::<u32>(&device, &config, beeping),
        cpal::SampleFormat::U64 => run::<u64>(&device, &config, beeping),
        cpal::SampleFormat::F32 => run::<f32>(&device, &config, beeping),
        cpal::SampleFormat::F64 => run::<f64>(&device, &config, beeping),
        sample_format => Err(anyhow!("Unsupported sample format '{sample_format}'")),
    }
}

fn run<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    beeping: Arc<AtomicBool>,
) -> anyhow::Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let sample_rate = config.sample_rate.0 as f32;
    let channels = config.channels as usize;

    // Produce a sinusoid of maximum amplitude, silence while not beeping.
    let mut sample_clock = 0f32;
    let mut next_value = move || {
        sample_clock = (sample_clock + 1.0) % sample_rate;
        if beeping.load(Ordering::Relaxed) {
            (sample_clock * TONE_HZ * 2.0 * std::f32::consts::PI / sample_rate).sin()
        } else {
            0.0
        }
    };

    let err_fn = |err| error!("an error occurred on stream: {}", err);

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                write_data(data, channels, &mut next_value)
            },
            err_fn,
            None,
        )
        .context("building output stream")?;

    stream.play().context("starting output stream")?;
    Ok(stream)
}

fn write_data<T>(output: &mut [T], channels: usize, next_sample: &mut dyn FnMut() -> f32)
where
    T: Sample + FromSample<f32>,
{
    for frame in output.chunks_mut(channels) {
        let value: T = T::from_sample(next_sample());
        for sample in frame.iter_mut() {
            *sample = value;
        }
    }
}
