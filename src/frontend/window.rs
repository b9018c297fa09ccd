use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{bail, Context};
use emuchip::display::{HEIGHT, WIDTH};
use emuchip::{FrameBuffer, Renderer};
use minifb::{Scale, Window, WindowOptions};

const OFF: u32 = 0x000000;
const ON: u32 = from_u16_rgb(0, 127, 255);

const fn from_u16_rgb(r: u16, g: u16, b: u16) -> u32 {
    let (r, g, b) = (r as u32, g as u32, b as u32);
    (r << 16) | (g << 8) | b
}

pub fn open(scale: u8) -> anyhow::Result<Window> {
    let scale = match scale {
        1 => Scale::X1,
        2 => Scale::X2,
        4 => Scale::X4,
        8 => Scale::X8,
        16 => Scale::X16,
        32 => Scale::X32,
        other => bail!("unsupported scale {other}, pick one of 1, 2, 4, 8, 16, 32"),
    };

    let mut window = Window::new(
        "emuchip - ESC to exit",
        WIDTH,
        HEIGHT,
        WindowOptions {
            scale,
            ..WindowOptions::default()
        },
    )
    .context("opening window")?;
    // Limit to max ~60 fps update rate
    window.limit_update_rate(Some(std::time::Duration::from_micros(16600)));
    Ok(window)
}

/// Colour buffer shared between the instruction clock, which fills it, and
/// the window loop on the main thread, which shows it.
#[derive(Clone)]
pub struct SharedFrame {
    pixel_buffer: Arc<Mutex<Vec<u32>>>,
}

impl SharedFrame {
    pub fn new() -> Self {
        Self {
            pixel_buffer: Arc::new(Mutex::new(vec![OFF; WIDTH * HEIGHT])),
        }
    }

    pub fn pixels(&self) -> Vec<u32> {
        self.pixel_buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Renderer for SharedFrame {
    fn publish(&mut self, frame: &FrameBuffer) {
        let mut pixels = self
            .pixel_buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for (pixel, &bit) in pixels.iter_mut().zip(frame.cells()) {
            *pixel = if bit == 1 { ON } else { OFF };
        }
    }
}
