use anyhow::{Result, anyhow};
use minifb::{Key, ScaleMode, Window, WindowOptions};

use crate::{pipeline::rgba_converter, types::Frame};

pub const WINDOW_TITLE: &str = "Gesture Mouse";
pub const QUIT_KEY: Key = Key::Q;

/// Where annotated frames go, and where the quit signal comes from.
pub trait FrameDisplay {
    fn present(&mut self, frame: &Frame) -> Result<()>;

    /// Polled once per cycle after `present`.
    fn quit_requested(&self) -> bool;

    fn close(&mut self);
}

pub struct Overlay {
    window: Option<Window>,
    buffer: Vec<u32>,
}

impl Overlay {
    pub fn open(width: u32, height: u32) -> Result<Self> {
        let options = WindowOptions {
            resize: true,
            scale_mode: ScaleMode::AspectRatioStretch,
            ..WindowOptions::default()
        };
        let window = Window::new(WINDOW_TITLE, width as usize, height as usize, options)
            .map_err(|err| anyhow!("failed to open preview window: {err}"))?;
        Ok(Self {
            window: Some(window),
            buffer: Vec::new(),
        })
    }
}

impl FrameDisplay for Overlay {
    fn present(&mut self, frame: &Frame) -> Result<()> {
        let window = self
            .window
            .as_mut()
            .ok_or_else(|| anyhow!("preview window already closed"))?;
        rgba_converter::rgba_to_0rgb(&frame.rgba, &mut self.buffer);
        window
            .update_with_buffer(&self.buffer, frame.width as usize, frame.height as usize)
            .map_err(|err| anyhow!("failed to update preview window: {err}"))
    }

    fn quit_requested(&self) -> bool {
        match &self.window {
            Some(window) => !window.is_open() || window.is_key_down(QUIT_KEY),
            None => true,
        }
    }

    fn close(&mut self) {
        if self.window.take().is_some() {
            log::info!("preview window closed");
        }
    }
}

impl Drop for Overlay {
    fn drop(&mut self) {
        self.close();
    }
}
