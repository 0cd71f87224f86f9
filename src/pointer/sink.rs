use anyhow::{Result, anyhow};
use enigo::{Button, Coordinate, Direction, Enigo, Mouse, Settings};

use super::PointerCommand;

/// Receiver of absolute cursor moves and primary-button clicks.
pub trait PointerSink {
    fn move_to(&mut self, x: f64, y: f64) -> Result<()>;
    fn click(&mut self) -> Result<()>;

    fn apply(&mut self, command: PointerCommand) -> Result<()> {
        match command {
            PointerCommand::MoveTo { x, y } => self.move_to(x, y),
            PointerCommand::Click => self.click(),
        }
    }
}

pub struct EnigoSink {
    enigo: Enigo,
}

impl EnigoSink {
    pub fn new() -> Result<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|err| anyhow!("failed to connect to the input system: {err:?}"))?;
        Ok(Self { enigo })
    }

    /// Size of the primary display in pixels.
    pub fn screen_size(&self) -> Result<(f64, f64)> {
        let (w, h) = self
            .enigo
            .main_display()
            .map_err(|err| anyhow!("failed to query display size: {err:?}"))?;
        Ok((w as f64, h as f64))
    }
}

impl PointerSink for EnigoSink {
    fn move_to(&mut self, x: f64, y: f64) -> Result<()> {
        self.enigo
            .move_mouse(x as i32, y as i32, Coordinate::Abs)
            .map_err(|err| anyhow!("cursor move to ({x:.1}, {y:.1}) failed: {err:?}"))
    }

    fn click(&mut self) -> Result<()> {
        self.enigo
            .button(Button::Left, Direction::Click)
            .map_err(|err| anyhow!("left click failed: {err:?}"))
    }
}
