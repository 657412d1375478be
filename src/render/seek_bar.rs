//! Waveform seek bar widget
//!
//! Paints a [`WaveformFrame`] into an egui rect and turns clicks and drags
//! into seek fractions.

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Vec2};

use super::waveform::{DrawCommand, Fill, WaveformFrame};

/// Colors for the seek bar
#[derive(Clone)]
pub struct SeekBarStyle {
    pub background: Color32,
    pub waveform: Color32,
    pub elapsed: Color32,
    pub cursor: Color32,
    pub placeholder: Color32,
}

impl Default for SeekBarStyle {
    fn default() -> Self {
        Self {
            background: Color32::from_gray(10),
            waveform: Color32::from_rgb(14, 165, 233),
            elapsed: Color32::from_rgba_unmultiplied(255, 255, 255, 26),
            cursor: Color32::from_rgb(0, 243, 255),
            placeholder: Color32::from_gray(90),
        }
    }
}

pub struct SeekBar {
    pub style: SeekBarStyle,
}

impl Default for SeekBar {
    fn default() -> Self {
        Self::new()
    }
}

impl SeekBar {
    pub fn new() -> Self {
        Self {
            style: SeekBarStyle::default(),
        }
    }

    /// Draw the frame; returns the clicked/dragged fraction (0.0 - 1.0)
    pub fn show(&self, ui: &mut egui::Ui, frame: &WaveformFrame, size: Vec2) -> Option<f32> {
        let (response, painter) = ui.allocate_painter(size, egui::Sense::click_and_drag());
        let rect = response.rect;

        painter.rect_filled(rect, 4.0, self.style.background);

        let scale = Vec2::new(
            rect.width() / frame.columns.max(1) as f32,
            rect.height() / frame.height,
        );

        for command in &frame.commands {
            match *command {
                DrawCommand::Rect {
                    x,
                    y,
                    width,
                    height,
                    fill,
                } => {
                    let min = rect.min + Vec2::new(x * scale.x, y * scale.y);
                    // Keep hairlines visible when the canvas is squeezed
                    let size = Vec2::new((width * scale.x).max(1.0), height * scale.y);
                    let color = match fill {
                        Fill::Waveform => self.style.waveform,
                        Fill::Elapsed => self.style.elapsed,
                        Fill::Cursor => self.style.cursor,
                    };
                    painter.rect_filled(Rect::from_min_size(min, size), 0.0, color);
                }
                DrawCommand::Placeholder(text) => {
                    painter.text(
                        rect.center(),
                        Align2::CENTER_CENTER,
                        text,
                        FontId::proportional(13.0),
                        self.style.placeholder,
                    );
                }
            }
        }

        if frame.peaks.is_empty() {
            return None;
        }

        if response.dragged() || response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                return Some(seek_fraction(rect, pos));
            }
        }
        None
    }
}

fn seek_fraction(rect: Rect, pos: Pos2) -> f32 {
    ((pos.x - rect.left()) / rect.width().max(1.0)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seek_fraction_clamps() {
        let rect = Rect::from_min_size(Pos2::new(10.0, 0.0), Vec2::new(100.0, 40.0));
        assert_eq!(seek_fraction(rect, Pos2::new(60.0, 5.0)), 0.5);
        assert_eq!(seek_fraction(rect, Pos2::new(0.0, 5.0)), 0.0);
        assert_eq!(seek_fraction(rect, Pos2::new(500.0, 5.0)), 1.0);
    }
}
