//! Waveform overview geometry
//!
//! Reduces a sample buffer to one min/max peak per display column and turns
//! that into plain rectangles in a `columns × height` unit space, plus the
//! elapsed-playback overlay. No painting happens here; the same inputs
//! always give the same geometry, and the seek bar widget maps it onto the
//! screen.

use crate::audio::SampleBuffer;

/// Columns of the overview canvas
pub const DEFAULT_COLUMNS: usize = 600;

/// Height of the overview canvas in units
pub const DEFAULT_HEIGHT: f32 = 64.0;

/// Width of the playback cursor in units
pub const CURSOR_WIDTH: f32 = 2.0;

pub const PLACEHOLDER_TEXT: &str = "No Audio Generated";

/// Amplitude extremes of one column
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak {
    pub min: f32,
    pub max: f32,
}

impl Peak {
    pub const SILENT: Peak = Peak { min: 0.0, max: 0.0 };
}

/// What a rectangle represents, so the painter can pick a color
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fill {
    Waveform,
    /// Semi-transparent shade over the played part
    Elapsed,
    Cursor,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Fill,
    },
    /// Nothing to draw yet; show this text instead
    Placeholder(&'static str),
}

/// Geometry for one overview frame
#[derive(Clone, Debug, PartialEq)]
pub struct WaveformFrame {
    pub columns: usize,
    pub height: f32,
    pub peaks: Vec<Peak>,
    pub commands: Vec<DrawCommand>,
}

/// Min/max per column over `ceil(len / columns)`-sample buckets
///
/// Columns past the end of the data are reported as silence.
pub fn peaks(samples: &[f32], columns: usize) -> Vec<Peak> {
    if columns == 0 {
        return Vec::new();
    }

    let bucket = samples.len().div_ceil(columns);
    (0..columns)
        .map(|column| {
            let start = column * bucket;
            if start >= samples.len() {
                return Peak::SILENT;
            }
            let end = (start + bucket).min(samples.len());
            samples[start..end].iter().fold(
                Peak {
                    min: f32::MAX,
                    max: f32::MIN,
                },
                |peak, &s| Peak {
                    min: peak.min.min(s),
                    max: peak.max.max(s),
                },
            )
        })
        .collect()
}

/// Renders overview frames at a fixed canvas height
#[derive(Clone, Copy, Debug)]
pub struct WaveformRenderer {
    pub height: f32,
}

impl Default for WaveformRenderer {
    fn default() -> Self {
        Self {
            height: DEFAULT_HEIGHT,
        }
    }
}

impl WaveformRenderer {
    pub fn new(height: f32) -> Self {
        Self {
            height: height.max(1.0),
        }
    }

    pub fn render(
        &self,
        buffer: Option<&SampleBuffer>,
        columns: usize,
        position_secs: f64,
        duration_secs: f64,
    ) -> WaveformFrame {
        let Some(buffer) = buffer else {
            return WaveformFrame {
                columns,
                height: self.height,
                peaks: Vec::new(),
                commands: vec![DrawCommand::Placeholder(PLACEHOLDER_TEXT)],
            };
        };

        let peaks = peaks(buffer.samples(), columns);
        let amp = self.height / 2.0;

        let mut commands: Vec<DrawCommand> = peaks
            .iter()
            .enumerate()
            .map(|(column, peak)| DrawCommand::Rect {
                x: column as f32,
                y: (1.0 + peak.min) * amp,
                // Silence still gets a one-unit baseline tick
                width: 1.0,
                height: ((peak.max - peak.min) * amp).max(1.0),
                fill: Fill::Waveform,
            })
            .collect();

        if duration_secs > 0.0 && duration_secs.is_finite() {
            let position = if position_secs.is_finite() {
                position_secs
            } else {
                0.0
            };
            let fraction = (position / duration_secs).clamp(0.0, 1.0) as f32;
            let progress = fraction * columns as f32;
            commands.push(DrawCommand::Rect {
                x: 0.0,
                y: 0.0,
                width: progress,
                height: self.height,
                fill: Fill::Elapsed,
            });
            commands.push(DrawCommand::Rect {
                x: progress,
                y: 0.0,
                width: CURSOR_WIDTH,
                height: self.height,
                fill: Fill::Cursor,
            });
        }

        WaveformFrame {
            columns,
            height: self.height,
            peaks,
            commands,
        }
    }
}

/// Render with the default canvas height
pub fn render(
    buffer: Option<&SampleBuffer>,
    columns: usize,
    position_secs: f64,
    duration_secs: f64,
) -> WaveformFrame {
    WaveformRenderer::default().render(buffer, columns, position_secs, duration_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rects(frame: &WaveformFrame, fill: Fill) -> Vec<(f32, f32, f32, f32)> {
        frame
            .commands
            .iter()
            .filter_map(|c| match *c {
                DrawCommand::Rect {
                    x,
                    y,
                    width,
                    height,
                    fill: f,
                } if f == fill => Some((x, y, width, height)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_peaks_per_bucket() {
        let samples = [0.1, -0.4, 0.3, 0.9, -0.2, 0.0, 0.5];
        // ceil(7 / 3) = 3 samples per column
        let peaks = peaks(&samples, 3);
        assert_eq!(
            peaks,
            vec![
                Peak { min: -0.4, max: 0.3 },
                Peak { min: -0.2, max: 0.9 },
                Peak { min: 0.5, max: 0.5 },
            ]
        );
    }

    #[test]
    fn test_more_columns_than_samples() {
        let peaks = peaks(&[0.5, -0.5], 4);
        assert_eq!(peaks.len(), 4);
        assert_eq!(peaks[0], Peak { min: 0.5, max: 0.5 });
        assert_eq!(peaks[1], Peak { min: -0.5, max: -0.5 });
        assert_eq!(peaks[2], Peak::SILENT);
        assert_eq!(peaks[3], Peak::SILENT);
    }

    #[test]
    fn test_bar_geometry() {
        let buffer = SampleBuffer::new(vec![-0.5, 0.5, 0.0, 0.0], 4);
        let frame = WaveformRenderer::new(64.0).render(Some(&buffer), 2, 0.0, 0.0);

        let bars = rects(&frame, Fill::Waveform);
        assert_eq!(bars.len(), 2);
        // (1 + -0.5) * 32 = 16, (0.5 - -0.5) * 32 = 32
        assert_eq!(bars[0], (0.0, 16.0, 1.0, 32.0));
        // Flat column keeps a one-unit tick at the baseline
        assert_eq!(bars[1], (1.0, 32.0, 1.0, 1.0));
    }

    #[test]
    fn test_progress_overlay() {
        let buffer = SampleBuffer::new(vec![0.0; 1_000], 100);
        let frame = render(Some(&buffer), 600, 2.5, 10.0);

        assert_eq!(
            rects(&frame, Fill::Elapsed),
            vec![(0.0, 0.0, 150.0, DEFAULT_HEIGHT)]
        );
        assert_eq!(
            rects(&frame, Fill::Cursor),
            vec![(150.0, 0.0, CURSOR_WIDTH, DEFAULT_HEIGHT)]
        );
    }

    #[test]
    fn test_non_finite_position_draws_at_start() {
        let buffer = SampleBuffer::new(vec![0.0; 1_000], 100);
        for position in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let frame = render(Some(&buffer), 600, position, 10.0);
            assert_eq!(
                rects(&frame, Fill::Elapsed),
                vec![(0.0, 0.0, 0.0, DEFAULT_HEIGHT)]
            );
            assert_eq!(
                rects(&frame, Fill::Cursor),
                vec![(0.0, 0.0, CURSOR_WIDTH, DEFAULT_HEIGHT)]
            );
        }
    }

    #[test]
    fn test_zero_duration_skips_overlay() {
        let buffer = SampleBuffer::new(vec![0.2; 50], 100);
        let frame = render(Some(&buffer), 10, 3.0, 0.0);
        assert!(rects(&frame, Fill::Elapsed).is_empty());
        assert!(rects(&frame, Fill::Cursor).is_empty());
        assert_eq!(rects(&frame, Fill::Waveform).len(), 10);
    }

    #[test]
    fn test_missing_buffer_renders_placeholder() {
        let frame = render(None, 600, 0.0, 0.0);
        assert!(frame.peaks.is_empty());
        assert_eq!(
            frame.commands,
            vec![DrawCommand::Placeholder(PLACEHOLDER_TEXT)]
        );
    }

    #[test]
    fn test_empty_buffer_renders_baseline() {
        let buffer = SampleBuffer::empty(24_000);
        let frame = render(Some(&buffer), 5, 0.0, 0.0);
        assert_eq!(frame.peaks, vec![Peak::SILENT; 5]);
        assert!(rects(&frame, Fill::Waveform)
            .iter()
            .all(|&(_, y, _, h)| y == DEFAULT_HEIGHT / 2.0 && h == 1.0));
    }

    #[test]
    fn test_deterministic() {
        let samples: Vec<f32> = (0..10_000)
            .map(|i| ((i * 37) % 201) as f32 / 100.0 - 1.0)
            .collect();
        let buffer = SampleBuffer::new(samples, 24_000);

        let a = render(Some(&buffer), 321, 0.1, 0.4);
        let b = render(Some(&buffer), 321, 0.1, 0.4);
        assert_eq!(a, b);
        assert_eq!(a.peaks.len(), 321);
    }
}
