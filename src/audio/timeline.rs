//! Timeline compositing
//!
//! Lays the per-line clips end to end with a fixed silence gap and copies
//! them into one composite buffer. Every clip reserves a gap after itself,
//! including the last one, so a composite always ends in silence.

use std::ops::Range;

use super::buffer::{SampleBuffer, DEFAULT_SAMPLE_RATE};

/// Silence inserted after each narrated line (seconds)
pub const DEFAULT_GAP_SECONDS: f64 = 0.5;

/// One narrated line: who said it and the decoded audio
#[derive(Clone, Debug)]
pub struct Segment {
    pub speaker: String,
    pub buffer: SampleBuffer,
}

impl Segment {
    pub fn new(speaker: impl Into<String>, buffer: SampleBuffer) -> Self {
        Self {
            speaker: speaker.into(),
            buffer,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        self.buffer.duration_secs()
    }
}

/// Number of silent samples for `gap_seconds` at `sample_rate`
pub fn gap_len(gap_seconds: f64, sample_rate: u32) -> usize {
    if !gap_seconds.is_finite() || gap_seconds <= 0.0 {
        return 0;
    }
    (gap_seconds * sample_rate as f64).round() as usize
}

/// Placement of each clip inside the composite, plus the total length
///
/// Clip `i` occupies `ranges[i]`; the `gap` samples after each range are
/// silence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    pub ranges: Vec<Range<usize>>,
    pub gap: usize,
    pub total_len: usize,
}

impl Layout {
    pub fn new(lengths: impl IntoIterator<Item = usize>, gap: usize) -> Self {
        let mut offset = 0;
        let ranges: Vec<Range<usize>> = lengths
            .into_iter()
            .map(|len| {
                let range = offset..offset + len;
                offset = range.end + gap;
                range
            })
            .collect();

        Self {
            ranges,
            gap,
            total_len: offset,
        }
    }
}

/// Concatenate clips into one buffer with `gap_seconds` of silence after each
///
/// All inputs are expected to share one sample rate; the first buffer's
/// rate is used for the output. An empty input yields a zero-length buffer
/// at [`DEFAULT_SAMPLE_RATE`].
pub fn merge(buffers: &[SampleBuffer], gap_seconds: f64) -> SampleBuffer {
    let Some(first) = buffers.first() else {
        return SampleBuffer::empty(DEFAULT_SAMPLE_RATE);
    };
    let sample_rate = first.sample_rate();

    if let Some(other) = buffers.iter().find(|b| b.sample_rate() != sample_rate) {
        log::warn!(
            "Merging clips with mixed sample rates ({} Hz and {} Hz); copying verbatim",
            sample_rate,
            other.sample_rate()
        );
    }

    let layout = Layout::new(
        buffers.iter().map(SampleBuffer::len),
        gap_len(gap_seconds, sample_rate),
    );

    // Sized once up front; gaps stay zeroed.
    let mut out = vec![0.0f32; layout.total_len];
    for (buffer, range) in buffers.iter().zip(&layout.ranges) {
        out[range.clone()].copy_from_slice(buffer.samples());
    }

    log::debug!(
        "Merged {} clips into {} samples ({:.2}s)",
        buffers.len(),
        layout.total_len,
        layout.total_len as f64 / sample_rate as f64
    );

    SampleBuffer::new(out, sample_rate)
}

/// [`merge`] over the segments' buffers
pub fn merge_segments(segments: &[Segment], gap_seconds: f64) -> SampleBuffer {
    let buffers: Vec<SampleBuffer> = segments.iter().map(|s| s.buffer.clone()).collect();
    merge(&buffers, gap_seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize, start: f32) -> SampleBuffer {
        let samples: Vec<f32> = (0..len).map(|i| start + i as f32 * 1e-4).collect();
        SampleBuffer::new(samples, DEFAULT_SAMPLE_RATE)
    }

    #[test]
    fn test_empty_input() {
        let merged = merge(&[], 0.5);
        assert!(merged.is_empty());
        assert_eq!(merged.sample_rate(), DEFAULT_SAMPLE_RATE);
    }

    #[test]
    fn test_one_and_two_seconds_with_half_second_gap() {
        let a = SampleBuffer::new(vec![0.1; 24_000], DEFAULT_SAMPLE_RATE);
        let b = SampleBuffer::new(vec![-0.1; 48_000], DEFAULT_SAMPLE_RATE);

        let merged = merge(&[a, b], 0.5);
        assert_eq!(merged.len(), 96_000);
        assert!((merged.duration_secs() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_length_reserves_one_gap_per_clip() {
        let buffers = vec![ramp(100, 0.0), ramp(7, 0.2), ramp(0, 0.0), ramp(55, -0.3)];
        let rate = DEFAULT_SAMPLE_RATE as f64;
        let gap = 0.013;

        let merged = merge(&buffers, gap);
        let expected = 100 + 7 + 55 + 4 * (gap * rate).round() as usize;
        assert_eq!(merged.len(), expected);
    }

    #[test]
    fn test_clips_copied_verbatim_and_gaps_silent() {
        let buffers = vec![ramp(300, 0.1), ramp(120, -0.5), ramp(50, 0.7)];
        let gap = 0.01;
        let merged = merge(&buffers, gap);

        let layout = Layout::new(
            buffers.iter().map(SampleBuffer::len),
            gap_len(gap, DEFAULT_SAMPLE_RATE),
        );
        assert_eq!(layout.total_len, merged.len());

        for (buffer, range) in buffers.iter().zip(&layout.ranges) {
            assert_eq!(&merged.samples()[range.clone()], buffer.samples());
            let silence = &merged.samples()[range.end..range.end + layout.gap];
            assert!(silence.iter().all(|&s| s == 0.0));
        }
    }

    #[test]
    fn test_non_positive_gap_is_plain_concat() {
        let merged = merge(&[ramp(3, 0.0), ramp(2, 0.5)], -1.0);
        assert_eq!(merged.len(), 5);
        assert_eq!(merged.samples()[3], 0.5);
    }

    #[test]
    fn test_inputs_untouched() {
        let a = ramp(10, 0.3);
        let before = a.samples().to_vec();
        let _ = merge(std::slice::from_ref(&a), 0.5);
        assert_eq!(a.samples(), before.as_slice());
    }

    #[test]
    fn test_merge_segments() {
        let segments = vec![
            Segment::new("Speaker 1", ramp(24, 0.0)),
            Segment::new("Speaker 2", ramp(48, 0.0)),
        ];
        assert!((segments[1].duration_secs() - 0.002).abs() < 1e-9);
        assert_eq!(merge_segments(&segments, 0.001).len(), 24 + 48 + 2 * 24);
    }
}
