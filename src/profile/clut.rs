//! Color lookup table produced by curve generation.

/// One 16-bit RGB ramp entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClutEntry {
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

/// A per-channel gamma ramp, suitable for loading into a video card.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Clut {
    entries: Vec<ClutEntry>,
}

impl Clut {
    pub fn new(entries: Vec<ClutEntry>) -> Self {
        Self { entries }
    }

    /// Build a ramp by sampling one function per channel at `size` evenly
    /// spaced inputs in `[0, 1]`. Outputs are clamped to `[0, 1]`.
    pub fn from_fn<R, G, B>(size: usize, red: R, green: G, blue: B) -> Self
    where
        R: Fn(f64) -> f64,
        G: Fn(f64) -> f64,
        B: Fn(f64) -> f64,
    {
        let entries = (0..size)
            .map(|i| {
                let x = sample_position(i, size);
                ClutEntry {
                    red: to_u16(red(x)),
                    green: to_u16(green(x)),
                    blue: to_u16(blue(x)),
                }
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[ClutEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Input position of sample `i` of `size`.
pub(crate) fn sample_position(i: usize, size: usize) -> f64 {
    if size <= 1 {
        0.0
    } else {
        i as f64 / (size - 1) as f64
    }
}

fn to_u16(value: f64) -> u16 {
    if value.is_nan() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * 65535.0).round() as u16
}
