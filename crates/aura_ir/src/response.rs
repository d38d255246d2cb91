//! Time-domain response buffer.

/// Mono response that remembers whether anything non-zero was written.
///
/// `is_silent` is O(1) and `clear` only touches the samples written since the
/// last clear, so an empty tick costs nothing per sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseBuffer {
    samples: Vec<f32>,
    silent: bool,
    // One past the last index written since the last clear
    touched: usize,
}

impl ResponseBuffer {
    pub fn new(len: usize) -> Self {
        Self {
            samples: vec![0.0; len],
            silent: true,
            touched: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// True when no non-zero value has been written since the last clear.
    pub fn is_silent(&self) -> bool {
        self.silent
    }

    /// Add `value` at `index`. Out-of-range indices are ignored.
    pub fn add(&mut self, index: usize, value: f32) {
        let Some(sample) = self.samples.get_mut(index) else {
            return;
        };
        *sample += value;
        self.touched = self.touched.max(index + 1);
        if value != 0.0 {
            self.silent = false;
        }
    }

    /// Overwrite `index`. Out-of-range indices are ignored.
    pub fn set(&mut self, index: usize, value: f32) {
        let Some(sample) = self.samples.get_mut(index) else {
            return;
        };
        *sample = value;
        self.touched = self.touched.max(index + 1);
        if value != 0.0 {
            self.silent = false;
        }
    }

    pub fn clear(&mut self) {
        self.samples[..self.touched].fill(0.0);
        self.touched = 0;
        self.silent = true;
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn peak(&self) -> f32 {
        self.samples[..self.touched]
            .iter()
            .fold(0.0, |peak, s| peak.max(s.abs()))
    }
}

/// Pick `target` samples at stride `len / target`; shorter inputs are returned as is.
pub fn downsample_to(input: &[f32], target: usize) -> Vec<f32> {
    if target == 0 || input.len() <= target {
        return input.to_vec();
    }
    let step = input.len() / target;
    (0..target).map(|i| input[i * step]).collect()
}
