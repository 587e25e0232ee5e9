/// Capture is forwarded in fixed frames of this many samples.
pub const CAPTURE_FRAME_SAMPLES: usize = 4096;

/// Re-chunks arbitrarily sized capture buffers into fixed-length frames.
#[derive(Debug)]
pub struct FrameAccumulator {
    frame_len: usize,
    pending: Vec<f32>,
}

impl Default for FrameAccumulator {
    fn default() -> Self {
        Self::new(CAPTURE_FRAME_SAMPLES)
    }
}

impl FrameAccumulator {
    pub fn new(frame_len: usize) -> Self {
        let frame_len = frame_len.max(1);
        Self {
            frame_len,
            pending: Vec::with_capacity(frame_len),
        }
    }

    /// Appends samples and drains every complete frame, oldest first.
    pub fn push(&mut self, samples: &[f32]) -> Vec<Vec<f32>> {
        self.pending.extend_from_slice(samples);
        let full = self.pending.len() / self.frame_len;
        if full == 0 {
            return Vec::new();
        }
        let mut rest = self.pending.split_off(full * self.frame_len);
        std::mem::swap(&mut rest, &mut self.pending);
        rest.chunks_exact(self.frame_len)
            .map(<[f32]>::to_vec)
            .collect()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drops a partial frame, e.g. when capture stops mid-frame.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
