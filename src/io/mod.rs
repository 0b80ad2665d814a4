// Purpose - block buffers for the audio callback, persisted shape state

pub mod state;

/// Planar stereo buffer, allocated once and reused per block.
#[derive(Debug, Clone, Default)]
pub struct StereoBuffer {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
}

impl StereoBuffer {
    pub fn new(len: usize) -> Self {
        Self {
            left: vec![0.0; len],
            right: vec![0.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.left.len().min(self.right.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.left.fill(0.0);
        self.right.fill(0.0);
    }

    /// The first `len` frames of both channels.
    pub fn channels(&self, len: usize) -> [&[f32]; 2] {
        let len = len.min(self.len());
        [&self.left[..len], &self.right[..len]]
    }

    pub fn channels_mut(&mut self, len: usize) -> [&mut [f32]; 2] {
        let len = len.min(self.len());
        [&mut self.left[..len], &mut self.right[..len]]
    }

    /// Fill from interleaved frames of `channels` samples. Mono input is
    /// copied to both sides; channels past the second are ignored. Returns
    /// the number of frames read.
    pub fn deinterleave(&mut self, data: &[f32], channels: usize) -> usize {
        if channels == 0 {
            return 0;
        }
        let mut frames = 0;
        for ((frame, l), r) in data
            .chunks_exact(channels)
            .zip(self.left.iter_mut())
            .zip(self.right.iter_mut())
        {
            *l = frame[0];
            *r = if channels > 1 { frame[1] } else { frame[0] };
            frames += 1;
        }
        frames
    }

    /// Write the first frames into interleaved `data`. Mono output receives
    /// the average of both sides; extra channels are silenced. Returns the
    /// number of frames written.
    pub fn interleave(&self, data: &mut [f32], channels: usize) -> usize {
        if channels == 0 {
            return 0;
        }
        let mut frames = 0;
        for ((frame, &l), &r) in data
            .chunks_exact_mut(channels)
            .zip(self.left.iter())
            .zip(self.right.iter())
        {
            if channels == 1 {
                frame[0] = 0.5 * (l + r);
            } else {
                frame[0] = l;
                frame[1] = r;
                frame[2..].fill(0.0);
            }
            frames += 1;
        }
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interleave_stereo() {
        let mut buffer = StereoBuffer::new(3);
        buffer.left.copy_from_slice(&[1.0, 2.0, 3.0]);
        buffer.right.copy_from_slice(&[-1.0, -2.0, -3.0]);

        let mut data = [0.0; 6];
        assert_eq!(buffer.interleave(&mut data, 2), 3);
        assert_eq!(data, [1.0, -1.0, 2.0, -2.0, 3.0, -3.0]);
    }

    #[test]
    fn test_interleave_mono_and_surround() {
        let mut buffer = StereoBuffer::new(2);
        buffer.left.copy_from_slice(&[1.0, 0.0]);
        buffer.right.copy_from_slice(&[0.0, 1.0]);

        let mut mono = [9.0; 2];
        buffer.interleave(&mut mono, 1);
        assert_eq!(mono, [0.5, 0.5]);

        let mut quad = [9.0; 8];
        buffer.interleave(&mut quad, 4);
        assert_eq!(quad, [1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_deinterleave_limits_to_capacity() {
        let mut buffer = StereoBuffer::new(2);
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        assert_eq!(buffer.deinterleave(&data, 2), 2);
        assert_eq!(buffer.left, [1.0, 3.0]);
        assert_eq!(buffer.right, [2.0, 4.0]);

        assert_eq!(buffer.deinterleave(&[7.0, 8.0], 1), 2);
        assert_eq!(buffer.right, [7.0, 8.0]);
    }
}
