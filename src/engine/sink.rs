/// Where rendered blocks go.
///
/// `write` returns how many samples were accepted. Fewer than offered is an
/// underrun; the engine reports it and carries on.
pub trait OutputSink {
    fn write(&mut self, samples: &[i16]) -> usize;

    /// Frames the device played as silence because nothing had been
    /// written in time. Sinks without a device clock report zero.
    fn starved_frames(&self) -> u64 {
        0
    }
}

/// Accepts and discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn write(&mut self, samples: &[i16]) -> usize {
        samples.len()
    }
}

/// Keeps every sample written, optionally accepting at most `limit` per
/// call to simulate a slow device.
#[derive(Debug, Default, Clone)]
pub struct CaptureSink {
    pub samples: Vec<i16>,
    pub limit: Option<usize>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            samples: Vec::new(),
            limit: Some(limit),
        }
    }

    pub fn peak(&self) -> i16 {
        self.samples
            .iter()
            .map(|s| s.saturating_abs())
            .max()
            .unwrap_or(0)
    }
}

impl OutputSink for CaptureSink {
    fn write(&mut self, samples: &[i16]) -> usize {
        let n = self.limit.map_or(samples.len(), |l| l.min(samples.len()));
        self.samples.extend_from_slice(&samples[..n]);
        n
    }
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn write(&mut self, samples: &[i16]) -> usize {
        (**self).write(samples)
    }

    fn starved_frames(&self) -> u64 {
        (**self).starved_frames()
    }
}

impl<S: OutputSink + ?Sized> OutputSink for Box<S> {
    fn write(&mut self, samples: &[i16]) -> usize {
        (**self).write(samples)
    }

    fn starved_frames(&self) -> u64 {
        (**self).starved_frames()
    }
}
