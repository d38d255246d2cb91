//! The output side of the engine: where responses and channel parameters go.

use thiserror::Error;

/// A reverb sink refused an upload or a parameter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SinkError {
    #[error("Channel {slot} does not exist (sink has {channels})")]
    NoSuchChannel { slot: usize, channels: usize },

    #[error("Rejected impulse response for channel {slot}: {reason}")]
    Rejected { slot: usize, reason: String },
}

/// Convolution reverb with one channel per source slot.
///
/// Implementations wrap whatever audio backend hosts the reverb. The engine
/// only ever talks to the sink from the thread that calls `tick`.
pub trait ReverbSink: Send {
    /// Number of channels; slots `0..channel_count()` are valid.
    fn channel_count(&self) -> usize;

    /// Replace the impulse response of channel `slot`.
    fn upload_impulse_response(
        &mut self,
        slot: usize,
        samples: &[f32],
        channels: u16,
        sample_rate: u32,
        label: &str,
    ) -> Result<(), SinkError>;

    fn set_lowpass_cutoff(&mut self, slot: usize, hz: f32) -> Result<(), SinkError>;

    /// Wet level in percent, 0 to 100.
    fn set_wet_mix(&mut self, slot: usize, percent: f32) -> Result<(), SinkError>;
}

/// Last state written to one channel of a [`MemorySink`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelState {
    pub impulse_response: Vec<f32>,
    pub label: String,
    pub uploads: usize,
    pub lowpass_hz: f32,
    pub wet_percent: f32,
}

impl Default for ChannelState {
    fn default() -> Self {
        Self {
            impulse_response: Vec::new(),
            label: String::new(),
            uploads: 0,
            lowpass_hz: 22000.0,
            wet_percent: 100.0,
        }
    }
}

/// Sink that keeps everything it receives in memory.
///
/// Used by the CLI for offline bakes and by tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    channels: Vec<ChannelState>,
    sample_rate: u32,
}

impl MemorySink {
    pub fn new(channels: usize) -> Self {
        Self {
            channels: vec![ChannelState::default(); channels],
            sample_rate: 0,
        }
    }

    pub fn channel(&self, slot: usize) -> Option<&ChannelState> {
        self.channels.get(slot)
    }

    pub fn channels(&self) -> &[ChannelState] {
        &self.channels
    }

    /// Sample rate of the most recent upload.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channel_mut(&mut self, slot: usize) -> Result<&mut ChannelState, SinkError> {
        let channels = self.channels.len();
        self.channels
            .get_mut(slot)
            .ok_or(SinkError::NoSuchChannel { slot, channels })
    }
}

impl ReverbSink for MemorySink {
    fn channel_count(&self) -> usize {
        self.channels.len()
    }

    fn upload_impulse_response(
        &mut self,
        slot: usize,
        samples: &[f32],
        channels: u16,
        sample_rate: u32,
        label: &str,
    ) -> Result<(), SinkError> {
        if channels != 1 {
            return Err(SinkError::Rejected {
                slot,
                reason: format!("expected mono, got {channels} channels"),
            });
        }
        let channel = self.channel_mut(slot)?;
        channel.impulse_response.clear();
        channel.impulse_response.extend_from_slice(samples);
        channel.label = label.to_string();
        channel.uploads += 1;
        self.sample_rate = sample_rate;
        Ok(())
    }

    fn set_lowpass_cutoff(&mut self, slot: usize, hz: f32) -> Result<(), SinkError> {
        self.channel_mut(slot)?.lowpass_hz = hz;
        Ok(())
    }

    fn set_wet_mix(&mut self, slot: usize, percent: f32) -> Result<(), SinkError> {
        self.channel_mut(slot)?.wet_percent = percent.clamp(0.0, 100.0);
        Ok(())
    }
}
