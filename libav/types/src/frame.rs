/*!
    Decoded frame type.
*/

use std::time::Duration;

use crate::{Pts, Rational};

/**
    Media-specific frame properties.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FrameProps {
    /// Scratch frame, not yet filled by a decoder.
    #[default]
    Unset,
    /// Decoded audio samples, interleaved.
    Audio {
        sample_rate: u32,
        channels: u16,
        /// Samples per channel.
        samples: usize,
    },
    /// Decoded video pixels.
    Video { width: u32, height: u32 },
}

/**
    A decoded frame of samples or pixels.

    Like [`crate::Packet`], a frame is reusable scratch space: the decode
    path calls [`Frame::reset`] before refilling the buffer.
*/
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    /// Raw decoded data.
    pub data: Vec<u8>,
    /// Index of the stream this frame was decoded from.
    pub stream_index: usize,
    /// Presentation timestamp, in the stream's time base.
    pub pts: Option<Pts>,
    /// Audio or video properties.
    pub props: FrameProps,
}

impl Frame {
    /**
        Create an empty frame, ready to be filled by a decoder.
    */
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Clear the frame for reuse, keeping the data allocation.
    */
    pub fn reset(&mut self) {
        self.data.clear();
        self.stream_index = 0;
        self.pts = None;
        self.props = FrameProps::Unset;
    }

    /**
        Presentation time of this frame under the given time base.
    */
    pub fn presentation_time(&self, time_base: Rational) -> Option<Duration> {
        self.pts.map(|pts| pts.to_duration(time_base))
    }
}

static_assertions::assert_impl_all!(Frame: Send, Sync);
