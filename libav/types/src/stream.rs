/*!
    Stream metadata surfaced by container probing.
*/

use crate::Rational;

/**
    Type of media carried by a stream.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaType {
    Video,
    Audio,
    Subtitle,
    /// Attachments, timed metadata, and other non-media payloads.
    Data,
}

impl MediaType {
    /**
        Returns true if streams of this type can be fed to a decoder.
    */
    pub const fn is_decodable(self) -> bool {
        matches!(self, Self::Video | Self::Audio)
    }
}

/**
    Codec identifiers.

    A subset of codecs commonly seen in containers; not every native codec
    is represented.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CodecId {
    // Video
    H264,
    H265,
    Vp9,
    Av1,
    // Audio
    Aac,
    Opus,
    Mp3,
    Flac,
    PcmS16Le,
}

impl CodecId {
    pub const fn is_video(self) -> bool {
        matches!(self, Self::H264 | Self::H265 | Self::Vp9 | Self::Av1)
    }

    pub const fn is_audio(self) -> bool {
        matches!(
            self,
            Self::Aac | Self::Opus | Self::Mp3 | Self::Flac | Self::PcmS16Le
        )
    }
}

/**
    Metadata of a single stream inside a probed container.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamInfo {
    /// Position of the stream in the container.
    pub index: usize,
    /// What kind of media the stream carries.
    pub media_type: MediaType,
    /// Codec of the stream's packets; `None` when no decoder is known for
    /// the stream.
    pub codec: Option<CodecId>,
    /// Time base for the stream's timestamps.
    pub time_base: Rational,
}

impl StreamInfo {
    /**
        Returns true if this stream can be decoded by the binding: it
        carries audio or video and a decoder is known for it.
    */
    pub const fn is_decodable(&self) -> bool {
        self.media_type.is_decodable() && self.codec.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodable_media_types() {
        assert!(MediaType::Video.is_decodable());
        assert!(MediaType::Audio.is_decodable());
        assert!(!MediaType::Subtitle.is_decodable());
        assert!(!MediaType::Data.is_decodable());
    }

    #[test]
    fn codec_classification() {
        assert!(CodecId::H264.is_video());
        assert!(!CodecId::H264.is_audio());
        assert!(CodecId::Opus.is_audio());
        assert!(!CodecId::Opus.is_video());
    }

    #[test]
    fn stream_decodability_follows_media_type() {
        let stream = StreamInfo {
            index: 0,
            media_type: MediaType::Audio,
            codec: Some(CodecId::Aac),
            time_base: Rational::new(1, 48000),
        };
        assert!(stream.is_decodable());

        let data = StreamInfo {
            media_type: MediaType::Data,
            ..stream
        };
        assert!(!data.is_decodable());

        // Audio with no known decoder is not decodable either.
        let unknown = StreamInfo {
            codec: None,
            ..stream
        };
        assert!(!unknown.is_decodable());
    }
}
