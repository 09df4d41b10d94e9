/*!
    Encoded packet type.
*/

use crate::Pts;

/**
    An encoded media packet.

    Owns a buffer of compressed data read from one stream of a container,
    identified by `stream_index` (a non-owning back-reference into the
    probed stream list).

    A packet is reusable scratch space: the read path calls [`Packet::reset`]
    and refills the same allocation instead of allocating per call, matching
    the native library's reuse contract.
*/
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Packet {
    /// Compressed data.
    pub data: Vec<u8>,
    /// Index of the stream this packet came from.
    pub stream_index: usize,
    /// Presentation timestamp, in the stream's time base.
    pub pts: Option<Pts>,
    /// Decode timestamp; differs from `pts` when frames are reordered.
    pub dts: Option<Pts>,
    /// Whether the packet can be decoded independently.
    pub keyframe: bool,
}

impl Packet {
    /**
        Create an empty packet, ready to be filled by a read call.
    */
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Clear the packet for reuse, keeping the data allocation.
    */
    pub fn reset(&mut self) {
        self.data.clear();
        self.stream_index = 0;
        self.pts = None;
        self.dts = None;
        self.keyframe = false;
    }

    /**
        Returns true if the packet holds no data.
    */
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

static_assertions::assert_impl_all!(Packet: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_clears_fields() {
        let mut packet = Packet {
            data: vec![1, 2, 3],
            stream_index: 2,
            pts: Some(Pts(100)),
            dts: Some(Pts(90)),
            keyframe: true,
        };

        packet.reset();

        assert!(packet.is_empty());
        assert_eq!(packet.stream_index, 0);
        assert_eq!(packet.pts, None);
        assert_eq!(packet.dts, None);
        assert!(!packet.keyframe);
    }

    #[test]
    fn reset_keeps_allocation() {
        let mut packet = Packet::new();
        packet.data.extend_from_slice(&[0u8; 4096]);
        let capacity = packet.data.capacity();

        packet.reset();

        assert!(packet.data.capacity() >= capacity);
    }
}
