/*!
    Deterministic in-memory backend.

    Stands in for the native library in tests and in builds without it.
    Containers are declared as fixtures ([`MemoryStream`]); demuxing
    interleaves the declared packets in container order, and decoding is a
    passthrough with a modelled codec latency: a decoder buffers packets
    until its `decoder_delay` is exceeded and releases the tail only when
    flushed, which is exactly the behavior the drain path of a session has
    to handle.

    The backend also keeps open/close bookkeeping so tests can assert that
    wrappers release every handle exactly once.
*/

use std::collections::{HashMap, VecDeque};

use libav_types::status::{
    AVERROR_DECODER_NOT_FOUND, AVERROR_STREAM_NOT_FOUND, EAGAIN_CODE, EOF_CODE, averror,
};
use libav_types::{CodecId, Frame, FrameProps, MediaType, Packet, Pts, Rational, StreamInfo};

use crate::{CodecHandle, FormatHandle, LibavBackend, OpenConfig};

const EINVAL_CODE: i32 = averror(libc::EINVAL);

/**
    One declared stream of an in-memory container.
*/
#[derive(Clone, Debug)]
pub struct MemoryStream {
    /// Metadata reported when the container is probed.
    pub info: StreamInfo,
    /// Compressed payload of each packet, in stream order.
    pub packets: Vec<Vec<u8>>,
    /// Packets the modelled decoder buffers before producing its first
    /// frame; the buffered tail only comes out on flush.
    pub decoder_delay: usize,
    /// Frames produced per packet once the decoder is past its delay.
    pub frames_per_packet: usize,
}

impl MemoryStream {
    /**
        An AAC audio stream with a 48 kHz time base.
    */
    pub fn audio(index: usize, packets: Vec<Vec<u8>>) -> Self {
        Self {
            info: StreamInfo {
                index,
                media_type: MediaType::Audio,
                codec: Some(CodecId::Aac),
                time_base: Rational::new(1, 48000),
            },
            packets,
            decoder_delay: 0,
            frames_per_packet: 1,
        }
    }

    /**
        An H.264 video stream with a 90 kHz time base.
    */
    pub fn video(index: usize, packets: Vec<Vec<u8>>) -> Self {
        Self {
            info: StreamInfo {
                index,
                media_type: MediaType::Video,
                codec: Some(CodecId::H264),
                time_base: Rational::new(1, 90000),
            },
            packets,
            decoder_delay: 0,
            frames_per_packet: 1,
        }
    }

    /**
        A non-media data stream. Not decodable; probing skips it when
        deciding whether the container is usable.
    */
    pub fn data(index: usize) -> Self {
        Self {
            info: StreamInfo {
                index,
                media_type: MediaType::Data,
                codec: None,
                time_base: Rational::new(1, 1000),
            },
            packets: Vec::new(),
            decoder_delay: 0,
            frames_per_packet: 1,
        }
    }

    /**
        Set the modelled decoder latency.
    */
    pub fn with_decoder_delay(mut self, delay: usize) -> Self {
        self.decoder_delay = delay;
        self
    }

    /**
        Set how many frames each packet decodes into.
    */
    pub fn with_frames_per_packet(mut self, frames: usize) -> Self {
        self.frames_per_packet = frames;
        self
    }
}

struct FormatState {
    /// (stream slot, packet index) pairs in container order.
    reads: Vec<(usize, usize)>,
    cursor: usize,
    /// Total read calls on this context, for fault injection.
    calls: usize,
}

struct DecoderState {
    stream_slot: usize,
    delay: usize,
    frames_per_packet: usize,
    queue: VecDeque<(Vec<u8>, Option<Pts>)>,
    flushed: bool,
}

struct EncoderState {
    delay: usize,
    queue: VecDeque<(Vec<u8>, Option<Pts>)>,
    flushed: bool,
}

enum CodecState {
    Decoder(DecoderState),
    Encoder(EncoderState),
}

/**
    In-memory [`LibavBackend`] over declared fixtures.

    Error injection: [`MemoryBackend::with_open_error`] and
    [`MemoryBackend::with_probe_error`] fail the corresponding call with a
    raw native code; [`MemoryBackend::with_read_fault`] fails the N-th read
    call once (injecting the would-block sentinel there makes the following
    retry succeed).

    Calls on released or unknown handles return `AVERROR(EINVAL)`.
*/
#[derive(Default)]
pub struct MemoryBackend {
    streams: Vec<MemoryStream>,
    open_error: Option<i32>,
    probe_error: Option<i32>,
    read_faults: HashMap<usize, i32>,
    encoder_delay: usize,

    next_handle: u64,
    formats: HashMap<u64, FormatState>,
    codecs: HashMap<u64, CodecState>,

    formats_opened: usize,
    formats_closed: usize,
    codecs_opened: usize,
    codecs_closed: usize,
}

impl MemoryBackend {
    /**
        Create a backend serving one container with the given streams.
    */
    pub fn new(streams: Vec<MemoryStream>) -> Self {
        Self {
            streams,
            ..Self::default()
        }
    }

    /**
        Fail every open with the given raw native code.
    */
    pub fn with_open_error(mut self, code: i32) -> Self {
        self.open_error = Some(code);
        self
    }

    /**
        Fail every probe with the given raw native code.
    */
    pub fn with_probe_error(mut self, code: i32) -> Self {
        self.probe_error = Some(code);
        self
    }

    /**
        Fail the `call`-th read (0-based, per format context) with the
        given raw native code, once.
    */
    pub fn with_read_fault(mut self, call: usize, code: i32) -> Self {
        self.read_faults.insert(call, code);
        self
    }

    /**
        Set the modelled encoder latency.
    */
    pub fn with_encoder_delay(mut self, delay: usize) -> Self {
        self.encoder_delay = delay;
        self
    }

    /// Format contexts currently open.
    pub fn live_formats(&self) -> usize {
        self.formats.len()
    }

    /// Codec contexts (decoders and encoders) currently open.
    pub fn live_codecs(&self) -> usize {
        self.codecs.len()
    }

    pub fn formats_opened(&self) -> usize {
        self.formats_opened
    }

    pub fn formats_closed(&self) -> usize {
        self.formats_closed
    }

    pub fn codecs_opened(&self) -> usize {
        self.codecs_opened
    }

    pub fn codecs_closed(&self) -> usize {
        self.codecs_closed
    }

    fn alloc_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl LibavBackend for MemoryBackend {
    fn open_input(
        &mut self,
        _url: &str,
        _config: &OpenConfig,
        out: &mut Option<FormatHandle>,
    ) -> i32 {
        if let Some(code) = self.open_error {
            return code;
        }

        // Interleave the declared streams by packet index, which is close
        // enough to container order for fixture purposes.
        let longest = self.streams.iter().map(|s| s.packets.len()).max();
        let mut reads = Vec::new();
        for packet_index in 0..longest.unwrap_or(0) {
            for (slot, stream) in self.streams.iter().enumerate() {
                if packet_index < stream.packets.len() {
                    reads.push((slot, packet_index));
                }
            }
        }

        let handle = self.alloc_handle();
        self.formats.insert(
            handle,
            FormatState {
                reads,
                cursor: 0,
                calls: 0,
            },
        );
        self.formats_opened += 1;
        *out = Some(FormatHandle(handle));
        0
    }

    fn find_stream_info(&mut self, format: FormatHandle) -> i32 {
        if !self.formats.contains_key(&format.0) {
            return EINVAL_CODE;
        }
        if let Some(code) = self.probe_error {
            return code;
        }
        0
    }

    fn stream_count(&mut self, format: FormatHandle) -> i32 {
        if !self.formats.contains_key(&format.0) {
            return EINVAL_CODE;
        }
        self.streams.len() as i32
    }

    fn stream_info(
        &mut self,
        format: FormatHandle,
        index: usize,
        out: &mut Option<StreamInfo>,
    ) -> i32 {
        if !self.formats.contains_key(&format.0) {
            return EINVAL_CODE;
        }
        let Some(stream) = self.streams.get(index) else {
            return EINVAL_CODE;
        };
        *out = Some(stream.info);
        0
    }

    fn read_packet(&mut self, format: FormatHandle, packet: &mut Packet) -> i32 {
        let Some(state) = self.formats.get_mut(&format.0) else {
            return EINVAL_CODE;
        };
        let call = state.calls;
        state.calls += 1;
        if let Some(code) = self.read_faults.remove(&call) {
            return code;
        }
        let Some(&(slot, packet_index)) = state.reads.get(state.cursor) else {
            return EOF_CODE;
        };
        state.cursor += 1;

        let stream = &self.streams[slot];
        packet.reset();
        packet.data.extend_from_slice(&stream.packets[packet_index]);
        packet.stream_index = stream.info.index;
        packet.pts = Some(Pts(packet_index as i64 * 1000));
        packet.dts = packet.pts;
        packet.keyframe = packet_index == 0;
        0
    }

    fn close_input(&mut self, format: FormatHandle) {
        if self.formats.remove(&format.0).is_some() {
            self.formats_closed += 1;
        }
    }

    fn open_decoder(
        &mut self,
        format: FormatHandle,
        stream_index: usize,
        out: &mut Option<CodecHandle>,
    ) -> i32 {
        if !self.formats.contains_key(&format.0) {
            return EINVAL_CODE;
        }
        let Some(slot) = self
            .streams
            .iter()
            .position(|s| s.info.index == stream_index)
        else {
            return AVERROR_STREAM_NOT_FOUND;
        };
        if !self.streams[slot].info.is_decodable() {
            return AVERROR_DECODER_NOT_FOUND;
        }

        let state = DecoderState {
            stream_slot: slot,
            delay: self.streams[slot].decoder_delay,
            frames_per_packet: self.streams[slot].frames_per_packet,
            queue: VecDeque::new(),
            flushed: false,
        };
        let handle = self.alloc_handle();
        self.codecs.insert(handle, CodecState::Decoder(state));
        self.codecs_opened += 1;
        *out = Some(CodecHandle(handle));
        0
    }

    fn open_encoder(&mut self, _codec: CodecId, out: &mut Option<CodecHandle>) -> i32 {
        let state = EncoderState {
            delay: self.encoder_delay,
            queue: VecDeque::new(),
            flushed: false,
        };
        let handle = self.alloc_handle();
        self.codecs.insert(handle, CodecState::Encoder(state));
        self.codecs_opened += 1;
        *out = Some(CodecHandle(handle));
        0
    }

    fn send_packet(&mut self, codec: CodecHandle, packet: Option<&Packet>) -> i32 {
        let Some(CodecState::Decoder(dec)) = self.codecs.get_mut(&codec.0) else {
            return EINVAL_CODE;
        };
        match packet {
            Some(pkt) => {
                if dec.flushed {
                    // Sending after flush is an error in the native API.
                    return EOF_CODE;
                }
                for i in 0..dec.frames_per_packet {
                    let pts = pkt.pts.map(|p| Pts(p.0 + i as i64));
                    dec.queue.push_back((pkt.data.clone(), pts));
                }
                0
            }
            None => {
                dec.flushed = true;
                0
            }
        }
    }

    fn receive_frame(&mut self, codec: CodecHandle, frame: &mut Frame) -> i32 {
        let Some(CodecState::Decoder(dec)) = self.codecs.get_mut(&codec.0) else {
            return EINVAL_CODE;
        };
        let available = if dec.flushed {
            !dec.queue.is_empty()
        } else {
            dec.queue.len() > dec.delay
        };
        if !available {
            return if dec.flushed { EOF_CODE } else { EAGAIN_CODE };
        }
        let Some((data, pts)) = dec.queue.pop_front() else {
            return EAGAIN_CODE;
        };

        let info = self.streams[dec.stream_slot].info;
        frame.reset();
        frame.data.extend_from_slice(&data);
        frame.stream_index = info.index;
        frame.pts = pts;
        frame.props = match info.media_type {
            MediaType::Audio => FrameProps::Audio {
                sample_rate: info.time_base.den as u32,
                channels: 2,
                samples: data.len(),
            },
            MediaType::Video => FrameProps::Video {
                width: 320,
                height: 240,
            },
            _ => FrameProps::Unset,
        };
        0
    }

    fn send_frame(&mut self, codec: CodecHandle, frame: Option<&Frame>) -> i32 {
        let Some(CodecState::Encoder(enc)) = self.codecs.get_mut(&codec.0) else {
            return EINVAL_CODE;
        };
        match frame {
            Some(f) => {
                if enc.flushed {
                    return EOF_CODE;
                }
                enc.queue.push_back((f.data.clone(), f.pts));
                0
            }
            None => {
                enc.flushed = true;
                0
            }
        }
    }

    fn receive_packet(&mut self, codec: CodecHandle, packet: &mut Packet) -> i32 {
        let Some(CodecState::Encoder(enc)) = self.codecs.get_mut(&codec.0) else {
            return EINVAL_CODE;
        };
        let available = if enc.flushed {
            !enc.queue.is_empty()
        } else {
            enc.queue.len() > enc.delay
        };
        if !available {
            return if enc.flushed { EOF_CODE } else { EAGAIN_CODE };
        }
        let Some((data, pts)) = enc.queue.pop_front() else {
            return EAGAIN_CODE;
        };

        packet.reset();
        packet.data.extend_from_slice(&data);
        packet.pts = pts;
        packet.dts = pts;
        0
    }

    fn close_codec(&mut self, codec: CodecHandle) {
        if self.codecs.remove(&codec.0).is_some() {
            self.codecs_closed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_handles_are_rejected_not_undefined() {
        let mut backend = MemoryBackend::new(vec![MemoryStream::audio(0, vec![vec![1]])]);
        let mut packet = Packet::new();
        let mut frame = Frame::new();

        assert_eq!(
            backend.read_packet(FormatHandle(99), &mut packet),
            EINVAL_CODE
        );
        assert_eq!(backend.find_stream_info(FormatHandle(99)), EINVAL_CODE);
        assert_eq!(
            backend.send_packet(CodecHandle(99), Some(&packet)),
            EINVAL_CODE
        );
        assert_eq!(backend.receive_frame(CodecHandle(99), &mut frame), EINVAL_CODE);
    }

    #[test]
    fn decoder_delay_holds_back_frames_until_flush() {
        let mut backend = MemoryBackend::new(vec![
            MemoryStream::audio(0, vec![vec![1], vec![2]]).with_decoder_delay(2),
        ]);
        let mut fmt = None;
        assert_eq!(
            backend.open_input("memory:a", &OpenConfig::new(), &mut fmt),
            0
        );
        let fmt = fmt.take().expect("format handle");
        let mut codec = None;
        assert_eq!(backend.open_decoder(fmt, 0, &mut codec), 0);
        let codec = codec.take().expect("codec handle");

        let mut packet = Packet::new();
        let mut frame = Frame::new();

        // Both packets fit inside the delay: no frames yet.
        assert_eq!(backend.read_packet(fmt, &mut packet), 0);
        assert_eq!(backend.send_packet(codec, Some(&packet)), 0);
        assert_eq!(backend.receive_frame(codec, &mut frame), EAGAIN_CODE);
        assert_eq!(backend.read_packet(fmt, &mut packet), 0);
        assert_eq!(backend.send_packet(codec, Some(&packet)), 0);
        assert_eq!(backend.receive_frame(codec, &mut frame), EAGAIN_CODE);

        // Flush releases the buffered tail, then reports end of stream.
        assert_eq!(backend.send_packet(codec, None), 0);
        assert_eq!(backend.receive_frame(codec, &mut frame), 0);
        assert_eq!(frame.data, vec![1]);
        assert_eq!(backend.receive_frame(codec, &mut frame), 0);
        assert_eq!(frame.data, vec![2]);
        assert_eq!(backend.receive_frame(codec, &mut frame), EOF_CODE);
    }

    #[test]
    fn close_bookkeeping() {
        let mut backend = MemoryBackend::new(vec![MemoryStream::audio(0, vec![vec![1]])]);
        let mut fmt = None;
        backend.open_input("memory:a", &OpenConfig::new(), &mut fmt);
        let fmt = fmt.take().expect("format handle");

        backend.close_input(fmt);
        backend.close_input(fmt); // second close of the same handle is ignored

        assert_eq!(backend.live_formats(), 0);
        assert_eq!(backend.formats_closed(), 1);
    }

    #[test]
    fn interleaves_streams_in_packet_order() {
        let mut backend = MemoryBackend::new(vec![
            MemoryStream::video(0, vec![vec![10], vec![11]]),
            MemoryStream::audio(1, vec![vec![20]]),
        ]);
        let mut fmt = None;
        backend.open_input("memory:av", &OpenConfig::new(), &mut fmt);
        let fmt = fmt.take().expect("format handle");

        let mut packet = Packet::new();
        let mut order = Vec::new();
        while backend.read_packet(fmt, &mut packet) == 0 {
            order.push((packet.stream_index, packet.data.clone()));
        }
        assert_eq!(
            order,
            vec![(0, vec![10]), (1, vec![20]), (0, vec![11])]
        );
    }
}
