/*!
    The demux/decode session.
*/

use std::collections::VecDeque;

use libav_types::{Error, Frame, Packet, Result, StreamInfo};

use libav_source::{FormatContext, OpenConfig, SharedBackend};

use crate::CodecContext;

/**
    Lifecycle of a [`Session`].

    ```text
    Opened -> StreamsProbed -> Reading -> Draining -> Closed
    ```

    `Closed` is terminal. A hard error short-circuits straight to `Closed`
    from any state.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Container opened, streams not yet probed.
    Opened,
    /// Streams discovered, decoders attached, nothing read yet.
    StreamsProbed,
    /// Packets flowing.
    Reading,
    /// Input exhausted; decoders flushing their buffered tails.
    Draining,
    /// Handles released. Terminal.
    Closed,
}

/**
    A demux/decode session over one container.

    Owns the format context and one decoder per decodable stream, and
    sequences open, probe, the read/decode loop, the end-of-stream drain,
    and release. One scratch [`Packet`] is reused across the whole read
    loop.

    Must not be used from more than one thread; the type is `!Send` and
    `!Sync`, so the compiler enforces this.
*/
pub struct Session {
    format: FormatContext,
    streams: Vec<StreamInfo>,
    decoders: Vec<CodecContext>,
    state: SessionState,
    packet: Packet,
    ready: VecDeque<Frame>,
    drain_cursor: usize,
    drained: bool,
}

impl Session {
    /**
        Open a container and set the session up for reading: probes the
        streams and attaches a decoder to every decodable one.

        Fails with [`Error::Unsupported`] when the container has no
        decodable stream. On any failure every handle opened so far is
        released before returning.
    */
    pub fn open(backend: SharedBackend, url: &str, config: &OpenConfig) -> Result<Self> {
        let format = FormatContext::open(backend, url, config)?;
        let mut session = Self::from_format(format);
        session.probe()?;
        Ok(session)
    }

    /**
        Wrap an already-open container. The session starts in
        [`SessionState::Opened`]; probing happens on the first
        [`Session::next_frame`] call if [`Session::probe`] is not called
        explicitly.
    */
    pub fn from_format(format: FormatContext) -> Self {
        Self {
            format,
            streams: Vec::new(),
            decoders: Vec::new(),
            state: SessionState::Opened,
            packet: Packet::new(),
            ready: VecDeque::new(),
            drain_cursor: 0,
            drained: false,
        }
    }

    /**
        Probe the container's streams and attach decoders. No-op if the
        session is already past [`SessionState::Opened`].
    */
    pub fn probe(&mut self) -> Result<()> {
        match self.state {
            SessionState::Opened => {}
            SessionState::Closed => return Err(Error::ContextClosed),
            _ => return Ok(()),
        }

        let streams = match self.format.probe_streams() {
            Ok(streams) => streams,
            Err(e) => {
                self.fail();
                return Err(e);
            }
        };
        for stream in streams.iter().filter(|s| s.is_decodable()) {
            match CodecContext::open(&self.format, stream) {
                Ok(decoder) => self.decoders.push(decoder),
                Err(e) => {
                    self.fail();
                    return Err(e);
                }
            }
        }
        self.streams = streams;
        self.state = SessionState::StreamsProbed;
        Ok(())
    }

    /**
        The probed stream list. Empty until probing has happened.
    */
    pub fn streams(&self) -> &[StreamInfo] {
        &self.streams
    }

    /**
        Current lifecycle state.
    */
    pub fn state(&self) -> SessionState {
        self.state
    }

    /**
        Produce the next decoded frame.

        - `Ok(Some(frame))` - the next frame, possibly buffered from an
          earlier packet.
        - `Ok(None)` - clean end of stream, after every decoder has been
          drained. Terminal and repeatable.
        - `Err(WouldBlockRetry)` - transient; the session state is
          unchanged and the caller should call again.
        - any other error - hard failure; all handles are released
          immediately and the session is unusable.

        Packets on streams without an attached decoder are skipped.
    */
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            if let Some(frame) = self.ready.pop_front() {
                return Ok(Some(frame));
            }

            match self.state {
                SessionState::Closed => {
                    return if self.drained {
                        Ok(None)
                    } else {
                        Err(Error::ContextClosed)
                    };
                }
                SessionState::Opened => self.probe()?,
                SessionState::StreamsProbed | SessionState::Reading => self.read_one()?,
                SessionState::Draining => {
                    if let Some(frame) = self.drain_one()? {
                        return Ok(Some(frame));
                    }
                    if self.state == SessionState::Closed {
                        return Ok(None);
                    }
                }
            }
        }
    }

    /**
        Release every handle. Idempotent: any number of calls after the
        first are no-ops with the same observable result.
    */
    pub fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.release_handles();
        self.state = SessionState::Closed;
    }

    /// Read one packet and route it to its decoder, buffering any frames
    /// it yields. Transitions to Draining at end of input.
    fn read_one(&mut self) -> Result<()> {
        match self.format.read_packet(&mut self.packet) {
            Ok(()) => {
                self.state = SessionState::Reading;
                let stream_index = self.packet.stream_index;
                let Some(pos) = self
                    .decoders
                    .iter()
                    .position(|d| d.stream_index() == stream_index)
                else {
                    // No decoder attached to this stream; skip the packet.
                    return Ok(());
                };

                let mut frames = Vec::new();
                if let Err(e) = self.decoders[pos].decode(&self.packet, &mut frames) {
                    if e.is_failure() {
                        self.fail();
                        return Err(e);
                    }
                }
                self.ready.extend(frames);
                Ok(())
            }
            Err(Error::EndOfStream) => {
                for decoder in &mut self.decoders {
                    if let Err(e) = decoder.send_flush() {
                        if e.is_failure() {
                            self.fail();
                            return Err(e);
                        }
                    }
                }
                self.state = SessionState::Draining;
                Ok(())
            }
            Err(Error::WouldBlockRetry) => Err(Error::WouldBlockRetry),
            Err(e) => {
                self.fail();
                Err(e)
            }
        }
    }

    /// Pull one frame out of the decoder currently draining. Advances to
    /// the next decoder on end of stream and closes the session once every
    /// decoder is drained.
    fn drain_one(&mut self) -> Result<Option<Frame>> {
        while self.drain_cursor < self.decoders.len() {
            let mut frame = Frame::new();
            match self.decoders[self.drain_cursor].receive_frame(&mut frame) {
                Ok(()) => return Ok(Some(frame)),
                Err(Error::EndOfStream) => self.drain_cursor += 1,
                Err(Error::WouldBlockRetry) => return Err(Error::WouldBlockRetry),
                Err(e) => {
                    self.fail();
                    return Err(e);
                }
            }
        }
        self.drained = true;
        self.release_handles();
        self.state = SessionState::Closed;
        Ok(None)
    }

    /// Hard-error path: release everything, discard buffered frames.
    fn fail(&mut self) {
        self.ready.clear();
        self.release_handles();
        self.state = SessionState::Closed;
    }

    fn release_handles(&mut self) {
        for decoder in &mut self.decoders {
            decoder.close();
        }
        self.format.close();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("streams", &self.streams.len())
            .field("decoders", &self.decoders.len())
            .finish_non_exhaustive()
    }
}

static_assertions::assert_not_impl_any!(Session: Send, Sync);

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use libav_source::{MemoryBackend, MemoryStream};
    use libav_types::status::{AVERROR_INVALIDDATA, EAGAIN_CODE, EOF_CODE};

    use super::*;

    fn shared(backend: MemoryBackend) -> (Rc<RefCell<MemoryBackend>>, SharedBackend) {
        let rc = Rc::new(RefCell::new(backend));
        let dyn_rc: SharedBackend = rc.clone();
        (rc, dyn_rc)
    }

    fn collect_all(session: &mut Session) -> Vec<Frame> {
        let mut frames = Vec::new();
        loop {
            match session.next_frame() {
                Ok(Some(frame)) => frames.push(frame),
                Ok(None) => return frames,
                Err(Error::WouldBlockRetry) => continue,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
    }

    #[test]
    fn single_audio_stream_runs_to_end_of_stream() {
        let (rc, backend) = shared(MemoryBackend::new(vec![MemoryStream::audio(
            0,
            vec![vec![1], vec![2], vec![3], vec![4]],
        )]));
        let mut session = Session::open(backend, "memory:a", &OpenConfig::new()).unwrap();
        assert_eq!(session.state(), SessionState::StreamsProbed);

        let frames = collect_all(&mut session);
        assert_eq!(frames.len(), 4);
        assert!(frames.iter().all(|f| f.stream_index == 0));

        // Terminal and repeatable.
        assert_eq!(session.next_frame().unwrap(), None);
        assert_eq!(session.next_frame().unwrap(), None);
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(rc.borrow().live_formats(), 0);
        assert_eq!(rc.borrow().live_codecs(), 0);
    }

    #[test]
    fn delayed_decoder_tail_comes_out_during_drain() {
        let (_, backend) = shared(MemoryBackend::new(vec![
            MemoryStream::audio(0, vec![vec![1], vec![2], vec![3]]).with_decoder_delay(2),
        ]));
        let mut session = Session::open(backend, "memory:a", &OpenConfig::new()).unwrap();

        // The first frame only appears once the delay is exceeded; the
        // remaining two are buffered until the drain.
        let frames = collect_all(&mut session);
        assert_eq!(frames.len(), 3);
        assert_eq!(
            frames.iter().map(|f| f.data.clone()).collect::<Vec<_>>(),
            vec![vec![1], vec![2], vec![3]]
        );
    }

    #[test]
    fn packet_can_yield_multiple_frames() {
        let (_, backend) = shared(MemoryBackend::new(vec![
            MemoryStream::audio(0, vec![vec![1], vec![2]]).with_frames_per_packet(2),
        ]));
        let mut session = Session::open(backend, "memory:a", &OpenConfig::new()).unwrap();

        assert_eq!(collect_all(&mut session).len(), 4);
    }

    #[test]
    fn two_streams_both_decode() {
        let (_, backend) = shared(MemoryBackend::new(vec![
            MemoryStream::video(0, vec![vec![10], vec![11]]),
            MemoryStream::audio(1, vec![vec![20], vec![21]]),
        ]));
        let mut session = Session::open(backend, "memory:av", &OpenConfig::new()).unwrap();
        assert_eq!(session.streams().len(), 2);

        let frames = collect_all(&mut session);
        assert_eq!(frames.len(), 4);
        assert_eq!(frames.iter().filter(|f| f.stream_index == 0).count(), 2);
        assert_eq!(frames.iter().filter(|f| f.stream_index == 1).count(), 2);
    }

    #[test]
    fn packets_without_a_decoder_are_skipped() {
        let mut data = MemoryStream::data(1);
        data.packets = vec![vec![99], vec![98]];
        let (_, backend) = shared(MemoryBackend::new(vec![
            MemoryStream::audio(0, vec![vec![1], vec![2]]),
            data,
        ]));
        let mut session = Session::open(backend, "memory:ad", &OpenConfig::new()).unwrap();

        let frames = collect_all(&mut session);
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|f| f.stream_index == 0));
    }

    #[test]
    fn corrupt_container_fails_open_without_leaking() {
        let (rc, backend) = shared(
            MemoryBackend::new(vec![MemoryStream::audio(0, vec![vec![1]])])
                .with_open_error(AVERROR_INVALIDDATA),
        );

        let result = Session::open(backend, "memory:bad", &OpenConfig::new());
        assert_eq!(result.err(), Some(Error::InvalidData));
        assert_eq!(rc.borrow().live_formats(), 0);
        assert_eq!(rc.borrow().live_codecs(), 0);
    }

    #[test]
    fn corrupt_probe_fails_without_leaking() {
        let (rc, backend) = shared(
            MemoryBackend::new(vec![MemoryStream::audio(0, vec![vec![1]])])
                .with_probe_error(AVERROR_INVALIDDATA),
        );

        let result = Session::open(backend, "memory:bad", &OpenConfig::new());
        assert_eq!(result.err(), Some(Error::InvalidData));
        assert_eq!(rc.borrow().live_formats(), 0);
        assert_eq!(rc.borrow().live_codecs(), 0);
    }

    #[test]
    fn container_without_decodable_streams_is_unsupported() {
        let (rc, backend) = shared(MemoryBackend::new(vec![MemoryStream::data(0)]));

        let result = Session::open(backend, "memory:data", &OpenConfig::new());
        assert_eq!(result.err(), Some(Error::Unsupported));
        assert_eq!(rc.borrow().live_formats(), 0);
    }

    #[test]
    fn would_block_is_transient_and_retryable() {
        let (_, backend) = shared(
            MemoryBackend::new(vec![MemoryStream::audio(0, vec![vec![1], vec![2]])])
                .with_read_fault(1, EAGAIN_CODE),
        );
        let mut session = Session::open(backend, "memory:a", &OpenConfig::new()).unwrap();

        let first = session.next_frame().unwrap().expect("first frame");
        assert_eq!(first.data, vec![1]);

        // Transient: the state machine does not advance or fail.
        assert_eq!(session.next_frame().err(), Some(Error::WouldBlockRetry));
        assert_eq!(session.state(), SessionState::Reading);

        let second = session.next_frame().unwrap().expect("second frame");
        assert_eq!(second.data, vec![2]);
        assert_eq!(session.next_frame().unwrap(), None);
    }

    #[test]
    fn hard_read_error_closes_the_session_immediately() {
        let (rc, backend) = shared(
            MemoryBackend::new(vec![MemoryStream::audio(0, vec![vec![1], vec![2]])])
                .with_read_fault(1, AVERROR_INVALIDDATA),
        );
        let mut session = Session::open(backend, "memory:a", &OpenConfig::new()).unwrap();

        session.next_frame().unwrap();
        assert_eq!(session.next_frame().err(), Some(Error::InvalidData));
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(rc.borrow().live_formats(), 0);
        assert_eq!(rc.borrow().live_codecs(), 0);

        // Unusable afterwards.
        assert_eq!(session.next_frame().err(), Some(Error::ContextClosed));
    }

    #[test]
    fn close_is_idempotent() {
        let (rc, backend) = shared(MemoryBackend::new(vec![MemoryStream::audio(
            0,
            vec![vec![1]],
        )]));
        let mut session = Session::open(backend, "memory:a", &OpenConfig::new()).unwrap();

        session.close();
        session.close();
        session.close();

        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(rc.borrow().formats_closed(), 1);
        assert_eq!(rc.borrow().codecs_closed(), 1);
        assert_eq!(session.next_frame().err(), Some(Error::ContextClosed));
    }

    #[test]
    fn drop_releases_everything() {
        let (rc, backend) = shared(MemoryBackend::new(vec![MemoryStream::audio(
            0,
            vec![vec![1]],
        )]));
        {
            let _session = Session::open(backend, "memory:a", &OpenConfig::new()).unwrap();
            assert_eq!(rc.borrow().live_formats(), 1);
            assert_eq!(rc.borrow().live_codecs(), 1);
        }
        assert_eq!(rc.borrow().live_formats(), 0);
        assert_eq!(rc.borrow().live_codecs(), 0);
    }

    #[test]
    fn two_phase_setup_probes_lazily() {
        let (_, backend) = shared(MemoryBackend::new(vec![MemoryStream::audio(
            0,
            vec![vec![1]],
        )]));
        let format = FormatContext::open(backend, "memory:a", &OpenConfig::new()).unwrap();
        let mut session = Session::from_format(format);
        assert_eq!(session.state(), SessionState::Opened);
        assert!(session.streams().is_empty());

        let frame = session.next_frame().unwrap().expect("frame after lazy probe");
        assert_eq!(frame.data, vec![1]);
        assert_eq!(session.state(), SessionState::Reading);
    }

    #[test]
    fn eof_sentinel_drives_the_drain_transition() {
        // A read fault injecting the end-of-stream sentinel early cuts the
        // container short: the session drains cleanly at that point.
        let (_, backend) = shared(
            MemoryBackend::new(vec![MemoryStream::audio(0, vec![vec![1], vec![2]])])
                .with_read_fault(1, EOF_CODE),
        );
        let mut session = Session::open(backend, "memory:a", &OpenConfig::new()).unwrap();

        let frames = collect_all(&mut session);
        assert_eq!(frames.len(), 1);
        assert_eq!(session.state(), SessionState::Closed);
    }
}
