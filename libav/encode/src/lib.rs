/*!
    Encoding for the libav binding crates.

    The mirror image of the decode side: frames go in, packets come out.
    [`Encoder`] wraps a native encoder handle with the same send/receive
    contract as decoding: a frame may yield zero or more packets, the
    would-block sentinel means "supply more frames", and
    [`Encoder::finish`] drains the encoder's buffered tail at end of
    input.

    # Example

    ```
    use std::cell::RefCell;
    use std::rc::Rc;

    use libav_encode::Encoder;
    use libav_source::{MemoryBackend, SharedBackend};
    use libav_types::{CodecId, Frame};

    let backend: SharedBackend = Rc::new(RefCell::new(MemoryBackend::new(vec![])));

    let mut encoder = Encoder::open(backend, CodecId::Opus)?;
    let mut packets = Vec::new();

    let frame = Frame { data: vec![1, 2, 3], ..Frame::new() };
    encoder.encode(&frame, &mut packets)?;
    encoder.finish(&mut packets)?;
    assert_eq!(packets.len(), 1);
    # Ok::<(), libav_types::Error>(())
    ```
*/

use libav_types::{CodecId, Error, Frame, Packet, Result, status};

use libav_source::{CodecHandle, SharedBackend};

/**
    Exclusively owned wrapper around an open encoder.

    Released exactly once by [`Encoder::close`] or on drop.
*/
pub struct Encoder {
    backend: SharedBackend,
    handle: Option<CodecHandle>,
    codec: CodecId,
}

impl Encoder {
    /**
        Create and open an encoder for the given codec.

        Fails with [`Error::Unsupported`] when the native library has no
        encoder for it.
    */
    pub fn open(backend: SharedBackend, codec: CodecId) -> Result<Self> {
        let mut out = None;
        let ret = backend.borrow_mut().open_encoder(codec, &mut out);
        status::check(ret)?;
        let handle = out.ok_or(Error::Unknown(status::AVERROR_UNKNOWN))?;

        Ok(Self {
            backend,
            handle: Some(handle),
            codec,
        })
    }

    /**
        The codec this encoder produces.
    */
    pub fn codec(&self) -> CodecId {
        self.codec
    }

    /**
        Feed one raw frame to the encoder.
    */
    pub fn send_frame(&mut self, frame: &Frame) -> Result<()> {
        let handle = self.handle()?;
        status::check(self.backend.borrow_mut().send_frame(handle, Some(frame)))?;
        Ok(())
    }

    /**
        Signal end of input, putting the encoder into draining mode.
    */
    pub fn send_flush(&mut self) -> Result<()> {
        let handle = self.handle()?;
        status::check(self.backend.borrow_mut().send_frame(handle, None))?;
        Ok(())
    }

    /**
        Receive the next encoded packet into `packet` (reset and refilled
        in place).
    */
    pub fn receive_packet(&mut self, packet: &mut Packet) -> Result<()> {
        let handle = self.handle()?;
        status::check(self.backend.borrow_mut().receive_packet(handle, packet))?;
        Ok(())
    }

    /**
        Encode one frame, appending every packet it yields to `packets`.

        Encoders buffer: a frame may yield zero packets now and more
        later, so callers must [`Encoder::finish`] once input ends.
    */
    pub fn encode(&mut self, frame: &Frame, packets: &mut Vec<Packet>) -> Result<()> {
        match self.send_frame(frame) {
            Ok(()) => {}
            Err(Error::WouldBlockRetry) => {
                self.collect_available(packets)?;
                self.send_frame(frame)?;
            }
            Err(e) => return Err(e),
        }
        self.collect_available(packets)
    }

    /**
        Flush the encoder at end of input, appending every remaining
        packet to `packets`.
    */
    pub fn finish(&mut self, packets: &mut Vec<Packet>) -> Result<()> {
        self.send_flush()?;
        loop {
            let mut packet = Packet::new();
            match self.receive_packet(&mut packet) {
                Ok(()) => packets.push(packet),
                Err(Error::EndOfStream) => return Ok(()),
                Err(Error::WouldBlockRetry) => return Err(Error::WouldBlockRetry),
                Err(e) => return Err(e),
            }
        }
    }

    fn collect_available(&mut self, packets: &mut Vec<Packet>) -> Result<()> {
        loop {
            let mut packet = Packet::new();
            match self.receive_packet(&mut packet) {
                Ok(()) => packets.push(packet),
                Err(Error::WouldBlockRetry) | Err(Error::EndOfStream) => return Ok(()),
                Err(e) => return Err(e),
            }
        }
    }

    /**
        Release the native handle. Idempotent.
    */
    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.backend.borrow_mut().close_codec(handle);
        }
    }

    /**
        Returns true until the encoder has been closed.
    */
    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    fn handle(&self) -> Result<CodecHandle> {
        self.handle.ok_or(Error::ContextClosed)
    }
}

impl Drop for Encoder {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Encoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encoder")
            .field("handle", &self.handle)
            .field("codec", &self.codec)
            .finish()
    }
}

static_assertions::assert_not_impl_any!(Encoder: Send, Sync);
