/*!
    Codec context wrapper (decoder side).
*/

use libav_types::{Error, Frame, Packet, Result, StreamInfo, status};

use libav_source::{CodecHandle, FormatContext, SharedBackend};

/**
    Exclusively owned wrapper around an open decoder.

    Created from one probed stream of an open [`FormatContext`]; its
    native lifetime must not outlast the container it was created from.
    Released exactly once by [`CodecContext::close`] or on drop.
*/
pub struct CodecContext {
    backend: SharedBackend,
    handle: Option<CodecHandle>,
    stream_index: usize,
}

impl CodecContext {
    /**
        Create and open a decoder for one stream of an open container.

        Fails fast with [`Error::ContextClosed`] if the format context has
        already been released, and with [`Error::Unsupported`] when the
        native library has no decoder for the stream.
    */
    pub fn open(format: &FormatContext, stream: &StreamInfo) -> Result<Self> {
        let format_handle = format.handle()?;
        let backend = format.backend();

        let mut out = None;
        let ret = backend
            .borrow_mut()
            .open_decoder(format_handle, stream.index, &mut out);
        status::check(ret)?;
        let handle = out.ok_or(Error::Unknown(status::AVERROR_UNKNOWN))?;

        Ok(Self {
            backend,
            handle: Some(handle),
            stream_index: stream.index,
        })
    }

    /**
        Index of the stream this decoder consumes.
    */
    pub fn stream_index(&self) -> usize {
        self.stream_index
    }

    /**
        Feed one packet of compressed data to the decoder.

        [`Error::WouldBlockRetry`] means the decoder wants its output
        drained before taking more input; it is not a failure.
    */
    pub fn send_packet(&mut self, packet: &Packet) -> Result<()> {
        let handle = self.handle()?;
        status::check(self.backend.borrow_mut().send_packet(handle, Some(packet)))?;
        Ok(())
    }

    /**
        Signal end of input, putting the decoder into draining mode.
    */
    pub fn send_flush(&mut self) -> Result<()> {
        let handle = self.handle()?;
        status::check(self.backend.borrow_mut().send_packet(handle, None))?;
        Ok(())
    }

    /**
        Receive the next decoded frame into `frame` (reset and refilled in
        place).

        [`Error::WouldBlockRetry`] means more packets are needed before
        more frames come out; [`Error::EndOfStream`] means the decoder is
        fully drained. Neither is a failure.
    */
    pub fn receive_frame(&mut self, frame: &mut Frame) -> Result<()> {
        let handle = self.handle()?;
        status::check(self.backend.borrow_mut().receive_frame(handle, frame))?;
        Ok(())
    }

    /**
        Decode one packet, appending every frame it yields to `frames`.

        A packet may yield zero, one, or multiple frames depending on the
        codec. All frames available so far are drained before returning, so
        the caller can immediately supply the next packet.
    */
    pub fn decode(&mut self, packet: &Packet, frames: &mut Vec<Frame>) -> Result<()> {
        match self.send_packet(packet) {
            Ok(()) => {}
            Err(Error::WouldBlockRetry) => {
                // The decoder is output-bound: drain, then resend once.
                self.collect_available(frames)?;
                self.send_packet(packet)?;
            }
            Err(e) => return Err(e),
        }
        self.collect_available(frames)
    }

    fn collect_available(&mut self, frames: &mut Vec<Frame>) -> Result<()> {
        loop {
            let mut frame = Frame::new();
            match self.receive_frame(&mut frame) {
                Ok(()) => frames.push(frame),
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
        Returns true until the context has been closed.
    */
    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    fn handle(&self) -> Result<CodecHandle> {
        self.handle.ok_or(Error::ContextClosed)
    }
}

impl Drop for CodecContext {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for CodecContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecContext")
            .field("handle", &self.handle)
            .field("stream_index", &self.stream_index)
            .finish()
    }
}

static_assertions::assert_not_impl_any!(CodecContext: Send, Sync);
