/*!
    Format context wrapper.
*/

use libav_types::{Error, Packet, Result, StreamInfo, status};

use crate::{FormatHandle, OpenConfig, SharedBackend};

/**
    Exclusively owned wrapper around an open container.

    Created by [`FormatContext::open`], released exactly once by
    [`FormatContext::close`] or on drop, whichever comes first. The handle
    is held in an `Option` that is taken on close, so every method reached
    after release fails with [`Error::ContextClosed`] instead of touching a
    dead native handle.
*/
pub struct FormatContext {
    backend: SharedBackend,
    handle: Option<FormatHandle>,
}

impl FormatContext {
    /**
        Open a container.

        On a negative native return the error is classified and surfaced;
        the native open leaves nothing allocated on its failure path.
    */
    pub fn open(backend: SharedBackend, url: &str, config: &OpenConfig) -> Result<Self> {
        let mut out = None;
        let ret = backend.borrow_mut().open_input(url, config, &mut out);
        status::check(ret)?;
        let handle = out.ok_or(Error::Unknown(status::AVERROR_UNKNOWN))?;
        Ok(Self {
            backend,
            handle: Some(handle),
        })
    }

    /**
        Probe the container and return its stream list.

        Fails with [`Error::Unsupported`] when no stream in the container
        is decodable.
    */
    pub fn probe_streams(&mut self) -> Result<Vec<StreamInfo>> {
        let handle = self.handle()?;
        let mut backend = self.backend.borrow_mut();

        status::check(backend.find_stream_info(handle))?;
        let count = status::check(backend.stream_count(handle))? as usize;

        let mut streams = Vec::with_capacity(count);
        for index in 0..count {
            let mut out = None;
            status::check(backend.stream_info(handle, index, &mut out))?;
            if let Some(info) = out {
                streams.push(info);
            }
        }

        if !streams.iter().any(StreamInfo::is_decodable) {
            return Err(Error::Unsupported);
        }
        Ok(streams)
    }

    /**
        Read the next packet in container order into `packet`.

        The packet is reset first and refilled in place, so one packet
        allocation serves the whole read loop. Returns
        [`Error::EndOfStream`] after the last packet and
        [`Error::WouldBlockRetry`] when the caller should retry the same
        call.
    */
    pub fn read_packet(&mut self, packet: &mut Packet) -> Result<()> {
        let handle = self.handle()?;
        packet.reset();
        status::check(self.backend.borrow_mut().read_packet(handle, packet))?;
        Ok(())
    }

    /**
        Release the native handle. Idempotent: the first call releases,
        every later call is a no-op.
    */
    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.backend.borrow_mut().close_input(handle);
        }
    }

    /**
        Returns true until the context has been closed.
    */
    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /**
        The native handle, for attaching codec contexts to this container.
    */
    pub fn handle(&self) -> Result<FormatHandle> {
        self.handle.ok_or(Error::ContextClosed)
    }

    /**
        The backend this context was opened from.
    */
    pub fn backend(&self) -> SharedBackend {
        SharedBackend::clone(&self.backend)
    }
}

impl Drop for FormatContext {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for FormatContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatContext")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

// Same-thread use only, enforced at compile time.
static_assertions::assert_not_impl_any!(FormatContext: Send, Sync);

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use libav_types::status::{AVERROR_INVALIDDATA, EAGAIN_CODE};

    use super::*;
    use crate::{MemoryBackend, MemoryStream};

    fn shared(backend: MemoryBackend) -> (Rc<RefCell<MemoryBackend>>, SharedBackend) {
        let rc = Rc::new(RefCell::new(backend));
        let dyn_rc: SharedBackend = rc.clone();
        (rc, dyn_rc)
    }

    fn one_audio_stream() -> Vec<MemoryStream> {
        vec![MemoryStream::audio(0, vec![vec![1, 2], vec![3, 4], vec![5]])]
    }

    #[test]
    fn open_probe_read_to_end() {
        let (_, backend) = shared(MemoryBackend::new(one_audio_stream()));
        let mut format = FormatContext::open(backend, "memory:a", &OpenConfig::new()).unwrap();

        let streams = format.probe_streams().unwrap();
        assert_eq!(streams.len(), 1);
        assert!(streams[0].is_decodable());

        let mut packet = Packet::new();
        let mut read = 0;
        loop {
            match format.read_packet(&mut packet) {
                Ok(()) => {
                    assert_eq!(packet.stream_index, 0);
                    read += 1;
                }
                Err(Error::EndOfStream) => break,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(read, 3);
    }

    #[test]
    fn failed_open_leaks_nothing() {
        let (rc, backend) = shared(
            MemoryBackend::new(one_audio_stream()).with_open_error(AVERROR_INVALIDDATA),
        );

        let result = FormatContext::open(backend, "memory:bad", &OpenConfig::new());
        assert_eq!(result.err(), Some(Error::InvalidData));
        assert_eq!(rc.borrow().live_formats(), 0);
    }

    #[test]
    fn probe_with_no_decodable_streams_is_unsupported() {
        let (_, backend) = shared(MemoryBackend::new(vec![MemoryStream::data(0)]));
        let mut format = FormatContext::open(backend, "memory:data", &OpenConfig::new()).unwrap();

        assert_eq!(format.probe_streams().err(), Some(Error::Unsupported));
    }

    #[test]
    fn would_block_is_transient() {
        let (_, backend) =
            shared(MemoryBackend::new(one_audio_stream()).with_read_fault(1, EAGAIN_CODE));
        let mut format = FormatContext::open(backend, "memory:a", &OpenConfig::new()).unwrap();
        format.probe_streams().unwrap();

        let mut packet = Packet::new();
        format.read_packet(&mut packet).unwrap();
        // Second read blocks once, then the retry succeeds.
        assert_eq!(
            format.read_packet(&mut packet).err(),
            Some(Error::WouldBlockRetry)
        );
        format.read_packet(&mut packet).unwrap();
        assert_eq!(packet.data, vec![3, 4]);
    }

    #[test]
    fn close_is_idempotent_and_releases_once() {
        let (rc, backend) = shared(MemoryBackend::new(one_audio_stream()));
        let mut format = FormatContext::open(backend, "memory:a", &OpenConfig::new()).unwrap();
        assert_eq!(rc.borrow().live_formats(), 1);

        format.close();
        format.close();
        format.close();

        assert_eq!(rc.borrow().live_formats(), 0);
        assert_eq!(rc.borrow().formats_closed(), 1);
    }

    #[test]
    fn use_after_close_fails_fast() {
        let (_, backend) = shared(MemoryBackend::new(one_audio_stream()));
        let mut format = FormatContext::open(backend, "memory:a", &OpenConfig::new()).unwrap();
        format.close();

        assert!(!format.is_open());
        assert_eq!(format.handle().err(), Some(Error::ContextClosed));
        assert_eq!(format.probe_streams().err(), Some(Error::ContextClosed));
        let mut packet = Packet::new();
        assert_eq!(
            format.read_packet(&mut packet).err(),
            Some(Error::ContextClosed)
        );
    }

    #[test]
    fn drop_releases_exactly_once() {
        let (rc, backend) = shared(MemoryBackend::new(one_audio_stream()));
        {
            let _format = FormatContext::open(backend, "memory:a", &OpenConfig::new()).unwrap();
            assert_eq!(rc.borrow().live_formats(), 1);
        }
        assert_eq!(rc.borrow().live_formats(), 0);
        assert_eq!(rc.borrow().formats_closed(), 1);
    }

    #[test]
    fn close_then_drop_does_not_release_twice() {
        let (rc, backend) = shared(MemoryBackend::new(one_audio_stream()));
        {
            let mut format = FormatContext::open(backend, "memory:a", &OpenConfig::new()).unwrap();
            format.close();
        }
        assert_eq!(rc.borrow().formats_closed(), 1);
    }
}
