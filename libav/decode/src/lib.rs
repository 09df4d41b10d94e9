/*!
    Decoding and the demux/decode session for the libav binding crates.

    This crate turns an open container into decoded frames. It owns the
    decoder-side handle wrapper ([`CodecContext`]) and the [`Session`]
    state machine that sequences open, probe, the read/decode loop, the
    end-of-stream drain, and release.

    # Example

    ```
    use std::cell::RefCell;
    use std::rc::Rc;

    use libav_decode::Session;
    use libav_source::{MemoryBackend, MemoryStream, OpenConfig, SharedBackend};

    let backend: SharedBackend = Rc::new(RefCell::new(MemoryBackend::new(vec![
        MemoryStream::audio(0, vec![vec![1, 2], vec![3, 4]]),
    ])));

    let mut session = Session::open(backend, "memory:demo", &OpenConfig::new())?;
    while let Some(frame) = session.next_frame()? {
        assert_eq!(frame.stream_index, 0);
    }
    // next_frame returned Ok(None): clean end of stream, handles released.
    # Ok::<(), libav_types::Error>(())
    ```

    # Retry semantics

    [`Session::next_frame`] never retries internally. A transient
    would-block condition is surfaced as
    [`libav_types::Error::WouldBlockRetry`] and the caller decides whether
    and when to call again; the session state is unchanged by it.
*/

mod codec;
mod session;

pub use codec::CodecContext;
pub use session::{Session, SessionState};

pub use libav_source::{FormatContext, OpenConfig, SharedBackend};
pub use libav_types::{Error, Frame, Packet, Result};

/**
    Open a container with default settings and set up a session for it.

    Shorthand for [`Session::open`] with [`OpenConfig::new`].
*/
pub fn open(backend: SharedBackend, url: &str) -> Result<Session> {
    Session::open(backend, url, &OpenConfig::new())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use libav_source::{MemoryBackend, MemoryStream};

    use super::*;

    #[test]
    fn open_shorthand_builds_a_ready_session() {
        let backend: SharedBackend = Rc::new(RefCell::new(MemoryBackend::new(vec![
            MemoryStream::audio(0, vec![vec![1]]),
        ])));

        let mut session = open(backend, "memory:a").unwrap();
        assert_eq!(session.state(), SessionState::StreamsProbed);
        assert!(session.next_frame().unwrap().is_some());
    }
}
