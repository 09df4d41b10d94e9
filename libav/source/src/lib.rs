/*!
    Native boundary and demuxing for the libav binding crates.

    This crate holds the seam between safe code and the native library, and
    the demux half of the binding built on top of it:

    - [`LibavBackend`] - the trait mirroring the native function surface.
      Every method returns a raw `i32` status in the native convention
      (negative = error-table code); the safe layer classifies each return
      through [`libav_types::status::check`]. A real FFI implementation
      linking the native library plugs in here; it is not part of this
      workspace.
    - [`FormatContext`] - exclusively owned wrapper around an open
      container handle. Guarantees exactly-once release on every exit path
      and fails fast with [`Error::ContextClosed`] after close.
    - [`MemoryBackend`] - a deterministic in-memory backend for tests and
      development builds without the native library.

    # Example

    ```
    use std::cell::RefCell;
    use std::rc::Rc;

    use libav_source::{FormatContext, MemoryBackend, MemoryStream, OpenConfig, SharedBackend};
    use libav_types::Packet;

    let backend: SharedBackend = Rc::new(RefCell::new(MemoryBackend::new(vec![
        MemoryStream::audio(0, vec![vec![1, 2, 3], vec![4, 5]]),
    ])));

    let mut format = FormatContext::open(backend, "memory:demo", &OpenConfig::new())?;
    let streams = format.probe_streams()?;
    assert_eq!(streams.len(), 1);

    let mut packet = Packet::new();
    format.read_packet(&mut packet)?;
    assert_eq!(packet.data, vec![1, 2, 3]);
    # Ok::<(), libav_types::Error>(())
    ```

    # Threading

    The whole binding is single-threaded and synchronous, matching the
    native library's own threading contract. [`SharedBackend`] is an
    `Rc<RefCell<..>>`, so contexts are `!Send` and `!Sync` by construction
    and cross-thread use is rejected at compile time.
*/

mod backend;
mod config;
mod format;
mod memory;

pub use backend::{CodecHandle, FormatHandle, LibavBackend, SharedBackend};
pub use config::OpenConfig;
pub use format::FormatContext;
pub use memory::{MemoryBackend, MemoryStream};

pub use libav_types::{Error, Packet, Result, StreamInfo};
