/*!
    Shared types for the libav binding crates.

    This crate defines the vocabulary of the binding layer, the types that
    cross crate boundaries. It has no dependency on the native library, so
    consumers can depend on it without pulling in any linkage.

    # Error Handling

    - [`Error`] and [`Result`] - The closed error taxonomy of the binding
    - [`status`] - Native status-code table and the [`status::translate`]
      function mapping raw negative returns into the taxonomy

    # Data Types

    - [`Packet`] - Compressed data read from a container stream
    - [`Frame`] - Decoded samples or pixels
    - [`Rational`] and [`Pts`] - Time bases and timestamps

    # Stream Metadata

    - [`StreamInfo`] - Per-stream metadata surfaced by probing
    - [`MediaType`] and [`CodecId`] - Stream and codec classification
*/

mod error;
mod frame;
mod packet;
mod stream;
mod time;

pub mod status;

pub use error::{Error, Result};
pub use frame::{Frame, FrameProps};
pub use packet::Packet;
pub use stream::{CodecId, MediaType, StreamInfo};
pub use time::{Pts, Rational};
