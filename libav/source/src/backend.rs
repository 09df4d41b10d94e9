/*!
    The native function surface the binding adapts.
*/

use std::cell::RefCell;
use std::rc::Rc;

use libav_types::{CodecId, Frame, Packet, StreamInfo};

use crate::OpenConfig;

/**
    Opaque handle to an open native format context.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FormatHandle(pub u64);

/**
    Opaque handle to an open native codec context (decoder or encoder).
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CodecHandle(pub u64);

/**
    The native library boundary.

    One method per native call the binding uses, each keeping the C calling
    convention: a raw `i32` status return (zero or positive on success,
    error-table code when negative) and out-parameters for produced handles
    and data. The safe layer passes every return through
    [`libav_types::status::check`]; no code is ever swallowed.

    Handle ownership lives in the wrapper types, not here: a backend must
    tolerate calls on released or unknown handles by returning
    `AVERROR(EINVAL)` rather than exhibiting undefined behavior.
*/
pub trait LibavBackend {
    /// Open a container for reading. Mirrors `avformat_open_input`.
    /// On failure no handle is produced and nothing is left allocated.
    fn open_input(&mut self, url: &str, config: &OpenConfig, out: &mut Option<FormatHandle>)
    -> i32;

    /// Inspect the container to discover its streams. Mirrors
    /// `avformat_find_stream_info`.
    fn find_stream_info(&mut self, format: FormatHandle) -> i32;

    /// Number of streams in the container, as a non-negative return.
    fn stream_count(&mut self, format: FormatHandle) -> i32;

    /// Metadata of one stream.
    fn stream_info(&mut self, format: FormatHandle, index: usize, out: &mut Option<StreamInfo>)
    -> i32;

    /// Read the next packet in container order into `packet`. Mirrors
    /// `av_read_frame`: returns 0 when a packet was produced, the
    /// end-of-stream sentinel after the last packet, the would-block
    /// sentinel when input is transiently unavailable, or a hard error.
    fn read_packet(&mut self, format: FormatHandle, packet: &mut Packet) -> i32;

    /// Release the format context. Mirrors `avformat_close_input`.
    fn close_input(&mut self, format: FormatHandle);

    /// Create and open a decoder for one stream of an open container.
    /// Mirrors the `avcodec_find_decoder` / `avcodec_alloc_context3` /
    /// `avcodec_parameters_to_context` / `avcodec_open2` sequence.
    fn open_decoder(
        &mut self,
        format: FormatHandle,
        stream_index: usize,
        out: &mut Option<CodecHandle>,
    ) -> i32;

    /// Create and open an encoder for a codec. Mirrors
    /// `avcodec_find_encoder` + `avcodec_open2`.
    fn open_encoder(&mut self, codec: CodecId, out: &mut Option<CodecHandle>) -> i32;

    /// Feed a packet to a decoder; `None` signals end of input (drain).
    /// Mirrors `avcodec_send_packet`.
    fn send_packet(&mut self, codec: CodecHandle, packet: Option<&Packet>) -> i32;

    /// Receive the next decoded frame into `frame`. Mirrors
    /// `avcodec_receive_frame`: the would-block sentinel means more input
    /// is needed, the end-of-stream sentinel means the decoder is fully
    /// drained.
    fn receive_frame(&mut self, codec: CodecHandle, frame: &mut Frame) -> i32;

    /// Feed a frame to an encoder; `None` signals end of input (drain).
    /// Mirrors `avcodec_send_frame`.
    fn send_frame(&mut self, codec: CodecHandle, frame: Option<&Frame>) -> i32;

    /// Receive the next encoded packet into `packet`. Mirrors
    /// `avcodec_receive_packet`.
    fn receive_packet(&mut self, codec: CodecHandle, packet: &mut Packet) -> i32;

    /// Release a codec context. Mirrors `avcodec_free_context`.
    fn close_codec(&mut self, codec: CodecHandle);
}

/**
    A backend shared by the contexts opened from it.

    Single ownership domain, single thread: `Rc<RefCell<..>>` matches the
    native library's threading contract and makes every context type
    `!Send` and `!Sync`.
*/
pub type SharedBackend = Rc<RefCell<dyn LibavBackend>>;
