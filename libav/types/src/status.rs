/*!
    Native status codes and their translation into the error taxonomy.

    The native library reports status as an `i32`: zero or positive on
    success, negative on error. Error values come from two families:
    negated POSIX errno values (`AVERROR(errno)`) and four-character error
    tags (`FFERRTAG`). Both are preprocessor constructs in the native
    headers, so they are reproduced here as const evaluation: computed once
    at compile time, never rederived at runtime.
*/

use crate::{Error, Result};

/**
    Negate a POSIX errno into a native error code.

    Mirror of the native `AVERROR()` macro.
*/
#[inline]
pub const fn averror(errnum: i32) -> i32 {
    -errnum
}

/**
    Recover the POSIX errno from a native error code.

    Mirror of the native `AVUNERROR()` macro.
*/
#[inline]
pub const fn avunerror(code: i32) -> i32 {
    -code
}

const fn mktag(a: u8, b: u8, c: u8, d: u8) -> u32 {
    (a as u32) | ((b as u32) << 8) | ((c as u32) << 16) | ((d as u32) << 24)
}

/**
    Four-character error tag, the native `FFERRTAG()` macro.
*/
pub const fn fferrtag(a: u8, b: u8, c: u8, d: u8) -> i32 {
    -(mktag(a, b, c, d) as i32)
}

/// End of file.
pub const AVERROR_EOF: i32 = fferrtag(b'E', b'O', b'F', b' ');
/// Invalid data found when processing input.
pub const AVERROR_INVALIDDATA: i32 = fferrtag(b'I', b'N', b'D', b'A');
/// Buffer too small.
pub const AVERROR_BUFFER_TOO_SMALL: i32 = fferrtag(b'B', b'U', b'F', b'S');
/// Bitstream filter not found.
pub const AVERROR_BSF_NOT_FOUND: i32 = fferrtag(0xF8, b'B', b'S', b'F');
/// Decoder not found.
pub const AVERROR_DECODER_NOT_FOUND: i32 = fferrtag(0xF8, b'D', b'E', b'C');
/// Demuxer not found.
pub const AVERROR_DEMUXER_NOT_FOUND: i32 = fferrtag(0xF8, b'D', b'E', b'M');
/// Encoder not found.
pub const AVERROR_ENCODER_NOT_FOUND: i32 = fferrtag(0xF8, b'E', b'N', b'C');
/// Muxer not found.
pub const AVERROR_MUXER_NOT_FOUND: i32 = fferrtag(0xF8, b'M', b'U', b'X');
/// Filter not found.
pub const AVERROR_FILTER_NOT_FOUND: i32 = fferrtag(0xF8, b'F', b'I', b'L');
/// Option not found.
pub const AVERROR_OPTION_NOT_FOUND: i32 = fferrtag(0xF8, b'O', b'P', b'T');
/// Protocol not found.
pub const AVERROR_PROTOCOL_NOT_FOUND: i32 = fferrtag(0xF8, b'P', b'R', b'O');
/// Stream not found.
pub const AVERROR_STREAM_NOT_FOUND: i32 = fferrtag(0xF8, b'S', b'T', b'R');
/// Not yet implemented in the native library.
pub const AVERROR_PATCHWELCOME: i32 = fferrtag(b'P', b'A', b'W', b'E');
/// Feature is flagged experimental.
pub const AVERROR_EXPERIMENTAL: i32 = -0x2bb2afa8;
/// Generic error in an external library.
pub const AVERROR_EXTERNAL: i32 = fferrtag(b'E', b'X', b'T', b' ');
/// Unknown error, typically from an external library.
pub const AVERROR_UNKNOWN: i32 = fferrtag(b'U', b'N', b'K', b'N');
/// Internal bug in the native library.
pub const AVERROR_BUG: i32 = fferrtag(b'B', b'U', b'G', b'!');

/**
    The end-of-stream sentinel.

    Signals clean, expected end of input; not a failure.
*/
pub const EOF_CODE: i32 = AVERROR_EOF;

/**
    The would-block sentinel, `AVERROR(EAGAIN)`.

    Signals "call again after supplying more input or output capacity";
    distinct from failure.
*/
pub const EAGAIN_CODE: i32 = averror(libc::EAGAIN);

const EINVAL_CODE: i32 = averror(libc::EINVAL);
const ENOMEM_CODE: i32 = averror(libc::ENOMEM);
const ENOSPC_CODE: i32 = averror(libc::ENOSPC);
const ENOSYS_CODE: i32 = averror(libc::ENOSYS);

// The two sentinels as plain linkable integer symbols, for foreign callers
// that only link against runtime symbols and cannot read Rust consts or the
// native preprocessor macros.
#[allow(non_upper_case_globals)]
#[unsafe(no_mangle)]
pub static lav_error_eof: i32 = EOF_CODE;
#[allow(non_upper_case_globals)]
#[unsafe(no_mangle)]
pub static lav_error_eagain: i32 = EAGAIN_CODE;

/**
    Map a native negative return value into the error taxonomy.

    Total and deterministic over all negative codes. [`EOF_CODE`] is the
    only input producing [`Error::EndOfStream`] and [`EAGAIN_CODE`] the only
    input producing [`Error::WouldBlockRetry`]; unmapped codes fall into
    [`Error::Unknown`] carrying the raw value.

    Zero and positive codes are not errors and must not be passed in.
*/
pub fn translate(code: i32) -> Error {
    debug_assert!(code < 0, "translate called with non-error code {code}");
    match code {
        EOF_CODE => Error::EndOfStream,
        EAGAIN_CODE => Error::WouldBlockRetry,
        AVERROR_INVALIDDATA | EINVAL_CODE => Error::InvalidData,
        AVERROR_BSF_NOT_FOUND
        | AVERROR_DECODER_NOT_FOUND
        | AVERROR_DEMUXER_NOT_FOUND
        | AVERROR_ENCODER_NOT_FOUND
        | AVERROR_MUXER_NOT_FOUND
        | AVERROR_FILTER_NOT_FOUND
        | AVERROR_OPTION_NOT_FOUND
        | AVERROR_PROTOCOL_NOT_FOUND
        | AVERROR_STREAM_NOT_FOUND
        | AVERROR_PATCHWELCOME
        | AVERROR_EXPERIMENTAL
        | ENOSYS_CODE => Error::Unsupported,
        AVERROR_BUFFER_TOO_SMALL | ENOMEM_CODE | ENOSPC_CODE => Error::ResourceExhausted,
        other => Error::Unknown(other),
    }
}

/**
    Classify a native return value.

    Non-negative values pass through unchanged (many native calls return a
    meaningful count or index on success); negative values are translated.
    Used at every native call site so that no code is ever swallowed.
*/
#[inline]
pub fn check(ret: i32) -> Result<i32> {
    if ret >= 0 { Ok(ret) } else { Err(translate(ret)) }
}
