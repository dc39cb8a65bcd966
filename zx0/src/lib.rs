//! Decoder for Einar Saukas' "classic" ZX0 format, built for targets where the
//! output lands in banked or paged memory.
//!
//! Streams are made by an external compressor (`salvador -classic`, add
//! `-w <size>` when the output goes through a [`Window`]). Every bound is
//! checked: a malformed stream is reported as a [`DecodeError`] rather than
//! reading or writing out of range.

mod bits;
mod decode;
mod sink;
mod window;

#[cfg(any(test, feature = "tokens"))]
#[doc(hidden)]
pub mod tokens;

pub use {
    bits::{BitReader, Source, SliceSource},
    decode::{decompress, Session},
    sink::{Device, Sink, SliceSink, WindowSink},
    window::{PagedAddr, Window, WindowError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("compressed stream ended before the end marker")]
    Underrun,
    #[error("output does not fit in the destination")]
    Overrun,
    #[error("match reaches {distance} bytes back from output position {position}")]
    OffsetOutOfRange { distance: usize, position: usize },
    #[error("interlaced gamma value does not fit in 16 bits")]
    GammaOverflow,
    #[error("offset high part {0} is out of range")]
    BadOffset(u32),
    #[error(transparent)]
    Window(#[from] WindowError),
}

pub fn decompress_to_vec(compressed: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::with_capacity(compressed.len() * 2);
    decompress(&mut SliceSource::new(compressed), &mut out)?;
    Ok(out)
}

/// Decodes into a caller-sized buffer and returns how much of it was filled.
pub fn decompress_into(compressed: &[u8], out: &mut [u8]) -> Result<usize, DecodeError> {
    let mut sink = SliceSink::new(out);
    decompress(&mut SliceSource::new(compressed), &mut sink)?;
    Ok(sink.position())
}

/// Decodes through a ring buffer into a write-only device. `ring` must be
/// exactly `window.size()` bytes long and the stream must have been made for
/// a window of that size.
pub fn decompress_windowed<D: Device>(
    compressed: &[u8],
    ring: &mut [u8],
    window: Window,
    device: D,
) -> Result<usize, DecodeError>
{
    let mut sink = WindowSink::new(ring, window, device)?;
    decompress(&mut SliceSource::new(compressed), &mut sink)?;
    Ok(sink.position())
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::tokens::{encode, Token::*},
    };

    #[test]
    fn minimal_stream_is_one_literal_and_eof() {
        let stream = encode(&[Literals(b"A")]);
        assert_eq!(stream, [0xc0, b'A', 0x00, 0x20]);
        assert_eq!(decompress_to_vec(&stream).unwrap(), b"A");
    }

    #[test]
    fn literal_only_stream_reproduces_input() {
        let text = b"The quick brown fox jumps over the lazy dog";
        let stream = encode(&[Literals(text)]);
        assert_eq!(decompress_to_vec(&stream).unwrap(), text);
        // one literal run costs only the run length, the bytes themselves and the end marker
        assert!(stream.len() < text.len() + 6);
    }

    #[test]
    fn all_symbol_kinds() {
        let stream = encode(&[
            Literals(b"abc"),
            Match { distance: 3, len: 6 },
            Literals(b"x"),
            Repeat(4),
            Match { distance: 1, len: 3 },
            Literals(b"yz"),
        ]);
        assert_eq!(decompress_to_vec(&stream).unwrap(), b"abcabcabcxbcxbbbbyz");
    }

    #[test]
    fn into_buffer_reports_length() {
        let stream = encode(&[Literals(b"ab"), Match { distance: 2, len: 4 }]);
        let mut out = [0u8; 16];
        let n = decompress_into(&stream, &mut out).unwrap();
        assert_eq!(&out[..n], b"ababab");
    }

    #[test]
    fn into_buffer_too_small() {
        let stream = encode(&[Literals(b"ab"), Match { distance: 2, len: 4 }]);
        let mut out = [0u8; 5];
        assert_eq!(decompress_into(&stream, &mut out), Err(DecodeError::Overrun));
    }

    #[test]
    fn truncated_stream() {
        let stream = encode(&[Literals(b"hello"), Match { distance: 5, len: 5 }]);
        for cut in 0..stream.len() {
            assert_eq!(
                decompress_to_vec(&stream[..cut]),
                Err(DecodeError::Underrun),
                "cut at {cut}",
            );
        }
    }

    #[test]
    fn match_before_start_of_output() {
        let stream = encode(&[Literals(b"ab"), Match { distance: 3, len: 2 }]);
        assert_eq!(
            decompress_to_vec(&stream),
            Err(DecodeError::OffsetOutOfRange { distance: 3, position: 2 }),
        );
    }

    #[test]
    fn windowed_into_device() {
        let stream = encode(&[Literals(b"ab"), Match { distance: 2, len: 4 }]);
        let mut ring = [0u8; 256];
        let mut written = Vec::<u8>::new();
        let window = Window::new(0x3800, 256).unwrap();
        let n = decompress_windowed(&stream, &mut ring, window, &mut written).unwrap();
        assert_eq!(n, 6);
        assert_eq!(written, b"ababab");
        assert_eq!(&ring[..6], b"ababab");
    }

    #[test]
    fn windowed_ring_of_wrong_size() {
        let stream = encode(&[Literals(b"ab")]);
        let mut ring = [0u8; 100];
        let mut written = Vec::<u8>::new();
        assert_eq!(
            decompress_windowed(&stream, &mut ring, Window::DEFAULT, &mut written),
            Err(DecodeError::Window(WindowError::RingSize { got: 100, want: 2048 })),
        );
    }
}
