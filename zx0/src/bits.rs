use crate::DecodeError;

/// Forward-only byte supply for the decoder.
pub trait Source {
    fn next_byte(&mut self) -> Option<u8>;
}

impl<S: Source + ?Sized> Source for &mut S {
    fn next_byte(&mut self) -> Option<u8> {
        (**self).next_byte()
    }
}

pub struct SliceSource<'a> {
    bytes: &'a [u8],
    consumed: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self{bytes, consumed: 0}
    }

    pub fn consumed(&self) -> usize { self.consumed }
    pub fn remaining(&self) -> &'a [u8] { self.bytes }
}

impl Source for SliceSource<'_> {
    fn next_byte(&mut self) -> Option<u8> {
        let (&byte, rest) = self.bytes.split_first()?;
        self.bytes = rest;
        self.consumed += 1;
        Some(byte)
    }
}

/// Bit buffer fed from a [`Source`], plus the interlaced Elias-gamma decoder
/// built on it.
///
/// The buffer holds the unread bits of the last fetched byte left-aligned,
/// followed by a single set sentinel bit. Once only the sentinel is left the
/// next shift leaves zero and a fresh byte is fetched. The starting value
/// `0x40` yields one 0 bit without touching the source, which is what makes
/// every stream open with a literal run.
pub struct BitReader<S> {
    source: S,
    buffer: u8,
}

impl<S: Source> BitReader<S> {
    pub const INITIAL_BUFFER: u8 = 0x40;

    pub fn new(source: S) -> Self {
        Self{source, buffer: Self::INITIAL_BUFFER}
    }

    pub fn into_source(self) -> S { self.source }

    pub fn read_byte(&mut self) -> Result<u8, DecodeError> {
        self.source.next_byte().ok_or(DecodeError::Underrun)
    }

    pub fn next_bit(&mut self) -> Result<bool, DecodeError> {
        let mut bit = self.buffer & 0x80 != 0;
        self.buffer <<= 1;
        if self.buffer == 0 {
            // what just fell out was the sentinel
            let byte = self.read_byte()?;
            bit = byte & 0x80 != 0;
            self.buffer = byte << 1 | 1;
        }
        Ok(bit)
    }

    /// First flag of a gamma field; `true` when the value is just 1.
    pub fn gamma_flag(&mut self) -> Result<bool, DecodeError> {
        self.next_bit()
    }

    /// Rest of a gamma field whose first flag said "more": alternating data
    /// and flag bits, data first, until a set flag.
    pub fn gamma_data(&mut self, mut value: u32) -> Result<u32, DecodeError> {
        loop {
            if value > 0x7fff {return Err(DecodeError::GammaOverflow)}
            value = value << 1 | self.next_bit()? as u32;
            if self.gamma_flag()? {break Ok(value)}
        }
    }

    pub fn gamma(&mut self) -> Result<u32, DecodeError> {
        if self.gamma_flag()? {Ok(1)}
        else                  {self.gamma_data(1)}
    }
}
