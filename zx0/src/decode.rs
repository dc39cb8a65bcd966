use {
    crate::{
        DecodeError,
        bits::{BitReader, Source},
        sink::Sink,
    },
    log::{debug, trace},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Literals,
    NewOffset,
    OldOffset,
}

/// One decompression run. Holds everything that has to survive from one
/// symbol to the next: the bit buffer and the last match offset.
pub struct Session<'k, S, K: ?Sized> {
    bits: BitReader<S>,
    sink: &'k mut K,
    offset: u16,
}

impl<'k, S: Source, K: Sink + ?Sized> Session<'k, S, K> {
    /// One byte back, which is what a repeat match before any new offset uses.
    pub const INITIAL_OFFSET: u16 = 0xffff;

    pub fn new(source: S, sink: &'k mut K) -> Self {
        Self{bits: BitReader::new(source), sink, offset: Self::INITIAL_OFFSET}
    }

    /// Decodes up to and including the end marker, then hands back the
    /// source so the caller can see where it stopped.
    pub fn run(mut self) -> Result<S, DecodeError> {
        // the preset bit buffer makes this pick literals
        let mut state = self.after_match()?;
        loop {
            state = match state {
                State::Literals => self.literals()?,
                State::OldOffset => self.old_offset()?,
                State::NewOffset => match self.new_offset()? {
                    Some(state) => state,
                    None => break,
                },
            };
        }
        Ok(self.bits.into_source())
    }

    fn after_match(&mut self) -> Result<State, DecodeError> {
        Ok(if self.bits.next_bit()? {State::NewOffset} else {State::Literals})
    }

    fn literals(&mut self) -> Result<State, DecodeError> {
        let len = self.bits.gamma()?;
        trace!("literals x{len} at {}", self.sink.position());
        for _ in 0..len {
            let byte = self.bits.read_byte()?;
            self.sink.put(byte)?;
        }
        Ok(if self.bits.next_bit()? {State::NewOffset} else {State::OldOffset})
    }

    fn old_offset(&mut self) -> Result<State, DecodeError> {
        let len = self.bits.gamma()?;
        trace!("repeat -{} x{len} at {}", self.offset.wrapping_neg(), self.sink.position());
        self.sink.copy_match(self.offset, len)?;
        self.after_match()
    }

    /// `None` once the end marker has been read.
    fn new_offset(&mut self) -> Result<Option<State>, DecodeError> {
        let high = match self.bits.gamma_flag()? {
            true => 1,
            false => self.bits.gamma_data(1)?,
        };
        if high > 0x100 {return Err(DecodeError::BadOffset(high))}

        // a high part of 256 negates to zero, which is the end marker
        let neg = 0u8.wrapping_sub(high as u8);
        if neg == 0 {return Ok(None)}

        // the low byte's spare bit is the first flag of the length
        let low = self.bits.read_byte()?;
        self.offset = u16::from_be_bytes([0x80 | neg >> 1, neg << 7 | low >> 1]);

        let len = match low & 1 {
            1 => 1,
            _ => self.bits.gamma_data(1)?,
        };
        trace!("match -{} x{} at {}", self.offset.wrapping_neg(), len + 1, self.sink.position());
        self.sink.copy_match(self.offset, len + 1)?;
        Ok(Some(self.after_match()?))
    }
}

/// Decodes one complete stream from `source` into `sink`. Both are borrowed
/// so their final positions stay visible to the caller.
pub fn decompress<S, K>(source: &mut S, sink: &mut K) -> Result<(), DecodeError>
where
    S: Source + ?Sized,
    K: Sink + ?Sized,
{
    let start = sink.position();
    Session::new(source, &mut *sink).run()?;
    debug!("zx0: decoded {} bytes", sink.position() - start);
    Ok(())
}
