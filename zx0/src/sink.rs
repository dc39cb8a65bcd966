use crate::{
    DecodeError,
    window::{PagedAddr, Window, WindowError},
};

/// Where decoded bytes go.
///
/// `offset` in [`Sink::copy_match`] is the format's negative 16-bit
/// displacement: `0xffff` means one byte back. Overlapping copies must go
/// byte by byte so a short offset repeats what was just written.
pub trait Sink {
    /// Bytes written so far.
    fn position(&self) -> usize;
    fn put(&mut self, byte: u8) -> Result<(), DecodeError>;
    fn copy_match(&mut self, offset: u16, len: u32) -> Result<(), DecodeError>;
}

/// Write-only destination behind a [`WindowSink`], e.g. a video chip data
/// port. Whoever owns it selects the target address before decoding starts.
pub trait Device {
    fn write(&mut self, byte: u8) -> Result<(), DecodeError>;
}

impl<D: Device + ?Sized> Device for &mut D {
    fn write(&mut self, byte: u8) -> Result<(), DecodeError> {
        (**self).write(byte)
    }
}

impl Device for Vec<u8> {
    fn write(&mut self, byte: u8) -> Result<(), DecodeError> {
        self.push(byte);
        Ok(())
    }
}

fn distance(offset: u16) -> usize {
    offset.wrapping_neg() as usize
}

fn check_reach(offset: u16, position: usize) -> Result<usize, DecodeError> {
    let distance = distance(offset);
    if distance == 0 || distance > position {
        return Err(DecodeError::OffsetOutOfRange{distance, position})
    }
    Ok(distance)
}

impl Sink for Vec<u8> {
    fn position(&self) -> usize { self.len() }

    fn put(&mut self, byte: u8) -> Result<(), DecodeError> {
        self.push(byte);
        Ok(())
    }

    fn copy_match(&mut self, offset: u16, len: u32) -> Result<(), DecodeError> {
        let from = self.len() - check_reach(offset, self.len())?;
        self.reserve(len as usize);
        for i in from .. from + len as usize {
            let byte = self[i];
            self.push(byte);
        }
        Ok(())
    }
}

/// Plain addressable memory: back-references are ordinary pointer arithmetic.
pub struct SliceSink<'a> {
    out: &'a mut [u8],
    pos: usize,
}

impl<'a> SliceSink<'a> {
    pub fn new(out: &'a mut [u8]) -> Self {
        Self{out, pos: 0}
    }

    pub fn written(&self) -> &[u8] { &self.out[..self.pos] }
}

impl Sink for SliceSink<'_> {
    fn position(&self) -> usize { self.pos }

    fn put(&mut self, byte: u8) -> Result<(), DecodeError> {
        *self.out.get_mut(self.pos).ok_or(DecodeError::Overrun)? = byte;
        self.pos += 1;
        Ok(())
    }

    fn copy_match(&mut self, offset: u16, len: u32) -> Result<(), DecodeError> {
        let from = self.pos - check_reach(offset, self.pos)?;
        let end = self.pos + len as usize;
        if end > self.out.len() {return Err(DecodeError::Overrun)}
        for i in 0 .. len as usize {
            self.out[self.pos + i] = self.out[from + i];
        }
        self.pos = end;
        Ok(())
    }
}

/// Output for a destination that can only be written: every byte goes to the
/// device and also into a ring buffer so later matches have something to
/// read. Both cursors live in the window's address range and wrap at its
/// last page.
pub struct WindowSink<'r, D> {
    ring: &'r mut [u8],
    window: Window,
    dst: PagedAddr,
    device: D,
    written: usize,
}

impl<'r, D: Device> WindowSink<'r, D> {
    pub fn new(ring: &'r mut [u8], window: Window, device: D) -> Result<Self, WindowError> {
        if ring.len() != window.size() {
            return Err(WindowError::RingSize{got: ring.len(), want: window.size()})
        }
        Ok(Self{ring, window, dst: window.start(), device, written: 0})
    }

    pub fn into_device(self) -> D { self.device }

    /// Current output cursor inside the window.
    pub fn cursor(&self) -> PagedAddr { self.dst }

    fn emit(&mut self, byte: u8) -> Result<(), DecodeError> {
        self.ring[self.window.index(self.dst)] = byte;
        self.device.write(byte)?;
        self.written += 1;
        if self.dst.step() {
            self.dst.page = self.window.wrap_page(self.dst.page);
        }
        Ok(())
    }
}

impl<D: Device> Sink for WindowSink<'_, D> {
    fn position(&self) -> usize { self.written }

    fn put(&mut self, byte: u8) -> Result<(), DecodeError> {
        self.emit(byte)
    }

    fn copy_match(&mut self, offset: u16, len: u32) -> Result<(), DecodeError> {
        let distance = check_reach(offset, self.written)?;
        if distance > self.window.size() {
            return Err(DecodeError::OffsetOutOfRange{distance, position: self.written})
        }

        let mut src = self.window.resolve(self.dst, offset);
        for _ in 0..len {
            let byte = self.ring[self.window.index(src)];
            self.emit(byte)?;
            if src.step() {
                src.page = self.window.wrap_page(src.page);
            }
        }
        Ok(())
    }
}
