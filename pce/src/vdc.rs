use {
    log::trace,
    zx0::{DecodeError, Device},
};

pub const VRAM_WORDS: usize = 0x8000;

/// Just enough of the HuC6270 to receive data: VRAM, the write address
/// register, and the VWR data port split into its low and high halves.
///
/// A byte written to the low half is latched; the high half commits the
/// word at MAWR and steps MAWR by one. A decode that ends on a low byte
/// leaves that byte latched and uncommitted, same as the chip.
pub struct Vdc {
    vram: Box<[[u8; 2]]>,
    mawr: u16,
    latch: u8,
    high_next: bool,
}

impl Vdc {
    pub fn new() -> Self {
        Self{vram: vec![[0; 2]; VRAM_WORDS].into_boxed_slice(), mawr: 0, latch: 0, high_next: false}
    }

    /// Selects the write address and the VWR data register.
    pub fn set_mawr(&mut self, addr: u16) {
        trace!("mawr = {addr:#06x}");
        self.mawr = addr;
        self.high_next = false;
    }

    pub fn mawr(&self) -> u16 { self.mawr }

    pub fn write_low(&mut self, byte: u8) {
        self.latch = byte;
    }

    pub fn write_high(&mut self, byte: u8) -> Result<(), DecodeError> {
        let word = self.vram.get_mut(self.mawr as usize).ok_or(DecodeError::Overrun)?;
        *word = [self.latch, byte];
        self.mawr = self.mawr.wrapping_add(1);
        Ok(())
    }

    pub fn word(&self, addr: u16) -> Option<u16> {
        self.vram.get(addr as usize).map(|&w| u16::from_le_bytes(w))
    }

    /// VRAM as bytes, low byte of each word first.
    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vram[..])
    }

    /// Bytes of the words committed from `start` up to MAWR. Empty when
    /// `start` is outside VRAM or nothing was committed there.
    pub fn committed_from(&self, start: u16) -> &[u8] {
        let bytes = self.bytes();
        let start = (start as usize * 2).min(bytes.len());
        let end = (self.mawr as usize * 2).clamp(start, bytes.len());
        &bytes[start..end]
    }
}

impl Default for Vdc {
    fn default() -> Self { Self::new() }
}

impl Device for Vdc {
    fn write(&mut self, byte: u8) -> Result<(), DecodeError> {
        let high = self.high_next;
        self.high_next = !high;
        if high {self.write_high(byte)}
        else    {self.write_low(byte); Ok(())}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_pairs_become_words() {
        let mut vdc = Vdc::new();
        vdc.set_mawr(0x2000);
        for b in [0x34, 0x12, 0x78, 0x56, 0x9a] {vdc.write(b).unwrap()}
        assert_eq!(vdc.word(0x2000), Some(0x1234));
        assert_eq!(vdc.word(0x2001), Some(0x5678));
        // odd byte out stays latched
        assert_eq!(vdc.word(0x2002), Some(0));
        assert_eq!(vdc.mawr(), 0x2002);
        assert_eq!(&vdc.bytes()[0x4000..0x4004], [0x34, 0x12, 0x78, 0x56]);
    }

    #[test]
    fn set_mawr_restarts_on_low_byte() {
        let mut vdc = Vdc::new();
        vdc.set_mawr(0x10);
        vdc.write(0xaa).unwrap();
        vdc.set_mawr(0x20);
        vdc.write(0x01).unwrap();
        vdc.write(0x02).unwrap();
        assert_eq!(vdc.word(0x20), Some(0x0201));
        assert_eq!(vdc.word(0x10), Some(0));
    }

    #[test]
    fn writing_past_end_of_vram() {
        let mut vdc = Vdc::new();
        vdc.set_mawr(0x7fff);
        vdc.write(1).unwrap();
        vdc.write(2).unwrap();
        assert_eq!(vdc.word(0x7fff), Some(0x0201));
        vdc.write(3).unwrap();
        assert_eq!(vdc.write(4), Err(DecodeError::Overrun));
        assert_eq!(vdc.word(0x8000), None);
        assert_eq!(vdc.committed_from(0x7fff), [1, 2]);
    }

    #[test]
    fn committed_span_outside_vram_is_empty() {
        let mut vdc = Vdc::new();
        vdc.set_mawr(0x8000);
        // a lone low byte only latches
        vdc.write(9).unwrap();
        assert!(vdc.committed_from(0x8000).is_empty());
        assert!(vdc.committed_from(0xffff).is_empty());

        vdc.set_mawr(0x10);
        for b in [1, 2, 3, 4, 5] {vdc.write(b).unwrap()}
        assert_eq!(vdc.committed_from(0x10), [1, 2, 3, 4]);
        assert_eq!(vdc.committed_from(0x11), [3, 4]);
        assert!(vdc.committed_from(0x20).is_empty());
    }
}
