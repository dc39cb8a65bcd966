use {
    crate::{FarPtr, Error},
    log::trace,
    zx0::{PagedAddr, Source},
};

pub const BANK_SIZE: usize = 0x2000;
/// HuCards map at most this many ROM banks without a mapper.
pub const ROM_BANKS: usize = 0x80;
pub const RAM_BANK: u8 = 0xf8;
pub const IO_BANK: u8 = 0xff;

/// The 6280's eight mapping registers. MPRn picks the 8 KiB physical bank
/// seen at logical `n * $2000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mmu {
    mpr: [u8; 8],
}

impl Mmu {
    pub fn new() -> Self {
        Self{mpr: [IO_BANK, RAM_BANK, 0, 0, 0, 0, 0, 0]}
    }

    pub fn tam(&mut self, slot: usize, bank: u8) {
        self.mpr[slot & 7] = bank;
    }

    pub fn tma(&self, slot: usize) -> u8 {
        self.mpr[slot & 7]
    }

    pub fn bank_at(&self, addr: u16) -> u8 {
        self.mpr[(addr >> 13) as usize]
    }
}

impl Default for Mmu {
    fn default() -> Self { Self::new() }
}

#[derive(Debug, Clone, Default)]
pub struct Rom {
    bytes: Vec<u8>,
}

impl Rom {
    pub fn new() -> Self { Self::default() }

    pub fn from_image(bytes: Vec<u8>) -> Result<Self, Error> {
        if bytes.len() > ROM_BANKS * BANK_SIZE {return Err(Error::RomFull(bytes.len()))}
        Ok(Self{bytes})
    }

    pub fn len(&self) -> usize { self.bytes.len() }
    pub fn is_empty(&self) -> bool { self.bytes.is_empty() }

    pub fn banks(&self) -> usize {
        (self.bytes.len() + BANK_SIZE - 1) / BANK_SIZE
    }

    /// Contents of bank `n`. The last bank may be short.
    pub fn bank(&self, n: u8) -> Option<&[u8]> {
        let start = n as usize * BANK_SIZE;
        let end = (start + BANK_SIZE).min(self.bytes.len());
        self.bytes.get(start..end)
    }

    /// Appends `data` right after what is already there, like `#incbin`, and
    /// returns where it landed. The address is given as seen through MPR3.
    pub fn place(&mut self, data: &[u8]) -> Result<FarPtr, Error> {
        let at = self.bytes.len();
        if at + data.len() > ROM_BANKS * BANK_SIZE {return Err(Error::RomFull(at + data.len()))}
        self.bytes.extend_from_slice(data);
        let ptr = FarPtr{bank: (at / BANK_SIZE) as u8, addr: 0x6000 | (at % BANK_SIZE) as u16};
        trace!("placed {} bytes at {ptr}", data.len());
        Ok(ptr)
    }
}

/// Compressed data read through MPR3 (`$6000-$7FFF`). Stepping past `$7FFF`
/// maps the next bank and goes back to `$6000`, so a stream can run across
/// any number of banks.
pub struct Mpr3Source<'a> {
    rom: &'a Rom,
    mmu: &'a mut Mmu,
    ptr: PagedAddr,
}

impl<'a> Mpr3Source<'a> {
    /// Maps `src.bank` at MPR3 and points at `src.addr` remapped into it.
    pub fn new(rom: &'a Rom, mmu: &'a mut Mmu, src: FarPtr) -> Self {
        mmu.tam(3, src.bank);
        Self{rom, mmu, ptr: PagedAddr::new(src.mpr3())}
    }

    pub fn ptr(&self) -> u16 { self.ptr.get() }
    pub fn bank(&self) -> u8 { self.mmu.tma(3) }
}

impl Source for Mpr3Source<'_> {
    fn next_byte(&mut self) -> Option<u8> {
        let bank = self.mmu.bank_at(self.ptr.get());
        let byte = *self.rom.bank(bank)?.get(self.ptr.get() as usize % BANK_SIZE)?;
        if self.ptr.step() && self.ptr.page >= 0x80 {
            let next = self.mmu.tma(3).wrapping_add(1);
            self.mmu.tam(3, next);
            self.ptr.page = 0x60;
            trace!("source moves on to bank {next:#04x}");
        }
        Some(byte)
    }
}
