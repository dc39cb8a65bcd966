//! A PC Engine model just big enough to run the ZX0-to-VRAM routine:
//! banked ROM behind MPR3, work RAM holding the match window, and the VDC
//! data port as the only way into VRAM.

mod mmu;
mod vdc;

pub use {
    mmu::{BANK_SIZE, IO_BANK, Mmu, Mpr3Source, RAM_BANK, ROM_BANKS, Rom},
    vdc::{VRAM_WORDS, Vdc},
};

use {
    log::debug,
    zx0::{DecodeError, Window, WindowSink},
};

/// Logical address of work RAM, mapped by MPR1.
pub const RAM_BASE: u16 = 0x2000;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("{0} bytes do not fit in the ROM")]
    RomFull(usize),
    #[error("window at {base:#06x} ({size} bytes) is not inside work RAM")]
    WindowOutsideRam { base: u16, size: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("pointer table already holds {} entries", PointerTable::CAPACITY)]
    Full,
    #[error("pointer table has no entry {0}")]
    NoEntry(usize),
}

/// Bank number plus address, what `getFarPointer` stores for a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FarPtr {
    pub bank: u8,
    pub addr: u16,
}

impl FarPtr {
    /// The address once `bank` sits in MPR3. Only the offset inside the bank
    /// is kept from `addr`.
    pub fn mpr3(self) -> u16 {
        self.addr & 0x1fff | 0x6000
    }
}

impl std::fmt::Display for FarPtr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02X}:{:04X}", self.bank, self.addr)
    }
}

/// Fixed-size table of far pointers filled in slot order.
#[derive(Debug, Clone, Default)]
pub struct PointerTable {
    entries: Vec<FarPtr>,
}

impl PointerTable {
    pub const CAPACITY: usize = 20;

    pub fn new() -> Self { Self::default() }

    /// Stores `ptr` in the next open slot and returns that slot.
    pub fn push(&mut self, ptr: FarPtr) -> Result<usize, TableError> {
        if self.entries.len() == Self::CAPACITY {return Err(TableError::Full)}
        self.entries.push(ptr);
        Ok(self.entries.len() - 1)
    }

    pub fn get(&self, index: usize) -> Result<FarPtr, TableError> {
        self.entries.get(index).copied().ok_or(TableError::NoEntry(index))
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

pub struct Console {
    pub rom: Rom,
    pub mmu: Mmu,
    pub ram: Box<[u8]>,
    pub vdc: Vdc,
    window: Window,
}

impl Console {
    pub fn new(rom: Rom) -> Self {
        Self {
            rom,
            mmu: Mmu::new(),
            ram: vec![0; BANK_SIZE].into_boxed_slice(),
            vdc: Vdc::new(),
            window: Window::DEFAULT,
        }
    }

    /// Moves the match window. It has to lie in work RAM and match the
    /// window the data was compressed for.
    pub fn with_window(mut self, window: Window) -> Result<Self, Error> {
        ram_range(window)?;
        self.window = window;
        Ok(self)
    }

    pub fn window(&self) -> Window { self.window }

    /// Decompresses the stream at `src` to VRAM word address `vram`. MPR3 is
    /// put back as it was; the bank it held at the end marker is returned.
    pub fn decompress_to_vram(&mut self, src: FarPtr, vram: u16) -> Result<u8, Error> {
        let Self{rom, mmu, ram, vdc, window} = self;
        let ring = &mut ram[ram_range(*window)?];
        let saved = mmu.tma(3);

        vdc.set_mawr(vram);
        let start = vdc.mawr();
        let mut source = Mpr3Source::new(rom, mmu, src);
        let mut sink = WindowSink::new(ring, *window, &mut *vdc).map_err(DecodeError::from)?;
        let result = zx0::decompress(&mut source, &mut sink);
        let last = source.bank();
        mmu.tam(3, saved);
        result?;

        debug!("{src} -> vram {start:#06x}..{:#06x}, ended in bank {last:#04x}", vdc.mawr());
        Ok(last)
    }
}

fn ram_range(window: Window) -> Result<std::ops::Range<usize>, Error> {
    let start = window.base().wrapping_sub(RAM_BASE) as usize;
    let end = start + window.size();
    if end > BANK_SIZE {
        return Err(Error::WindowOutsideRam{base: window.base(), size: window.size()})
    }
    Ok(start..end)
}

/// Decompresses from an explicit bank and address.
pub fn decomp_zx0_vram_base(console: &mut Console, bank: u8, addr: u16, vram: u16) -> Result<u8, Error> {
    console.decompress_to_vram(FarPtr{bank, addr}, vram)
}

/// Decompresses from a label's far pointer.
pub fn decomp_zx0_vram_direct(console: &mut Console, src: FarPtr, vram: u16) -> Result<u8, Error> {
    console.decompress_to_vram(src, vram)
}

/// Decompresses the stream held in slot `index` of `table`.
pub fn decomp_zx0_vram(console: &mut Console, table: &PointerTable, index: usize, vram: u16) -> Result<u8, Error> {
    let src = table.get(index)?;
    console.decompress_to_vram(src, vram)
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        zx0::tokens::{encode, expand, parse, sample, Token::*},
    };

    fn vram_bytes(console: &Console, at: u16, len: usize) -> &[u8] {
        let start = at as usize * 2;
        &console.vdc.bytes()[start..start + len]
    }

    #[test]
    fn far_pointer_remaps_into_mpr3() {
        assert_eq!(FarPtr{bank: 3, addr: 0x4123}.mpr3(), 0x6123);
        assert_eq!(FarPtr{bank: 3, addr: 0xfffe}.mpr3(), 0x7ffe);
        assert_eq!(FarPtr{bank: 0x1a, addr: 0x6000}.to_string(), "1A:6000");
    }

    #[test]
    fn pointer_table_holds_twenty() {
        let mut table = PointerTable::new();
        for i in 0..PointerTable::CAPACITY {
            assert_eq!(table.push(FarPtr{bank: i as u8, addr: 0x6000}), Ok(i));
        }
        assert_eq!(table.push(FarPtr{bank: 0, addr: 0}), Err(TableError::Full));
        assert_eq!(table.get(19).unwrap().bank, 19);
        assert_eq!(table.get(20), Err(TableError::NoEntry(20)));
    }

    #[test]
    fn all_entry_points_agree() {
        let data = sample(5000, 42);
        let stream = encode(&parse(&data, 2048));
        let mut rom = Rom::new();
        rom.place(&[0xea; 300]).unwrap();
        let at = rom.place(&stream).unwrap();
        let mut table = PointerTable::new();
        table.push(at).unwrap();

        let mut console = Console::new(rom);
        decomp_zx0_vram(&mut console, &table, 0, 0x2000).unwrap();
        assert_eq!(vram_bytes(&console, 0x2000, data.len()), data);

        decomp_zx0_vram_direct(&mut console, at, 0x0000).unwrap();
        assert_eq!(vram_bytes(&console, 0x0000, data.len()), data);

        // the bank/address pair need not already point into MPR3
        decomp_zx0_vram_base(&mut console, at.bank, at.addr & 0x1fff, 0x4000).unwrap();
        assert_eq!(vram_bytes(&console, 0x4000, data.len()), data);
        assert_eq!(console.vdc.mawr(), 0x4000 + 2500);
    }

    #[test]
    fn literal_run_across_source_bank() {
        let text = sample(20, 9);
        let stream = encode(&[Literals(&text)]);
        let mut rom = Rom::new();
        // the raw bytes start a few before the end of bank 0
        rom.place(&vec![0; BANK_SIZE - 6]).unwrap();
        let at = rom.place(&stream).unwrap();
        rom.place(&[0; 16]).unwrap();

        let mut console = Console::new(rom);
        console.mmu.tam(3, 0x42);
        let last = decomp_zx0_vram_direct(&mut console, at, 0x100).unwrap();
        assert_eq!(last, 1);
        assert_eq!(console.mmu.tma(3), 0x42);
        assert_eq!(vram_bytes(&console, 0x100, 20), text);
    }

    #[test]
    fn stream_spanning_several_banks() {
        let data = sample(40_000, 17);
        let tokens = [Literals(&data[..20_000]), Match{distance: 2048, len: 3000}, Literals(&data[20_000..])];
        let expected = expand(&tokens);
        let stream = encode(&tokens);
        let mut rom = Rom::new();
        let at = rom.place(&stream).unwrap();

        let mut console = Console::new(rom);
        let last = decomp_zx0_vram_direct(&mut console, at, 0).unwrap();
        assert_eq!(last as usize, (stream.len() - 1) / BANK_SIZE);
        assert_eq!(vram_bytes(&console, 0, expected.len()), expected);
        assert_eq!(console.mmu.tma(3), 0);
    }

    #[test]
    fn window_is_staged_in_work_ram() {
        let stream = encode(&[Literals(b"tile"), Match{distance: 4, len: 8}]);
        let mut rom = Rom::new();
        let at = rom.place(&stream).unwrap();
        let mut console = Console::new(rom);
        decomp_zx0_vram_direct(&mut console, at, 0x1000).unwrap();
        assert_eq!(&console.ram[0x1800..0x180c], b"tiletiletile");
        assert!(console.ram[..0x1800].iter().all(|&b| b == 0));
    }

    #[test]
    fn smaller_window_elsewhere_in_ram() {
        let data = sample(3000, 5);
        let stream = encode(&parse(&data, 512));
        let mut rom = Rom::new();
        let at = rom.place(&stream).unwrap();
        let window = Window::new(0x2400, 512).unwrap();
        let mut console = Console::new(rom).with_window(window).unwrap();
        decomp_zx0_vram_direct(&mut console, at, 0).unwrap();
        assert_eq!(vram_bytes(&console, 0, data.len()), data);
        assert!(console.ram[0x600..].iter().all(|&b| b == 0));
    }

    #[test]
    fn window_must_be_in_work_ram() {
        let console = Console::new(Rom::new());
        let window = Window::new(0x4000, 0x800).unwrap();
        assert!(matches!(console.with_window(window), Err(Error::WindowOutsideRam{base: 0x4000, ..})));
        let console = Console::new(Rom::new());
        let window = Window::new(0x0000, 0x800).unwrap();
        assert!(matches!(console.with_window(window), Err(Error::WindowOutsideRam{..})));
    }

    #[test]
    fn errors_still_restore_mpr3() {
        let stream = encode(&[Literals(b"abc"), Match{distance: 2, len: 5}]);
        let mut rom = Rom::new();
        let at = rom.place(&stream[..stream.len() - 1]).unwrap();
        let mut console = Console::new(rom);
        console.mmu.tam(3, 7);
        let err = decomp_zx0_vram_direct(&mut console, at, 0).unwrap_err();
        assert!(matches!(err, Error::Decode(DecodeError::Underrun)));
        assert_eq!(console.mmu.tma(3), 7);

        let table = PointerTable::new();
        assert!(matches!(decomp_zx0_vram(&mut console, &table, 0, 0), Err(Error::Table(TableError::NoEntry(0)))));
    }

    #[test]
    fn output_past_end_of_vram() {
        let stream = encode(&[Literals(b"ab"), Match{distance: 2, len: 10}]);
        let mut rom = Rom::new();
        let at = rom.place(&stream).unwrap();
        let mut console = Console::new(rom);
        let err = decomp_zx0_vram_direct(&mut console, at, 0x7ffd).unwrap_err();
        assert!(matches!(err, Error::Decode(DecodeError::Overrun)));
    }
}
