/// A 16-bit logical address as the 6280 sees it: a 256-byte page and an
/// offset inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PagedAddr {
    pub page: u8,
    pub offset: u8,
}

impl PagedAddr {
    pub const fn new(addr: u16) -> Self {
        let [page, offset] = addr.to_be_bytes();
        Self{page, offset}
    }

    pub const fn get(self) -> u16 {
        u16::from_be_bytes([self.page, self.offset])
    }

    /// Moves forward one byte. Returns `true` when that crossed into the next
    /// page, which is left for the caller to fix up.
    pub fn step(&mut self) -> bool {
        self.offset = self.offset.wrapping_add(1);
        if self.offset != 0 {return false}
        self.page = self.page.wrapping_add(1);
        true
    }
}

impl From<u16> for PagedAddr {
    fn from(addr: u16) -> Self { Self::new(addr) }
}

impl std::fmt::Display for PagedAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${:04X}", self.get())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    #[error("window size {0:#x} is not a power of two from 256 to 32768")]
    Size(usize),
    #[error("window base {0:#06x} is not aligned to the window size")]
    Misaligned(u16),
    #[error("ring buffer holds {got} bytes but the window is {want}")]
    RingSize { got: usize, want: usize },
}

/// Placement of the ring buffer that stages output for back-references when
/// the real destination can't be read back. Whole pages only: `base` is the
/// first page, `mask` the page-number bits that vary inside the window.
///
/// The compressor has to be told the same size (`salvador -w`), otherwise it
/// will emit matches that reach further back than the ring remembers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    base: u8,
    mask: u8,
}

impl Window {
    /// 2 KiB at `$3800`, the top of the work RAM bank.
    pub const DEFAULT: Window = Window{base: 0x38, mask: 0x07};

    pub fn new(base: u16, size: usize) -> Result<Self, WindowError> {
        if !size.is_power_of_two() || !(0x100..=0x8000).contains(&size) {
            return Err(WindowError::Size(size))
        }
        if base as usize & (size - 1) != 0 {return Err(WindowError::Misaligned(base))}
        let base = (base >> 8) as u8;
        let mask = ((size >> 8) - 1) as u8;
        Ok(Window{base, mask})
    }

    pub fn size(&self) -> usize { (self.mask as usize + 1) << 8 }
    pub fn base(&self) -> u16 { (self.base as u16) << 8 }

    pub fn start(&self) -> PagedAddr {
        PagedAddr{page: self.base, offset: 0}
    }

    /// Folds a page number back into the window.
    pub fn wrap_page(&self, page: u8) -> u8 {
        page & self.mask | self.base
    }

    /// Where a match starts: `dst + offset` with the offset a negative 16-bit
    /// displacement. The offset byte wraps on its own; only the page is
    /// folded into the window.
    pub fn resolve(&self, dst: PagedAddr, offset: u16) -> PagedAddr {
        let mut at = PagedAddr::new(dst.get().wrapping_add(offset));
        at.page = self.wrap_page(at.page);
        at
    }

    /// Ring slot of an address already inside the window.
    pub fn index(&self, at: PagedAddr) -> usize {
        ((at.page & self.mask) as usize) << 8 | at.offset as usize
    }
}

impl Default for Window {
    fn default() -> Self { Self::DEFAULT }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_explicit() {
        assert_eq!(Window::new(0x3800, 0x800), Ok(Window::DEFAULT));
        assert_eq!(Window::DEFAULT.size(), 2048);
        assert_eq!(Window::DEFAULT.base(), 0x3800);
    }

    #[test]
    fn rejects_bad_geometry() {
        assert_eq!(Window::new(0x3800, 0x600), Err(WindowError::Size(0x600)));
        assert_eq!(Window::new(0x3800, 0x80), Err(WindowError::Size(0x80)));
        assert_eq!(Window::new(0x0000, 0x10000), Err(WindowError::Size(0x10000)));
        assert_eq!(Window::new(0x3c00, 0x800), Err(WindowError::Misaligned(0x3c00)));
    }

    #[test]
    fn step_reports_page_crossing() {
        let mut at = PagedAddr::new(0x38fe);
        assert!(!at.step());
        assert_eq!(at.get(), 0x38ff);
        assert!(at.step());
        assert_eq!(at.get(), 0x3900);
    }

    #[test]
    fn resolve_wraps_into_window() {
        let w = Window::DEFAULT;
        // one back from the start of the window lands on its last byte
        assert_eq!(w.resolve(w.start(), 0xffff).get(), 0x3fff);
        // a full window back is the same slot
        assert_eq!(w.resolve(PagedAddr::new(0x3a10), 0xf800).get(), 0x3a10);
        assert_eq!(w.resolve(PagedAddr::new(0x3a10), 0xf801).get(), 0x3a11);
        assert_eq!(w.resolve(PagedAddr::new(0x3a10), 0xfff0).get(), 0x3a00);
        assert_eq!(w.resolve(PagedAddr::new(0x3a10), 0xffe0).get(), 0x39f0);
    }

    #[test]
    fn index_is_relative_to_base() {
        let w = Window::DEFAULT;
        assert_eq!(w.index(w.start()), 0);
        assert_eq!(w.index(PagedAddr::new(0x3fff)), 0x7ff);
        assert_eq!(w.index(PagedAddr::new(0x3912)), 0x112);
    }

    #[test]
    fn wrap_page_after_last_page() {
        let w = Window::DEFAULT;
        assert_eq!(w.wrap_page(0x40), 0x38);
        assert_eq!(w.wrap_page(0x3b), 0x3b);
    }
}
