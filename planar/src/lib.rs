//! Host-side converter from indexed images to the PC Engine's planar
//! character and sprite layouts, optionally with a linear 4bpp copy.

use {
    bytemuck as bm,
    image::{DynamicImage, GenericImageView as _, Rgba},
    log::{debug, warn},
    util::row_major,
};

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("unknown conversion type {0:?}; expected Sprite, tile_8x8 or tile_16x16")]
    UnknownKind(String),
    #[error("image uses more than 16 colours")]
    TooManyColours,
    #[error("{wide}x{high} image needs {} pixels, got {got}", wide * high)]
    PixelCount { wide: usize, high: usize, got: usize },
    #[error(transparent)]
    Png(#[from] png::DecodingError),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// 16x16 sprite pattern.
    Sprite,
    /// 8x8 background character.
    Tile8,
    /// 16x16 metatile made of four characters.
    Tile16,
}

impl Kind {
    pub fn suffix(self) -> &'static str {
        match self {
            Kind::Sprite => "_spr16",
            Kind::Tile8  => "_tle8",
            Kind::Tile16 => "_tle16",
        }
    }

    pub fn cell_size(self) -> usize {
        match self {
            Kind::Tile8 => 8,
            _           => 16,
        }
    }
}

impl std::str::FromStr for Kind {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Sprite"     => Ok(Kind::Sprite),
            "tile_8x8"   => Ok(Kind::Tile8),
            "tile_16x16" => Ok(Kind::Tile16),
            _            => Err(ConvertError::UnknownKind(s.to_owned())),
        }
    }
}

/// Palette indices, one byte per pixel, row by row.
#[derive(Debug, Clone)]
pub struct Indexed {
    pixels: Vec<u8>,
    wide: usize,
    high: usize,
}

impl Indexed {
    pub fn new(wide: usize, high: usize, pixels: Vec<u8>) -> Result<Self, ConvertError> {
        if pixels.len() != wide * high {
            return Err(ConvertError::PixelCount{wide, high, got: pixels.len()})
        }
        if pixels.iter().any(|&p| p > 0x0f) {
            warn!("palette indices above 15; only the low four bits are kept");
        }
        Ok(Self{pixels, wide, high})
    }

    /// Reads an image file's bytes. Palettised PNGs keep their own indices,
    /// so the data stays in step with a palette taken from the same file.
    /// Anything else goes through [`Indexed::from_image`].
    pub fn decode(bytes: &[u8]) -> Result<Self, ConvertError> {
        if bytes.starts_with(PNG_SIGNATURE) {
            if let Some(indexed) = Self::from_indexed_png(bytes)? {return Ok(indexed)}
        }
        Self::from_image(&image::load_from_memory(bytes)?)
    }

    /// `None` unless the PNG is palettised.
    fn from_indexed_png(bytes: &[u8]) -> Result<Option<Self>, ConvertError> {
        let mut decoder = png::Decoder::new(bytes);
        decoder.set_transformations(png::Transformations::IDENTITY);
        let mut reader = decoder.read_info()?;
        if reader.info().color_type != png::ColorType::Indexed {return Ok(None)}

        let mut buf = vec![0; reader.output_buffer_size()];
        let frame = reader.next_frame(&mut buf)?;
        let (wide, high) = (frame.width as usize, frame.height as usize);
        // indexed PNGs are 1, 2, 4 or 8 bits deep, packed leftmost pixel high
        let depth = frame.bit_depth as usize;
        let per_byte = 8 / depth;
        let mask = ((1u16 << depth) - 1) as u8;

        let mut pixels = Vec::with_capacity(wide * high);
        for row in buf.chunks_exact(frame.line_size).take(high) {
            pixels.extend((0..wide).map(|x| {
                let shift = 8 - depth * (x % per_byte + 1);
                row[x / per_byte] >> shift & mask
            }));
        }
        debug!("{wide}x{high} palettised png, {depth} bits per pixel");
        Self::new(wide, high, pixels).map(Some)
    }

    /// Greyscale images are taken as raw indices. Anything else is decoded
    /// to colour and numbered in order of first appearance.
    pub fn from_image(image: &DynamicImage) -> Result<Self, ConvertError> {
        let (wide, high) = (image.width() as usize, image.height() as usize);
        if let DynamicImage::ImageLuma8(grey) = image {
            return Self::new(wide, high, grey.as_raw().clone())
        }

        let mut palette: Vec<Rgba<u8>> = Vec::with_capacity(16);
        let mut pixels = Vec::with_capacity(wide * high);
        for &colour in image.to_rgba8().pixels() {
            let index = match palette.iter().position(|&c| c == colour) {
                Some(index) => index,
                None if palette.len() == 16 => return Err(ConvertError::TooManyColours),
                None => {palette.push(colour); palette.len() - 1}
            };
            pixels.push(index as u8);
        }
        debug!("{} colours in first-seen order", palette.len());
        Self::new(wide, high, pixels)
    }

    pub fn wide(&self) -> usize { self.wide }
    pub fn high(&self) -> usize { self.high }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * self.wide + x] & 0x0f
    }

    fn cell<const N: usize>(&self, x0: usize, y0: usize) -> [[u8; N]; N] {
        std::array::from_fn(|y| std::array::from_fn(|x| self.get(x0 + x, y0 + y)))
    }
}

/// One 8x8 character: each row puts planes 0 and 1 side by side in the
/// first 16 bytes and planes 2 and 3 in the second 16. Leftmost pixel is
/// the top bit.
pub fn tile8(cell: &[[u8; 8]; 8], out: &mut Vec<u8>) {
    let mut planes = [0u8; 32];
    for (r, row) in cell.iter().enumerate() {
        for &p in row {
            for (plane, at) in [2*r, 2*r + 1, 16 + 2*r, 17 + 2*r].into_iter().enumerate() {
                planes[at] = planes[at] << 1 | (p >> plane & 1);
            }
        }
    }
    out.extend_from_slice(&planes);
}

/// One 16x16 sprite: four planes of sixteen little-endian row words.
pub fn sprite16(cell: &[[u8; 16]; 16], out: &mut Vec<u8>) {
    let mut words = [0u16; 64];
    for (r, row) in cell.iter().enumerate() {
        for &p in row {
            for plane in 0..4 {
                let w = &mut words[plane * 16 + r];
                *w = *w << 1 | (p >> plane & 1) as u16;
            }
        }
    }
    let words = words.map(u16::to_le_bytes);
    out.extend_from_slice(bm::cast_slice(&words[..]));
}

/// Two pixels a byte, left one in the high nibble.
pub fn linear<const N: usize>(cell: &[[u8; N]; N], out: &mut Vec<u8>) {
    for row in cell {
        out.extend(row.chunks_exact(2).map(|pair| pair[0] << 4 | pair[1]));
    }
}

#[derive(Debug, Clone, Default)]
pub struct Converted {
    pub planar: Vec<u8>,
    pub linear: Vec<u8>,
    pub cells: usize,
}

/// Cuts the image into cells left to right, top to bottom. Cells that would
/// hang over the right or bottom edge are left out.
pub fn convert(image: &Indexed, kind: Kind) -> Converted {
    let n = kind.cell_size();
    let (cols, rows) = (image.wide / n, image.high / n);
    if image.wide % n != 0 || image.high % n != 0 {
        warn!("{}x{} is not a whole number of {n}x{n} cells; edges dropped", image.wide, image.high);
    }

    let mut out = Converted::default();
    for (cx, cy) in row_major(0..cols, 0..rows) {
        let (x0, y0) = (cx * n, cy * n);
        match kind {
            Kind::Sprite => {
                let cell = image.cell::<16>(x0, y0);
                sprite16(&cell, &mut out.planar);
                linear(&cell, &mut out.linear);
            }
            Kind::Tile8 => {
                let cell = image.cell::<8>(x0, y0);
                tile8(&cell, &mut out.planar);
                linear(&cell, &mut out.linear);
            }
            Kind::Tile16 => {
                for (dx, dy) in row_major(0..2, 0..2) {
                    let cell = image.cell::<8>(x0 + dx * 8, y0 + dy * 8);
                    tile8(&cell, &mut out.planar);
                    linear(&cell, &mut out.linear);
                }
            }
        }
        out.cells += 1;
    }
    debug!("{} {kind:?} cells, {} planar bytes", out.cells, out.planar.len());
    out
}

/// `planar_tle8.bin` style names, or the given base with the kind's suffix.
pub fn output_names(base: Option<&str>, kind: Kind) -> (String, String) {
    let suffix = kind.suffix();
    match base {
        Some(base) => (format!("{base}{suffix}.bin"), format!("{base}_linear{suffix}.bin")),
        None       => (format!("planar{suffix}.bin"), format!("linear{suffix}.bin")),
    }
}
