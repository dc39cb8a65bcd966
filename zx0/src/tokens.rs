//! Test fixtures: writes classic-format streams from an explicit token list,
//! plus a naive greedy parse to get token lists out of sample data. Only
//! built for tests and under the `tokens` feature.

#[derive(Debug, Clone, Copy)]
pub enum Token<'a> {
    Literals(&'a [u8]),
    /// Copy from the previous match distance (only after literals).
    Repeat(usize),
    Match { distance: usize, len: usize },
}

use Token::*;

/// Bit packer mirroring the reader: a flag byte is reserved in the output
/// when its first bit is written, raw bytes are appended as they come.
pub struct BitWriter {
    out: Vec<u8>,
    index: usize,
    mask: u8,
    backtrack: bool,
}

impl BitWriter {
    pub fn new() -> Self {
        Self{out: Vec::new(), index: 0, mask: 0, backtrack: false}
    }

    pub fn bit(&mut self, value: bool) {
        if self.backtrack {
            // spare low bit of the offset byte
            self.backtrack = false;
            if value {*self.out.last_mut().unwrap() |= 1}
            return;
        }
        if self.mask == 0 {
            self.mask = 0x80;
            self.index = self.out.len();
            self.out.push(0);
        }
        if value {self.out[self.index] |= self.mask}
        self.mask >>= 1;
    }

    pub fn byte(&mut self, byte: u8) {
        self.out.push(byte);
    }

    pub fn gamma(&mut self, value: u32) {
        assert!(value >= 1);
        let top = 31 - value.leading_zeros();
        for i in (0..top).rev() {
            self.bit(false);
            self.bit(value >> i & 1 != 0);
        }
        self.bit(true);
    }

    fn offset(&mut self, distance: usize) {
        assert!((1..=32640).contains(&distance));
        let d = distance - 1;
        self.gamma((d >> 7) as u32 + 1);
        self.byte(((127 - (d & 127)) << 1) as u8);
        self.backtrack = true;
    }

    pub fn finish(self) -> Vec<u8> {
        self.out
    }
}

pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let mut w = BitWriter::new();
    let mut prev: Option<Token> = None;
    for &token in tokens {
        match (prev, token) {
            (None, Literals(_)) => {}
            (None, _) => panic!("stream must open with literals"),
            (Some(Literals(_)), Literals(_)) => panic!("adjacent literal runs"),
            (Some(Literals(_)), Match{..}) => w.bit(true),
            (Some(Literals(_)), Repeat(_)) => w.bit(false),
            (Some(_), Literals(_)) => w.bit(false),
            (Some(_), Match{..}) => w.bit(true),
            (Some(_), Repeat(_)) => panic!("repeat must follow literals"),
        }
        match token {
            Literals(bytes) => {
                w.gamma(bytes.len() as u32);
                bytes.iter().for_each(|&b| w.byte(b));
            }
            Repeat(len) => w.gamma(len as u32),
            Match{distance, len} => {
                assert!(len >= 2);
                w.offset(distance);
                w.gamma(len as u32 - 1);
            }
        }
        prev = Some(token);
    }
    // end marker: new offset whose high part is 256
    w.bit(true);
    w.gamma(256);
    w.finish()
}

/// What a token list should decode to.
pub fn expand(tokens: &[Token]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut last = 1;
    for &token in tokens {
        let (distance, len) = match token {
            Literals(bytes) => {out.extend_from_slice(bytes); continue}
            Repeat(len) => (last, len),
            Match{distance, len} => (distance, len),
        };
        last = distance;
        for _ in 0..len {
            let byte = out[out.len() - distance];
            out.push(byte);
        }
    }
    out
}

/// Greedy longest-match parse, matches no further back than `reach`.
pub fn parse(data: &[u8], reach: usize) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut lits = 0;
    let mut last = 0;
    let mut pos = 1;

    let match_len = |pos: usize, distance: usize| {
        let limit = (data.len() - pos).min(0xffff);
        (0..limit).take_while(|&i| data[pos + i] == data[pos + i - distance]).count()
    };

    while pos < data.len() {
        let pending = pos > lits;
        let rep = if pending && last != 0 {match_len(pos, last)} else {0};
        let (distance, len) = (1..=reach.min(pos).min(32640))
            .map(|d| (d, match_len(pos, d)))
            .max_by_key(|&(d, len)| (len, std::cmp::Reverse(d)))
            .unwrap_or((0, 0));

        if rep >= 1 && rep >= len {
            tokens.push(Literals(&data[lits..pos]));
            tokens.push(Repeat(rep));
            pos += rep;
            lits = pos;
        }
        else if len >= 2 {
            if pending {tokens.push(Literals(&data[lits..pos]))}
            tokens.push(Match{distance, len});
            last = distance;
            pos += len;
            lits = pos;
        }
        else {
            pos += 1;
        }
    }
    if lits < data.len() {tokens.push(Literals(&data[lits..]))}
    tokens
}

/// Compressible but irregular sample data.
pub fn sample(len: usize, seed: u32) -> Vec<u8> {
    let mut x = seed | 1;
    let mut rand = move || {
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        x
    };
    let mut out = Vec::with_capacity(len);
    while out.len() < len {
        let r = rand();
        if out.len() > 8 && r % 3 == 0 {
            let back = 1 + (rand() as usize % out.len().min(3000));
            let n = 2 + (rand() as usize % 40);
            for _ in 0..n {
                let byte = out[out.len() - back];
                out.push(byte);
            }
        }
        else {
            out.push((r >> 8) as u8 % 12 + b'a');
        }
    }
    out.truncate(len);
    out
}
