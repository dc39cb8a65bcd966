use {
    anyhow::{Context as _, Result as Anyhow, bail},
    camino::Utf8PathBuf,
    pce::{Console, PointerTable, Rom},
};

const USAGE: &str = "usage: vramload input.zx0 [vram-word-address] [bank]";

fn parse_num(arg: &str) -> Anyhow<u32> {
    let n = match arg.strip_prefix("0x").or_else(|| arg.strip_prefix('$')) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None      => arg.parse(),
    };
    n.with_context(|| format!("bad number {arg}; {USAGE}"))
}

fn main() -> Anyhow<()> {
    util::log_init(log::LevelFilter::Info);

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next().map(Utf8PathBuf::from) else {bail!(USAGE)};
    let vram = args.next().map(|a| parse_num(&a)).transpose()?.unwrap_or(0x2000);
    let Ok(vram) = u16::try_from(vram) else {bail!("vram address {vram:#x} is out of range")};
    if vram as usize >= pce::VRAM_WORDS {bail!("vram address {vram:#x} is past the end of VRAM")}
    let first_bank = args.next().map(|a| parse_num(&a)).transpose()?.unwrap_or(0) as usize;
    if first_bank >= pce::ROM_BANKS {bail!("bank {first_bank:#x} is past the end of the ROM")}

    let compressed = std::fs::read(&path).with_context(|| format!("reading {path}"))?;
    log::info!("{path}: {} bytes, hash {:016x}", compressed.len(), util::fnv1a_64(&compressed));

    let mut rom = Rom::from_image(vec![0xff; first_bank * pce::BANK_SIZE])?;
    let mut table = PointerTable::new();
    table.push(rom.place(&compressed)?)?;

    let mut console = Console::new(rom);
    let last_bank = pce::decomp_zx0_vram(&mut console, &table, 0, vram)
        .with_context(|| format!("decompressing {path} to vram {vram:#06x}"))?;

    let end = console.vdc.mawr();
    let dump = console.vdc.committed_from(vram);
    let out_path = path.with_extension("vram");
    if out_path == path {bail!("{path} would be overwritten by its own output")}
    std::fs::write(&out_path, dump).with_context(|| format!("writing {out_path}"))?;
    log::info!("{out_path}: words {vram:#06x}..{end:#06x}, stream ended in bank {last_bank:#04x}");
    Ok(())
}
