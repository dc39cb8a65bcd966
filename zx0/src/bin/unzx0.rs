use {
    anyhow::{Context as _, Result as Anyhow, bail},
    camino::Utf8PathBuf,
    zx0::{SliceSource, Window, WindowSink},
};

const USAGE: &str = "usage: unzx0 input.zx0 [window-size]";

fn main() -> Anyhow<()> {
    util::log_init(log::LevelFilter::Info);

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next().map(Utf8PathBuf::from) else {bail!(USAGE)};
    let window = args.next()
        .map(|size| -> Anyhow<Window> {
            let size = size.parse().context(USAGE)?;
            Ok(Window::new(0x0000, size)?)
        })
        .transpose()?;

    let compressed = std::fs::read(&path).with_context(|| format!("reading {path}"))?;
    log::info!("{path}: {} bytes, hash {:016x}", compressed.len(), util::fnv1a_64(&compressed));

    let mut source = SliceSource::new(&compressed);
    let decoded = if let Some(window) = window {
        // same route as a VRAM target: only the ring is ever read back
        let mut ring = vec![0u8; window.size()];
        let mut out = Vec::<u8>::new();
        let mut sink = WindowSink::new(&mut ring, window, &mut out)?;
        zx0::decompress(&mut source, &mut sink)
            .with_context(|| format!("decoding {path} through a {} byte window", window.size()))?;
        out
    }
    else {
        let mut out = Vec::<u8>::new();
        zx0::decompress(&mut source, &mut out).with_context(|| format!("decoding {path}"))?;
        out
    };

    if !source.remaining().is_empty() {
        log::warn!("{path}: {} bytes after the end marker", source.remaining().len());
    }

    let out_path = path.with_extension("bin");
    if out_path == path {bail!("{path} would be overwritten by its own output")}
    std::fs::write(&out_path, &decoded).with_context(|| format!("writing {out_path}"))?;
    log::info!("{out_path}: {} bytes", decoded.len());
    Ok(())
}
