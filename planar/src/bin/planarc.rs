use {
    anyhow::{Context as _, Result as Anyhow},
    camino::Utf8Path,
    clap::clap_app,
    planar::{Indexed, Kind},
};

fn main() -> Anyhow<()> {
    let matches = clap_app!(planarc =>
        (version: env!("CARGO_PKG_VERSION"))
        (about: "Indexed image to PC Engine planar converter")
        (@arg in: -i --in +takes_value +required "Source image; palettised PNG indices are kept as they are")
        (@arg out: -o --out +takes_value "Override the default output name")
        (@arg linear: -l --linear "Also write a linear 4bpp file")
        (@arg silence: -s --silence "Only report problems")
        (@arg type: -t --type +takes_value +required "Sprite, tile_8x8 or tile_16x16 (HuC metatiles)")
    ).get_matches();

    let level = if matches.is_present("silence") {log::LevelFilter::Warn} else {log::LevelFilter::Info};
    util::log_init(level);

    // both required, clap has already checked
    let path = Utf8Path::new(matches.value_of("in").unwrap_or_default());
    let kind: Kind = matches.value_of("type").unwrap_or_default().parse()?;

    let bytes = std::fs::read(path).with_context(|| format!("reading {path}"))?;
    let image = Indexed::decode(&bytes).with_context(|| format!("indexing {path}"))?;
    log::info!("{path}: {}x{}", image.wide(), image.high());

    let out = planar::convert(&image, kind);
    let (planar_name, linear_name) = planar::output_names(matches.value_of("out"), kind);

    std::fs::write(&planar_name, &out.planar).with_context(|| format!("writing {planar_name}"))?;
    log::info!("{planar_name}: {} cells, {} bytes", out.cells, out.planar.len());

    if matches.is_present("linear") {
        std::fs::write(&linear_name, &out.linear).with_context(|| format!("writing {linear_name}"))?;
        log::info!("{linear_name}: {} bytes", out.linear.len());
    }
    Ok(())
}
