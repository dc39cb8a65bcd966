pub fn row_major<Xs, Ys> (xs: Xs, ys: Ys)
    -> impl Iterator<Item = (Xs::Item, Ys::Item)>
where
    Xs: Iterator + Clone,
    Xs::Item: 'static,
    Ys: Iterator,
    Ys::Item: Clone + 'static,
{
    ys.flat_map(move |y| xs.clone().map(move |x| (x, y.clone())))
}

/// Cheap content fingerprint for log lines; not for anything that matters.
pub const fn fnv1a_64(bs: &[u8]) -> u64 {
    const H0: u64 = 0xcbf29ce4_84222325;
    const A:  u64 = 0x00000100_000001B3;

    let mut h = H0;
    let mut i = 0;
    while i != bs.len() {
        h ^= bs[i] as u64;
        h = h.wrapping_mul(A);
        i += 1;
    }
    h
}

/// Terminal logging for the command-line tools. Everything goes to stderr so
/// stdout stays free for data.
pub fn log_init(level: log::LevelFilter) {
    use simplelog::*;
    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .build();
    // only fails if a logger is already installed, which is fine
    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto);
}
