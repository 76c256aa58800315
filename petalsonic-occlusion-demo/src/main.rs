mod walkthrough;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let level = if args.iter().any(|arg| arg == "--trace") {
        log::LevelFilter::Trace
    } else {
        log::LevelFilter::Debug
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let ticks = match args.iter().position(|arg| arg == "--ticks") {
        Some(index) => args
            .get(index + 1)
            .ok_or_else(|| anyhow::anyhow!("--ticks expects a number"))?
            .parse()?,
        None => 60,
    };

    walkthrough::run_corridor(ticks)
}
