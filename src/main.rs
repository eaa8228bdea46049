use anyhow::{Context, bail};
use run_ngin::{
    config::GameConfig,
    flow,
    logging::{LoggingConfig, init_logging},
};

struct Args {
    profile: String,
    headless: Option<u64>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args {
        profile: "default".to_string(),
        headless: None,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--profile" => {
                args.profile = it.next().context("--profile needs a name")?;
            }
            "--headless" => {
                let frames = it.next().context("--headless needs a frame count")?;
                args.headless = Some(
                    frames
                        .parse()
                        .with_context(|| format!("`{frames}` is not a frame count"))?,
                );
            }
            "-h" | "--help" => {
                println!("usage: run42 [--profile NAME] [--headless FRAMES]");
                std::process::exit(0);
            }
            other => bail!("unknown argument `{other}`"),
        }
    }
    Ok(args)
}

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());
    let args = parse_args()?;
    let config = GameConfig::load(&args.profile)
        .with_context(|| format!("could not load profile `{}`", args.profile))?;

    match args.headless {
        Some(frames) => {
            let summary = flow::run_headless(config, frames)?;
            println!(
                "{} frames, score {}, health {}, {:?}",
                summary.frames, summary.score, summary.health, summary.status
            );
            Ok(())
        }
        None => flow::run(config),
    }
}
