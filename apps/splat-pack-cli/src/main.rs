use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use splat_pack_cli::{Cli, run};

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .target(env_logger::Target::Stdout)
        .init();

    let cli = Cli::parse().validate()?;

    let progress = ProgressBar::new(cli.inputs.len() as u64).with_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} {wide_msg}")?.progress_chars("=> "),
    );

    let summary = run(&cli, &progress)?;
    progress.finish_and_clear();

    log::info!(
        "Converted {} file(s) ({} splats), skipped {} unsupported file(s)",
        summary.converted,
        summary.total_splats,
        summary.skipped
    );
    Ok(())
}
