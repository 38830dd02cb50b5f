use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser};
use indicatif::ProgressBar;
use web_time::Instant;

#[derive(Clone, Debug, Args)]
pub struct ConvertArgs {
    /// Directory to write the .splat files to. Defaults to next to each input.
    #[arg(long, short, help_heading = "Convert options")]
    pub output_dir: Option<PathBuf>,
    /// Number of threads to convert with. Defaults to all cores.
    #[arg(long, help_heading = "Convert options")]
    pub threads: Option<usize>,
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Pack gaussian splat .ply files into importance sorted .splat buffers"
)]
pub struct Cli {
    /// Ply files to convert.
    #[arg(value_name = "PLY", required = true)]
    pub inputs: Vec<PathBuf>,
    #[clap(flatten)]
    pub convert: ConvertArgs,
}

impl Cli {
    pub fn validate(self) -> anyhow::Result<Self> {
        if self.convert.threads == Some(0) {
            anyhow::bail!("--threads must be at least 1");
        }
        if let Some(dir) = &self.convert.output_dir
            && dir.is_file()
        {
            anyhow::bail!("Output directory {dir:?} is a file");
        }
        Ok(self)
    }
}

pub enum FileOutcome {
    Converted { output: PathBuf, splats: usize },
    Skipped,
}

#[derive(Default, Debug)]
pub struct Summary {
    pub converted: usize,
    pub skipped: usize,
    pub total_splats: usize,
}

pub fn output_path(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let file_name = input.with_extension("splat");
    let file_name = file_name.file_name().unwrap_or(file_name.as_os_str());
    match output_dir {
        Some(dir) => dir.join(file_name),
        None => input.with_extension("splat"),
    }
}

pub fn convert_file(input: &Path, output_dir: Option<&Path>) -> anyhow::Result<FileOutcome> {
    let data = std::fs::read(input).with_context(|| format!("Failed to read {input:?}"))?;

    let buffer = match splat_pack::convert(&data) {
        Ok(buffer) => buffer,
        Err(e) if e.is_unsupported() => {
            log::warn!("Skipping {input:?}: {e}");
            return Ok(FileOutcome::Skipped);
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to convert {input:?}")),
    };

    let output = output_path(input, output_dir);
    let splats = buffer.len();
    std::fs::write(&output, buffer.into_bytes())
        .with_context(|| format!("Failed to write {output:?}"))?;

    Ok(FileOutcome::Converted { output, splats })
}

fn convert_all(cli: &Cli, progress: &ProgressBar) -> anyhow::Result<Summary> {
    let output_dir = cli.convert.output_dir.as_deref();
    if let Some(dir) = output_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {dir:?}"))?;
    }

    let mut summary = Summary::default();
    for input in &cli.inputs {
        let _span = tracing::info_span!("Convert file", path = ?input).entered();
        progress.set_message(input.display().to_string());

        let start = Instant::now();
        match convert_file(input, output_dir)? {
            FileOutcome::Converted { output, splats } => {
                let elapsed = humantime::format_duration(start.elapsed());
                progress.suspend(|| {
                    log::info!("Wrote {splats} splats to {output:?} in {elapsed}");
                });
                summary.converted += 1;
                summary.total_splats += splats;
            }
            FileOutcome::Skipped => summary.skipped += 1,
        }
        progress.inc(1);
    }
    Ok(summary)
}

pub fn run(cli: &Cli, progress: &ProgressBar) -> anyhow::Result<Summary> {
    match cli.convert.threads {
        Some(threads) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .context("Failed to build thread pool")?;
            pool.install(|| convert_all(cli, progress))
        }
        None => convert_all(cli, progress),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_ply(path: &Path) {
        let mut data = b"ply\n\
            format binary_little_endian 1.0\n\
            element vertex 2\n\
            property float x\n\
            property float y\n\
            property float z\n\
            property uchar red\n\
            property uchar green\n\
            property uchar blue\n\
            end_header\n"
            .to_vec();
        for (pos, color) in [([1.0f32, 2.0, 3.0], [10u8, 20, 30]), ([4.0, 5.0, 6.0], [1, 2, 3])] {
            for p in pos {
                data.extend(p.to_le_bytes());
            }
            data.extend(color);
        }
        std::fs::write(path, data).unwrap();
    }

    fn cli(inputs: Vec<PathBuf>, output_dir: Option<PathBuf>) -> Cli {
        Cli {
            inputs,
            convert: ConvertArgs {
                output_dir,
                threads: Some(2),
            },
        }
    }

    #[test]
    fn output_path_swaps_extension() {
        assert_eq!(
            output_path(Path::new("scans/room.ply"), None),
            PathBuf::from("scans/room.splat")
        );
        assert_eq!(
            output_path(Path::new("scans/room.ply"), Some(Path::new("out"))),
            PathBuf::from("out/room.splat")
        );
    }

    #[test]
    fn converts_and_skips() {
        let dir = tempfile::tempdir().unwrap();
        let ply = dir.path().join("points.ply");
        let not_ply = dir.path().join("notes.txt");
        write_ply(&ply);
        std::fs::write(&not_ply, "hello").unwrap();

        let out_dir = dir.path().join("out");
        let cli = cli(vec![ply, not_ply], Some(out_dir.clone()));
        let summary = run(&cli, &ProgressBar::hidden()).unwrap();

        assert_eq!(summary.converted, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.total_splats, 2);

        let written = std::fs::read(out_dir.join("points.splat")).unwrap();
        assert_eq!(written.len(), 64);
        assert!(!out_dir.join("notes.splat").exists());
    }

    #[test]
    fn broken_ply_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ply = dir.path().join("broken.ply");
        std::fs::write(&ply, "ply\nelement vertex 3\n").unwrap();

        let result = run(&cli(vec![ply], None), &ProgressBar::hidden());
        assert!(result.is_err());
    }

    #[test]
    fn zero_threads_is_invalid() {
        let mut args = cli(vec![PathBuf::from("a.ply")], None);
        args.convert.threads = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn parses_args() {
        let cli = Cli::try_parse_from(["splat-pack", "a.ply", "b.ply", "-o", "out", "--threads", "4"])
            .unwrap();
        assert_eq!(cli.inputs.len(), 2);
        assert_eq!(cli.convert.output_dir, Some(PathBuf::from("out")));
        assert_eq!(cli.convert.threads, Some(4));

        assert!(Cli::try_parse_from(["splat-pack"]).is_err());
    }
}
