use std::path::{Path, PathBuf};

use anyhow::Context;
use apainter::random::random_strokes;
use apainter::{legacy, Drawing, PainterConfig};
use clap::{Parser, Subcommand};

mod util;
use util::ResultExt;

const DEFAULT_CONFIG: &str = "apainter.toml";

#[derive(Parser)]
#[command(name = "apainter", version, about = "Inspect and convert painter drawings")]
struct Cli {
	/// Brush and import settings. Defaults to `apainter.toml` if it exists.
	#[arg(long, global = true)]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Print a summary of a binary or JSON drawing
	Inspect { file: PathBuf },
	/// Convert a binary or JSON drawing to the binary format
	Convert { input: PathBuf, output: PathBuf },
	/// Write a drawing made of random strokes
	Random {
		output: PathBuf,
		#[arg(long, default_value_t = 10)]
		strokes: usize,
		#[arg(long)]
		seed: Option<u64>,
	},
}

fn configure_tracing() -> anyhow::Result<()> {
	let max_level = if cfg!(debug_assertions) {
		tracing::Level::TRACE
	} else {
		tracing::Level::INFO
	};
	tracing::subscriber::set_global_default(
		tracing_subscriber::FmtSubscriber::builder()
			.with_max_level(max_level)
			.with_writer(std::io::stderr)
			.finish(),
	)?;
	Ok(())
}

fn configure_logging() -> anyhow::Result<()> {
	configure_tracing()?;

	// Dependencies logging through `log` end up in the same subscriber.
	#[cfg(feature = "log")]
	tracing_log::LogTracer::init()?;
	Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PainterConfig> {
	if let Some(path) = path {
		return Ok(PainterConfig::load(path)?);
	}
	let default = Path::new(DEFAULT_CONFIG);
	if !default.exists() {
		return Ok(PainterConfig::default());
	}
	Ok(PainterConfig::load(default)
		.ok_or_warn("ignoring default config")
		.unwrap_or_default())
}

fn load_drawing(path: &Path, config: &PainterConfig) -> anyhow::Result<Drawing> {
	let mut drawing = Drawing::new(config.registry()?);
	let is_json = path
		.extension()
		.is_some_and(|extension| extension.eq_ignore_ascii_case("json"));
	if is_json {
		let json = std::fs::read_to_string(path)
			.with_context(|| format!("failed to read {}", path.display()))?;
		legacy::import_str(&mut drawing, &json, &config.import)?;
	} else {
		let bytes =
			std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
		// Decode warnings are logged by the codec.
		drawing.load_binary(&bytes)?;
	}
	Ok(drawing)
}

fn save_drawing(path: &Path, drawing: &Drawing) -> anyhow::Result<()> {
	let bytes = drawing.to_binary();
	std::fs::write(path, &bytes).with_context(|| format!("failed to write {}", path.display()))?;
	tracing::info!(path = %path.display(), bytes = bytes.len(), strokes = drawing.len(), "saved");
	Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
	let config = load_config(cli.config.as_deref())?;
	match cli.command {
		Command::Inspect { file } => {
			let drawing = load_drawing(&file, &config)?;
			let points: usize = drawing.strokes().iter().map(|stroke| stroke.len()).sum();
			println!("strokes: {}", drawing.len());
			println!("points: {points}");
			println!("brushes: {}", drawing.used_brush_names().join(", "));
			for (i, stroke) in drawing.strokes().iter().enumerate() {
				println!(
					"  {i}: {} size {} color {} with {} points",
					drawing.brush_name(stroke),
					stroke.size(),
					stroke.color(),
					stroke.len()
				);
			}
		}
		Command::Convert { input, output } => {
			let drawing = load_drawing(&input, &config)?;
			save_drawing(&output, &drawing)?;
		}
		Command::Random {
			output,
			strokes,
			seed,
		} => {
			let mut drawing = Drawing::new(config.registry()?);
			random_strokes(strokes).maybe_seed(seed).generate(&mut drawing)?;
			save_drawing(&output, &drawing)?;
		}
	}
	Ok(())
}

fn main() {
	let cli = Cli::parse();

	if let Err(error) = configure_logging() {
		// We can technically continue without logging.
		eprintln!("failed to configure logging: {error}");
	}

	if let Err(error) = run(cli) {
		tracing::error!(error = format!("{error:#}"));
		std::process::exit(1);
	}
}
