use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::{
	Result,
	eyre::{WrapErr as _, eyre},
};
use image::{DynamicImage, GenericImageView, imageops};
use text_overlay::{OverlayList, config::AppConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "text_overlay")]
#[command(about = "Annotate an image with positioned text labels")]
struct Args {
	/// Path to input image file (any format the `image` crate decodes)
	input: PathBuf,
	/// Where to write the result. Defaults to `<input-stem>.overlay.png` next to the input.
	#[arg(short, long)]
	output: Option<PathBuf>,
	/// Overlay descriptor, e.g. `x=10,y=90%,fg=white,bg=transparent,font=/path/to/font.ttf:18,s=hello`. Repeatable; painted in order.
	#[arg(short = 't', long = "text")]
	text: Vec<String>,
	/// Scale to cover WIDTHxHEIGHT and center-crop before drawing. Percent coordinates resolve against the resized image.
	#[arg(long, value_parser = parse_dimensions)]
	resize: Option<(u32, u32)>,
	/// Config file. Defaults to $XDG_CONFIG_HOME/text_overlay{,/config}.{toml,yaml,json,..}
	#[arg(long)]
	config: Option<PathBuf>,
}

fn parse_dimensions(s: &str) -> std::result::Result<(u32, u32), String> {
	let (w, h) = s.split_once(['x', 'X']).ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
	let parse = |v: &str| match v.trim().parse::<u32>() {
		Ok(0) | Err(_) => Err(format!("invalid dimension {v:?} in {s:?}")),
		Ok(n) => Ok(n),
	};
	Ok((parse(w)?, parse(h)?))
}

fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.with_writer(std::io::stderr)
		.init();
	let args = Args::parse();

	let config = AppConfig::read(args.config.as_deref())?;
	let fonts = config.font_cache();

	let mut img = image::open(&args.input).wrap_err_with(|| format!("Failed to open {}", args.input.display()))?;
	if let Some((width, height)) = args.resize {
		img = resize_fill(img, width, height);
	}
	let mut img = img.to_rgba8();
	let (width, height) = img.dimensions();
	info!("Input {} is {width}x{height}", args.input.display());

	let mut overlays = OverlayList::new();
	for entry in &config.overlays {
		entry.push_onto(&mut overlays, width, height, &fonts).wrap_err("Invalid overlay in config")?;
	}
	for raw in &args.text {
		overlays.push(raw, width, height, &fonts).wrap_err_with(|| format!("Invalid overlay {raw:?}"))?;
	}
	if overlays.is_empty() {
		return Err(eyre!("No overlays given. Pass at least one --text descriptor or configure `overlays`"));
	}

	overlays.render_onto(&mut img)?;

	let output_path = args.output.unwrap_or_else(|| default_output(&args.input));
	img.save(&output_path).wrap_err_with(|| format!("Failed to write {}", output_path.display()))?;
	info!("Rendered {} overlay(s) to {}", overlays.len(), output_path.display());

	Ok(())
}

fn default_output(input: &Path) -> PathBuf {
	input.with_extension("overlay.png")
}

/// Scale `img` until it covers the target, then crop the excess evenly from both sides.
fn resize_fill(img: DynamicImage, target_width: u32, target_height: u32) -> DynamicImage {
	let (img_width, img_height) = img.dimensions();
	let img_ratio = img_width as f32 / img_height as f32;
	let target_ratio = target_width as f32 / target_height as f32;

	let (scaled_width, scaled_height) = if img_ratio > target_ratio {
		((target_height as f32 * img_ratio).round() as u32, target_height)
	} else {
		(target_width, (target_width as f32 / img_ratio).round() as u32)
	};
	let (scaled_width, scaled_height) = (scaled_width.max(target_width), scaled_height.max(target_height));

	let resized = img.resize_exact(scaled_width, scaled_height, imageops::FilterType::Lanczos3).to_rgba8();
	let x_offset = (scaled_width - target_width) / 2;
	let y_offset = (scaled_height - target_height) / 2;

	DynamicImage::ImageRgba8(imageops::crop_imm(&resized, x_offset, y_offset, target_width, target_height).to_image())
}

#[cfg(test)]
mod tests {
	use image::RgbaImage;

	use super::*;

	#[test]
	fn dimensions_flag() {
		assert_eq!(parse_dimensions("1920x1080"), Ok((1920, 1080)));
		assert_eq!(parse_dimensions("300X200"), Ok((300, 200)));
		assert!(parse_dimensions("1920").is_err());
		assert!(parse_dimensions("0x10").is_err());
		assert!(parse_dimensions("ax10").is_err());
	}

	#[test]
	fn resize_fill_hits_exact_target() {
		let wide = DynamicImage::ImageRgba8(RgbaImage::new(400, 100));
		assert_eq!(resize_fill(wide, 120, 90).dimensions(), (120, 90));

		let tall = DynamicImage::ImageRgba8(RgbaImage::new(50, 300));
		assert_eq!(resize_fill(tall, 200, 100).dimensions(), (200, 100));
	}

	#[test]
	fn output_defaults_next_to_input() {
		assert_eq!(default_output(Path::new("/tmp/shot.jpg")), PathBuf::from("/tmp/shot.overlay.png"));
	}
}
