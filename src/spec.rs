//! The overlay descriptor mini-language.
//!
//! A descriptor is a comma separated list of `key=value` tokens, e.g. `x=50%,y=20,fg=white,bg=black,font=/path/font.ttf:18,s=hello`.
//! Every token is validated before anything is appended, so a bad token rejects the whole descriptor.

use std::{str::FromStr, sync::Arc};

use tracing::debug;

use crate::{
	color::DrawColor,
	error::{OverlayError, Result},
	font::{Font, FontCache},
	render::{Surface, render},
};

pub const DEFAULT_TEXT: &str = "<no content>";

/// A fully resolved overlay: absolute coordinates, palette colors, a loaded face and literal text.
#[derive(Clone, Debug)]
pub struct OverlaySpec {
	/// Baseline-left origin of the text, in pixels from the top-left corner. May lie off canvas.
	pub x: i64,
	pub y: i64,
	pub fg: DrawColor,
	pub bg: DrawColor,
	pub font: Arc<Font>,
	pub text: String,
}

/// Recognized descriptor keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
	X,
	Y,
	Fg,
	Bg,
	Font,
	Text,
}

impl FromStr for Key {
	type Err = OverlayError;

	fn from_str(s: &str) -> Result<Self> {
		Ok(match s {
			"x" => Key::X,
			"y" => Key::Y,
			"fg" => Key::Fg,
			"bg" => Key::Bg,
			"font" => Key::Font,
			"string" | "str" | "s" => Key::Text,
			other => return Err(OverlayError::UnknownKey { key: other.to_owned() }),
		})
	}
}

/// Everything a setter needs besides the value itself.
struct Context<'a> {
	width: u32,
	height: u32,
	fonts: &'a FontCache,
}

#[derive(Debug)]
struct Draft {
	x: i64,
	y: i64,
	fg: DrawColor,
	bg: DrawColor,
	font: Option<Arc<Font>>,
	text: String,
}

impl Default for Draft {
	fn default() -> Self {
		Self {
			x: 0,
			y: 0,
			fg: DrawColor::Black,
			bg: DrawColor::White,
			font: None,
			text: DEFAULT_TEXT.to_owned(),
		}
	}
}

impl Key {
	fn apply(self, draft: &mut Draft, token: &str, value: &str, cx: &Context<'_>) -> Result<()> {
		match self {
			Key::X => draft.x = parse_coordinate(token, value, cx.width)?,
			Key::Y => draft.y = parse_coordinate(token, value, cx.height)?,
			Key::Fg => draft.fg = parse_foreground(token, value)?,
			Key::Bg => draft.bg = parse_color(token, value)?,
			Key::Font => {
				let font = cx.fonts.resolve(value).map_err(|source| OverlayError::FontSpec { token: token.to_owned(), source })?;
				draft.font = Some(font);
			}
			Key::Text => draft.text = value.to_owned(),
		}
		Ok(())
	}
}

/// Integer pixel coordinate. A trailing `%` makes it relative to `dimension`, rounded half away from zero.
/// A percentage whose pixel value does not fit an `i64` is an [`OverlayError::InvalidInteger`].
fn parse_coordinate(token: &str, value: &str, dimension: u32) -> Result<i64> {
	let invalid = |source| OverlayError::InvalidInteger { token: token.to_owned(), source };
	let (digits, percent) = match value.strip_suffix('%') {
		Some(digits) => (digits, true),
		None => (value, false),
	};
	let n: i64 = digits.parse().map_err(|e| invalid(Some(e)))?;
	if !percent {
		return Ok(n);
	}
	// exact in i128: |n * dimension| < 2^95
	let product = i128::from(n) * i128::from(dimension);
	let rounded = (product.abs() + 50) / 100 * product.signum();
	i64::try_from(rounded).map_err(|_| invalid(None))
}

fn parse_color(token: &str, value: &str) -> Result<DrawColor> {
	value.parse().map_err(|e: crate::color::InvalidColor| OverlayError::InvalidColor {
		token: token.to_owned(),
		reason: e.to_string(),
	})
}

/// Like [`parse_color`], but the text color can never be transparent, including via the empty token.
fn parse_foreground(token: &str, value: &str) -> Result<DrawColor> {
	let color = parse_color(token, value)?;
	if color.is_transparent() {
		return Err(OverlayError::InvalidColor {
			token: token.to_owned(),
			reason: format!("invalid fg color: {color}"),
		});
	}
	Ok(color)
}

/// Parse one descriptor against an image of `width`x`height` pixels.
pub fn parse(raw: &str, width: u32, height: u32, fonts: &FontCache) -> Result<OverlaySpec> {
	let pairs = raw
		.split(',')
		.map(|token| token.split_once('=').ok_or_else(|| OverlayError::MalformedToken { token: token.to_owned() }))
		.collect::<Result<Vec<_>>>()?;
	parse_pairs(pairs, width, height, fonts)
}

/// Apply already split `(key, value)` pairs in order, on top of the defaults.
pub fn parse_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>, width: u32, height: u32, fonts: &FontCache) -> Result<OverlaySpec> {
	let cx = Context { width, height, fonts };
	let mut draft = Draft::default();

	for (key, value) in pairs {
		let token = format!("{key}={value}");
		key.parse::<Key>()?.apply(&mut draft, &token, value, &cx)?;
	}

	let font = match draft.font {
		Some(font) => font,
		None => fonts.resolve_default().map_err(|source| OverlayError::FontSpec {
			token: format!("font={}", fonts.default_spec()),
			source,
		})?,
	};

	Ok(OverlaySpec {
		x: draft.x,
		y: draft.y,
		fg: draft.fg,
		bg: draft.bg,
		font,
		text: draft.text,
	})
}

/// Overlays in paint order. Only successfully parsed descriptors are ever appended.
#[derive(Clone, Debug, Default)]
pub struct OverlayList {
	overlays: Vec<OverlaySpec>,
}

impl OverlayList {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, raw: &str, width: u32, height: u32, fonts: &FontCache) -> Result<&OverlaySpec> {
		let spec = parse(raw, width, height, fonts)?;
		Ok(self.append(spec))
	}

	pub fn push_pairs<'a>(&mut self, pairs: impl IntoIterator<Item = (&'a str, &'a str)>, width: u32, height: u32, fonts: &FontCache) -> Result<&OverlaySpec> {
		let spec = parse_pairs(pairs, width, height, fonts)?;
		Ok(self.append(spec))
	}

	fn append(&mut self, spec: OverlaySpec) -> &OverlaySpec {
		debug!(x = spec.x, y = spec.y, fg = %spec.fg, bg = %spec.bg, text = %spec.text, "overlay added");
		self.overlays.push(spec);
		&self.overlays[self.overlays.len() - 1]
	}

	pub fn iter(&self) -> std::slice::Iter<'_, OverlaySpec> {
		self.overlays.iter()
	}

	pub fn len(&self) -> usize {
		self.overlays.len()
	}

	pub fn is_empty(&self) -> bool {
		self.overlays.is_empty()
	}

	/// Paint every overlay in order. Stops at the first failure; earlier overlays stay painted.
	pub fn render_onto<S: Surface + ?Sized>(&self, surface: &mut S) -> Result<()> {
		self.overlays.iter().try_for_each(|spec| render(surface, spec))
	}
}

impl<'a> IntoIterator for &'a OverlayList {
	type IntoIter = std::slice::Iter<'a, OverlaySpec>;
	type Item = &'a OverlaySpec;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}
