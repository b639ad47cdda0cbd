use std::{
	collections::HashMap,
	fmt,
	path::{Path, PathBuf},
	sync::{Arc, Mutex, PoisonError},
};

use ab_glyph::{Font as _, FontVec, GlyphId, PxScale, ScaleFont as _, point};
use derive_new::new;
use tracing::debug;

use crate::error::FontError;

/// Rendering resolution every face in the process is built at.
pub const DPI: f32 = 226.0;
pub const DEFAULT_FONT_SIZE: f32 = 12.0;
pub const DEFAULT_FONT_SPEC: &str = "/usr/share/fonts/ttf/noto/NotoSans-Regular.ttf:12";

/// Tight bounding box of a rendered string, in pixels relative to the baseline-left origin.
/// Y grows downward, so glyph parts above the baseline have negative `min_y`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, new)]
pub struct Extent {
	pub min_x: i64,
	pub min_y: i64,
	pub max_x: i64,
	pub max_y: i64,
}

/// A parsed font program at a fixed size.
pub struct Font {
	face: FontVec,
	path: PathBuf,
	size: f32,
	scale: PxScale,
}

impl fmt::Debug for Font {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Font").field("path", &self.path).field("size", &self.size).finish_non_exhaustive()
	}
}

impl Font {
	/// Build a face from font program bytes. `path` is only used to identify the face in errors and logs.
	pub fn from_vec(data: Vec<u8>, size: f32, path: impl Into<PathBuf>) -> Result<Self, FontError> {
		let path = path.into();
		let face = FontVec::try_from_vec(data).map_err(|source| FontError::Malformed { path: path.clone(), source })?;
		let units_per_em = face.units_per_em().ok_or_else(|| FontError::MissingUnitsPerEm { path: path.clone() })?;

		// ab_glyph scales by ascent-descent height, we want `size` points per em at DPI
		let px_per_em = size * DPI / 72.0;
		let scale = PxScale::from(px_per_em * face.height_unscaled() / units_per_em);

		Ok(Self { face, path, size, scale })
	}

	pub fn load(path: &Path, size: f32) -> Result<Self, FontError> {
		let data = std::fs::read(path).map_err(|source| FontError::Unreadable { path: path.to_owned(), source })?;
		Self::from_vec(data, size, path)
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Point size.
	pub fn size(&self) -> f32 {
		self.size
	}

	pub fn px_per_em(&self) -> f32 {
		self.size * DPI / 72.0
	}

	/// Glyph ids with their caret offsets from the origin, kerning applied.
	fn layout<'a>(&'a self, text: &'a str) -> impl Iterator<Item = (GlyphId, f32)> + 'a {
		let scaled = self.face.as_scaled(self.scale);
		let mut caret = 0.0;
		let mut prev: Option<GlyphId> = None;
		text.chars().map(move |c| {
			let id = scaled.glyph_id(c);
			if let Some(prev) = prev {
				caret += scaled.kern(prev, id);
			}
			let at = caret;
			caret += scaled.h_advance(id);
			prev = Some(id);
			(id, at)
		})
	}

	/// Tight extent of the glyph outlines of `text`. Outline-less glyphs (space) only advance the caret.
	pub fn measure(&self, text: &str) -> Extent {
		let scaled = self.face.as_scaled(self.scale);
		let (h, v) = (scaled.h_scale_factor(), scaled.v_scale_factor());

		let mut bounds: Option<(f32, f32, f32, f32)> = None;
		for (id, caret) in self.layout(text) {
			let Some(outline) = self.face.outline(id) else { continue };
			let b = outline.bounds;
			// outline units are y-up
			let glyph = (caret + b.min.x * h, -b.max.y * v, caret + b.max.x * h, -b.min.y * v);
			bounds = Some(match bounds {
				None => glyph,
				Some(acc) => (acc.0.min(glyph.0), acc.1.min(glyph.1), acc.2.max(glyph.2), acc.3.max(glyph.3)),
			});
		}

		match bounds {
			Some((min_x, min_y, max_x, max_y)) => Extent::new(min_x.round() as i64, min_y.round() as i64, max_x.round() as i64, max_y.round() as i64),
			None => Extent::default(),
		}
	}

	/// Rasterize `text` with its baseline-left origin at `(x, y)`, calling `plot(px, py, coverage)` for every touched pixel.
	/// Coordinates are not clipped; they saturate at the `i64` range.
	pub fn draw(&self, text: &str, x: i64, y: i64, mut plot: impl FnMut(i64, i64, f32)) {
		for (id, caret) in self.layout(text) {
			// rasterize around a zero origin and offset by the integer anchor afterwards
			let glyph = id.with_scale_and_position(self.scale, point(caret, 0.0));
			let Some(outlined) = self.face.outline_glyph(glyph) else { continue };
			let bounds = outlined.px_bounds();
			let left = x.saturating_add(bounds.min.x as i64);
			let top = y.saturating_add(bounds.min.y as i64);
			outlined.draw(|gx, gy, coverage| plot(left.saturating_add(i64::from(gx)), top.saturating_add(i64::from(gy)), coverage));
		}
	}
}

/// Split a `path[:size]` spec on its first `:`. The size defaults to [`DEFAULT_FONT_SIZE`].
pub fn parse_font_spec(spec: &str) -> Result<(&Path, f32), FontError> {
	let Some((path, size)) = spec.split_once(':') else {
		debug!("Default font size {DEFAULT_FONT_SIZE}");
		return Ok((Path::new(spec), DEFAULT_FONT_SIZE));
	};
	let invalid = |source| FontError::InvalidSize {
		spec: spec.to_owned(),
		size: size.to_owned(),
		source,
	};
	let size: f32 = size.parse().map_err(|e| invalid(Some(e)))?;
	if !size.is_finite() || size <= 0.0 {
		return Err(invalid(None));
	}
	Ok((Path::new(path), size))
}

/// Loaded faces keyed by the literal spec string they were requested with.
///
/// Entries are never evicted. Lookup and population happen under one lock, so concurrent
/// requests for the same spec load the file once.
pub struct FontCache {
	default_spec: String,
	fonts: Mutex<HashMap<String, Arc<Font>>>,
}

impl fmt::Debug for FontCache {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FontCache").field("default_spec", &self.default_spec).field("len", &self.len()).finish()
	}
}

impl Default for FontCache {
	fn default() -> Self {
		Self::new()
	}
}

impl FontCache {
	pub fn new() -> Self {
		Self::with_default_spec(DEFAULT_FONT_SPEC)
	}

	pub fn with_default_spec(spec: impl Into<String>) -> Self {
		Self {
			default_spec: spec.into(),
			fonts: Mutex::new(HashMap::new()),
		}
	}

	/// Spec resolved when an overlay names no font.
	pub fn default_spec(&self) -> &str {
		&self.default_spec
	}

	pub fn resolve(&self, spec: &str) -> Result<Arc<Font>, FontError> {
		let mut fonts = self.fonts.lock().unwrap_or_else(PoisonError::into_inner);
		if let Some(font) = fonts.get(spec) {
			debug!(spec, "font cache hit");
			return Ok(Arc::clone(font));
		}

		let (path, size) = parse_font_spec(spec)?;
		let font = Arc::new(Font::load(path, size)?);
		debug!(spec, path = %font.path().display(), px_per_em = font.px_per_em(), "loaded font");
		fonts.insert(spec.to_owned(), Arc::clone(&font));
		Ok(font)
	}

	pub fn resolve_default(&self) -> Result<Arc<Font>, FontError> {
		self.resolve(&self.default_spec)
	}

	/// Register an already built face under `spec`, replacing any previous entry.
	pub fn insert(&self, spec: impl Into<String>, font: Font) -> Arc<Font> {
		let font = Arc::new(font);
		self.fonts.lock().unwrap_or_else(PoisonError::into_inner).insert(spec.into(), Arc::clone(&font));
		font
	}

	pub fn len(&self) -> usize {
		self.fonts.lock().unwrap_or_else(PoisonError::into_inner).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn spec_without_size_defaults_to_12() {
		let (path, size) = parse_font_spec("/fonts/a.ttf").unwrap();
		assert_eq!(path, Path::new("/fonts/a.ttf"));
		assert_eq!(size, 12.0);
	}

	#[test]
	fn spec_splits_on_first_colon() {
		let (path, size) = parse_font_spec("/fonts/a.ttf:14.5").unwrap();
		assert_eq!(path, Path::new("/fonts/a.ttf"));
		assert_eq!(size, 14.5);

		// anything after the first colon is the size
		assert!(matches!(parse_font_spec("a:b:12"), Err(FontError::InvalidSize { .. })));
	}

	#[test]
	fn rejects_bad_sizes() {
		for spec in ["a.ttf:", "a.ttf:big", "a.ttf:0", "a.ttf:-3", "a.ttf:inf", "a.ttf:NaN"] {
			assert!(matches!(parse_font_spec(spec), Err(FontError::InvalidSize { .. })), "{spec}");
		}
	}

	#[test]
	fn unreadable_file_is_not_cached() {
		let cache = FontCache::new();
		let err = cache.resolve("/definitely/not/here.ttf:12").unwrap_err();
		assert!(matches!(err, FontError::Unreadable { .. }));
		assert!(cache.is_empty());
	}

	#[test]
	fn garbage_bytes_are_malformed() {
		let err = Font::from_vec(b"not a font".to_vec(), 12.0, "mem").unwrap_err();
		assert!(matches!(err, FontError::Malformed { .. }));
	}

	#[test]
	fn default_spec_is_overridable() {
		assert_eq!(FontCache::new().default_spec(), DEFAULT_FONT_SPEC);
		assert_eq!(FontCache::with_default_spec("x.ttf:9").default_spec(), "x.ttf:9");
	}
}
