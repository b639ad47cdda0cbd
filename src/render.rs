use derive_new::new;
use image::{DynamicImage, GenericImage, GenericImageView, ImageBuffer, Rgba, RgbaImage};
use tiny_skia::{ColorU8, Pixmap, PixmapRef};

use crate::{
	error::{OverlayError, Result},
	spec::OverlaySpec,
};

/// Space between the measured text extent and the edge of its background box, on every side.
pub const PADDING: i64 = 10;

/// Pixel access to a surface that can be written in place.
pub trait Canvas {
	fn dimensions(&self) -> (u32, u32);
	fn pixel(&self, x: u32, y: u32) -> Rgba<u8>;
	fn set_pixel(&mut self, x: u32, y: u32, pixel: Rgba<u8>);
}

/// Anything overlays can be rendered onto.
pub trait Surface {
	fn dimensions(&self) -> (u32, u32);
	/// `None` when the backing storage is read-only.
	fn canvas(&mut self) -> Option<&mut dyn Canvas>;
}

impl Canvas for RgbaImage {
	fn dimensions(&self) -> (u32, u32) {
		ImageBuffer::dimensions(self)
	}

	fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
		*self.get_pixel(x, y)
	}

	fn set_pixel(&mut self, x: u32, y: u32, pixel: Rgba<u8>) {
		self.put_pixel(x, y, pixel);
	}
}

impl Surface for RgbaImage {
	fn dimensions(&self) -> (u32, u32) {
		ImageBuffer::dimensions(self)
	}

	fn canvas(&mut self) -> Option<&mut dyn Canvas> {
		Some(self)
	}
}

impl Canvas for DynamicImage {
	fn dimensions(&self) -> (u32, u32) {
		GenericImageView::dimensions(self)
	}

	fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
		GenericImageView::get_pixel(self, x, y)
	}

	fn set_pixel(&mut self, x: u32, y: u32, pixel: Rgba<u8>) {
		GenericImage::put_pixel(self, x, y, pixel);
	}
}

impl Surface for DynamicImage {
	fn dimensions(&self) -> (u32, u32) {
		GenericImageView::dimensions(self)
	}

	fn canvas(&mut self) -> Option<&mut dyn Canvas> {
		Some(self)
	}
}

/// Image view over borrowed, read-only bytes.
impl Surface for ImageBuffer<Rgba<u8>, &[u8]> {
	fn dimensions(&self) -> (u32, u32) {
		ImageBuffer::dimensions(self)
	}

	fn canvas(&mut self) -> Option<&mut dyn Canvas> {
		None
	}
}

impl Canvas for Pixmap {
	fn dimensions(&self) -> (u32, u32) {
		(self.width(), self.height())
	}

	fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
		match Pixmap::pixel(self, x, y) {
			Some(p) => {
				let c = p.demultiply();
				Rgba([c.red(), c.green(), c.blue(), c.alpha()])
			}
			None => Rgba([0, 0, 0, 0]),
		}
	}

	fn set_pixel(&mut self, x: u32, y: u32, pixel: Rgba<u8>) {
		let idx = y as usize * self.width() as usize + x as usize;
		let Rgba([r, g, b, a]) = pixel;
		if let Some(p) = self.pixels_mut().get_mut(idx) {
			*p = ColorU8::from_rgba(r, g, b, a).premultiply();
		}
	}
}

impl Surface for Pixmap {
	fn dimensions(&self) -> (u32, u32) {
		(self.width(), self.height())
	}

	fn canvas(&mut self) -> Option<&mut dyn Canvas> {
		Some(self)
	}
}

impl Surface for PixmapRef<'_> {
	fn dimensions(&self) -> (u32, u32) {
		(self.width(), self.height())
	}

	fn canvas(&mut self) -> Option<&mut dyn Canvas> {
		None
	}
}

/// Half-open pixel rectangle `[left, right) x [top, bottom)`. May extend past the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, new)]
pub struct Region {
	pub left: i64,
	pub top: i64,
	pub right: i64,
	pub bottom: i64,
}

impl Region {
	pub fn contains(&self, x: i64, y: i64) -> bool {
		(self.left..self.right).contains(&x) && (self.top..self.bottom).contains(&y)
	}
}

/// The padded box painted behind the text, `None` for a transparent background.
/// Edges saturate at the `i64` range, so a box anchored at the extremes just ends up off canvas.
pub fn background_box(spec: &OverlaySpec) -> Option<Region> {
	if spec.bg.is_transparent() {
		return None;
	}
	let extent = spec.font.measure(&spec.text);
	Some(Region::new(
		spec.x.saturating_add(extent.min_x).saturating_sub(PADDING),
		spec.y.saturating_add(extent.min_y).saturating_sub(PADDING),
		spec.x.saturating_add(extent.max_x).saturating_add(PADDING),
		spec.y.saturating_add(extent.max_y).saturating_add(PADDING),
	))
}

/// Paint one overlay: the background box first (if any), then the glyphs with their origin at `(spec.x, spec.y)`.
/// Anything falling outside the surface is clipped.
pub fn render<S: Surface + ?Sized>(surface: &mut S, spec: &OverlaySpec) -> Result<()> {
	let canvas = surface.canvas().ok_or(OverlayError::ImmutableImage)?;

	if let (Some(region), Some(fill)) = (background_box(spec), spec.bg.uniform()) {
		fill_region(canvas, region, fill);
	}

	// fg is never transparent once parsed
	let Some(fg) = spec.fg.uniform() else { return Ok(()) };
	spec.font.draw(&spec.text, spec.x, spec.y, |x, y, coverage| blend(canvas, x, y, fg, coverage));
	Ok(())
}

fn clip(canvas: &dyn Canvas, x: i64, y: i64) -> Option<(u32, u32)> {
	let (width, height) = canvas.dimensions();
	let (x, y) = (u32::try_from(x).ok()?, u32::try_from(y).ok()?);
	(x < width && y < height).then_some((x, y))
}

/// Opaque replacement of every pixel of `region` that lies on the canvas.
fn fill_region(canvas: &mut dyn Canvas, region: Region, fill: Rgba<u8>) {
	let (width, height) = canvas.dimensions();
	let right = region.right.min(i64::from(width));
	let bottom = region.bottom.min(i64::from(height));
	for y in region.top.max(0)..bottom {
		for x in region.left.max(0)..right {
			canvas.set_pixel(x as u32, y as u32, fill);
		}
	}
}

/// Porter-Duff "over" of an opaque `color` at `coverage` onto the pixel at `(x, y)`.
fn blend(canvas: &mut dyn Canvas, x: i64, y: i64, color: Rgba<u8>, coverage: f32) {
	let Some((x, y)) = clip(canvas, x, y) else { return };
	let src_a = coverage.clamp(0.0, 1.0);
	if src_a == 0.0 {
		return;
	}

	let dst = canvas.pixel(x, y);
	let dst_a = f32::from(dst[3]) / 255.0;
	let out_a = src_a + dst_a * (1.0 - src_a);
	let channel = |s: u8, d: u8| ((f32::from(s) * src_a + f32::from(d) * dst_a * (1.0 - src_a)) / out_a).round() as u8;

	canvas.set_pixel(x, y, Rgba([channel(color[0], dst[0]), channel(color[1], dst[1]), channel(color[2], dst[2]), (out_a * 255.0).round() as u8]));
}
