//! A tiny TrueType font built in memory, so tests don't depend on system fonts.
//!
//! Glyphs: `.notdef` (empty), a solid box used for every printable ASCII character except space, and an
//! outline-less space. With 904 units per em, a 36pt face at 226 DPI is exactly 113 px per em, i.e. 1/8 px per unit.
#![allow(dead_code)]

use std::path::Path;

use text_overlay::{Font, FontCache};

pub const UNITS_PER_EM: u16 = 904;
pub const SIZE: f32 = 36.0;
/// Pixels per font unit at [`SIZE`].
pub const PX_PER_UNIT: f32 = 0.125;

/// Box glyph outline in font units: x_min, y_min, x_max, y_max.
pub const BOX: [i16; 4] = [96, 0, 496, 704];
pub const BOX_ADVANCE: u16 = 600;
pub const SPACE_ADVANCE: u16 = 256;

/// Spec string the synthetic face is registered under by [`fonts`].
pub const SPEC: &str = "synthetic.ttf:36";

struct Writer(Vec<u8>);

impl Writer {
	fn u8(&mut self, v: u8) -> &mut Self {
		self.0.push(v);
		self
	}

	fn u16(&mut self, v: u16) -> &mut Self {
		self.0.extend_from_slice(&v.to_be_bytes());
		self
	}

	fn i16(&mut self, v: i16) -> &mut Self {
		self.0.extend_from_slice(&v.to_be_bytes());
		self
	}

	fn u32(&mut self, v: u32) -> &mut Self {
		self.0.extend_from_slice(&v.to_be_bytes());
		self
	}

	fn i64(&mut self, v: i64) -> &mut Self {
		self.0.extend_from_slice(&v.to_be_bytes());
		self
	}
}

fn table(build: impl FnOnce(&mut Writer)) -> Vec<u8> {
	let mut w = Writer(Vec::new());
	build(&mut w);
	w.0
}

fn checksum(data: &[u8]) -> u32 {
	data.chunks(4).fold(0u32, |sum, chunk| {
		let mut word = [0u8; 4];
		word[..chunk.len()].copy_from_slice(chunk);
		sum.wrapping_add(u32::from_be_bytes(word))
	})
}

pub fn font_bytes() -> Vec<u8> {
	let [x_min, y_min, x_max, y_max] = BOX;

	let box_glyph = table(|w| {
		w.i16(1).i16(x_min).i16(y_min).i16(x_max).i16(y_max);
		// one contour of four on-curve points, no instructions
		w.u16(3).u16(0);
		for _ in 0..4 {
			w.u8(0x01);
		}
		for dx in [x_min, 0, x_max - x_min, 0] {
			w.i16(dx);
		}
		for dy in [y_min, y_max - y_min, 0, y_min - y_max] {
			w.i16(dy);
		}
	});
	let glyph_len = u16::try_from(box_glyph.len()).unwrap();
	assert_eq!(glyph_len % 2, 0);

	let cmap = table(|w| {
		w.u16(0).u16(1);
		w.u16(3).u16(1).u32(12);
		// format 6: trimmed table mapping 32..=126
		let count: u16 = 95;
		w.u16(6).u16(10 + 2 * count).u16(0).u16(32).u16(count);
		w.u16(2);
		for _ in 1..count {
			w.u16(1);
		}
	});

	let head = table(|w| {
		w.u32(0x0001_0000).u32(0x0001_0000).u32(0).u32(0x5F0F_3CF5);
		w.u16(0).u16(UNITS_PER_EM);
		w.i64(0).i64(0);
		w.i16(x_min).i16(y_min).i16(x_max).i16(y_max);
		w.u16(0).u16(8).i16(2);
		// short loca offsets, glyph data format 0
		w.i16(0).i16(0);
	});
	assert_eq!(head.len(), 54);

	let hhea = table(|w| {
		w.u32(0x0001_0000);
		w.i16(800).i16(-200).i16(0);
		w.u16(BOX_ADVANCE).i16(x_min).i16(BOX_ADVANCE as i16 - x_max).i16(x_max);
		w.i16(1).i16(0).i16(0);
		w.i16(0).i16(0).i16(0).i16(0);
		w.i16(0).u16(3);
	});
	assert_eq!(hhea.len(), 36);

	let hmtx = table(|w| {
		w.u16(500).i16(0);
		w.u16(BOX_ADVANCE).i16(x_min);
		w.u16(SPACE_ADVANCE).i16(0);
	});
	let loca = table(|w| {
		w.u16(0).u16(0).u16(glyph_len / 2).u16(glyph_len / 2);
	});
	let maxp = table(|w| {
		w.u32(0x0000_5000).u16(3);
	});

	// sorted by tag
	let tables: [(&[u8; 4], Vec<u8>); 7] = [
		(b"cmap", cmap),
		(b"glyf", box_glyph),
		(b"head", head),
		(b"hhea", hhea),
		(b"hmtx", hmtx),
		(b"loca", loca),
		(b"maxp", maxp),
	];

	let num_tables = tables.len() as u16;
	let mut out = Writer(Vec::new());
	out.u32(0x0001_0000).u16(num_tables).u16(64).u16(2).u16(num_tables * 16 - 64);

	let mut offset = 12 + 16 * tables.len();
	let mut body = Vec::new();
	for (tag, data) in &tables {
		out.0.extend_from_slice(*tag);
		out.u32(checksum(data)).u32(offset as u32).u32(data.len() as u32);
		body.extend_from_slice(data);
		while body.len() % 4 != 0 {
			body.push(0);
		}
		offset = 12 + 16 * tables.len() + body.len();
	}
	out.0.extend_from_slice(&body);
	out.0
}

pub fn font(size: f32) -> Font {
	Font::from_vec(font_bytes(), size, "synthetic.ttf").unwrap()
}

/// A cache whose default font is the synthetic face at [`SIZE`].
pub fn fonts() -> FontCache {
	let cache = FontCache::with_default_spec(SPEC);
	cache.insert(SPEC, font(SIZE));
	cache
}

/// Write the synthetic font to `dir/name` and return its path.
pub fn write_font(dir: &Path, name: &str) -> std::path::PathBuf {
	let path = dir.join(name);
	std::fs::write(&path, font_bytes()).unwrap();
	path
}
