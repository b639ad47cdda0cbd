use std::{fmt, str::FromStr};

use image::Rgba;

/// The fixed palette overlays may be painted with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DrawColor {
	#[default]
	Transparent,
	Black,
	/// Gray 85/255.
	Gray1,
	/// Gray 170/255.
	Gray2,
	White,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid color {0:?}")]
pub struct InvalidColor(pub String);

impl DrawColor {
	/// Flat fill for this color, `None` for transparent.
	pub fn uniform(self) -> Option<Rgba<u8>> {
		let gray = |v: u8| Some(Rgba([v, v, v, 255]));
		match self {
			DrawColor::Transparent => None,
			DrawColor::Black => gray(0),
			DrawColor::Gray1 => gray(85),
			DrawColor::Gray2 => gray(170),
			DrawColor::White => gray(255),
		}
	}

	pub fn is_transparent(self) -> bool {
		self == DrawColor::Transparent
	}

	pub fn as_str(self) -> &'static str {
		match self {
			DrawColor::Transparent => "transparent",
			DrawColor::Black => "black",
			DrawColor::Gray1 => "gray1",
			DrawColor::Gray2 => "gray2",
			DrawColor::White => "white",
		}
	}
}

impl FromStr for DrawColor {
	type Err = InvalidColor;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"" | "transparent" => Ok(DrawColor::Transparent),
			"black" => Ok(DrawColor::Black),
			"gray1" | "gray-light" => Ok(DrawColor::Gray1),
			"gray2" | "gray-dark" => Ok(DrawColor::Gray2),
			"white" => Ok(DrawColor::White),
			other => Err(InvalidColor(other.to_owned())),
		}
	}
}

impl fmt::Display for DrawColor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
