use std::{
	num::{ParseFloatError, ParseIntError},
	path::PathBuf,
};

use thiserror::Error;

/// Failure to turn a `path[:size]` font spec into a usable face.
#[derive(Debug, Error)]
pub enum FontError {
	#[error("invalid font size {size:?} in {spec:?}")]
	InvalidSize {
		spec: String,
		size: String,
		#[source]
		source: Option<ParseFloatError>,
	},
	#[error("cannot read font file {}", path.display())]
	Unreadable {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("cannot parse font program {}", path.display())]
	Malformed {
		path: PathBuf,
		#[source]
		source: ab_glyph::InvalidFont,
	},
	#[error("font {} does not declare units per em", path.display())]
	MissingUnitsPerEm { path: PathBuf },
}

#[derive(Debug, Error)]
pub enum OverlayError {
	#[error("cannot parse {token:?}: expected key=value")]
	MalformedToken { token: String },
	#[error("parse failed: unknown key {key:?}")]
	UnknownKey { key: String },
	/// `source` is `None` when the digits parse but the resolved coordinate is out of range.
	#[error("parse {token:?} failed")]
	InvalidInteger {
		token: String,
		#[source]
		source: Option<ParseIntError>,
	},
	#[error("parse {token:?} failed: {reason}")]
	InvalidColor { token: String, reason: String },
	#[error("parse {token:?} failed")]
	FontSpec {
		token: String,
		#[source]
		source: FontError,
	},
	#[error("image is immutable")]
	ImmutableImage,
}

pub type Result<T, E = OverlayError> = std::result::Result<T, E>;
