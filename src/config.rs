use std::path::Path;

use color_eyre::eyre::{Result, WrapErr as _};
use serde::{Deserialize, Deserializer};

use crate::{
	font::FontCache,
	spec::{OverlayList, OverlaySpec},
};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
	/// `path[:size]` used by overlays that name no font.
	pub default_font: Option<String>,
	/// Applied to every image, before the overlays given on the command line.
	pub overlays: Vec<OverlayEntry>,
}

/// Either a raw descriptor (`"x=10,y=20,s=hi"`) or a table of the same keys.
/// Tables allow commas in the text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OverlayEntry {
	Descriptor(String),
	Fields(OverlayFields),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OverlayFields {
	pub x: Option<Coordinate>,
	pub y: Option<Coordinate>,
	pub fg: Option<String>,
	pub bg: Option<String>,
	pub font: Option<String>,
	#[serde(alias = "string", alias = "str", alias = "s")]
	pub text: Option<String>,
}

/// `10` and `"50%"` are both valid coordinates in a table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Coordinate(pub String);

impl<'de> Deserialize<'de> for Coordinate {
	fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
	where
		D: Deserializer<'de>, {
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum CoordinateHelper {
			Int(i64),
			String(String),
		}

		Ok(match CoordinateHelper::deserialize(deserializer)? {
			CoordinateHelper::Int(n) => Coordinate(n.to_string()),
			CoordinateHelper::String(s) => Coordinate(s),
		})
	}
}

impl<'de> Deserialize<'de> for OverlayEntry {
	fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
	where
		D: Deserializer<'de>, {
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum OverlayHelper {
			String(String),
			Structured(OverlayFields),
		}

		let helper = OverlayHelper::deserialize(deserializer)?;
		Ok(match helper {
			OverlayHelper::String(raw) => OverlayEntry::Descriptor(raw),
			OverlayHelper::Structured(fields) => OverlayEntry::Fields(fields),
		})
	}
}

impl OverlayFields {
	/// Key/value pairs in descriptor order, skipping unset fields.
	pub fn pairs(&self) -> Vec<(&str, &str)> {
		[
			("x", self.x.as_ref().map(|c| c.0.as_str())),
			("y", self.y.as_ref().map(|c| c.0.as_str())),
			("fg", self.fg.as_deref()),
			("bg", self.bg.as_deref()),
			("font", self.font.as_deref()),
			("string", self.text.as_deref()),
		]
		.into_iter()
		.filter_map(|(k, v)| v.map(|v| (k, v)))
		.collect()
	}
}

impl OverlayEntry {
	pub fn push_onto<'l>(&self, list: &'l mut OverlayList, width: u32, height: u32, fonts: &FontCache) -> crate::error::Result<&'l OverlaySpec> {
		match self {
			OverlayEntry::Descriptor(raw) => list.push(raw, width, height, fonts),
			OverlayEntry::Fields(fields) => list.push_pairs(fields.pairs(), width, height, fonts),
		}
	}
}

impl AppConfig {
	/// Read `path` if given, else the optional XDG locations. `TEXT_OVERLAY_*` variables override either.
	pub fn read(path: Option<&Path>) -> Result<Self> {
		let xdg_dirs = xdg::BaseDirectories::with_prefix(env!("CARGO_PKG_NAME"));
		let xdg_conf_dir = xdg_dirs.get_config_home().as_deref().and_then(Path::parent).map(Path::to_path_buf);
		Self::read_from(path, xdg_conf_dir.as_deref(), config::Environment::with_prefix("TEXT_OVERLAY"))
	}

	fn read_from(path: Option<&Path>, xdg_conf_dir: Option<&Path>, env: config::Environment) -> Result<Self> {
		let app_name = env!("CARGO_PKG_NAME");
		let mut builder = config::Config::builder();

		match path {
			Some(path) => {
				let path_str = path.display().to_string();
				builder = builder.add_source(config::File::with_name(&path_str).required(true));
				Ok(builder.add_source(env).build()?.try_deserialize().wrap_err_with(|| format!("Invalid config file {path_str}"))?)
			}
			None => {
				if let Some(conf_dir) = xdg_conf_dir {
					let xdg_conf_dir = conf_dir.display().to_string();
					let locations = [
						format!("{xdg_conf_dir}/{app_name}"),
						format!("{xdg_conf_dir}/{app_name}/config"), //
					];
					for location in locations.iter() {
						builder = builder.add_source(config::File::with_name(location).required(false));
					}
				}
				let raw: config::Config = builder.add_source(env).build()?;

				raw.try_deserialize().wrap_err("Config file is invalid")
			}
		}
	}

	pub fn font_cache(&self) -> FontCache {
		match &self.default_font {
			Some(spec) => FontCache::with_default_spec(spec),
			None => FontCache::new(),
		}
	}
}
