pub mod color;
pub mod config;
pub mod error;
pub mod font;
pub mod render;
pub mod spec;

pub use color::DrawColor;
pub use error::{FontError, OverlayError};
pub use font::{Extent, Font, FontCache};
pub use render::{Canvas, Region, Surface, background_box, render};
pub use spec::{OverlayList, OverlaySpec, parse, parse_pairs};
