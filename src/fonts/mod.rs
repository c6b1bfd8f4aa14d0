// src/fonts/mod.rs

//! X11 font matching and the font catalog.
//!
//! `xlfd`, `matcher` and `selector` pick the best name from a font listing;
//! `resolver` walks the family fallback chain; `font_manager` ties the
//! resolver to a `FontDriver` and the loaded-font cache. `database` keeps
//! the family/style/size catalog for font dialogs.

pub mod cache;
pub mod database;
pub mod encoding;
pub mod font_driver;
pub mod font_info;
pub mod font_manager;
pub mod headless_font_driver;
pub mod matcher;
pub mod outline;
pub mod request;
pub mod resolver;
pub mod selector;
pub mod substitution;
#[cfg(feature = "x11")]
pub mod x11_font_driver;
pub mod xlfd;

pub use font_driver::{FontDriver, FontFace, FontKind, FontMetrics};
pub use font_manager::{FontManager, LoadedFont};
pub use headless_font_driver::HeadlessFontDriver;
pub use request::{CharSet, FontRequest, StyleHint};
