//! `FontDriver` for a live X server: core fonts and font sets through Xlib,
//! outline fonts through Xft and fontconfig.
//!
//! Every handle keeps the display connection alive and frees its X
//! resource on drop.
#![allow(non_snake_case)]

use super::font_driver::{FontDriver, FontFace, FontMetrics, OutlineMatch};
use super::outline::{OutlineFace, OutlineQuery, OUTLINE_PROPORTIONAL, OUTLINE_SLANT_ROMAN, OUTLINE_WEIGHT_MEDIUM};
use anyhow::{anyhow, bail, Context, Result};
use libc::{c_char, c_int};
use log::{debug, info, trace, warn};
use std::ffi::{CStr, CString};
use std::ptr;
use std::rc::Rc;

use fontconfig_sys::constants::{FC_ANTIALIAS, FC_FAMILY, FC_MATRIX, FC_SIZE, FC_SLANT, FC_SPACING, FC_WEIGHT};
use fontconfig_sys::{
    FcBool, FcChar8, FcFontList, FcFontSetDestroy, FcMatrix, FcNameUnparse, FcObjectSetAdd,
    FcObjectSetCreate, FcObjectSetDestroy, FcPattern, FcPatternAddBool, FcPatternAddDouble,
    FcPatternAddInteger, FcPatternAddMatrix, FcPatternAddString, FcPatternCreate, FcPatternDestroy,
    FcPatternGetInteger, FcPatternGetString, FcResultMatch,
};
use x11::{xft, xlib};

/// Owns the display connection; closed when the last handle is gone.
#[derive(Debug)]
struct ManagedDisplay {
    ptr: *mut xlib::Display,
}

impl ManagedDisplay {
    fn open() -> Result<Self> {
        // SAFETY: a null name makes Xlib use $DISPLAY.
        let ptr = unsafe { xlib::XOpenDisplay(ptr::null()) };
        if ptr.is_null() {
            bail!("Failed to open X display. Check DISPLAY environment variable or X server status.");
        }
        debug!("X display opened: {:p}", ptr);
        Ok(ManagedDisplay { ptr })
    }

    #[inline]
    fn raw(&self) -> *mut xlib::Display {
        self.ptr
    }
}

impl Drop for ManagedDisplay {
    fn drop(&mut self) {
        info!("Closing X display connection: {:p}", self.ptr);
        // SAFETY: `ptr` came from XOpenDisplay and every font holding it
        // has already been dropped.
        unsafe { xlib::XCloseDisplay(self.ptr) };
    }
}

/// A core font opened with `XLoadQueryFont`.
#[derive(Debug)]
pub struct X11CoreFont {
    ptr: *mut xlib::XFontStruct,
    display: Rc<ManagedDisplay>,
}

impl FontFace for X11CoreFont {
    fn metrics(&self) -> FontMetrics {
        // SAFETY: `ptr` is non-null and owned until drop.
        let f = unsafe { &*self.ptr };
        FontMetrics {
            ascent: f.ascent,
            descent: f.descent,
            min_left_bearing: i32::from(f.min_bounds.lbearing),
            min_right_bearing: i32::from(f.min_bounds.rbearing),
            max_width: i32::from(f.max_bounds.width),
            glyph_span: FontMetrics::glyph_span(
                f.min_byte1,
                f.max_byte1,
                f.min_char_or_byte2,
                f.max_char_or_byte2,
            ),
        }
    }

    // Sized by the largest glyph, as the server allocates it.
    fn approximate_cost(&self) -> usize {
        // SAFETY: as above.
        let f = unsafe { &*self.ptr };
        let height = (i32::from(f.max_bounds.ascent) + i32::from(f.max_bounds.descent)).max(0) as usize;
        let width = i32::from(f.max_bounds.width).max(0) as usize;
        height
            .saturating_mul(width)
            .saturating_mul(self.metrics().glyph_span as usize)
            / 8
    }
}

impl Drop for X11CoreFont {
    fn drop(&mut self) {
        trace!("XFreeFont {:p}", self.ptr);
        // SAFETY: `ptr` was returned by XLoadQueryFont on this display.
        unsafe { xlib::XFreeFont(self.display.raw(), self.ptr) };
    }
}

/// A font set opened with `XCreateFontSet`.
#[derive(Debug)]
pub struct X11FontSet {
    set: xlib::XFontSet,
    display: Rc<ManagedDisplay>,
}

impl FontFace for X11FontSet {
    fn metrics(&self) -> FontMetrics {
        // SAFETY: the extents belong to the font set and live as long as it.
        let extents = unsafe { xlib::XExtentsOfFontSet(self.set) };
        if extents.is_null() {
            return FontMetrics::default();
        }
        // SAFETY: checked for null above.
        let logical = unsafe { (*extents).max_logical_extent };
        let ascent = -i32::from(logical.y);
        FontMetrics {
            ascent,
            descent: i32::from(logical.height) - ascent,
            min_left_bearing: 0,
            min_right_bearing: 0,
            max_width: i32::from(logical.width),
            glyph_span: 0,
        }
    }
}

impl Drop for X11FontSet {
    fn drop(&mut self) {
        trace!("XFreeFontSet {:p}", self.set);
        // SAFETY: `set` was returned by XCreateFontSet on this display.
        unsafe { xlib::XFreeFontSet(self.display.raw(), self.set) };
    }
}

/// An Xft font, closed via `XftFontClose` on drop.
#[derive(Debug)]
pub struct X11OutlineFont {
    ptr: *mut xft::XftFont,
    display: Rc<ManagedDisplay>,
}

impl FontFace for X11OutlineFont {
    fn metrics(&self) -> FontMetrics {
        // SAFETY: `ptr` is non-null and owned until drop.
        let f = unsafe { &*self.ptr };
        FontMetrics {
            ascent: f.ascent,
            descent: f.descent,
            min_left_bearing: 0,
            min_right_bearing: 0,
            max_width: f.max_advance_width,
            glyph_span: 0,
        }
    }

    // Glyphs are rendered on demand on the client side.
    fn approximate_cost(&self) -> usize {
        0
    }
}

impl Drop for X11OutlineFont {
    fn drop(&mut self) {
        trace!("XftFontClose {:p}", self.ptr);
        // SAFETY: `ptr` was returned by XftFontOpenPattern on this display.
        unsafe { xft::XftFontClose(self.display.raw(), self.ptr) };
    }
}

/// Font driver talking to the X server named by `$DISPLAY`.
#[derive(Debug)]
pub struct X11FontDriver {
    display: Rc<ManagedDisplay>,
}

impl X11FontDriver {
    pub fn open() -> Result<Self> {
        info!("Connecting font driver to the X server");
        Ok(X11FontDriver {
            display: Rc::new(ManagedDisplay::open()?),
        })
    }

    fn cstring(value: &str) -> Result<CString> {
        CString::new(value).with_context(|| format!("'{}' contains a NUL byte", value))
    }

    // Builds the fontconfig pattern for `query`. The caller owns the result.
    unsafe fn outline_pattern(query: &OutlineQuery) -> Result<*mut FcPattern> {
        let pat = FcPatternCreate();
        if pat.is_null() {
            bail!("FcPatternCreate failed");
        }
        for family in [query.family.as_str(), query.generic_family] {
            if family.is_empty() {
                continue;
            }
            let family = match Self::cstring(family) {
                Ok(family) => family,
                Err(e) => {
                    FcPatternDestroy(pat);
                    return Err(e);
                }
            };
            FcPatternAddString(pat, FC_FAMILY.as_ptr(), family.as_ptr() as *const FcChar8);
        }
        FcPatternAddInteger(pat, FC_WEIGHT.as_ptr(), query.weight as c_int);
        FcPatternAddInteger(pat, FC_SLANT.as_ptr(), query.slant as c_int);
        FcPatternAddInteger(pat, FC_SPACING.as_ptr(), query.spacing as c_int);
        FcPatternAddDouble(pat, FC_SIZE.as_ptr(), query.size_points);
        if query.scale != 1.0 {
            let matrix = FcMatrix {
                xx: query.scale,
                xy: 0.0,
                yx: 0.0,
                yy: query.scale,
            };
            FcPatternAddMatrix(pat, FC_MATRIX.as_ptr(), &matrix);
        }
        if let Some(antialias) = query.antialias {
            FcPatternAddBool(pat, FC_ANTIALIAS.as_ptr(), antialias as FcBool);
        }
        Ok(pat)
    }

    unsafe fn pattern_string(pat: *mut FcPattern, object: &CStr) -> Option<String> {
        let mut value: *mut FcChar8 = ptr::null_mut();
        if FcPatternGetString(pat, object.as_ptr(), 0, &mut value) != FcResultMatch || value.is_null() {
            return None;
        }
        Some(CStr::from_ptr(value as *const c_char).to_string_lossy().into_owned())
    }

    unsafe fn pattern_int(pat: *mut FcPattern, object: &CStr, default: i32) -> i32 {
        let mut value: c_int = default;
        if FcPatternGetInteger(pat, object.as_ptr(), 0, &mut value) != FcResultMatch {
            return default;
        }
        value
    }
}

impl FontDriver for X11FontDriver {
    type Bitmap = X11CoreFont;
    type FontSet = X11FontSet;
    type Outline = X11OutlineFont;

    fn list_fonts(&self, pattern: &str, max_names: usize) -> Result<Vec<String>> {
        let c_pattern = Self::cstring(pattern)?;
        let max = c_int::try_from(max_names).unwrap_or(c_int::MAX);
        let mut count: c_int = 0;
        // SAFETY: valid display and NUL-terminated pattern.
        let list = unsafe { xlib::XListFonts(self.display.raw(), c_pattern.as_ptr(), max, &mut count) };
        if list.is_null() {
            return Ok(Vec::new());
        }
        let names = (0..count.max(0) as usize)
            .map(|i| {
                // SAFETY: XListFonts returned `count` NUL-terminated names.
                unsafe { CStr::from_ptr(*list.add(i)) }.to_string_lossy().into_owned()
            })
            .collect();
        // SAFETY: `list` came from XListFonts.
        unsafe { xlib::XFreeFontNames(list) };
        Ok(names)
    }

    fn load_bitmap_font(&self, name: &str) -> Result<Self::Bitmap> {
        let c_name = Self::cstring(name)?;
        // SAFETY: valid display and NUL-terminated name.
        let ptr = unsafe { xlib::XLoadQueryFont(self.display.raw(), c_name.as_ptr()) };
        if ptr.is_null() {
            return Err(anyhow!("XLoadQueryFont failed for '{}'", name));
        }
        Ok(X11CoreFont {
            ptr,
            display: Rc::clone(&self.display),
        })
    }

    fn load_font_set(&self, patterns: &str) -> Result<Self::FontSet> {
        let c_patterns = Self::cstring(patterns)?;
        let mut missing: *mut *mut c_char = ptr::null_mut();
        let mut missing_count: c_int = 0;
        // SAFETY: valid display and NUL-terminated pattern list.
        let set = unsafe {
            xlib::XCreateFontSet(
                self.display.raw(),
                c_patterns.as_ptr(),
                &mut missing,
                &mut missing_count,
                ptr::null_mut(),
            )
        };
        if !missing.is_null() {
            if missing_count > 0 {
                debug!("Font set is missing {} charsets", missing_count);
            }
            // SAFETY: the list was allocated by XCreateFontSet.
            unsafe { xlib::XFreeStringList(missing) };
        }
        if set.is_null() {
            return Err(anyhow!("XCreateFontSet failed for '{}'", patterns));
        }
        Ok(X11FontSet {
            set,
            display: Rc::clone(&self.display),
        })
    }

    fn match_outline(&self, query: &OutlineQuery) -> Result<OutlineMatch<Self::Outline>> {
        let display = self.display.raw();
        // SAFETY: all fontconfig and Xft calls below are FFI calls on
        // patterns created and released here.
        unsafe {
            let pat = Self::outline_pattern(query)?;
            let mut result: xft::FcResult = xft::FcResult::Match;
            let matched = xft::XftFontMatch(
                display,
                xlib::XDefaultScreen(display),
                pat as *const xft::FcPattern,
                &mut result,
            );
            FcPatternDestroy(pat);
            if matched.is_null() {
                bail!("XftFontMatch found nothing for '{}'", query.family);
            }

            let fc_matched = matched as *mut FcPattern;
            let family = Self::pattern_string(fc_matched, FC_FAMILY).unwrap_or_default();
            let unparsed = FcNameUnparse(fc_matched);
            let pattern = if unparsed.is_null() {
                family.clone()
            } else {
                let text = CStr::from_ptr(unparsed as *const c_char)
                    .to_string_lossy()
                    .into_owned();
                libc::free(unparsed as *mut libc::c_void);
                text
            };

            // On success the font owns `matched`.
            let font = xft::XftFontOpenPattern(display, matched);
            if font.is_null() {
                FcPatternDestroy(fc_matched);
                bail!("XftFontOpenPattern failed for '{}'", pattern);
            }
            trace!("Outline match for '{}': {}", query.family, pattern);
            Ok(OutlineMatch {
                font: X11OutlineFont {
                    ptr: font,
                    display: Rc::clone(&self.display),
                },
                family,
                pattern,
            })
        }
    }

    fn list_outline_faces(&self) -> Result<Vec<OutlineFace>> {
        // SAFETY: the pattern, object set and font set are created and
        // destroyed here.
        unsafe {
            let pat = FcPatternCreate();
            let objects = FcObjectSetCreate();
            if pat.is_null() || objects.is_null() {
                if !pat.is_null() {
                    FcPatternDestroy(pat);
                }
                if !objects.is_null() {
                    FcObjectSetDestroy(objects);
                }
                bail!("fontconfig allocation failed");
            }
            for object in [FC_FAMILY, FC_WEIGHT, FC_SLANT, FC_SPACING] {
                FcObjectSetAdd(objects, object.as_ptr());
            }
            let fonts = FcFontList(ptr::null_mut(), pat, objects);
            FcObjectSetDestroy(objects);
            FcPatternDestroy(pat);
            if fonts.is_null() {
                warn!("FcFontList returned no font set");
                return Ok(Vec::new());
            }

            let count = (*fonts).nfont.max(0) as usize;
            let mut faces = Vec::with_capacity(count);
            for i in 0..count {
                let font = *(*fonts).fonts.add(i);
                let Some(family) = Self::pattern_string(font, FC_FAMILY) else {
                    continue;
                };
                faces.push(OutlineFace::new(
                    family,
                    Self::pattern_int(font, FC_WEIGHT, OUTLINE_WEIGHT_MEDIUM),
                    Self::pattern_int(font, FC_SLANT, OUTLINE_SLANT_ROMAN),
                    Self::pattern_int(font, FC_SPACING, OUTLINE_PROPORTIONAL),
                ));
            }
            FcFontSetDestroy(fonts);
            debug!("fontconfig listed {} outline faces", faces.len());
            Ok(faces)
        }
    }
}
