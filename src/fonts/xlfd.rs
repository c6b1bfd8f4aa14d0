//! XLFD (X Logical Font Description) name parsing.
//!
//! A core X font name looks like
//! `-adobe-helvetica-medium-r-normal--12-120-75-75-p-67-iso8859-1`: a leading
//! hyphen followed by fourteen hyphen-delimited fields. `XlfdName` borrows
//! slices of the original string, so parsing allocates nothing and the parsed
//! value must not outlive the name it was parsed from.

use std::fmt;

/// Number of fields in a well-formed XLFD name.
pub const XLFD_FIELD_COUNT: usize = 14;

/// Index of each XLFD field, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Foundry = 0,
    Family,
    Weight,
    Slant,
    Width,
    AddStyle,
    PixelSize,
    PointSize,
    ResolutionX,
    ResolutionY,
    Spacing,
    AverageWidth,
    CharsetRegistry,
    CharsetEncoding,
}

/// A parsed XLFD name. Fields may be empty strings (`--` in the source).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XlfdName<'a> {
    fields: [&'a str; XLFD_FIELD_COUNT],
}

impl<'a> XlfdName<'a> {
    /// Splits `name` into its fourteen fields.
    ///
    /// Returns `None` when the name does not start with `-`, has fewer than
    /// fourteen fields, or ends with an empty fourteenth field. Fields beyond
    /// the fourteenth are ignored.
    pub fn parse(name: &'a str) -> Option<Self> {
        let rest = name.strip_prefix('-')?;
        let mut parts = rest.split('-');
        let mut fields = [""; XLFD_FIELD_COUNT];
        for slot in fields.iter_mut() {
            *slot = parts.next()?;
        }
        // A name that ends right where its last field should start is cut
        // short, not a name with an empty encoding.
        if fields[XLFD_FIELD_COUNT - 1].is_empty() && parts.next().is_none() {
            return None;
        }
        Some(Self { fields })
    }

    #[inline]
    pub fn field(&self, field: Field) -> &'a str {
        self.fields[field as usize]
    }

    pub fn foundry(&self) -> &'a str {
        self.field(Field::Foundry)
    }

    pub fn family(&self) -> &'a str {
        self.field(Field::Family)
    }

    pub fn weight(&self) -> &'a str {
        self.field(Field::Weight)
    }

    pub fn slant(&self) -> &'a str {
        self.field(Field::Slant)
    }

    pub fn width(&self) -> &'a str {
        self.field(Field::Width)
    }

    pub fn add_style(&self) -> &'a str {
        self.field(Field::AddStyle)
    }

    pub fn pixel_size(&self) -> &'a str {
        self.field(Field::PixelSize)
    }

    pub fn point_size(&self) -> &'a str {
        self.field(Field::PointSize)
    }

    pub fn resolution_x(&self) -> &'a str {
        self.field(Field::ResolutionX)
    }

    pub fn resolution_y(&self) -> &'a str {
        self.field(Field::ResolutionY)
    }

    pub fn spacing(&self) -> &'a str {
        self.field(Field::Spacing)
    }

    pub fn average_width(&self) -> &'a str {
        self.field(Field::AverageWidth)
    }

    pub fn charset_registry(&self) -> &'a str {
        self.field(Field::CharsetRegistry)
    }

    pub fn charset_encoding(&self) -> &'a str {
        self.field(Field::CharsetEncoding)
    }

    /// True when the field is the literal `"0"` ("any"/"scalable").
    ///
    /// This is an exact string comparison: `"00"` or `" 0"` do not count.
    #[inline]
    pub fn is_zero(&self, field: Field) -> bool {
        self.field(field) == "0"
    }

    /// Numeric value of a field with C `atoi` semantics (leading digits only,
    /// 0 when there are none).
    pub fn numeric(&self, field: Field) -> u32 {
        atoi(self.field(field))
    }

    /// Pixel size, point size and average width are all `"0"`.
    pub fn is_scalable(&self) -> bool {
        self.is_zero(Field::PixelSize)
            && self.is_zero(Field::PointSize)
            && self.is_zero(Field::AverageWidth)
    }

    /// Scalable and without a resolution baked in.
    pub fn is_smoothly_scalable(&self) -> bool {
        self.is_scalable() && self.is_zero(Field::ResolutionX) && self.is_zero(Field::ResolutionY)
    }

    /// Weight, slant or width is `"0"`, i.e. the font has variable axes.
    pub fn is_polymorphic(&self) -> bool {
        self.is_zero(Field::Weight) || self.is_zero(Field::Slant) || self.is_zero(Field::Width)
    }

    /// Spacing is `m` (monospace) or `c` (character cell), in either case.
    pub fn is_fixed_pitch(&self) -> bool {
        matches!(self.spacing_char(), Some('m') | Some('c'))
    }

    /// Lower-cased first letter of the spacing field.
    pub fn spacing_char(&self) -> Option<char> {
        self.spacing().chars().next().map(|c| c.to_ascii_lowercase())
    }

    /// `registry-encoding`, e.g. `iso8859-1`.
    pub fn encoding_name(&self) -> String {
        format!("{}-{}", self.charset_registry(), self.charset_encoding())
    }

    /// Re-synthesises a scalable name at a concrete size and resolution.
    ///
    /// Pixel size and average width become wildcards; the deci-point size
    /// goes into the point-size field.
    pub fn with_size(&self, deci_point_size: u32, res_x: u32, res_y: u32) -> String {
        format!(
            "-{}-{}-{}-{}-{}-{}-*-{}-{}-{}-{}-*-{}-{}",
            self.foundry(),
            self.family(),
            self.weight(),
            self.slant(),
            self.width(),
            self.add_style(),
            deci_point_size,
            res_x,
            res_y,
            self.spacing(),
            self.charset_registry(),
            self.charset_encoding(),
        )
    }
}

impl fmt::Display for XlfdName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field in &self.fields {
            write!(f, "-{}", field)?;
        }
        Ok(())
    }
}

/// Enumeration pattern matching every font of `family`.
pub fn family_pattern(family: &str) -> String {
    format!("-*-{}-*-*-*-*-*-*-*-*-*-*-*-*", family)
}

/// Leading-digits integer parse, like C's `atoi` restricted to unsigned values.
pub(crate) fn atoi(s: &str) -> u32 {
    s.bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0u32, |acc, b| {
            acc.saturating_mul(10).saturating_add(u32::from(b - b'0'))
        })
}
