//! `Glyph` and related types.

use serde::Serialize;

use super::{Cursor, Font, GlyphTable, Outlines};
use crate::{errors::ParseErrorKind, CharacterMap, ParseError};

/// Maximum nesting of composite glyphs followed when computing ink area.
const MAX_COMPOSITE_DEPTH: usize = 8;

/// Glyph bounding box in font units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[allow(missing_docs)] // self-explanatory
pub struct BoundingBox {
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
}

impl BoundingBox {
    fn parse(cursor: &mut Cursor<'_>) -> Result<Self, ParseError> {
        Ok(Self {
            x_min: cursor.read_i16()?,
            y_min: cursor.read_i16()?,
            x_max: cursor.read_i16()?,
            y_max: cursor.read_i16()?,
        })
    }

    /// Returns the box width (0 for a degenerate box).
    pub fn width(&self) -> u32 {
        (i32::from(self.x_max) - i32::from(self.x_min)).max(0).unsigned_abs()
    }

    /// Returns the box height (0 for a degenerate box).
    pub fn height(&self) -> u32 {
        (i32::from(self.y_max) - i32::from(self.y_min)).max(0).unsigned_abs()
    }

    /// Returns the box area.
    pub fn area(&self) -> f64 {
        f64::from(self.width()) * f64::from(self.height())
    }
}

/// Shape statistics of a single glyph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GlyphGeometry {
    /// Bounding box from the glyph header.
    pub bbox: BoundingBox,
    /// Area enclosed by the outline, in squared font units.
    pub ink_area: f64,
    /// Advance width.
    pub advance: u16,
}

impl GlyphGeometry {
    /// Returns `height / width` of the bounding box. A zero-width box with a positive height
    /// has infinite aspect ratio.
    pub fn aspect_ratio(&self) -> f64 {
        let (width, height) = (self.bbox.width(), self.bbox.height());
        match (width, height) {
            (0, 0) => 0.0,
            (0, _) => f64::INFINITY,
            _ => f64::from(height) / f64::from(width),
        }
    }

    /// Returns `ink_area / bbox_area`, clamped to `0..=1`.
    pub fn fill_ratio(&self) -> f64 {
        let bbox_area = self.bbox.area();
        if bbox_area == 0.0 {
            0.0
        } else {
            (self.ink_area / bbox_area).clamp(0.0, 1.0)
        }
    }
}

/// Accessor sampling glyph shapes by codepoint.
pub trait GlyphSampler {
    /// Returns geometry of the glyph mapped to `codepoint`. Returns `Ok(None)` if the codepoint
    /// is unmapped, the glyph is empty, or outlines are not available.
    ///
    /// # Errors
    ///
    /// Returns an error if glyph data is corrupt.
    fn glyph_geometry(&self, codepoint: u32) -> Result<Option<GlyphGeometry>, ParseError>;
}

impl GlyphSampler for Font<'_> {
    fn glyph_geometry(&self, codepoint: u32) -> Result<Option<GlyphGeometry>, ParseError> {
        let Some(glyph_id) = self.char_map.glyph_id(codepoint) else {
            return Ok(None);
        };
        let Outlines::TrueType(table) = &self.outlines else {
            return Ok(None);
        };
        let glyph = table.glyph(glyph_id)?;
        let Some(bbox) = glyph.bbox() else {
            return Ok(None);
        };
        let ink_area = glyph
            .ink_area(table, 0)
            .map_err(|err| err.with_table(super::TableTag::GLYF))?;
        Ok(Some(GlyphGeometry {
            bbox,
            ink_area,
            advance: self.advance(glyph_id)?,
        }))
    }
}

#[derive(Debug)]
pub(crate) enum Glyph<'a> {
    Empty,
    Simple(&'a [u8]),
    Composite {
        bbox: BoundingBox,
        components: Vec<GlyphComponent>,
    },
}

impl<'a> Glyph<'a> {
    pub(super) fn new(raw: Cursor<'a>) -> Result<Self, ParseError> {
        if raw.bytes.is_empty() {
            return Ok(Self::Empty);
        }

        let mut cursor = raw;
        let number_of_contours = cursor.read_i16()?;
        if number_of_contours < 0 {
            let bbox = BoundingBox::parse(&mut cursor)?;
            let mut has_more_components = true;
            let mut components = Vec::with_capacity(1);
            while has_more_components {
                let (component, new_has_more_components) = GlyphComponent::new(&mut cursor)?;
                components.push(component);
                has_more_components = new_has_more_components;
            }
            Ok(Self::Composite { bbox, components })
        } else {
            Ok(Self::Simple(raw.bytes))
        }
    }

    /// Returns the bounding box, or `None` for an empty glyph.
    pub(crate) fn bbox(&self) -> Option<BoundingBox> {
        match self {
            Self::Empty => None,
            Self::Simple(raw) => {
                let mut cursor = Cursor::new(raw);
                cursor.skip(2).ok()?;
                BoundingBox::parse(&mut cursor).ok()
            }
            Self::Composite { bbox, .. } => Some(*bbox),
        }
    }

    /// Returns indices of glyphs referenced by this glyph.
    pub(crate) fn component_ids(&self) -> impl Iterator<Item = u16> + '_ {
        let components = match self {
            Self::Composite { components, .. } => components.as_slice(),
            _ => &[],
        };
        components.iter().map(|component| component.glyph_idx)
    }

    fn ink_area(&self, table: &GlyphTable<'_>, depth: usize) -> Result<f64, ParseError> {
        match self {
            Self::Empty => Ok(0.0),
            Self::Simple(raw) => outline_area(Cursor::new(raw)),
            Self::Composite { components, .. } => {
                if depth >= MAX_COMPOSITE_DEPTH {
                    return Err(ParseError::new(ParseErrorKind::CompositeTooDeep(
                        MAX_COMPOSITE_DEPTH,
                    )));
                }
                components.iter().try_fold(0.0, |acc, component| {
                    let glyph = table.glyph(component.glyph_idx)?;
                    let area = glyph.ink_area(table, depth + 1)?;
                    Ok(acc + area * component.transform.area_scale())
                })
            }
        }
    }
}

/// Computes the area enclosed by a simple glyph outline with the shoelace formula.
///
/// Off-curve points are treated as polygon vertices, which approximates quadratic curves
/// closely enough for fill ratio estimation. Contours of opposite directions (e.g., counters)
/// cancel out.
fn outline_area(mut cursor: Cursor<'_>) -> Result<f64, ParseError> {
    const X_SHORT: u8 = 0x02;
    const Y_SHORT: u8 = 0x04;
    const REPEAT: u8 = 0x08;
    const X_SAME_OR_POSITIVE: u8 = 0x10;
    const Y_SAME_OR_POSITIVE: u8 = 0x20;

    let contour_count = cursor.read_i16()?;
    let contour_count = usize::try_from(contour_count).unwrap_or(0);
    cursor.skip(8)?; // bounding box
    let end_points = (0..contour_count)
        .map(|_| cursor.read_u16())
        .collect::<Result<Vec<_>, _>>()?;
    let Some(&last_point) = end_points.last() else {
        return Ok(0.0);
    };
    let point_count = usize::from(last_point) + 1;
    let instruction_len = cursor.read_u16()?;
    cursor.skip(instruction_len.into())?;

    let mut flags = Vec::with_capacity(point_count);
    while flags.len() < point_count {
        let flag = cursor.read_u8()?;
        flags.push(flag);
        if flag & REPEAT != 0 {
            let repeat_count = cursor.read_u8()?;
            flags.extend(std::iter::repeat_n(flag, repeat_count.into()));
        }
    }
    flags.truncate(point_count);

    let mut read_coords = |short: u8, same_or_positive: u8| {
        let mut value = 0_i32;
        flags
            .iter()
            .map(|&flag| {
                let delta = if flag & short != 0 {
                    let magnitude = i32::from(cursor.read_u8()?);
                    if flag & same_or_positive != 0 {
                        magnitude
                    } else {
                        -magnitude
                    }
                } else if flag & same_or_positive != 0 {
                    0
                } else {
                    i32::from(cursor.read_i16()?)
                };
                value += delta;
                Ok(f64::from(value))
            })
            .collect::<Result<Vec<_>, ParseError>>()
    };
    let xs = read_coords(X_SHORT, X_SAME_OR_POSITIVE)?;
    let ys = read_coords(Y_SHORT, Y_SAME_OR_POSITIVE)?;

    let mut signed_area = 0.0;
    let mut start = 0;
    for &end in &end_points {
        let end = usize::from(end);
        if end < start || end >= point_count {
            break;
        }
        let mut contour_area = 0.0;
        for i in start..=end {
            let next = if i == end { start } else { i + 1 };
            contour_area += xs[i] * ys[next] - xs[next] * ys[i];
        }
        signed_area += contour_area / 2.0;
        start = end + 1;
    }
    Ok(signed_area.abs())
}

#[derive(Debug)]
pub(crate) struct GlyphComponent {
    pub(crate) glyph_idx: u16,
    pub(crate) transform: TransformData,
}

impl GlyphComponent {
    fn new(cursor: &mut Cursor<'_>) -> Result<(Self, bool), ParseError> {
        const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
        const WE_HAVE_A_SCALE: u16 = 0x008;
        const MORE_COMPONENTS: u16 = 0x0020;
        const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
        const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;

        let flags = cursor.read_u16()?;
        let glyph_idx = cursor.read_u16()?;
        let args_len = if flags & ARG_1_AND_2_ARE_WORDS != 0 {
            4
        } else {
            2
        };
        cursor.skip(args_len)?;
        let transform = if flags & WE_HAVE_A_SCALE != 0 {
            TransformData::Scale(cursor.read_i16()?)
        } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
            TransformData::TwoScales([cursor.read_i16()?, cursor.read_i16()?])
        } else if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
            TransformData::Affine([
                cursor.read_i16()?,
                cursor.read_i16()?,
                cursor.read_i16()?,
                cursor.read_i16()?,
            ])
        } else {
            TransformData::None
        };
        let this = Self {
            glyph_idx,
            transform,
        };

        let has_more_components = flags & MORE_COMPONENTS != 0;
        Ok((this, has_more_components))
    }
}

/// Component transform with `F2Dot14` entries.
#[derive(Debug)]
pub(crate) enum TransformData {
    None,
    Scale(i16),
    TwoScales([i16; 2]),
    Affine([i16; 4]),
}

impl TransformData {
    fn f2dot14(raw: i16) -> f64 {
        f64::from(raw) / 16_384.0
    }

    /// Returns the factor by which this transform scales areas.
    fn area_scale(&self) -> f64 {
        match *self {
            Self::None => 1.0,
            Self::Scale(scale) => Self::f2dot14(scale).powi(2),
            Self::TwoScales([x, y]) => (Self::f2dot14(x) * Self::f2dot14(y)).abs(),
            Self::Affine([xx, xy, yx, yy]) => (Self::f2dot14(xx) * Self::f2dot14(yy)
                - Self::f2dot14(xy) * Self::f2dot14(yx))
            .abs(),
        }
    }
}
