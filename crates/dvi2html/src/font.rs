use crate::tfm::{CharMetrics, FontMetrics};
use crate::{Error, Strictness};
use std::rc::Rc;

/// The properties of a font as given by a DVI font definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontProperties {
    pub name: String,
    pub checksum: u32,
    /// Size the font is used at, in DVI units.
    pub scale_factor: u32,
    /// Design size of the font, in DVI units.
    pub design_size: u32,
}

/// A loaded font.
#[derive(Debug, Clone)]
pub struct Font {
    pub name: String,
    pub checksum: u32,
    pub scale_factor: u32,
    pub design_size: u32,
    pub metrics: Rc<FontMetrics>,
}

/// Dimensions of a run of text, in DVI units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextExtent {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

impl Font {
    pub fn new(properties: FontProperties, metrics: Rc<FontMetrics>) -> Self {
        if properties.checksum != 0
            && metrics.checksum != 0
            && properties.checksum != metrics.checksum
        {
            tracing::warn!(
                font = %properties.name,
                dvi = properties.checksum,
                tfm = metrics.checksum,
                "font checksum mismatch"
            );
        }
        Font {
            name: properties.name,
            checksum: properties.checksum,
            scale_factor: properties.scale_factor,
            design_size: properties.design_size,
            metrics,
        }
    }

    /// Number of DVI units in one unit of the metrics tables, at design size.
    pub fn dvi_units_per_font_unit(&self) -> f64 {
        self.metrics.design_size as f64 / (1 << 20) as f64 * 65536.0 / (1 << 20) as f64
    }

    fn magnification(&self) -> f64 {
        if self.design_size == 0 {
            1.0
        } else {
            self.scale_factor as f64 / self.design_size as f64
        }
    }

    /// Converts a dimension from the metrics tables to DVI units at the
    /// size the font is used at.
    pub fn to_dvi_units(&self, font_units: f64) -> f64 {
        font_units * self.dvi_units_per_font_unit() * self.magnification()
    }

    /// The size the font is used at, in points.
    pub fn point_size(&self) -> f64 {
        self.metrics.design_size as f64 / (1 << 20) as f64 * self.magnification()
    }

    /// Returns the metrics of a character.
    ///
    /// In lenient mode a character without metrics uses the metrics of
    /// character 126 instead.
    pub fn char_metrics(&self, code: u8, strictness: Strictness) -> Result<CharMetrics, Error> {
        if let Some(metrics) = self.metrics.character(code) {
            return Ok(*metrics);
        }
        match strictness {
            Strictness::Strict => Err(Error::MissingGlyph {
                font: self.name.clone(),
                code,
            }),
            Strictness::Lenient => {
                tracing::warn!(font = %self.name, code, "no metrics for character, using 126");
                Ok(self.metrics.character(126).copied().unwrap_or_default())
            }
        }
    }

    /// Measures a run of text: the total width and the largest height and depth.
    pub fn measure(&self, text: &[u8], strictness: Strictness) -> Result<TextExtent, Error> {
        let mut width = 0_f64;
        let mut height = 0_i32;
        let mut depth = 0_i32;
        for &code in text {
            let metrics = self.char_metrics(code, strictness)?;
            width += metrics.width as f64;
            height = height.max(metrics.height);
            depth = depth.max(metrics.depth);
        }
        Ok(TextExtent {
            width: self.to_dvi_units(width),
            height: self.to_dvi_units(height as f64),
            depth: self.to_dvi_units(depth as f64),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmr10(scale_factor: u32) -> Font {
        let metrics = FontMetrics::new(10 << 20)
            .with_char(b'A', CharMetrics::new(1 << 19, 3 << 18, 0))
            .with_char(b'g', CharMetrics::new(1 << 18, 1 << 18, 1 << 17))
            .with_char(126, CharMetrics::new(1 << 17, 0, 0));
        Font::new(
            FontProperties {
                name: "cmr10".into(),
                checksum: 0,
                scale_factor,
                design_size: 655360,
            },
            Rc::new(metrics),
        )
    }

    #[test]
    fn units() {
        let font = cmr10(655360);
        assert_eq!(font.dvi_units_per_font_unit(), 0.625);
        assert_eq!(font.point_size(), 10.0);
        // Half the design size is 5pt, which is 5 * 65536 DVI units.
        assert_eq!(font.to_dvi_units((1 << 19) as f64), 327680.0);
    }

    #[test]
    fn scaled_font() {
        let font = cmr10(2 * 655360);
        assert_eq!(font.point_size(), 20.0);
        assert_eq!(font.to_dvi_units((1 << 19) as f64), 655360.0);
    }

    #[test]
    fn measure_run() {
        let font = cmr10(655360);
        let extent = font.measure(b"Ag", Strictness::Strict).unwrap();
        assert_eq!(extent.width, 327680.0 + 163840.0);
        assert_eq!(extent.height, 0.625 * (3 << 18) as f64);
        assert_eq!(extent.depth, 0.625 * (1 << 17) as f64);
    }

    #[test]
    fn missing_glyph() {
        let font = cmr10(655360);
        assert!(matches!(
            font.measure(b"Az", Strictness::Strict),
            Err(Error::MissingGlyph { code: b'z', .. })
        ));
        let extent = font.measure(b"z", Strictness::Lenient).unwrap();
        assert_eq!(extent.width, 0.625 * (1 << 17) as f64);
    }
}
