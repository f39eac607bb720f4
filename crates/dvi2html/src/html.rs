//! HTML and SVG output.

use crate::encoding::Encodings;
use crate::machine::{Machine, MachineState};
use crate::matrix::Num;
use crate::tfm::MetricsProvider;
use crate::{Error, Strictness};
use std::io::Write;

const SVG_OPEN_SENTINEL: &str = "<svg beginpicture>";
const SVG_CLOSE_SENTINEL: &str = "</svg endpicture>";

/// A machine that writes absolutely positioned HTML, with inline SVG for
/// graphics specials.
///
/// Text outside of SVG is written as `<span>` elements positioned in
/// points. Text and rules inside SVG are written as `<text>` and `<rect>`
/// elements carrying the current transform.
pub struct HtmlMachine<W> {
    state: MachineState,
    output: W,
    encodings: Encodings,
    strictness: Strictness,
    points_per_dvi_unit: f64,
    svg_depth: i64,
    color: String,
    color_stack: Vec<String>,
    paper_width: f64,
    paper_height: f64,
}

impl<W: Write> HtmlMachine<W> {
    pub fn new(output: W, provider: impl MetricsProvider + 'static) -> Self {
        HtmlMachine {
            state: MachineState::new(provider),
            output,
            encodings: Default::default(),
            strictness: Default::default(),
            // TeX's units until a preamble says otherwise.
            points_per_dvi_unit: dvi_unit_in_points(25400000, 473628672, 1000),
            svg_depth: 0,
            color: "black".into(),
            color_stack: vec![],
            paper_width: 0.0,
            paper_height: 0.0,
        }
    }

    pub fn with_encodings(mut self, encodings: Encodings) -> Self {
        self.encodings = encodings;
        self
    }

    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    pub fn points_per_dvi_unit(&self) -> f64 {
        self.points_per_dvi_unit
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn into_inner(self) -> W {
        self.output
    }

    fn points(&self, dvi_units: f64) -> f64 {
        dvi_units * self.points_per_dvi_unit
    }

    fn svg_header(&self) -> String {
        let (w, h) = (Num(self.paper_width), Num(self.paper_height));
        format!(
            r#"<svg version="1.1" xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}pt" height="{h}pt" viewBox="-72 -72 {w} {h}">"#
        )
    }
}

/// Converts a DVI unit to points, given the preamble's scale.
fn dvi_unit_in_points(numerator: u32, denominator: u32, magnification: u32) -> f64 {
    magnification as f64 * numerator as f64 / 1000.0 / denominator as f64 * 72.27 / 100000.0
        / 2.54
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SvgTag {
    Open,
    Close,
}

impl SvgTag {
    fn prefix(self) -> &'static str {
        match self {
            SvgTag::Open => "<svg",
            SvgTag::Close => "</svg",
        }
    }
}

/// Finds the first `<svg` open tag or `</svg` close tag in a fragment.
fn find_svg_tag(svg: &str) -> Option<(usize, SvgTag)> {
    svg.match_indices('<').find_map(|(i, _)| {
        let tail = &svg[i..];
        if tail.starts_with("</svg") {
            return Some((i, SvgTag::Close));
        }
        tail.strip_prefix("<svg")
            .and_then(|rest| rest.chars().next())
            .filter(|&c| c == '>' || c == '/' || c.is_whitespace())
            .map(|_| (i, SvgTag::Open))
    })
}

impl<W: Write> Machine for HtmlMachine<W> {
    fn state(&self) -> &MachineState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut MachineState {
        &mut self.state
    }

    fn preamble(
        &mut self,
        numerator: u32,
        denominator: u32,
        magnification: u32,
        _comment: &str,
    ) -> Result<(), Error> {
        self.points_per_dvi_unit = dvi_unit_in_points(numerator, denominator, magnification);
        Ok(())
    }

    fn push_color(&mut self, color: &str) -> Result<(), Error> {
        let previous = std::mem::replace(&mut self.color, color.to_string());
        self.color_stack.push(previous);
        Ok(())
    }

    fn pop_color(&mut self) -> Result<(), Error> {
        self.color = self.color_stack.pop().ok_or(Error::ColorStackUnderflow)?;
        Ok(())
    }

    fn set_papersize(&mut self, width: f64, height: f64) -> Result<(), Error> {
        self.paper_width = width;
        self.paper_height = height;
        Ok(())
    }

    fn post_post(&mut self) -> Result<(), Error> {
        self.output.flush()?;
        Ok(())
    }

    fn current_position(&self) -> (f64, f64) {
        let p = &self.state.position;
        (self.points(p.h), self.points(p.v))
    }

    fn set_current_position(&mut self, x: f64, y: f64) {
        let p = &mut self.state.position;
        p.h = x / self.points_per_dvi_unit;
        p.v = y / self.points_per_dvi_unit;
    }

    fn put_rule(&mut self, height: i32, width: i32) -> Result<(), Error> {
        if height <= 0 || width <= 0 {
            return Ok(());
        }
        let a = self.points(height as f64);
        let b = self.points(width as f64);
        let (left, bottom) = self.current_position();
        write!(
            self.output,
            r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}"{}></rect>"#,
            Num(left),
            Num(bottom - a),
            Num(b),
            Num(a),
            self.color,
            self.state.matrix.to_svg_transform(),
        )?;
        Ok(())
    }

    /// Writes an SVG fragment.
    ///
    /// The picture sentinels are resolved one at a time, against the depth at
    /// their own position: only the outermost picture gets a full `<svg>`
    /// header and a closing tag.
    fn put_svg(&mut self, svg: &str) -> Result<(), Error> {
        let (left, top) = self.current_position();
        let mut resolved = String::with_capacity(svg.len());
        let mut rest = svg;
        while let Some((i, tag)) = find_svg_tag(rest) {
            resolved.push_str(&rest[..i]);
            rest = &rest[i..];
            match tag {
                SvgTag::Open => {
                    self.svg_depth += 1;
                    if let Some(tail) = rest.strip_prefix(SVG_OPEN_SENTINEL) {
                        if self.svg_depth <= 1 {
                            resolved.push_str(&self.svg_header());
                        }
                        rest = tail;
                        continue;
                    }
                }
                SvgTag::Close => {
                    self.svg_depth -= 1;
                    if let Some(tail) = rest.strip_prefix(SVG_CLOSE_SENTINEL) {
                        if self.svg_depth <= 0 {
                            resolved.push_str("</svg>");
                        }
                        rest = tail;
                        continue;
                    }
                }
            }
            let prefix = tag.prefix();
            resolved.push_str(prefix);
            rest = &rest[prefix.len()..];
        }
        resolved.push_str(rest);
        let resolved = resolved
            .replace("{?x}", &Num(left).to_string())
            .replace("{?y}", &Num(top).to_string());
        self.output.write_all(resolved.as_bytes())?;
        Ok(())
    }

    fn put_html(&mut self, html: &str) -> Result<(), Error> {
        self.output.write_all(html.as_bytes())?;
        Ok(())
    }

    fn put_text(&mut self, text: &[u8]) -> Result<f64, Error> {
        let font = self.state.current_font()?;
        let extent = font.measure(text, self.strictness)?;
        let raw = text
            .iter()
            .map(|&code| self.encodings.resolve(&font.name, code, self.strictness))
            .collect::<Result<String, Error>>()?;
        let html_text = html_escape::encode_text(&raw);
        let family = html_escape::encode_double_quoted_attribute(&font.name);
        let (left, top) = self.current_position();
        let height = self.points(extent.height);
        let size = Num(font.point_size());
        if self.svg_depth == 0 {
            write!(
                self.output,
                concat!(
                    r#"<span style="line-height: 0; color: {color}; font-family: {family}; "#,
                    r#"font-size: {size}pt; position: absolute; top: {top}pt; left: {left}pt; overflow: visible;">"#,
                    r#"<span style="margin-top: -{size}pt; line-height: 0pt; height: {size}pt; "#,
                    r#"display: inline-block; vertical-align: baseline; ">{text}</span>"#,
                    r#"<span style="display: inline-block; vertical-align: {height}pt; height: 0pt; line-height: 0;"></span>"#,
                    r#"</span>"#,
                ),
                color = self.color,
                family = family,
                size = size,
                top = Num(top - height),
                left = Num(left),
                text = html_text,
                height = Num(height),
            )?;
        } else {
            write!(
                self.output,
                r#"<text alignment-baseline="baseline" y="{}" x="{}" font-family="{}" font-size="{}" fill="{}"{}>{}</text>"#,
                Num(top),
                Num(left),
                family,
                size,
                self.color,
                self.state.matrix.to_svg_transform(),
                html_text,
            )?;
        }
        tracing::trace!(font = %font.name, text = %raw, "typeset text");
        Ok(extent.width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FontProperties;
    use crate::tfm::{CharMetrics, FontMetrics};
    use std::collections::HashMap;

    fn machine() -> HtmlMachine<Vec<u8>> {
        let mut fonts = HashMap::new();
        fonts.insert(
            "cmr10".to_string(),
            FontMetrics::new(10 << 20)
                .with_char(b'<', CharMetrics::new(1 << 19, 1 << 19, 0))
                .with_char(b'A', CharMetrics::new(1 << 19, 1 << 19, 0)),
        );
        let mut encodings = Encodings::default();
        encodings.insert("cmr10", b'<', '<');
        encodings.insert("cmr10", b'A', 'A');
        let mut m = HtmlMachine::new(vec![], fonts).with_encodings(encodings);
        // One DVI unit is one point.
        m.points_per_dvi_unit = 1.0;
        m.define_font(
            0,
            FontProperties {
                name: "cmr10".into(),
                checksum: 0,
                scale_factor: 10,
                design_size: 10,
            },
        )
        .unwrap();
        m.enable_font(0).unwrap();
        m
    }

    fn output(m: HtmlMachine<Vec<u8>>) -> String {
        String::from_utf8(m.into_inner()).unwrap()
    }

    #[test]
    fn points_per_dvi_unit() {
        let mut m = HtmlMachine::new(vec![], HashMap::<String, FontMetrics>::new());
        m.preamble(25400000, 473628672, 1000, "").unwrap();
        let want = 72.27 / 72.27 / 65536.0;
        assert!((m.points_per_dvi_unit() - want).abs() < 1e-15);
    }

    #[test]
    fn colors_nest() {
        let mut m = machine();
        m.push_color("red").unwrap();
        m.push_color("#00ff00").unwrap();
        m.pop_color().unwrap();
        assert_eq!(m.color(), "red");
        m.pop_color().unwrap();
        assert_eq!(m.color(), "black");
        assert!(matches!(m.pop_color(), Err(Error::ColorStackUnderflow)));
    }

    #[test]
    fn text_outside_svg_is_escaped() {
        let mut m = machine();
        let advance = m.put_text(b"<A").unwrap();
        assert_eq!(advance, 2.0 * 327680.0);
        similar_asserts::assert_eq!(
            output(m),
            concat!(
                r#"<span style="line-height: 0; color: black; font-family: cmr10; font-size: 10pt; "#,
                r#"position: absolute; top: -327680pt; left: 0pt; overflow: visible;">"#,
                r#"<span style="margin-top: -10pt; line-height: 0pt; height: 10pt; display: inline-block; "#,
                r#"vertical-align: baseline; ">&lt;A</span>"#,
                r#"<span style="display: inline-block; vertical-align: 327680pt; height: 0pt; line-height: 0;"></span>"#,
                r#"</span>"#,
            )
        );
    }

    #[test]
    fn text_inside_svg() {
        let mut m = machine();
        m.put_svg("<svg beginpicture>").unwrap();
        m.move_right(3.0);
        m.move_down(4.0);
        m.matrix_mut().scale(2.0, 2.0);
        m.put_text(b"A").unwrap();
        m.put_svg("</svg endpicture>").unwrap();
        similar_asserts::assert_eq!(
            output(m),
            concat!(
                r#"<svg version="1.1" xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" "#,
                r#"width="0pt" height="0pt" viewBox="-72 -72 0 0">"#,
                r#"<text alignment-baseline="baseline" y="4" x="3" font-family="cmr10" font-size="10" "#,
                r#"fill="black" transform="matrix(2 0 0 2 0 0)">A</text>"#,
                r#"</svg>"#,
            )
        );
    }

    #[test]
    fn nested_svg_sentinels_are_removed() {
        let mut m = machine();
        m.set_papersize(100.0, 50.0).unwrap();
        m.put_svg("<svg beginpicture><g>").unwrap();
        m.put_svg("<svg beginpicture>").unwrap();
        m.put_svg("</svg endpicture>").unwrap();
        m.put_svg("</g></svg endpicture>").unwrap();
        similar_asserts::assert_eq!(
            output(m),
            concat!(
                r#"<svg version="1.1" xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" "#,
                r#"width="100pt" height="50pt" viewBox="-72 -72 100 50"><g>"#,
                r#"</g></svg>"#,
            )
        );
    }

    #[test]
    fn cursor_placeholders() {
        let mut m = machine();
        m.move_right(12.5);
        m.move_down(-3.0);
        m.put_svg(r#"<circle cx="{?x}" cy="{?y}"/>"#).unwrap();
        assert_eq!(output(m), r#"<circle cx="12.5" cy="-3"/>"#);
    }

    #[test]
    fn rules() {
        let mut m = machine();
        m.push_color("red").unwrap();
        m.move_down(10.0);
        m.put_rule(4, 6).unwrap();
        m.put_rule(0, 6).unwrap();
        m.put_rule(4, -1).unwrap();
        assert_eq!(
            output(m),
            r#"<rect x="0" y="6" width="6" height="4" fill="red"></rect>"#
        );
    }

    #[test]
    fn current_position_is_in_points() {
        let mut m = HtmlMachine::new(vec![], HashMap::<String, FontMetrics>::new());
        m.points_per_dvi_unit = 2.0;
        m.move_right(10.0);
        assert_eq!(m.current_position(), (20.0, 0.0));
        m.set_current_position(4.0, 8.0);
        assert_eq!(m.state().position.h, 2.0);
        assert_eq!(m.state().position.v, 4.0);
    }

    #[test]
    fn adjacent_pictures_are_not_nested() {
        let mut m = machine();
        m.put_svg("<svg beginpicture>").unwrap();
        m.move_right(1.0);
        m.put_svg("</svg endpicture><svg beginpicture>").unwrap();
        m.move_right(1.0);
        m.put_svg("</svg endpicture>").unwrap();
        let header = concat!(
            r#"<svg version="1.1" xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" "#,
            r#"width="0pt" height="0pt" viewBox="-72 -72 0 0">"#,
        );
        similar_asserts::assert_eq!(output(m), format!("{header}</svg>{header}</svg>"));
    }

    #[test]
    fn inner_svg_tags_are_kept() {
        let mut m = machine();
        m.put_svg(r#"<svg beginpicture><svg x="{?x}"><g/></svg></svg endpicture>"#)
            .unwrap();
        let got = output(m);
        assert!(
            got.ends_with(r#"viewBox="-72 -72 0 0"><svg x="0"><g/></svg></svg>"#),
            "{got}"
        );
        assert_eq!(got.matches("<svg").count(), 2);
    }

    #[test]
    fn font_names_are_escaped() {
        let name = r#"x"><y"#;
        let mut fonts = HashMap::new();
        fonts.insert(
            name.to_string(),
            FontMetrics::new(10 << 20).with_char(b'A', CharMetrics::new(1 << 19, 1 << 19, 0)),
        );
        let mut encodings = Encodings::default();
        encodings.insert(name, b'A', 'A');
        let mut m = HtmlMachine::new(vec![], fonts).with_encodings(encodings);
        m.define_font(
            0,
            FontProperties {
                name: name.into(),
                checksum: 0,
                scale_factor: 10,
                design_size: 10,
            },
        )
        .unwrap();
        m.enable_font(0).unwrap();
        m.put_text(b"A").unwrap();
        m.put_svg("<svg beginpicture>").unwrap();
        m.put_text(b"A").unwrap();
        let got = output(m);
        assert!(got.contains("font-family: x&quot;&gt;&lt;y;"), "{got}");
        assert!(got.contains(r#"font-family="x&quot;&gt;&lt;y""#), "{got}");
        assert!(!got.contains(name), "{got}");
    }

    #[test]
    fn positions_before_the_preamble_use_tex_units() {
        let mut m = HtmlMachine::new(vec![], HashMap::<String, FontMetrics>::new());
        assert!((m.points_per_dvi_unit() - 1.0 / 65536.0).abs() < 1e-15);
        m.set_current_position(3.0, -4.0);
        assert!((m.state().position.h - 3.0 * 65536.0).abs() < 1e-6);
        assert!((m.state().position.v + 4.0 * 65536.0).abs() < 1e-6);
        let (x, y) = m.current_position();
        assert!((x - 3.0).abs() < 1e-9 && (y + 4.0).abs() < 1e-9);
    }

    #[test]
    fn svg_tag_finding() {
        assert_eq!(find_svg_tag("<svg beginpicture><svg>"), Some((0, SvgTag::Open)));
        assert_eq!(find_svg_tag("<svgfoo></svg endpicture>"), Some((8, SvgTag::Close)));
        assert_eq!(find_svg_tag("<g><svg/>"), Some((3, SvgTag::Open)));
        assert_eq!(find_svg_tag("<svgfoo><g>"), None);
    }
}
