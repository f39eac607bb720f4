use dvi::Op;
use dvi2html::font::FontProperties;
use dvi2html::{
    execute, pipeline, CharMetrics, Encodings, Error, FontMetrics, HtmlMachine, Machine,
    Strictness, TextMachine,
};
use std::collections::HashMap;

/// Scaled points per point.
const SP: i32 = 65536;

fn fonts() -> HashMap<String, FontMetrics> {
    // Ten point font where every letter is half an em wide and tall.
    let mut metrics = FontMetrics::new(10 << 20);
    for code in (b'A'..=b'Z').chain(b'a'..=b'z').chain([20_u8]) {
        metrics = metrics.with_char(code, CharMetrics::new(1 << 19, 1 << 19, 0));
    }
    let mut fonts = HashMap::new();
    fonts.insert("cmr10".to_string(), metrics);
    fonts
}

fn encodings() -> Encodings {
    let mut encodings = Encodings::default();
    for c in ('A'..='Z').chain('a'..='z') {
        encodings.insert("cmr10", c as u8, c);
    }
    encodings
}

fn page(body: Vec<Op>) -> Vec<u8> {
    let mut ops = vec![
        Op::Preamble {
            dvi_format: 2,
            unit_numerator: 25400000,
            unit_denominator: 473628672,
            magnification: 1000,
            comment: " TeX output".into(),
        },
        Op::BeginPage {
            parameters: [1, 0, 0, 0, 0, 0, 0, 0, 0, 0],
            previous_begin_page: -1,
        },
        Op::DefineFont {
            number: 0,
            checksum: 0,
            at_size: 10 * SP as u32,
            design_size: 10 * SP as u32,
            area: String::new(),
            name: "cmr10".into(),
        },
        Op::EnableFont(0),
    ];
    ops.extend(body);
    ops.push(Op::EndPage);
    dvi::serialize(ops)
}

fn text(s: &str) -> impl Iterator<Item = Op> + '_ {
    s.bytes().map(|b| Op::TypesetChar {
        char: b as u32,
        move_h: true,
    })
}

fn special(s: &str) -> Op {
    Op::Special(s.as_bytes().to_vec())
}

fn html(data: &[u8], strictness: Strictness) -> Result<String, Error> {
    let mut machine = HtmlMachine::new(vec![], fonts())
        .with_encodings(encodings())
        .with_strictness(strictness);
    execute(pipeline(dvi::Reader::new(data)), &mut machine)?;
    Ok(String::from_utf8(machine.into_inner()).unwrap())
}

/// Returns the numbers that follow each occurrence of `key` in the output.
fn values(output: &str, key: &str) -> Vec<f64> {
    output
        .match_indices(key)
        .map(|(i, _)| {
            let rest = &output[i + key.len()..];
            let end = rest
                .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == 'e'))
                .unwrap_or(rest.len());
            rest[..end].parse().unwrap()
        })
        .collect()
}

fn assert_close(got: &[f64], want: &[f64]) {
    assert_eq!(got.len(), want.len(), "got {got:?}, want {want:?}");
    for (g, w) in got.iter().zip(want) {
        assert!((g - w).abs() < 1e-9, "got {got:?}, want {want:?}");
    }
}

#[test_log::test]
fn words_are_typeset_as_runs() {
    let mut body = vec![Op::Right(10 * SP), Op::Down(20 * SP)];
    body.extend(text("Hi"));
    body.push(Op::Right(3 * SP));
    body.extend(text("there"));
    let output = html(&page(body), Strictness::Strict).unwrap();

    assert_eq!(output.matches("<span style=\"line-height: 0;").count(), 2);
    assert!(output.contains(">Hi</span>"), "{output}");
    assert!(output.contains(">there</span>"), "{output}");
    // Two half-em characters advance by 10pt, plus the 3pt space.
    assert_close(&values(&output, "left: "), &[10.0, 23.0]);
    assert_close(&values(&output, "; top: "), &[15.0, 15.0]);
    assert_close(&values(&output, "font-size: "), &[10.0, 10.0]);
}

#[test]
fn set_char_advances_by_scaled_width() {
    let mut machine = HtmlMachine::new(vec![], fonts()).with_encodings(encodings());
    let mut body: Vec<Op> = text("A").collect();
    body.push(Op::Push);
    let data = page(body);
    execute(pipeline(dvi::Reader::new(data.as_slice())), &mut machine).unwrap();
    // Half of a ten point em, in scaled points.
    assert_eq!(machine.state().position.h, 5.0 * SP as f64);
}

#[test]
fn font_scale_changes_advance() {
    let mut machine = HtmlMachine::new(vec![], fonts()).with_encodings(encodings());
    machine
        .define_font(
            3,
            FontProperties {
                name: "cmr10".into(),
                checksum: 0,
                scale_factor: 20 * SP as u32,
                design_size: 10 * SP as u32,
            },
        )
        .unwrap();
    machine.enable_font(3).unwrap();
    let advance = machine.put_text(b"A").unwrap();
    assert_eq!(advance, 10.0 * SP as f64);
}

#[test]
fn psfile_image() {
    let data = page(vec![
        special("dvisvgm:raw <svg beginpicture>"),
        Op::Push,
        special(r#"psfile="fig.eps" llx=0 lly=0 urx=10 ury=10 rwi=1000 rhi=1000"#),
        Op::Pop,
        special("dvisvgm:raw </svg endpicture>"),
    ]);
    let output = html(&data, Strictness::Strict).unwrap();
    assert!(
        output.contains(
            r#"<image x="0" y="0" width="10" height="10" href="fig" transform="matrix(10 0 0 10 0 -100)"></image>"#
        ),
        "{output}"
    );
    assert!(output.ends_with("</svg>"), "{output}");
}

#[test]
fn psfile_width_is_in_tenths_of_a_point() {
    let data = page(vec![special(
        "psfile=fig.eps llx=0 lly=0 urx=10 ury=10 rwi=100",
    )]);
    let output = html(&data, Strictness::Strict).unwrap();
    assert!(
        output.contains(r#"href="fig" transform="matrix(1 0 0 1 0 -10)""#),
        "{output}"
    );
}

#[test_log::test]
fn colors_and_graphics() {
    let data = page(vec![
        special("papersize=100pt,50pt"),
        special("color push rgb 1 0 0"),
        special("dvisvgm:raw <svg beginpicture>{?nl}"),
        special("dvisvgm:raw <g>"),
        special("ps: gsave 2 2 scale"),
        Op::TypesetRule {
            height: SP,
            width: 2 * SP,
            move_h: false,
        },
        special("ps: grestore"),
        Op::TypesetRule {
            height: SP,
            width: 2 * SP,
            move_h: true,
        },
        special("dvisvgm:raw </g>"),
        special("dvisvgm:raw </svg endpicture>"),
        special("color pop"),
        Op::Down(12 * SP),
    ]
    .into_iter()
    .chain(text("A"))
    .collect());
    let output = html(&data, Strictness::Strict).unwrap();

    let header = concat!(
        r#"<svg version="1.1" xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" "#,
        r#"width="100pt" height="50pt" viewBox="-72 -72 100 50"><g>"#,
    );
    assert!(output.starts_with(header), "{output}");
    assert_eq!(output.matches(r##"fill="#ff0000""##).count(), 2);
    assert_eq!(output.matches(r#"transform="matrix(2 0 0 2 0 0)""#).count(), 1);
    assert!(output.contains("</g></svg>"), "{output}");
    assert!(output.contains("color: black;"), "{output}");
    assert_close(&values(&output, "<rect x=\""), &[0.0, 0.0]);
    // The second rule moved h by its width.
    assert_close(&values(&output, "left: "), &[2.0]);
}

#[test]
fn adjacent_pictures() {
    let data = page(vec![
        special("dvisvgm:raw <svg beginpicture>"),
        Op::Right(SP),
        special("dvisvgm:raw </svg endpicture>"),
        special("dvisvgm:raw <svg beginpicture>"),
        Op::Right(SP),
        special("dvisvgm:raw </svg endpicture>"),
    ]);
    let output = html(&data, Strictness::Strict).unwrap();
    assert_eq!(output.matches("<svg version=").count(), 2, "{output}");
    assert_eq!(output.matches("</svg>").count(), 2, "{output}");
    assert!(output.contains("</svg><svg version="), "{output}");
    assert!(output.ends_with("</svg>"), "{output}");
}

#[test]
fn unbalanced_color_pop() {
    let data = page(vec![special("color pop")]);
    assert!(matches!(
        html(&data, Strictness::Strict),
        Err(Error::ColorStackUnderflow)
    ));
}

#[test]
fn unknown_postscript_operator() {
    let data = page(vec![special("ps: 1 2 frobnicate")]);
    match html(&data, Strictness::Strict) {
        Err(Error::PostScript(err)) => {
            assert_eq!(
                err,
                dvi2html::postscript::Error::UnknownOperator("frobnicate".into())
            )
        }
        other => panic!("unexpected result {:?}", other.map(|_| ())),
    }
}

#[test]
fn truncated_input() {
    let mut data = page(text("A").collect());
    data.truncate(data.len() - 3);
    data.push(132);
    assert!(matches!(
        html(&data, Strictness::Strict),
        Err(Error::Dvi(dvi::Error::Truncated(132)))
    ));
}

#[test_log::test]
fn missing_encoding_entries() {
    let data = page(text("\x14").collect());
    assert!(matches!(
        html(&data, Strictness::Strict),
        Err(Error::MissingEncoding { code: 20, .. })
    ));
    let output = html(&data, Strictness::Lenient).unwrap();
    assert!(output.contains(">\u{2219}</span>"), "{output}");
}

#[test_log::test]
fn missing_glyph_metrics() {
    let data = page(text("1").collect());
    assert!(matches!(
        html(&data, Strictness::Strict),
        Err(Error::MissingGlyph { code: b'1', .. })
    ));
}

#[test]
fn text_extraction() {
    let mut body = vec![Op::Down(20 * SP)];
    body.extend(text("Hello"));
    body.push(Op::Right(3 * SP));
    body.extend(text("world"));
    body.push(Op::Push);
    body.push(Op::Down(12 * SP));
    body.extend(text("again"));
    body.push(Op::Pop);
    let data = page(body);
    let mut machine = TextMachine::new(vec![], fonts()).with_encodings(encodings());
    execute(pipeline(dvi::Reader::new(data.as_slice())), &mut machine).unwrap();
    similar_asserts::assert_eq!(
        String::from_utf8(machine.into_inner()).unwrap(),
        "Hello world\nagain\n"
    );
}
