//! Scene to SVG serialization
//!
//! The vector export route serializes the canvas display list to a
//! standalone SVG document and hands it to a rasterizer. Geometry matches
//! the on-screen renderer, including arrow heads.

use std::fmt::Write;

use crate::ui::scene::{Scene, Shape, TextAnchor, arrow_head_points};
use crate::ui::theme::Rgb;

/// Font stack used for canvas text in exported documents
const FONT_FAMILY: &str = "Segoe UI, Arial, DejaVu Sans, sans-serif";

/// Serializes a scene into an SVG document of the scene's pixel size
pub fn scene_to_svg(scene: &Scene) -> String {
    let mut svg = String::with_capacity(256 + scene.shapes.len() * 128);

    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = scene.width,
        h = scene.height,
    );
    let _ = writeln!(
        svg,
        r#"<rect x="0" y="0" width="{w}" height="{h}" fill="{fill}"/>"#,
        w = scene.width,
        h = scene.height,
        fill = scene.background,
    );

    for shape in &scene.shapes {
        write_shape(&mut svg, shape);
    }

    svg.push_str("</svg>\n");
    svg
}

fn write_shape(svg: &mut String, shape: &Shape) {
    match shape {
        Shape::Rect {
            x,
            y,
            w,
            h,
            fill,
            stroke,
            stroke_width,
        } => {
            let _ = writeln!(
                svg,
                r#"<rect x="{x}" y="{y}" width="{w}" height="{h}" fill="{fill}" stroke="{stroke}" stroke-width="{stroke_width}"/>"#,
                fill = paint(*fill),
                stroke = paint(*stroke),
            );
        }
        Shape::Line {
            x1,
            y1,
            x2,
            y2,
            color,
            width,
            dash,
            arrow,
        } => {
            let dash_attr = match dash {
                Some([on, off]) => format!(r#" stroke-dasharray="{on} {off}""#),
                None => String::new(),
            };
            let _ = writeln!(
                svg,
                r#"<line x1="{x1}" y1="{y1}" x2="{x2}" y2="{y2}" stroke="{color}" stroke-width="{width}"{dash_attr}/>"#,
            );

            let head = arrow
                .then(|| arrow_head_points((*x1, *y1), (*x2, *y2), *width))
                .flatten();
            if let Some(points) = head {
                let points = points
                    .iter()
                    .map(|(px, py)| format!("{px},{py}"))
                    .collect::<Vec<_>>()
                    .join(" ");
                let _ = writeln!(svg, r#"<polygon points="{points}" fill="{color}"/>"#);
            }
        }
        Shape::Text {
            x,
            y,
            text,
            color,
            size,
            anchor,
        } => {
            let anchor = match anchor {
                TextAnchor::Start => "start",
                TextAnchor::Middle => "middle",
            };
            let _ = writeln!(
                svg,
                r#"<text x="{x}" y="{y}" font-family="{FONT_FAMILY}" font-size="{size}" fill="{color}" text-anchor="{anchor}" dominant-baseline="central">{text}</text>"#,
                text = escape_xml(text),
            );
        }
    }
}

fn paint(color: Option<Rgb>) -> String {
    color.map_or_else(|| "none".to_string(), |c| c.to_hex())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
