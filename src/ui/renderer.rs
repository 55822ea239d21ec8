//! Scene rasterizer
//!
//! Renders a [`Scene`] into a tiny-skia pixmap. Text is rasterized with
//! ab_glyph from a system font when one can be found; without a font the
//! text runs are skipped and everything else still renders.

use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontVec, PxScale, ScaleFont, point};
use tiny_skia::{
    ColorU8, FillRule, Paint, PathBuilder, Pixmap, PixmapPaint, Rect as SkiaRect, Stroke,
    StrokeDash, Transform,
};

use crate::ui::scene::{Scene, Shape, TextAnchor, arrow_head_points};
use crate::ui::theme::Rgb;

/// Environment variable naming a TTF/OTF file to use for canvas text
pub const FONT_ENV: &str = "SEQDRAW_FONT";

const FONT_CANDIDATES: &[&str] = &[
    "C:\\Windows\\Fonts\\segoeui.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
];

#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    #[error("Failed to create {width}x{height} pixmap for rendering")]
    PixmapCreationFailed { width: u32, height: u32 },

    #[error("Failed to read font {path}: {source}")]
    FontRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid font file {0}")]
    InvalidFont(PathBuf),
}

/// Rasterizer for canvas scenes
pub struct SceneRenderer {
    font: Option<FontVec>,
}

impl std::fmt::Debug for SceneRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneRenderer")
            .field("has_font", &self.font.is_some())
            .finish()
    }
}

impl SceneRenderer {
    /// Creates a renderer using the first usable system font
    pub fn new() -> Self {
        let font = find_system_font();
        if font.is_none() {
            tracing::warn!("no usable font found; canvas text will not be rasterized");
        }
        Self { font }
    }

    /// Creates a renderer that skips text runs
    pub fn without_text() -> Self {
        Self { font: None }
    }

    /// Creates a renderer with the font at `path`
    pub fn with_font_file(path: &Path) -> Result<Self, RendererError> {
        Ok(Self {
            font: Some(load_font(path)?),
        })
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Renders the scene onto a fresh pixmap filled with the scene background
    pub fn render(&self, scene: &Scene) -> Result<Pixmap, RendererError> {
        let mut pixmap =
            Pixmap::new(scene.width, scene.height).ok_or(RendererError::PixmapCreationFailed {
                width: scene.width,
                height: scene.height,
            })?;
        pixmap.fill(scene.background.to_skia());

        for shape in &scene.shapes {
            match shape {
                Shape::Rect {
                    x,
                    y,
                    w,
                    h,
                    fill,
                    stroke,
                    stroke_width,
                } => draw_rect(&mut pixmap, *x, *y, *w, *h, *fill, *stroke, *stroke_width),
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
                    draw_line(&mut pixmap, (*x1, *y1), (*x2, *y2), *color, *width, *dash);
                    if *arrow {
                        draw_arrow_head(&mut pixmap, (*x1, *y1), (*x2, *y2), *color, *width);
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
                    if let Some(font) = &self.font {
                        draw_text(&mut pixmap, font, *x, *y, text, *color, *size, *anchor);
                    }
                }
            }
        }

        Ok(pixmap)
    }
}

impl Default for SceneRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts a pixmap to the BGRA byte order GDI expects for 32-bit DIBs
pub fn pixmap_to_bgra(pixmap: &Pixmap) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        out.extend_from_slice(&[pixel.blue(), pixel.green(), pixel.red(), pixel.alpha()]);
    }
    out
}

fn find_system_font() -> Option<FontVec> {
    let from_env = std::env::var_os(FONT_ENV).map(PathBuf::from);
    let candidates = from_env
        .into_iter()
        .chain(FONT_CANDIDATES.iter().map(PathBuf::from));

    for path in candidates {
        if !path.is_file() {
            continue;
        }
        match load_font(&path) {
            Ok(font) => {
                tracing::debug!(path = %path.display(), "loaded canvas font");
                return Some(font);
            }
            Err(err) => tracing::debug!(error = %err, "skipping font candidate"),
        }
    }
    None
}

fn load_font(path: &Path) -> Result<FontVec, RendererError> {
    let data = std::fs::read(path).map_err(|source| RendererError::FontRead {
        path: path.to_path_buf(),
        source,
    })?;
    FontVec::try_from_vec(data).map_err(|_| RendererError::InvalidFont(path.to_path_buf()))
}

fn solid_paint(color: Rgb) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    paint.anti_alias = true;
    paint
}

#[allow(clippy::too_many_arguments)]
fn draw_rect(
    pixmap: &mut Pixmap,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    fill: Option<Rgb>,
    stroke: Option<Rgb>,
    stroke_width: f32,
) {
    let Some(rect) = SkiaRect::from_xywh(x, y, w, h) else {
        return;
    };

    if let Some(fill) = fill {
        pixmap.fill_rect(rect, &solid_paint(fill), Transform::identity(), None);
    }

    if let Some(stroke_color) = stroke {
        let path = PathBuilder::from_rect(rect);
        let stroke = Stroke {
            width: stroke_width.max(0.5),
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &solid_paint(stroke_color), &stroke, Transform::identity(), None);
    }
}

fn draw_line(
    pixmap: &mut Pixmap,
    from: (f32, f32),
    to: (f32, f32),
    color: Rgb,
    width: f32,
    dash: Option<[f32; 2]>,
) {
    let mut path_builder = PathBuilder::new();
    path_builder.move_to(from.0, from.1);
    path_builder.line_to(to.0, to.1);

    if let Some(path) = path_builder.finish() {
        let stroke = Stroke {
            width,
            dash: dash.and_then(|[on, off]| StrokeDash::new(vec![on, off], 0.0)),
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &solid_paint(color), &stroke, Transform::identity(), None);
    }
}

fn draw_arrow_head(pixmap: &mut Pixmap, from: (f32, f32), to: (f32, f32), color: Rgb, width: f32) {
    let Some([p1, p2, p3]) = arrow_head_points(from, to, width) else {
        return;
    };

    let mut path_builder = PathBuilder::new();
    path_builder.move_to(p1.0, p1.1);
    path_builder.line_to(p2.0, p2.1);
    path_builder.line_to(p3.0, p3.1);
    path_builder.close();

    if let Some(path) = path_builder.finish() {
        pixmap.fill_path(&path, &solid_paint(color), FillRule::Winding, Transform::identity(), None);
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_text(
    pixmap: &mut Pixmap,
    font: &FontVec,
    x: f32,
    y: f32,
    text: &str,
    color: Rgb,
    size: f32,
    anchor: TextAnchor,
) {
    if text.is_empty() {
        return;
    }

    let scale = PxScale::from(size);
    let scaled = font.as_scaled(scale);

    let mut glyphs = Vec::with_capacity(text.len());
    let mut caret = 0.0f32;
    let mut previous = None;
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = previous {
            caret += scaled.kern(prev, id);
        }
        glyphs.push(id.with_scale_and_position(scale, point(caret, 0.0)));
        caret += scaled.h_advance(id);
        previous = Some(id);
    }

    let origin_x = match anchor {
        TextAnchor::Start => x,
        TextAnchor::Middle => x - caret / 2.0,
    };
    // Centre the line box (ascent above, descent below the baseline) on y
    let baseline = y + (scaled.ascent() + scaled.descent()) / 2.0;

    let outlined: Vec<_> = glyphs
        .into_iter()
        .filter_map(|glyph| font.outline_glyph(glyph))
        .collect();
    if outlined.is_empty() {
        return;
    }

    let min_x = outlined.iter().map(|g| g.px_bounds().min.x).fold(f32::MAX, f32::min).floor();
    let min_y = outlined.iter().map(|g| g.px_bounds().min.y).fold(f32::MAX, f32::min).floor();
    let max_x = outlined.iter().map(|g| g.px_bounds().max.x).fold(f32::MIN, f32::max).ceil();
    let max_y = outlined.iter().map(|g| g.px_bounds().max.y).fold(f32::MIN, f32::max).ceil();

    let width = (max_x - min_x).max(1.0) as u32;
    let height = (max_y - min_y).max(1.0) as u32;
    let Some(mut run) = Pixmap::new(width, height) else {
        return;
    };

    let mut coverage = vec![0.0f32; (width * height) as usize];
    for glyph in &outlined {
        let bounds = glyph.px_bounds();
        let offset_x = (bounds.min.x - min_x) as i64;
        let offset_y = (bounds.min.y - min_y) as i64;
        glyph.draw(|gx, gy, c| {
            let px = offset_x + gx as i64;
            let py = offset_y + gy as i64;
            if px >= 0 && py >= 0 && (px as u32) < width && (py as u32) < height {
                let slot = &mut coverage[(py as u32 * width + px as u32) as usize];
                *slot = slot.max(c);
            }
        });
    }

    for (pixel, c) in run.pixels_mut().iter_mut().zip(coverage) {
        let alpha = (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        if alpha > 0 {
            *pixel = ColorU8::from_rgba(color.r, color.g, color.b, alpha).premultiply();
        }
    }

    pixmap.draw_pixmap(
        (origin_x + min_x).round() as i32,
        (baseline + min_y).round() as i32,
        run.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );
}
