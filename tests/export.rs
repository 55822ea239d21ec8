use std::path::Path;

use image::{ColorType, GenericImageView};
use seqdraw::app::CanvasController;
use seqdraw::domain::core::Rect;
use seqdraw::domain::{Diagram, LineStyle};
use seqdraw::export::{
    CanvasSurface, CaptureError, CommandRasterizer, ExportError, ExportFormat, ExportPipeline,
    ScreenCapture, ScreenCaptureExport, VectorExport,
};
use seqdraw::ui::renderer::SceneRenderer;
use seqdraw::ui::scene::Scene;
use seqdraw::ui::theme::Palette;
use tiny_skia::Pixmap;

/// Screen that always shows a pre-rendered canvas
struct StaticScreen {
    pixels: Pixmap,
}

impl ScreenCapture for StaticScreen {
    fn name(&self) -> &str {
        "static"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn capture(&self, region: Rect) -> Result<Pixmap, CaptureError> {
        assert_eq!((region.w as u32, region.h as u32), (self.pixels.width(), self.pixels.height()));
        Ok(self.pixels.clone())
    }
}

fn two_actor_scene() -> Scene {
    let mut diagram = Diagram::default();
    let client = diagram.add_actor("Client").unwrap();
    let server = diagram.add_actor("Server").unwrap();
    diagram
        .add_interaction(client, server, "request", LineStyle::Solid)
        .unwrap();
    diagram
        .add_interaction(server, client, "response", LineStyle::Dashed)
        .unwrap();
    CanvasController::new().build_scene(&diagram, &Palette::LIGHT)
}

fn fallback_only_pipeline(scene: &Scene) -> ExportPipeline {
    let pixels = SceneRenderer::without_text().render(scene).unwrap();
    ExportPipeline::new()
        .with_strategy(VectorExport::new(CommandRasterizer::new(
            "seqdraw-test-missing-converter",
        )))
        .with_strategy(ScreenCaptureExport::new(StaticScreen { pixels }))
}

fn on_screen(scene: Scene) -> CanvasSurface {
    let region = Rect::new(200, 150, scene.width as i32, scene.height as i32);
    CanvasSurface::new(scene).with_screen_region(region)
}

fn alpha_at(path: &Path, x: u32, y: u32) -> u8 {
    image::open(path).unwrap().get_pixel(x, y)[3]
}

#[test]
fn fallback_capture_writes_png_when_converter_is_missing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("diagram.png");
    let scene = two_actor_scene();
    let pipeline = fallback_only_pipeline(&scene);

    let report = pipeline.export(&on_screen(scene), &path, false).unwrap();

    assert!(report.used_fallback);
    assert_eq!(report.format, ExportFormat::Png);
    assert!(report.strategy.starts_with("screen capture"));
    assert!(std::fs::metadata(&path).unwrap().len() > 0);
    assert_eq!(image::open(&path).unwrap().dimensions(), (1000, 700));
}

#[test]
fn transparent_png_keys_out_background_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("diagram.png");
    let scene = two_actor_scene();
    let pipeline = fallback_only_pipeline(&scene);

    let report = pipeline.export(&on_screen(scene), &path, true).unwrap();

    assert!(report.transparent_pixels > 0);
    // empty corner is background
    assert_eq!(alpha_at(&path, 990, 690), 0);
    // inside the first actor box, away from its outline and name
    assert_eq!(alpha_at(&path, 48, 26), 255);
}

#[test]
fn jpeg_ignores_transparency() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("diagram.JPG");
    let scene = two_actor_scene();
    let pipeline = fallback_only_pipeline(&scene);

    let report = pipeline.export(&on_screen(scene), &path, true).unwrap();

    assert_eq!(report.format, ExportFormat::Jpeg);
    assert_eq!(report.transparent_pixels, 0);
    assert_eq!(image::open(&path).unwrap().color(), ColorType::Rgb8);
}

#[test]
fn unsupported_extension_is_rejected_before_rendering() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("diagram.bmp");
    let scene = two_actor_scene();
    let pipeline = fallback_only_pipeline(&scene);

    let err = pipeline.export(&on_screen(scene), &path, false).unwrap_err();
    assert!(matches!(err, ExportError::UnsupportedFormat(_)));
    assert!(!path.exists());
}

#[test]
fn hidden_canvas_with_no_converter_fails_with_every_attempt() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("diagram.png");
    let scene = two_actor_scene();
    let pipeline = fallback_only_pipeline(&scene);

    let err = pipeline
        .export(&CanvasSurface::new(scene), &path, false)
        .unwrap_err();
    match err {
        ExportError::AllStrategiesFailed { attempts } => {
            assert_eq!(attempts.len(), 1);
            assert!(attempts[0].strategy.starts_with("screen capture"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[cfg(feature = "resvg")]
#[test]
fn vector_export_prefers_resvg() {
    use seqdraw::export::ResvgRasterizer;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("diagram.png");
    let scene = two_actor_scene();
    let pipeline = ExportPipeline::new()
        .with_strategy(VectorExport::new(ResvgRasterizer::new()))
        .with_strategy(ScreenCaptureExport::new(StaticScreen {
            pixels: SceneRenderer::without_text().render(&scene).unwrap(),
        }));

    let report = pipeline.export(&on_screen(scene), &path, true).unwrap();

    assert!(!report.used_fallback);
    assert_eq!(alpha_at(&path, 990, 690), 0);
    assert_eq!(alpha_at(&path, 48, 26), 255);
}
