//! Editor controller and coordination layer
//!
//! The controller owns the diagram and wires the canvas controller, the
//! interaction manager, preferences, theming, dialogs and export together.
//! Hosts forward pointer events and commands to it and repaint when asked.

use std::path::{Path, PathBuf};

use crate::app::canvas::{CanvasController, GestureOutcome, hit_test};
use crate::app::interactions::{InteractionManager, list_entries};
use crate::app::state::PressTarget;
use crate::config::{Preferences, PreferencesError, PreferencesStore, ThemePreference};
use crate::domain::core::{Point, Rect};
use crate::domain::diagram::{Diagram, DiagramError};
use crate::domain::sequence::MoveDirection;
use crate::export::{CanvasSurface, ExportError, ExportFormat, ExportPipeline, ExportReport};
use crate::input::EditorCommand;
use crate::ui::scene::Scene;
use crate::ui::shell::UiShell;
use crate::ui::theme::{Palette, Theme};

/// Default file name offered by the export dialog
const DEFAULT_EXPORT_STEM: &str = "diagram";

/// Application errors that can occur during controller operations
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Diagram error: {0}")]
    Diagram(#[from] DiagramError),

    #[error("Preferences error: {0}")]
    Preferences(#[from] PreferencesError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[cfg(windows)]
    #[error("Window error: {0}")]
    Window(#[from] crate::platform::window::WindowError),
}

/// Main editor controller
///
/// Generic over the dialog/theming shell so the whole editor can be driven
/// from tests.
pub struct EditorController<S: UiShell> {
    diagram: Diagram,
    canvas: CanvasController,
    shell: S,
    store: PreferencesStore,
    preferences: Preferences,
    theme: Theme,
    exporter: ExportPipeline,
    /// Canvas rectangle in screen coordinates while the window is shown
    screen_region: Option<Rect>,
}

impl<S: UiShell> EditorController<S> {
    /// Creates a controller, loading preferences and applying the theme
    ///
    /// `system_theme` is only consulted when the stored preference follows
    /// the OS (or nothing is stored).
    pub fn new(
        shell: S,
        store: PreferencesStore,
        exporter: ExportPipeline,
        system_theme: impl FnOnce() -> Theme,
    ) -> Self {
        let preferences = store.load();
        let theme = preferences.theme.resolve(system_theme);
        tracing::info!(%theme, path = %store.path().display(), "editor starting");

        let mut controller = Self {
            diagram: Diagram::default(),
            canvas: CanvasController::new(),
            shell,
            store,
            preferences,
            theme,
            exporter,
            screen_region: None,
        };
        controller.shell.apply_theme(theme, &theme.palette());
        controller
    }

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn diagram_mut(&mut self) -> &mut Diagram {
        &mut self.diagram
    }

    pub fn canvas(&self) -> &CanvasController {
        &self.canvas
    }

    pub fn shell(&self) -> &S {
        &self.shell
    }

    pub fn shell_mut(&mut self) -> &mut S {
        &mut self.shell
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn palette(&self) -> Palette {
        self.theme.palette()
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Interaction list as shown in the side panel
    pub fn interaction_entries(&self) -> Vec<String> {
        list_entries(&self.diagram)
    }

    /// Updates where the canvas sits on screen (`None` while hidden)
    pub fn set_screen_region(&mut self, region: Option<Rect>) {
        self.screen_region = region;
    }

    /// Resizes the canvas to the host's client area
    pub fn resize(&mut self, width: i32, height: i32) {
        if width > 0 && height > 0 {
            self.diagram.resize(width, height);
        }
    }

    /// Display list for the current state
    pub fn scene(&self) -> Scene {
        self.canvas.build_scene(&self.diagram, &self.palette())
    }

    // ----- pointer input -----

    /// Returns true when the canvas needs repainting
    pub fn pointer_down(&mut self, point: Point) -> Result<bool, AppError> {
        let outcome = self.canvas.press(&mut self.diagram, point)?;
        self.handle_outcome(outcome)
    }

    pub fn pointer_move(&mut self, point: Point) -> Result<bool, AppError> {
        let outcome = self.canvas.drag(&mut self.diagram, point)?;
        self.handle_outcome(outcome)
    }

    pub fn pointer_up(&mut self, point: Point) -> Result<bool, AppError> {
        let outcome = self.canvas.release(&mut self.diagram, point)?;
        self.handle_outcome(outcome)
    }

    /// Double click on an arrow edits its label
    pub fn double_click(&mut self, point: Point) -> Result<bool, AppError> {
        if let PressTarget::Interaction(index) = hit_test(&self.diagram, point) {
            InteractionManager::new(&mut self.diagram).select(index)?;
            self.edit_label()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn handle_outcome(&mut self, outcome: GestureOutcome) -> Result<bool, AppError> {
        let redraw = outcome.needs_redraw();
        match outcome {
            GestureOutcome::InteractionCreated(index) => {
                self.prompt_label(index, "Interaction label", "Enter label for this interaction:")?;
            }
            GestureOutcome::Rejected(reason) => self.shell.status(&reason.to_string()),
            GestureOutcome::ActorMoved { actor, touching, .. } => {
                tracing::debug!(%actor, redrawn = touching.len(), "interactions follow moved actor");
            }
            _ => {}
        }
        Ok(redraw)
    }

    // ----- commands -----

    /// Runs a keyboard command; returns true when the canvas needs repainting
    pub fn execute(&mut self, command: EditorCommand) -> Result<bool, AppError> {
        tracing::debug!(?command, "editor command");
        match command {
            EditorCommand::AddActor => self.add_actor(),
            EditorCommand::ToggleNewInteractionMode => {
                let enabled = !self.canvas.new_interaction_mode();
                self.canvas.set_new_interaction_mode(enabled);
                let message = if enabled {
                    "New interaction: drag from one actor to another"
                } else {
                    "New interaction mode off"
                };
                self.shell.status(message);
                Ok(true)
            }
            EditorCommand::ToggleNewStyle => {
                let style = self.canvas.new_interaction_style().toggled();
                self.canvas.set_new_interaction_style(style);
                self.shell.status(&format!("New interactions: {style}"));
                Ok(true)
            }
            EditorCommand::ToggleSelectedStyle => {
                let toggled = InteractionManager::new(&mut self.diagram).toggle_selected_style()?;
                Ok(toggled.is_some())
            }
            EditorCommand::EditLabel => self.edit_label(),
            EditorCommand::MoveUp => Ok(self.move_selected(MoveDirection::Up)),
            EditorCommand::MoveDown => Ok(self.move_selected(MoveDirection::Down)),
            EditorCommand::Delete => {
                let removed = InteractionManager::new(&mut self.diagram).delete_selected()?;
                Ok(removed.is_some())
            }
            EditorCommand::ToggleTheme => {
                self.set_theme(self.theme.toggled());
                Ok(true)
            }
            EditorCommand::Export => {
                self.export_interactive();
                Ok(false)
            }
            EditorCommand::Cancel => {
                let outcome = self.canvas.cancel(&mut self.diagram)?;
                if outcome.needs_redraw() {
                    return Ok(true);
                }
                self.diagram.select_actor(None);
                InteractionManager::new(&mut self.diagram).clear_selection();
                Ok(true)
            }
        }
    }

    /// Prompts for a name and adds an actor at the next free slot
    pub fn add_actor(&mut self) -> Result<bool, AppError> {
        let Some(name) = self.shell.ask_text("Add Actor", "Actor name:", "") else {
            return Ok(false);
        };
        match self.diagram.add_actor(&name) {
            Ok(_) => Ok(true),
            Err(DiagramError::EmptyActorName) => {
                self.shell.status("Actor name must not be empty");
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Edits the selected interaction's label; cancelling keeps it unchanged
    pub fn edit_label(&mut self) -> Result<bool, AppError> {
        let Some(index) = self.diagram.interactions().selected() else {
            self.shell.status("Select an interaction to edit");
            return Ok(false);
        };
        self.prompt_label(index, "Edit label", "Label:")
    }

    fn prompt_label(&mut self, index: usize, title: &str, prompt: &str) -> Result<bool, AppError> {
        let current = self
            .diagram
            .interactions()
            .get(index)
            .map(|interaction| interaction.label.clone())
            .unwrap_or_default();

        match self.shell.ask_text(title, prompt, &current) {
            Some(label) => {
                InteractionManager::new(&mut self.diagram).set_label(index, &label)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn move_selected(&mut self, direction: MoveDirection) -> bool {
        InteractionManager::new(&mut self.diagram)
            .move_selected(direction)
            .is_some()
    }

    // ----- theme -----

    /// Switches theme, persists the choice and restyles the shell
    ///
    /// A failed save is reported but the theme still changes for this session.
    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.preferences.theme = ThemePreference::from(theme);
        self.shell.apply_theme(theme, &theme.palette());

        if let Err(err) = self.store.save(&self.preferences) {
            tracing::warn!(error = %err, "failed to save preferences");
            self.shell.error("Preferences", &err.to_string());
        }
    }

    // ----- export -----

    /// Snapshot of the canvas handed to the export pipeline
    pub fn surface(&self) -> CanvasSurface {
        CanvasSurface {
            scene: self.scene(),
            screen_region: self.screen_region,
        }
    }

    /// Exports the canvas to `path` without any dialogs
    pub fn export_to(&self, path: &Path, transparent: bool) -> Result<ExportReport, ExportError> {
        self.exporter.export(&self.surface(), path, transparent)
    }

    /// Export dialog flow: format, transparency, destination
    ///
    /// Returns the report when a file was written. Failures are shown with
    /// the shell's error dialog.
    pub fn export_interactive(&mut self) -> Option<ExportReport> {
        let format = match self
            .shell
            .ask_choice("Export", "Image format:", &["PNG", "JPEG"])?
        {
            0 => ExportFormat::Png,
            _ => ExportFormat::Jpeg,
        };

        let transparent = match format {
            ExportFormat::Png => {
                self.shell
                    .ask_choice("Export", "Background:", &["Opaque", "Transparent"])?
                    == 1
            }
            ExportFormat::Jpeg => false,
        };

        let suggested = format!("{DEFAULT_EXPORT_STEM}.{}", format.extension());
        let destination = self.shell.ask_text("Export", "Save image to:", &suggested)?;
        let destination = destination.trim();
        if destination.is_empty() {
            return None;
        }
        let path = PathBuf::from(destination);

        // The destination prompt may still be on screen over the canvas
        self.shell.before_capture();
        match self.export_to(&path, transparent) {
            Ok(report) => {
                let mut message = format!("Exported to {}", report.path.display());
                if report.used_fallback {
                    message.push_str(
                        "\n\nThe vector converter was unavailable, so the image was captured \
                         from the screen. Keep the window visible and unobstructed when exporting.",
                    );
                }
                self.shell.info("Export", &message);
                Some(report)
            }
            Err(err) => {
                tracing::error!(error = %err, path = %path.display(), "export failed");
                self.shell.error("Export error", &err.to_string());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ACTOR_TOP_Y, LineStyle};
    use crate::export::{CaptureError, ExportStrategy, StrategyError};
    use std::collections::VecDeque;
    use tiny_skia::Pixmap;

    /// Shell that answers dialogs from a script and records what it showed
    #[derive(Default)]
    struct ScriptedShell {
        texts: VecDeque<Option<String>>,
        choices: VecDeque<Option<usize>>,
        infos: Vec<String>,
        errors: Vec<String>,
        statuses: Vec<String>,
        themes: Vec<Theme>,
        captures_prepared: usize,
    }

    impl UiShell for ScriptedShell {
        fn ask_text(&mut self, _title: &str, _prompt: &str, _initial: &str) -> Option<String> {
            self.texts.pop_front().flatten()
        }

        fn ask_choice(&mut self, _title: &str, _prompt: &str, _options: &[&str]) -> Option<usize> {
            self.choices.pop_front().flatten()
        }

        fn info(&mut self, _title: &str, message: &str) {
            self.infos.push(message.to_string());
        }

        fn error(&mut self, _title: &str, message: &str) {
            self.errors.push(message.to_string());
        }

        fn status(&mut self, message: &str) {
            self.statuses.push(message.to_string());
        }

        fn before_capture(&mut self) {
            self.captures_prepared += 1;
        }

        fn apply_theme(&mut self, theme: Theme, _palette: &Palette) {
            self.themes.push(theme);
        }
    }

    /// Strategy that paints the scene background only
    struct BackgroundOnly;

    impl ExportStrategy for BackgroundOnly {
        fn name(&self) -> &str {
            "background"
        }

        fn is_available(&self) -> bool {
            true
        }

        fn attempt(&self, surface: &CanvasSurface) -> Result<Pixmap, StrategyError> {
            let mut pixmap = Pixmap::new(surface.scene.width, surface.scene.height)
                .ok_or(CaptureError::BitmapCreationFailed)?;
            pixmap.fill(surface.scene.background.to_skia());
            Ok(pixmap)
        }
    }

    fn editor(dir: &tempfile::TempDir) -> EditorController<ScriptedShell> {
        EditorController::new(
            ScriptedShell::default(),
            PreferencesStore::new(dir.path().join("prefs.json")),
            ExportPipeline::new().with_strategy(BackgroundOnly),
            || Theme::Light,
        )
    }

    fn script_text(editor: &mut EditorController<ScriptedShell>, answers: &[Option<&str>]) {
        editor
            .shell_mut()
            .texts
            .extend(answers.iter().map(|a| a.map(str::to_string)));
    }

    fn actor_point(editor: &EditorController<ScriptedShell>, index: usize) -> Point {
        Point::new(editor.diagram().actors()[index].x, ACTOR_TOP_Y + 10)
    }

    #[test]
    fn startup_applies_resolved_theme() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("prefs.json"), r#"{"theme":"dark"}"#).unwrap();
        let editor = editor(&dir);
        assert_eq!(editor.theme(), Theme::Dark);
        assert_eq!(editor.shell().themes, vec![Theme::Dark]);
    }

    #[test]
    fn add_actor_prompts_and_rejects_blank_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = editor(&dir);
        script_text(&mut editor, &[Some("Client"), Some("   "), None]);

        assert!(editor.execute(EditorCommand::AddActor).unwrap());
        assert!(!editor.execute(EditorCommand::AddActor).unwrap());
        assert!(!editor.execute(EditorCommand::AddActor).unwrap());
        assert_eq!(editor.diagram().actors().len(), 1);
        assert_eq!(editor.shell().statuses, vec!["Actor name must not be empty"]);
    }

    #[test]
    fn drawing_an_interaction_prompts_for_label() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = editor(&dir);
        script_text(&mut editor, &[Some("Client"), Some("Server"), Some("login")]);
        editor.execute(EditorCommand::AddActor).unwrap();
        editor.execute(EditorCommand::AddActor).unwrap();
        editor.execute(EditorCommand::ToggleNewInteractionMode).unwrap();

        let (from, to) = (actor_point(&editor, 0), actor_point(&editor, 1));
        editor.pointer_down(from).unwrap();
        editor.pointer_move(Point::new(200, 100)).unwrap();
        assert!(editor.pointer_up(to).unwrap());

        assert_eq!(
            editor.interaction_entries(),
            vec!["1. Client -> Server [solid]: login"]
        );
    }

    #[test]
    fn self_drag_shows_status_and_adds_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = editor(&dir);
        script_text(&mut editor, &[Some("Client")]);
        editor.execute(EditorCommand::AddActor).unwrap();
        editor.execute(EditorCommand::ToggleNewInteractionMode).unwrap();

        let point = actor_point(&editor, 0);
        editor.pointer_down(point).unwrap();
        editor.pointer_up(point).unwrap();

        assert!(editor.diagram().interactions().is_empty());
        assert_eq!(
            editor.shell().statuses.last().unwrap(),
            "an interaction cannot start and end on the same actor"
        );
    }

    #[test]
    fn cancelled_label_edit_keeps_label() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = editor(&dir);
        let a = editor.diagram_mut().add_actor("A").unwrap();
        let b = editor.diagram_mut().add_actor("B").unwrap();
        editor
            .diagram_mut()
            .add_interaction(a, b, "keep", LineStyle::Solid)
            .unwrap();
        editor.diagram_mut().interactions_mut().select(0).unwrap();

        script_text(&mut editor, &[None, Some("changed")]);
        assert!(!editor.execute(EditorCommand::EditLabel).unwrap());
        assert_eq!(editor.diagram().interactions().get(0).unwrap().label, "keep");
        assert!(editor.execute(EditorCommand::EditLabel).unwrap());
        assert_eq!(editor.diagram().interactions().get(0).unwrap().label, "changed");
    }

    #[test]
    fn keyboard_reorder_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = editor(&dir);
        let a = editor.diagram_mut().add_actor("A").unwrap();
        let b = editor.diagram_mut().add_actor("B").unwrap();
        for label in ["one", "two"] {
            editor
                .diagram_mut()
                .add_interaction(a, b, label, LineStyle::Solid)
                .unwrap();
        }
        editor.diagram_mut().interactions_mut().select(1).unwrap();

        assert!(!editor.execute(EditorCommand::MoveDown).unwrap());
        assert!(editor.execute(EditorCommand::MoveUp).unwrap());
        assert!(editor.execute(EditorCommand::ToggleSelectedStyle).unwrap());
        assert_eq!(
            editor.interaction_entries(),
            vec!["1. A -> B [dashed]: two", "2. A -> B [solid]: one"]
        );

        assert!(editor.execute(EditorCommand::Delete).unwrap());
        assert_eq!(editor.interaction_entries(), vec!["1. A -> B [solid]: one"]);
        assert_eq!(editor.diagram().interactions().selected(), Some(0));
    }

    #[test]
    fn theme_toggle_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = editor(&dir);
        editor.execute(EditorCommand::ToggleTheme).unwrap();

        assert_eq!(editor.theme(), Theme::Dark);
        assert_eq!(editor.shell().themes, vec![Theme::Light, Theme::Dark]);
        let saved = PreferencesStore::new(dir.path().join("prefs.json")).load();
        assert_eq!(saved.theme, ThemePreference::Dark);
    }

    #[test]
    fn theme_save_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = EditorController::new(
            ScriptedShell::default(),
            PreferencesStore::new(dir.path()),
            ExportPipeline::new(),
            || Theme::Light,
        );
        editor.set_theme(Theme::Dark);
        assert_eq!(editor.theme(), Theme::Dark);
        assert_eq!(editor.shell().errors.len(), 1);
    }

    #[test]
    fn interactive_export_writes_file_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = editor(&dir);
        let out = dir.path().join("out.png");
        editor.shell_mut().choices.extend([Some(0), Some(1)]);
        script_text(&mut editor, &[Some(out.to_str().unwrap())]);

        let report = editor.export_interactive().unwrap();
        assert_eq!(report.format, ExportFormat::Png);
        assert_eq!(report.transparent_pixels, 1000 * 700);
        assert!(out.is_file());
        assert_eq!(editor.shell().infos.len(), 1);
        assert_eq!(editor.shell().captures_prepared, 1);
    }

    #[test]
    fn interactive_export_reports_bad_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = editor(&dir);
        editor.shell_mut().choices.extend([Some(1)]);
        let out = dir.path().join("out.gif");
        script_text(&mut editor, &[Some(out.to_str().unwrap())]);

        assert!(editor.export_interactive().is_none());
        assert_eq!(editor.shell().errors.len(), 1);
        assert!(editor.shell().errors[0].contains("Unsupported export format"));
    }

    #[test]
    fn cancelling_export_dialog_does_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = editor(&dir);
        editor.shell_mut().choices.push_back(None);
        assert!(editor.export_interactive().is_none());
        assert!(editor.shell().errors.is_empty());
        assert!(editor.shell().infos.is_empty());
        assert_eq!(editor.shell().captures_prepared, 0);
    }

    #[test]
    fn escape_clears_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = editor(&dir);
        let a = editor.diagram_mut().add_actor("A").unwrap();
        editor.diagram_mut().select_actor(Some(a));
        editor.execute(EditorCommand::Cancel).unwrap();
        assert_eq!(editor.diagram().selected_actor(), None);
    }
}
