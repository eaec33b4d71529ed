//! GUI module for the application.
//!
//! Provides the kiosk window using egui/eframe. The window only forwards
//! operator input to the enrollment `Controller` and paints its state.

pub mod render;
pub mod state;

use eframe::egui::{self, TextureHandle, Vec2};

use crate::enrollment::{Controller, Mode};

use state::{GuiState, UiAction};

/// Main GUI application struct.
pub struct GuiApp {
    /// Enrollment workflow (owns every background task).
    controller: Controller,
    /// Widget state.
    state: GuiState,
    /// Live feed texture, refreshed when the surface changes.
    feed_texture: Option<TextureHandle>,
}

impl GuiApp {
    /// Create a new GUI application instance.
    pub fn new(_cc: &eframe::CreationContext<'_>, controller: Controller) -> Self {
        Self {
            controller,
            state: GuiState::default(),
            feed_texture: None,
        }
    }

    /// Upload the surface to the feed texture if a new frame was drawn.
    fn update_feed_texture(&mut self, ctx: &egui::Context) {
        let surface = self.controller.surface();
        if surface.frames_drawn() == self.state.texture_frame && self.feed_texture.is_some() {
            return;
        }
        if !surface.has_frame() {
            return;
        }

        let snapshot = surface.snapshot();
        let size = [
            snapshot.pixels.width() as usize,
            snapshot.pixels.height() as usize,
        ];
        let color_image =
            egui::ColorImage::from_rgba_unmultiplied(size, snapshot.pixels.as_raw());

        match &mut self.feed_texture {
            Some(texture) => texture.set(color_image, egui::TextureOptions::LINEAR),
            None => {
                self.feed_texture =
                    Some(ctx.load_texture("live_feed", color_image, egui::TextureOptions::LINEAR));
            }
        }
        self.state.texture_frame = snapshot.frames_drawn;
        // A caption already in the pixels must not be painted twice
        self.state.feed_caption = snapshot.caption.filter(|_| !snapshot.caption_in_pixels);
    }

    /// Handle the "Iniciar coleta" button.
    fn handle_start_enrollment(&mut self) {
        let input = self.state.count_input.clone();
        match self.controller.start_enrollment(&input) {
            Ok(()) => {
                self.state.clear_error();
                self.state.name_input.clear();
                crate::log(&format!("GUI: Enrollment started for {} students", input.trim()));
            }
            Err(e) => self.state.set_error(e.user_message()),
        }
    }

    /// Handle the "Tirar fotos" button.
    fn handle_capture(&mut self) {
        match self.controller.start_capture() {
            Ok(()) => self.state.clear_error(),
            Err(e) => self.state.set_error(e.user_message()),
        }
    }

    /// Handle the "Próximo aluno" button.
    fn handle_advance(&mut self) {
        match self.controller.advance_student() {
            Ok(()) => {
                self.state.name_input.clear();
                self.state.clear_error();
            }
            Err(e) => self.state.set_error(e.user_message()),
        }
    }

    /// Handle the "Iniciar reconhecimento" button.
    fn handle_begin_recognition(&mut self) {
        match self.controller.begin_recognition() {
            Ok(()) => self.state.clear_error(),
            Err(e) => self.state.set_error(e.user_message()),
        }
    }

    fn dispatch(&mut self, action: UiAction) {
        match action {
            UiAction::StartEnrollment => self.handle_start_enrollment(),
            UiAction::NameChanged => self.controller.set_student_name(&self.state.name_input),
            UiAction::Capture => self.handle_capture(),
            UiAction::AdvanceStudent => self.handle_advance(),
            UiAction::BeginRecognition => self.handle_begin_recognition(),
        }
    }
}

impl eframe::App for GuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Collect finished capture sequences
        self.controller.poll_capture();
        self.update_feed_texture(ctx);

        // Keep the live feed moving
        ctx.request_repaint_after(self.controller.config().render_interval());

        let session = self.controller.snapshot();
        let outcome = self.controller.last_outcome().cloned();
        let polling = self.controller.is_polling();
        let mut action = None;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Cadastro e reconhecimento de alunos");
            ui.label(session.progress_string());
            ui.add_space(16.0);

            egui::ScrollArea::vertical().show(ui, |ui| match session.mode() {
                Mode::Idle => {
                    action = render::render_setup(ui, &mut self.state);
                }
                Mode::Collecting => {
                    action = render::render_collecting(
                        ui,
                        &mut self.state,
                        &session,
                        outcome.as_ref(),
                        self.feed_texture.as_ref(),
                    );
                }
                Mode::Recognizing => {
                    render::render_recognition(ui, &session, polling, self.feed_texture.as_ref());
                }
            });
        });

        if let Some(action) = action {
            self.dispatch(action);
        }
    }
}

/// Run the GUI application.
/// This function blocks until the window is closed; the controller (and every
/// task it owns) is dropped with the app.
pub fn run_gui(controller: Controller) -> eframe::Result<()> {
    crate::log("GUI: Creating native options...");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(Vec2::new(720.0, 760.0))
            .with_min_inner_size(Vec2::new(480.0, 480.0))
            .with_title("Cadastro de Alunos"),
        ..Default::default()
    };

    eframe::run_native(
        "Face Enrollment",
        options,
        Box::new(|cc| {
            crate::log("GUI: Creating GuiApp instance...");
            Ok(Box::new(GuiApp::new(cc, controller)))
        }),
    )
}
