//! GUI rendering functions.
//!
//! Contains UI layout and component rendering logic. Each panel returns the
//! actions the operator requested this frame.

use eframe::egui::{self, Color32, RichText, TextureHandle, Vec2};

use super::state::{GuiState, UiAction};
use crate::enrollment::{CaptureOutcome, OfferedAction, Session, PHOTOS_PER_STUDENT};

/// Render the live feed with the caption overlay.
pub fn render_feed(ui: &mut egui::Ui, texture: Option<&TextureHandle>, caption: Option<&str>) {
    let available_width = ui.available_width().min(640.0);
    let size = Vec2::new(available_width, available_width * 0.75); // 4:3

    let rect = if let Some(texture) = texture {
        ui.image((texture.id(), size)).rect
    } else {
        // Placeholder until the first frame arrives
        let (rect, _response) = ui.allocate_exact_size(size, egui::Sense::hover());
        ui.painter().rect_filled(rect, 4.0, Color32::from_gray(30));
        ui.painter().text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            "Aguardando câmera...",
            egui::FontId::proportional(16.0),
            Color32::from_gray(160),
        );
        rect
    };

    if let Some(caption) = caption.filter(|c| !c.is_empty()) {
        ui.painter().text(
            rect.left_bottom() + Vec2::new(10.0, -20.0),
            egui::Align2::LEFT_BOTTOM,
            caption,
            egui::FontId::proportional(20.0),
            Color32::WHITE,
        );
    }
}

fn render_error(ui: &mut egui::Ui, message: &str) {
    if !message.is_empty() {
        ui.label(RichText::new(message).color(Color32::from_rgb(200, 40, 40)));
    }
}

/// Render the student count form (Idle mode).
pub fn render_setup(ui: &mut egui::Ui, state: &mut GuiState) -> Option<UiAction> {
    let mut action = None;

    ui.horizontal(|ui| {
        ui.label("Número de alunos:");
        let response = ui.add(egui::TextEdit::singleline(&mut state.count_input).desired_width(80.0));
        let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

        if ui.button(RichText::new("Iniciar coleta").size(16.0)).clicked() || submitted {
            action = Some(UiAction::StartEnrollment);
        }
    });

    if let Some(message) = &state.error_message {
        render_error(ui, message);
    }

    action
}

/// Render the capture panel (Collecting mode).
pub fn render_collecting(
    ui: &mut egui::Ui,
    state: &mut GuiState,
    session: &Session,
    outcome: Option<&CaptureOutcome>,
    texture: Option<&TextureHandle>,
) -> Option<UiAction> {
    let mut action = None;

    ui.label(
        RichText::new(format!(
            "Aluno {} de {}",
            session.current_student(),
            session.total_students()
        ))
        .strong(),
    );
    ui.add_space(8.0);

    render_feed(ui, texture, state.feed_caption.as_deref());
    ui.add_space(8.0);

    ui.horizontal(|ui| {
        ui.label("Nome do aluno:");
        ui.add_enabled_ui(!session.is_capturing(), |ui| {
            let response = ui.text_edit_singleline(&mut state.name_input);
            if response.changed() {
                action = Some(UiAction::NameChanged);
            }
        });
    });
    render_error(ui, &session.validation().message);

    ui.add_space(8.0);

    match session.offered_action() {
        Some(OfferedAction::Capture) => {
            ui.add_enabled_ui(session.can_capture(), |ui| {
                if ui.button(RichText::new("📷 Tirar fotos").size(16.0)).clicked() {
                    action = Some(UiAction::Capture);
                }
            });
        }
        Some(OfferedAction::AdvanceStudent) => {
            if ui.button(RichText::new("Próximo aluno").size(16.0)).clicked() {
                action = Some(UiAction::AdvanceStudent);
            }
        }
        Some(OfferedAction::BeginRecognition) => {
            if ui
                .button(RichText::new("Iniciar reconhecimento").size(16.0))
                .clicked()
            {
                action = Some(UiAction::BeginRecognition);
            }
        }
        None => {}
    }

    ui.add_space(8.0);
    ui.label(session.progress_text());
    ui.add(egui::ProgressBar::new(
        f32::from(session.photos_taken()) / f32::from(PHOTOS_PER_STUDENT),
    ));

    if let Some(notice) = session.completion_notice() {
        ui.label(RichText::new(notice).color(Color32::from_rgb(40, 150, 60)).strong());
    }
    if let Some(CaptureOutcome::Interrupted { photos_taken }) = outcome {
        render_error(
            ui,
            &format!(
                "Captura interrompida em {}/{}. Tire as fotos restantes.",
                photos_taken, PHOTOS_PER_STUDENT
            ),
        );
    }
    if let Some(message) = &state.error_message {
        render_error(ui, message);
    }

    render_stats(ui, session);
    action
}

/// Render the recognition panel (Recognizing mode).
pub fn render_recognition(
    ui: &mut egui::Ui,
    session: &Session,
    polling: bool,
    texture: Option<&TextureHandle>,
) {
    render_feed(ui, texture, None);
    ui.add_space(8.0);
    ui.label(RichText::new(session.recognition_status()).size(18.0).strong());
    if !polling {
        render_error(ui, "Reconhecimento parado.");
    }
    render_stats(ui, session);
}

/// Render the submission counters; highlighted when photos may be missing.
fn render_stats(ui: &mut egui::Ui, session: &Session) {
    let stats = session.stats();
    if stats.photos_submitted == 0 && stats.recognition_requests == 0 {
        return;
    }

    ui.add_space(8.0);
    ui.separator();
    let color = if stats.has_photo_losses() {
        Color32::from_rgb(200, 120, 0)
    } else {
        Color32::GRAY
    };
    ui.label(RichText::new(stats.summary()).small().color(color));
}
