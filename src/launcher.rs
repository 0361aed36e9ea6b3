use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Small window pointing the user at the running server.
///
/// Closing it (button or window frame) returns from `run`; the caller then
/// stops the server.
pub struct Launcher {
    url: String,
    server_done: Arc<AtomicBool>,
}

pub fn run(url: String, server_done: Arc<AtomicBool>) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Graphical Representation of the Data Logs")
            .with_inner_size([380.0, 150.0])
            .with_resizable(false),
        ..Default::default()
    };

    eframe::run_native(
        "logplot",
        options,
        Box::new(|_cc| Ok(Box::new(Launcher { url, server_done }))),
    )
}

impl eframe::App for Launcher {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(10.0);
                if self.server_done.load(Ordering::Acquire) {
                    ui.colored_label(egui::Color32::RED, "Server stopped, see the log for details");
                } else {
                    ui.label("Application is running");
                }
                ui.add_space(10.0);
                ui.hyperlink_to("Click here to redirect to the server", &self.url);
                ui.add_space(10.0);
                if ui.button("Close").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });
        });
        // pick up a server that died after the window opened
        ctx.request_repaint_after(Duration::from_millis(500));
    }
}
