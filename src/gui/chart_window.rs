//! Chart Window
//! A native window showing one rendered chart. Closing it ends `run_native`.

use crate::charts::RenderedChart;
use egui::{CentralPanel, ColorImage, TextureHandle, TextureOptions};

/// Window padding around the chart image, in points.
const PADDING: f32 = 16.0;

/// Single-chart viewer.
pub struct ChartWindow {
    image: Option<ColorImage>,
    texture: Option<TextureHandle>,
}

impl ChartWindow {
    pub fn new(chart: &RenderedChart) -> Self {
        let image = ColorImage::from_rgb(
            [chart.width as usize, chart.height as usize],
            &chart.rgb,
        );
        Self {
            image: Some(image),
            texture: None,
        }
    }

    /// Show the chart and block until the window is closed.
    pub fn show_blocking(chart: &RenderedChart) -> eframe::Result<()> {
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([
                    chart.width as f32 + PADDING,
                    chart.height as f32 + PADDING,
                ])
                .with_title(chart.title.clone()),
            ..Default::default()
        };

        let window = ChartWindow::new(chart);
        eframe::run_native(
            &chart.title,
            options,
            Box::new(move |_cc| Ok(Box::new(window))),
        )
    }
}

impl eframe::App for ChartWindow {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.texture.is_none() {
            if let Some(image) = self.image.take() {
                self.texture = Some(ctx.load_texture("chart", image, TextureOptions::LINEAR));
            }
        }

        CentralPanel::default().show(ctx, |ui| {
            if let Some(texture) = &self.texture {
                ui.centered_and_justified(|ui| {
                    ui.add(egui::Image::new(texture).shrink_to_fit());
                });
            }
        });
    }
}
