//! Модуль для нативной real-time визуализации решётки с помощью egui.
//!
//! Визуализатор - это внешний потребитель данных: физическая симуляция
//! зовёт `update_data`/`set_target`, окно рисует последний снимок. Обе
//! стороны работают через один грубый замок: поток симуляции захватывает
//! его, копирует полный снимок позиций и сенсоров и сразу отпускает;
//! поток отрисовки захватывает тот же замок перед любым чтением. Никаких
//! частичных обновлений под замком не бывает.

use std::sync::{Arc, Mutex};

use eframe::egui;

/// Снимок сцены: позиции точек решётки, значения сенсоров, центр масс и
/// целевая позиция.
#[derive(Debug, Clone, Default)]
pub struct LatticeSnapshot {
    pub points: Vec<[f32; 3]>,
    pub sensors: Vec<f32>,
    pub center_of_mass: [f32; 3],
    pub target: [f32; 3],
}

/// Разделяемая сцена между симуляцией и отрисовкой.
#[derive(Clone, Default)]
pub struct SharedScene {
    inner: Arc<Mutex<LatticeSnapshot>>,
}

impl SharedScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Публикует новый снимок: позиции точек и значения сенсоров.
    /// Центр масс пересчитывается по точкам. Весь снимок копируется под
    /// замком целиком.
    pub fn update_data(&self, points: &[[f32; 3]], sensors: &[f32]) {
        let mut com = [0.0f32; 3];
        if !points.is_empty() {
            for p in points {
                com[0] += p[0];
                com[1] += p[1];
                com[2] += p[2];
            }
            let n = points.len() as f32;
            com = [com[0] / n, com[1] / n, com[2] / n];
        }
        let mut snapshot = self.inner.lock().expect("scene lock poisoned");
        snapshot.points = points.to_vec();
        snapshot.sensors = sensors.to_vec();
        snapshot.center_of_mass = com;
    }

    pub fn set_target(&self, target: [f32; 3]) {
        let mut snapshot = self.inner.lock().expect("scene lock poisoned");
        snapshot.target = target;
    }

    /// Копия последнего снимка, под тем же замком.
    pub fn snapshot(&self) -> LatticeSnapshot {
        self.inner.lock().expect("scene lock poisoned").clone()
    }
}

const POINT_RADIUS: f32 = 5.0;
const TARGET_RADIUS: f32 = 7.0;

/// Главная структура GUI-приложения.
pub struct LatticeViewerApp {
    scene: SharedScene,
    pan_offset: egui::Vec2,
    is_panning: bool,
    zoom: f32,
}

impl LatticeViewerApp {
    pub fn new(cc: &eframe::CreationContext<'_>, scene: SharedScene) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());
        Self {
            scene,
            pan_offset: egui::Vec2::ZERO,
            is_panning: false,
            zoom: 1.0,
        }
    }

    /// Простая изометрическая проекция 3D -> 2D.
    fn project(&self, p: [f32; 3], center: egui::Pos2) -> egui::Pos2 {
        let x = (p[0] - p[2] * 0.5) * self.zoom;
        let y = (-p[1] + p[2] * 0.25) * self.zoom;
        egui::pos2(center.x + x, center.y + y) + self.pan_offset
    }
}

impl eframe::App for LatticeViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let snapshot = self.scene.snapshot();

        egui::CentralPanel::default().show(ctx, |ui| {
            let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::drag());

            if response.drag_started() {
                self.is_panning = true;
            }
            if response.dragged() && self.is_panning {
                self.pan_offset += response.drag_delta();
            }
            if response.drag_stopped() {
                self.is_panning = false;
            }
            self.zoom *= (ui.input(|i| i.smooth_scroll_delta.y) * 0.001).exp();

            let center = response.rect.center();

            // Рёбра от точек к центру масс, чтобы форма читалась
            let com = self.project(snapshot.center_of_mass, center);
            for p in &snapshot.points {
                let pos = self.project(*p, center);
                painter.line_segment([pos, com], egui::Stroke::new(1.0, egui::Color32::GRAY));
            }

            for (i, p) in snapshot.points.iter().enumerate() {
                let pos = self.project(*p, center);
                let heat = snapshot
                    .sensors
                    .get(i)
                    .copied()
                    .unwrap_or(0.0)
                    .clamp(-1.0, 1.0);
                let color = egui::Color32::from_rgb(
                    (128.0 + 127.0 * heat) as u8,
                    96,
                    (128.0 - 127.0 * heat) as u8,
                );
                painter.circle_filled(pos, POINT_RADIUS, color);
            }

            painter.circle_filled(com, POINT_RADIUS * 0.6, egui::Color32::WHITE);
            let target = self.project(snapshot.target, center);
            painter.circle_stroke(
                target,
                TARGET_RADIUS,
                egui::Stroke::new(2.0, egui::Color32::RED),
            );

            ui.label(format!(
                "points: {}  com: ({:.1}, {:.1}, {:.1})",
                snapshot.points.len(),
                snapshot.center_of_mass[0],
                snapshot.center_of_mass[1],
                snapshot.center_of_mass[2]
            ));
        });

        // сцена обновляется из другого потока, перерисовываемся сами
        ctx.request_repaint();
    }
}

/// Открывает окно визуализатора и блокируется до его закрытия.
pub fn run_viewer(scene: SharedScene) -> eframe::Result {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([900.0, 700.0]),
        ..Default::default()
    };
    eframe::run_native(
        "rustynet - Визуализатор решётки",
        options,
        Box::new(|cc| Ok(Box::new(LatticeViewerApp::new(cc, scene)))),
    )
}
