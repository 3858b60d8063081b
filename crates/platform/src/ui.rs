//! egui control panel.

use corelib::camera::{MAX_ZOOM, MIN_ZOOM, ZOOM_STEP};
use corelib::clock::Clock;
use egui::Slider;

use crate::scene::Scene;

const ANGLE_RANGE: std::ops::RangeInclusive<f32> = -90.0..=90.0;

/// What the user did in the panel this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PanelResponse {
    pub toggle_walk: bool,
    pub poke: bool,
    /// A slider moved; the figure must be redrawn.
    pub changed: bool,
}

pub fn control_panel<C: Clock>(
    ctx: &egui::Context,
    scene: &mut Scene<C>,
    show_fps: bool,
) -> PanelResponse {
    let mut out = PanelResponse::default();
    // keep the slider in range; rotation is periodic anyway
    scene.camera.yaw_deg = scene.camera.yaw_deg.rem_euclid(360.0);

    egui::Window::new("Astrocat")
        .default_pos([12.0, 12.0])
        .resizable(false)
        .show(ctx, |ui| {
            ui.heading("Camera");
            out.changed |= ui
                .add(Slider::new(&mut scene.camera.yaw_deg, 0.0..=360.0).text("Rotation"))
                .changed();
            let mut zoom = scene.camera.zoom();
            if ui
                .add(
                    Slider::new(&mut zoom, MIN_ZOOM..=MAX_ZOOM)
                        .step_by(f64::from(ZOOM_STEP))
                        .text("Zoom"),
                )
                .changed()
            {
                scene.camera.set_zoom(zoom);
                out.changed = true;
            }

            ui.separator();
            ui.heading("Pose");
            // sliders display the live pose; edits only ever go to the manual pose
            let shown = scene.shown();
            let manual = &mut scene.manual;
            for (mut value, target, label) in [
                (shown.head, &mut manual.head, "Head"),
                (shown.tail, &mut manual.tail, "Tail"),
                (shown.leg, &mut manual.leg, "Legs"),
                (shown.paw, &mut manual.paw, "Paws"),
            ] {
                if ui
                    .add(Slider::new(&mut value, ANGLE_RANGE).text(label))
                    .changed()
                {
                    *target = value;
                    out.changed = true;
                }
            }

            ui.separator();
            ui.horizontal(|ui| {
                let label = if scene.is_walking() {
                    "Stop Animation"
                } else {
                    "Start Animation"
                };
                out.toggle_walk = ui.button(label).clicked();
                out.poke = ui.button("Poke").clicked();
            });

            if show_fps {
                let fps = scene
                    .fps()
                    .map_or_else(|| "--".to_owned(), |fps| fps.to_string());
                ui.label(format!("FPS: {fps}"));
            }
            ui.small("Drag to rotate, wheel to zoom, Shift+click to poke");
        });

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::clock::ManualClock;

    #[test]
    fn panel_without_input_changes_nothing() {
        let ctx = egui::Context::default();
        let mut scene = Scene::new(ManualClock::new(0.0), false);
        scene.manual.tail = 30.0;

        let mut response = PanelResponse::default();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            response = control_panel(ctx, &mut scene, true);
        });
        assert_eq!(response, PanelResponse::default());
        assert_eq!(scene.manual.tail, 30.0);
        assert_eq!(scene.camera.yaw_deg, 180.0);
    }

    #[test]
    fn panel_wraps_yaw_into_slider_range() {
        let ctx = egui::Context::default();
        let mut scene = Scene::new(ManualClock::new(0.0), false);
        scene.camera.yaw_deg = -90.0;
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            control_panel(ctx, &mut scene, false);
        });
        assert_eq!(scene.camera.yaw_deg, 270.0);
    }

    #[test]
    fn panel_during_a_walk_leaves_the_manual_pose_alone() {
        let ctx = egui::Context::default();
        let mut scene = Scene::new(ManualClock::new(0.0), true);
        scene.manual.tail = -20.0;
        scene.frame_pose();
        assert_ne!(scene.shown(), scene.manual);

        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            control_panel(ctx, &mut scene, false);
        });
        assert_eq!(scene.manual.tail, -20.0);
        assert_eq!(scene.manual.leg, 0.0);
    }
}
