use std::cell::RefCell;
use std::rc::Rc;

use raylib::prelude::*;
use tracing::{info, warn};

use crate::config::Config;
use crate::constants::*;
use crate::error::{Result, ViewerError};
use crate::event_bus::EventBus;
use crate::fader::FadeController;
use crate::image_cycle::ImageCycleController;
use crate::image_set::ImageSet;
use crate::look::LookController;
use crate::texture_loader::TextureSource;

/// Window, sphere and controllers of a running panorama viewer.
///
/// The panorama is drawn on the inside of a sphere around the camera, with a
/// full-screen black rectangle on top whose alpha follows the fader.
pub struct PanoramaViewer {
    // Field order matters: GPU resources go before the window does.
    sphere: Model,
    cycle: Rc<ImageCycleController<TextureSource>>,
    fader: Rc<FadeController>,
    look: LookController,
    rl: Rc<RefCell<RaylibHandle>>,
    thread: Rc<RaylibThread>,
}

impl PanoramaViewer {
    pub fn new(config: &Config, images: ImageSet, bus: Rc<EventBus>) -> Result<Self> {
        let (mut rl, thread) = raylib::init()
            .size(config.window.width, config.window.height)
            .title("Panorama Viewer")
            .vsync()
            .resizable()
            .build();
        rl.set_target_fps(config.window.fps);
        rl.set_trace_log(TraceLogLevel::LOG_ERROR);

        let mesh = Mesh::gen_mesh_sphere(&thread, SPHERE_RADIUS, SPHERE_RINGS, SPHERE_SLICES);
        let sphere = rl
            .load_model_from_mesh(&thread, unsafe { mesh.make_weak() })
            .map_err(|e| ViewerError::Render(e.to_string()))?;

        let rl = Rc::new(RefCell::new(rl));
        let thread = Rc::new(thread);

        bus.set_log_missing(config.log_missing_subscribers);
        let fader = FadeController::new(Rc::clone(&bus), config.fade_speed);
        let source = TextureSource::new(Rc::clone(&rl), Rc::clone(&thread));
        let cycle = ImageCycleController::new(bus, images, source, config.start_index);

        Ok(Self {
            sphere,
            cycle,
            fader,
            look: LookController::new(config.look),
            rl,
            thread,
        })
    }

    /// Runs until the window is closed.
    pub fn run(&mut self) -> Result<()> {
        self.fader.activate();
        self.cycle.activate();
        self.cycle.show_initial()?;
        info!(count = self.cycle.images().len(), "viewer started");

        while !self.rl.borrow().window_should_close() {
            let dt = self.rl.borrow().get_frame_time();
            self.render_frame(dt);
        }

        // Every activate is paired with a deactivate.
        self.cycle.deactivate();
        self.fader.deactivate();
        info!("viewer closed");
        Ok(())
    }

    fn handle_input(&mut self) {
        let (left, right, home, drag) = {
            let rl = self.rl.borrow();
            let drag = rl
                .is_mouse_button_down(MouseButton::MOUSE_BUTTON_LEFT)
                .then(|| rl.get_mouse_delta());
            (
                rl.is_key_pressed(KeyboardKey::KEY_LEFT),
                rl.is_key_pressed(KeyboardKey::KEY_RIGHT),
                rl.is_key_pressed(KeyboardKey::KEY_HOME),
                drag,
            )
        };

        if let Some(delta) = drag {
            self.look.drag(delta.x, delta.y);
        }
        if left {
            self.cycle.request_navigation(-1);
        }
        if right {
            self.cycle.request_navigation(1);
        }
        if home {
            if let Err(error) = self.cycle.reset_to_first() {
                warn!(%error, "could not go back to the first panorama");
            }
        }
    }

    fn render_frame(&mut self, dt: f32) {
        // --- Update Logic ---

        // 1. Arrow keys, Home and mouse drag
        self.handle_input();

        // 2. Advance the fade; finishing a fade to black swaps the texture,
        //    which borrows the raylib handle, so nothing may hold it here
        self.fader.update(dt);

        // 3. Point the sphere at whatever the cycle is showing now
        if let Some(texture) = self.cycle.displayed() {
            self.sphere.materials_mut()[0]
                .set_material_texture(MaterialMapIndex::MATERIAL_MAP_ALBEDO, &*texture);
        }

        let [x, y, z] = self.look.forward();
        let camera = Camera3D::perspective(
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(x, y, z),
            Vector3::new(0.0, 1.0, 0.0),
            FIELD_OF_VIEW,
        );
        // Overlay alpha: 0 = panorama fully visible, 255 = black screen
        let alpha = (self.fader.opacity().clamp(0.0, 1.0) * 255.0).round() as u8;

        // --- Render ---

        let mut rl = self.rl.borrow_mut();
        let mut d = rl.begin_drawing(&self.thread);
        d.clear_background(Color::BLACK);
        {
            let mut d3 = d.begin_mode3D(camera);
            // Mirrored on X so the texture reads correctly from inside the sphere.
            d3.draw_model_ex(
                &self.sphere,
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(0.0, 1.0, 0.0),
                0.0,
                Vector3::new(-1.0, 1.0, 1.0),
                Color::WHITE,
            );
        }

        // Black overlay on top of everything, covering the whole window
        let sw = d.get_screen_width();
        let sh = d.get_screen_height();
        d.draw_rectangle(0, 0, sw, sh, Color::new(0, 0, 0, alpha));
    }
}
