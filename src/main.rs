use clap::Parser;
use glam::{Mat4, Vec3};
use log::warn;
use sdl2::keyboard::Scancode;

use lantern::camera::Camera;
use lantern::engine::input::{InputEvent, InputState};
use lantern::engine::time::FrameTimer;
use lantern::engine::window::ViewerWindow;
use lantern::renderer::SceneRenderer;
use lantern::scene::demo_scene;
use lantern::snapshot;
use lantern::ui::{LightPanel, TextRenderer};
use lantern::LightKind;

#[derive(Parser)]
#[command(name = "lantern", about = "Lantern shadow-mapping viewer")]
struct Args {
    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Disable vsync
    #[arg(long)]
    no_vsync: bool,

    /// Save a PNG snapshot right after the first frame
    #[arg(long)]
    snapshot: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let sdl = sdl2::init().expect("Failed to init SDL2");
    let window = ViewerWindow::new(&sdl, "Lantern", args.width, args.height);
    window.set_vsync(!args.no_vsync);

    if !window.has_extension("GL_ARB_bindless_texture") {
        warn!("GL_ARB_bindless_texture missing; shadow maps will not resolve in the scene pass");
    }

    let mut renderer = SceneRenderer::new().expect("Failed to create scene renderer");
    let mut text_renderer = TextRenderer::new();
    let mut panel = LightPanel::new();
    let mut camera = Camera::new();

    let mut scene = demo_scene::build();
    renderer.upload_lights(&scene.lights);

    sdl.mouse().set_relative_mouse_mode(true);
    let mut event_pump = sdl.event_pump().expect("Failed to get event pump");
    let mut input = InputState::new();
    let mut timer = FrameTimer::new();

    let mut panel_light = 0usize;
    let mut frames: u64 = 0;

    loop {
        timer.tick();
        input.update(&mut event_pump);

        if input.should_quit() || input.is_key_held(Scancode::Escape) {
            break;
        }

        for event in &input.events {
            match event {
                InputEvent::KeyPressed(Scancode::F3) => {
                    panel.toggle();
                    sdl.mouse().set_relative_mouse_mode(!panel.is_visible());
                }
                InputEvent::KeyPressed(Scancode::Tab) => {
                    if panel.is_visible() {
                        panel_light = (panel_light + 1) % scene.lights.len();
                        panel.reset_selection();
                    }
                }
                InputEvent::KeyPressed(Scancode::F12) => {
                    let (w, h) = window.size();
                    snapshot::save_framebuffer("lantern", w, h);
                }
                _ => {}
            }
        }

        if panel.is_visible() {
            let light = &mut scene.lights[panel_light];
            if panel.edit(&input, light.state_mut(), timer.dt) {
                renderer.upload_lights(&scene.lights);
            }
        } else {
            camera.look(input.mouse_dx, input.mouse_dy);
            camera.move_wasd(&input, timer.dt);
        }

        // shadow passes: one per light, exercising each entry point
        for light in &mut scene.lights {
            if matches!(light.state().kind(), LightKind::Directional { .. }) {
                light.render_shadow_map_culled(&scene.batch);
            } else if matches!(light.state().kind(), LightKind::Spot { .. }) {
                light.render_shadow_map_batch(&scene.batch);
            } else {
                light.render_shadow_map(scene.batch.meshes());
            }
        }

        let view = camera.view_matrix();
        let proj = camera.projection_matrix(window.aspect_ratio());
        renderer.draw_scene(&scene.batch, &view, &proj, camera.position);

        if panel.is_visible() {
            let (w, h) = window.size();
            let ui_proj = Mat4::orthographic_rh_gl(0.0, w as f32, h as f32, 0.0, -1.0, 1.0);

            unsafe {
                gl::Disable(gl::DEPTH_TEST);
                gl::Enable(gl::BLEND);
                gl::BlendFunc(gl::SRC_ALPHA, gl::ONE_MINUS_SRC_ALPHA);
            }

            let name = format!("LIGHT {}", panel_light);
            panel.draw(
                &mut text_renderer,
                &name,
                scene.lights[panel_light].state(),
                &ui_proj,
            );
            text_renderer.draw_text(
                "F3 CLOSE  TAB NEXT LIGHT  F12 SNAPSHOT",
                8.0,
                h as f32 - 24.0,
                2.0,
                Vec3::new(0.5, 0.5, 0.5),
                &ui_proj,
            );

            unsafe {
                gl::Disable(gl::BLEND);
                gl::Enable(gl::DEPTH_TEST);
            }
        }

        window.swap();

        frames += 1;
        if args.snapshot && frames == 1 {
            let (w, h) = window.size();
            snapshot::save_framebuffer("lantern", w, h);
        }
    }
}
