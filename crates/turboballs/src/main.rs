//! Desktop entry point: GLFW window with an OpenGL 3.3 core context
#![allow(unsafe_code)]

use std::rc::Rc;

use glfw::{Action, Context, Key, OpenGlProfileHint, SwapInterval, WindowEvent, WindowHint, WindowMode};
use turbo_engine::assets::Assets;
use turbo_engine::audio::Mixer;
use turbo_engine::config::Config;
use turbo_engine::foundation::{logging, time::Timer};
use turbo_engine::input::{InputManager, KeyCode, KEY_COUNT};
use turbo_engine::render::device::gl::GlDevice;
use turbo_engine::render::Device;
use turboballs::config::CONFIG_PATH;
use turboballs::{Game, GameConfig};

/// Polled GLFW keys and the scancodes they report as
const KEY_MAP: [(Key, KeyCode); 14] = [
    (Key::A, KeyCode::A),
    (Key::D, KeyCode::D),
    (Key::M, KeyCode::M),
    (Key::S, KeyCode::S),
    (Key::W, KeyCode::W),
    (Key::Enter, KeyCode::Return),
    (Key::Escape, KeyCode::Escape),
    (Key::Backspace, KeyCode::Backspace),
    (Key::Space, KeyCode::Space),
    (Key::Right, KeyCode::Right),
    (Key::Left, KeyCode::Left),
    (Key::Down, KeyCode::Down),
    (Key::Up, KeyCode::Up),
    (Key::LeftAlt, KeyCode::LAlt),
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();
    let config = GameConfig::load_or_default(CONFIG_PATH);
    let window_config = &config.engine.window;

    let mut glfw = glfw::init(glfw::fail_on_errors)?;
    glfw.window_hint(WindowHint::ContextVersion(3, 3));
    glfw.window_hint(WindowHint::OpenGlProfile(OpenGlProfileHint::Core));
    glfw.window_hint(WindowHint::OpenGlForwardCompat(true));
    glfw.window_hint(WindowHint::Resizable(false));

    let (mut window, events) = glfw
        .create_window(
            window_config.width,
            window_config.height,
            &window_config.title,
            WindowMode::Windowed,
        )
        .ok_or("Failed to create GLFW window")?;
    window.make_current();
    window.set_key_polling(true);
    window.set_framebuffer_size_polling(true);
    glfw.set_swap_interval(SwapInterval::Sync(1));

    // SAFETY: the context was just made current on this thread and lives as
    // long as `window`, which outlives the device.
    let gl = unsafe { glow::Context::from_loader_function(|s| window.get_proc_address(s) as *const _) };
    let device: Device = Rc::new(GlDevice::new(gl));

    let assets = Assets::new(&device);
    let mut game = Game::new(&device, &config, &assets, Mixer::new())?;
    let input = InputManager::new();
    let mut raw = vec![false; KEY_COUNT];
    let mut timer = Timer::new();

    while !window.should_close() {
        glfw.poll_events();
        for (_, event) in glfw::flush_messages(&events) {
            match event {
                WindowEvent::FramebufferSize(width, height) => {
                    game.resize(width.max(0) as u32, height.max(0) as u32);
                }
                WindowEvent::Key(Key::Escape, _, Action::Press, _) => window.set_should_close(true),
                _ => {}
            }
        }

        for (key, code) in KEY_MAP {
            raw[code.scancode()] = window.get_key(key) != Action::Release;
        }
        input.update(&raw);
        if input.key(KeyCode::M).is_just_pressed() {
            game.toggle_mute();
        }

        let dt = timer.tick();
        game.update(dt, &input);
        game.render(timer.elapsed_millis());
        window.swap_buffers();
    }

    log::info!("Shutting down after {} frames", timer.frame_count());
    Ok(())
}
