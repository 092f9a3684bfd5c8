//! Scene owner: loads assets, runs [`Gameplay`] each frame and draws the
//! world, paddles, ball and HUD.

use std::rc::Rc;

use thiserror::Error;
use turbo_engine::assets::Assets;
use turbo_engine::audio::{Mixer, Music};
use turbo_engine::foundation::math::{look_at, Mat4, Rect, Vec2, Vec3, Vec4};
use turbo_engine::input::{InputManager, KeyCode};
use turbo_engine::render::{Device, Font, MeshRenderer, Model, RenderError, Renderer, SpriteBatch};

use crate::config::GameConfig;
use crate::gameplay::{Gameplay, TickOutcome};

/// Prompt blink period in milliseconds
const BLINK_PERIOD_MS: u64 = 1500;
/// Prompt visible for this part of each period
const BLINK_ON_MS: u64 = 750;

const PROMPT: &str = "Press Enter to Play";
const TITLE: &str = "Turboballs";

/// Startup failures. Missing assets are not among them: they are logged and
/// the part of the frame that needs them is skipped.
#[derive(Debug, Error)]
pub enum GameError {
    /// The device could not allocate a GPU resource
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

/// Everything the scene draws or plays
pub struct GameResources {
    /// HUD and prompt font, `None` if it failed to load
    pub font: Option<Rc<Font>>,
    /// Title font, `None` if it failed to load
    pub title_font: Option<Rc<Font>>,
    /// Scenery
    pub world: Model,
    /// Paddle model, drawn for the enemy and the player
    pub npc: Model,
    /// Ball
    pub ball: Model,
    /// Background track
    pub music: Rc<Music>,
}

impl GameResources {
    /// Load fonts and music through the cache and models from disk.
    ///
    /// Models are owned rather than cached: the paddle model is rescaled
    /// and the ball material recolored in place. Every failure is logged
    /// and leaves that resource empty.
    pub fn load(device: &Device, assets: &Assets, config: &GameConfig) -> Self {
        let paths = &config.resources;
        let font = |size: u32| match assets.font(&paths.font, size) {
            Ok(font) => Some(font),
            Err(e) => {
                log::error!("Text at size {size} disabled: {e}");
                None
            }
        };
        Self {
            font: font(config.font_size),
            title_font: font(config.title_font_size),
            world: Model::load(device, &paths.world_model),
            npc: Model::load(device, &paths.npc_model),
            ball: Model::load(device, &paths.ball_model),
            music: assets.music(&paths.music),
        }
    }
}

/// The running game
pub struct Game {
    gameplay: Gameplay,
    renderer: Renderer,
    sprite_batch: SpriteBatch,
    mesh_renderer: MeshRenderer,
    mixer: Mixer,
    resources: GameResources,
    control: f32,
    control_speed: f32,
}

impl Game {
    /// Build renderers from the configured shaders, load assets and start
    /// the music.
    ///
    /// Broken shaders, fonts or models only disable what they draw; the
    /// error case is a device that can't allocate the sprite geometry.
    pub fn new(device: &Device, config: &GameConfig, assets: &Assets, mixer: Mixer) -> Result<Self, GameError> {
        let window = &config.engine.window;
        let window_size = Vec2::new(window.width as f32, window.height as f32);
        let sprite_batch = SpriteBatch::new(device, &config.engine.sprite_shader, window_size)?;
        let mesh_renderer = MeshRenderer::new(device, &config.engine.mesh_shader, config.engine.vertex_colors);
        let resources = GameResources::load(device, assets, config);
        Ok(Self::from_parts(
            device,
            config,
            sprite_batch,
            mesh_renderer,
            resources,
            mixer,
            Gameplay::new(),
        ))
    }

    /// Assemble from already built parts
    pub fn from_parts(
        device: &Device,
        config: &GameConfig,
        mut sprite_batch: SpriteBatch,
        mesh_renderer: MeshRenderer,
        mut resources: GameResources,
        mut mixer: Mixer,
        gameplay: Gameplay,
    ) -> Self {
        let renderer = Renderer::new(device, &config.engine);
        mesh_renderer.resize(config.engine.window.width, config.engine.window.height);

        let scale = Mat4::new_scaling(config.npc_scale);
        for mesh in resources.npc.meshes_mut() {
            mesh.transform *= scale;
        }

        resources.music.play_on_loop(&mut mixer);

        let (width, height) = (config.engine.window.width as f32, config.engine.window.height as f32);
        sprite_batch.update_camera(
            Vec2::new(width / 2.0, height / 2.0),
            Rect::new(0.0, 0.0, width, height),
        );

        log::info!("Game initialized");
        Self {
            gameplay,
            renderer,
            sprite_batch,
            mesh_renderer,
            mixer,
            resources,
            control: 0.0,
            control_speed: config.control_speed,
        }
    }

    /// Advance one frame of `dt` seconds using this frame's input
    pub fn update(&mut self, dt: f32, input: &InputManager) -> TickOutcome {
        self.control = (self.control + input.axis_horizontal() * self.control_speed * dt).clamp(0.0, 1.0);
        let confirm = input.key(KeyCode::Return).is_just_pressed();

        let outcome = self.gameplay.update(dt, confirm, self.control);

        if self.gameplay.is_playing() {
            self.mesh_renderer
                .set_view_matrix(&look_at(self.gameplay.camera(), Vec3::zeros(), Vec3::y()));
        }
        if let Some(color) = outcome.ball_color {
            if let Some(material) = self.resources.ball.meshes().first().and_then(|m| m.material.as_ref()) {
                material.borrow_mut().emissive = color;
            }
        }
        self.mixer.update();
        outcome
    }

    /// Draw the frame. `ticks_ms` drives the prompt blink.
    pub fn render(&mut self, ticks_ms: u64) {
        self.renderer.clear();

        for mesh in self.resources.world.meshes() {
            self.mesh_renderer.draw_mesh(mesh, &mesh.transform);
        }
        let ball = Mat4::new_translation(&self.gameplay.ball());
        for mesh in self.resources.ball.meshes() {
            self.mesh_renderer.draw_mesh(mesh, &(mesh.transform * ball));
        }
        for position in [self.gameplay.enemy(), self.gameplay.player()] {
            let offset = Mat4::new_translation(&position);
            for mesh in self.resources.npc.meshes() {
                self.mesh_renderer.draw_mesh(mesh, &(mesh.transform * offset));
            }
        }

        if self.gameplay.is_playing() {
            self.draw_hud();
        } else {
            self.draw_title(ticks_ms);
        }
        self.sprite_batch.flush();
    }

    fn draw_title(&mut self, ticks_ms: u64) {
        if let Some(font) = &self.resources.font {
            if ticks_ms % BLINK_PERIOD_MS < BLINK_ON_MS {
                font.render_text(
                    &mut self.sprite_batch,
                    PROMPT,
                    Vec2::new(150.0, 300.0),
                    Vec2::new(1.0, 1.0),
                    Vec4::new(0.7, 1.0, 0.93, 0.8),
                    None,
                );
            }
        }
        self.sprite_batch.flush();

        if let Some(title_font) = &self.resources.title_font {
            title_font.render_text(
                &mut self.sprite_batch,
                TITLE,
                Vec2::new(130.0, 200.0),
                Vec2::new(1.0, 1.0),
                Vec4::new(0.0, 1.0, 1.0, 1.0),
                None,
            );
        }
    }

    fn draw_hud(&mut self) {
        let green = Vec4::new(0.0, 1.0, 0.0, 1.0);
        let unit = Vec2::new(1.0, 1.0);
        let Some(font) = &self.resources.font else {
            return;
        };
        let bottom = 600.0 - font.pixel_size() as f32;
        let lines = [
            (control_text(self.control), Vec2::new(0.0, bottom)),
            (format!("Score: {}", self.gameplay.score()), Vec2::zeros()),
            (format!("High Score: {}", self.gameplay.high_score()), Vec2::new(420.0, 0.0)),
        ];
        for (text, position) in lines {
            font.render_text(&mut self.sprite_batch, &text, position, unit, green, None);
        }
    }

    /// Mute or unmute all audio
    pub fn toggle_mute(&mut self) {
        self.mixer.toggle_mute();
    }

    /// Forward a window resize to the viewport and both projections
    pub fn resize(&mut self, width: u32, height: u32) {
        self.renderer.resize(width, height);
        self.sprite_batch.set_projection(Vec2::new(width as f32, height as f32));
        self.mesh_renderer.resize(width, height);
    }

    /// Rally state
    pub fn gameplay(&self) -> &Gameplay {
        &self.gameplay
    }

    /// Current control level in `[0, 1]`
    pub fn control(&self) -> f32 {
        self.control
    }

    /// Audio mixer
    pub fn mixer(&self) -> &Mixer {
        &self.mixer
    }
}

fn control_text(control: f32) -> String {
    format!("Control: {:.1}%", control * 100.0)
}
