//! Ball rally state machine
//!
//! One ball flies back and forth between the enemy at the far end (z = 0)
//! and the player's line (z = 12). Flight progress is a single parameter
//! `t`: the ball's ground position is interpolated between the two
//! endpoints and its height follows a parabola peaking at `t = 0.5`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use turbo_engine::foundation::math::utils::{lerp, lerp_vec3};
use turbo_engine::foundation::math::Vec3;

/// Player half-width of travel along x
pub const MAX_X: f32 = 1.8;
/// Camera travel along x at full control
pub const CAM_MAX_X: f32 = 12.0;
/// Ball landing spread along x
pub const BALL_MAX_X: f32 = 9.0;
/// Apex height of a rally
pub const MAX_BALL_HEIGHT: f32 = 4.0;
/// z of the player's return line
pub const PLAYER_DEST_Z: f32 = 12.0;
/// x offset of the first serve from the left edge
pub const BALL_OFFSET: f32 = 3.0;

/// Flight progress per second
const T_RATE: f32 = 0.4;
/// Max ball-to-paddle distance that counts as a return
const HIT_DISTANCE: f32 = 2.0;
/// Closer than this to the player's line without a hit is a miss
const MISS_MARGIN: f32 = 0.1;
/// Past the end of a flight: forces the turn-around this tick
const FLIGHT_OVER: f32 = 1.1;
/// Where a new flight starts
const FLIGHT_START: f32 = 0.1;
/// Height of the ball at both ends of a flight
const GROUND_HEIGHT: f32 = 0.1;

/// What changed during one [`Gameplay::update`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickOutcome {
    /// New ball glow when the ball turned around
    pub ball_color: Option<Vec3>,
    /// The player returned the ball
    pub scored: bool,
    /// The player missed and the round ended
    pub missed: bool,
}

/// Positions, score and flight state of one session
#[derive(Debug, Clone)]
pub struct Gameplay {
    rng: StdRng,
    t: f32,
    camera: Vec3,
    player: Vec3,
    enemy: Vec3,
    ball_begin: Vec3,
    ball_end: Vec3,
    ball: Vec3,
    score: u32,
    high_score: u32,
    playing: bool,
}

impl Gameplay {
    /// Fresh session seeded from the OS
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Fresh session with a fixed seed
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    /// Fresh session drawing from `rng`
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            t: 0.0,
            camera: Vec3::new(0.0, 2.85, 15.63),
            player: Vec3::new(-MAX_X, 0.0, 2.4),
            enemy: Vec3::zeros(),
            ball_begin: Vec3::new(-BALL_MAX_X + BALL_OFFSET, GROUND_HEIGHT, 0.0),
            ball_end: Vec3::new(-BALL_MAX_X, GROUND_HEIGHT, PLAYER_DEST_Z),
            ball: Vec3::new(0.0, -5.0, 0.0),
            score: 0,
            high_score: 0,
            playing: false,
        }
    }

    /// Advance by `dt` seconds.
    ///
    /// `confirm` starts a round when idle. `control` in `[0, 1]` places
    /// the player across the court; values outside are clamped.
    pub fn update(&mut self, dt: f32, confirm: bool, control: f32) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        if !self.playing && confirm {
            self.score = 0;
            self.playing = true;
            log::info!("Round started");
        }
        if !self.playing {
            return outcome;
        }

        let control = control.clamp(0.0, 1.0);
        self.t += T_RATE * dt;

        self.player.x = control * MAX_X * 2.0 - MAX_X;
        self.camera.x = self.player.x / MAX_X * CAM_MAX_X;

        let paddle = Vec3::new(self.player.x / MAX_X * BALL_MAX_X, 0.0, PLAYER_DEST_Z);
        if self.ball_end.z == PLAYER_DEST_Z {
            if (self.ball - paddle).norm() < HIT_DISTANCE {
                self.score += 1;
                self.t = FLIGHT_OVER;
                self.high_score = self.high_score.max(self.score);
                outcome.scored = true;
            } else if PLAYER_DEST_Z - self.ball.z < MISS_MARGIN {
                self.t = FLIGHT_OVER;
                self.playing = false;
                outcome.missed = true;
                log::info!("Round over: score {}, high score {}", self.score, self.high_score);
            }
        }

        self.ball = lerp_vec3(&self.ball_begin, &self.ball_end, self.t);
        self.ball.y = MAX_BALL_HEIGHT * 4.0 * self.t * (1.0 - self.t) + GROUND_HEIGHT;

        if self.t >= 1.0 {
            self.t = FLIGHT_START;
            self.ball_begin = self.ball;
            self.ball_end.z = if self.ball_end.z >= PLAYER_DEST_Z {
                0.0
            } else {
                PLAYER_DEST_Z
            };
            outcome.ball_color = Some(Vec3::new(
                self.random_channel(),
                self.random_channel(),
                self.random_channel(),
            ));
            self.ball_end.x = self.rng.gen_range(0..BALL_MAX_X as i32) as f32 * 2.0 - BALL_MAX_X;
        }

        self.enemy.x = lerp(self.enemy.x, self.ball_end.x / BALL_MAX_X * MAX_X, self.t);
        outcome
    }

    fn random_channel(&mut self) -> f32 {
        self.rng.gen_range(0..100) as f32 / 100.0
    }

    /// A round is in progress
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Returns this round
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Best score this session
    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    /// Camera eye; it always looks at the origin
    pub fn camera(&self) -> Vec3 {
        self.camera
    }

    /// Player paddle position
    pub fn player(&self) -> Vec3 {
        self.player
    }

    /// Enemy paddle position
    pub fn enemy(&self) -> Vec3 {
        self.enemy
    }

    /// Ball position
    pub fn ball(&self) -> Vec3 {
        self.ball
    }

    /// Flight progress
    pub fn t(&self) -> f32 {
        self.t
    }
}

impl Default for Gameplay {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn playing() -> Gameplay {
        let mut game = Gameplay::with_seed(7);
        game.update(0.0, true, 0.0);
        game
    }

    #[test]
    fn test_initial_state() {
        let game = Gameplay::with_seed(1);
        assert!(!game.is_playing());
        assert_eq!(game.camera(), Vec3::new(0.0, 2.85, 15.63));
        assert_eq!(game.player(), Vec3::new(-1.8, 0.0, 2.4));
        assert_eq!(game.ball(), Vec3::new(0.0, -5.0, 0.0));
        assert_eq!(game.ball_begin, Vec3::new(-6.0, 0.1, 0.0));
        assert_eq!(game.ball_end, Vec3::new(-9.0, 0.1, 12.0));
    }

    #[test]
    fn test_idle_ignores_time() {
        let mut game = Gameplay::with_seed(1);
        let outcome = game.update(1.0, false, 1.0);
        assert_eq!(outcome, TickOutcome::default());
        assert_eq!(game.t(), 0.0);
        assert_eq!(game.player().x, -MAX_X);
    }

    #[test]
    fn test_confirm_starts_round_and_resets_score() {
        let mut game = Gameplay::with_seed(1);
        game.score = 4;
        game.high_score = 4;
        game.update(0.0, true, 0.5);
        assert!(game.is_playing());
        assert_eq!(game.score(), 0);
        assert_eq!(game.high_score(), 4);
    }

    #[test]
    fn test_control_moves_player_and_camera() {
        let mut game = playing();
        game.update(0.0, false, 1.0);
        assert_relative_eq!(game.player().x, MAX_X);
        assert_relative_eq!(game.camera().x, CAM_MAX_X);

        game.update(0.0, false, 0.5);
        assert_relative_eq!(game.player().x, 0.0);
        assert_relative_eq!(game.camera().x, 0.0);

        game.update(0.0, false, 3.0);
        assert_relative_eq!(game.player().x, MAX_X);
    }

    #[test]
    fn test_time_advances_t() {
        let mut game = playing();
        game.update(0.5, false, 0.0);
        assert_relative_eq!(game.t(), 0.2);
    }

    #[test]
    fn test_ball_arc() {
        let mut game = playing();
        game.t = 0.5;
        game.update(0.0, false, 0.0);
        assert_relative_eq!(game.ball(), Vec3::new(-7.5, 4.1, 6.0), epsilon = 1e-5);
        // enemy moves half way to the landing column
        assert_relative_eq!(game.enemy().x, -0.9, epsilon = 1e-5);

        game.t = 0.0;
        game.update(0.0, false, 0.0);
        assert_relative_eq!(game.ball().y, 0.1);
    }

    #[test]
    fn test_return_scores_and_turns_ball() {
        let mut game = playing();
        game.t = 0.9;
        game.ball = Vec3::new(-9.0, 0.5, 11.5);

        let outcome = game.update(0.0, false, 0.0);

        assert!(outcome.scored);
        assert!(!outcome.missed);
        assert_eq!(game.score(), 1);
        assert_eq!(game.high_score(), 1);
        assert_relative_eq!(game.t(), FLIGHT_START);
        assert_eq!(game.ball_end.z, 0.0);
        assert_eq!(game.ball_begin, game.ball());

        let color = outcome.ball_color.unwrap();
        for channel in color.iter() {
            assert!((0.0..1.0).contains(channel));
        }
        let x = game.ball_end.x;
        assert!((-9.0..=7.0).contains(&x));
        assert_eq!((x + 9.0) % 2.0, 0.0);
    }

    #[test]
    fn test_ball_reaching_line_ends_round() {
        let mut game = playing();
        game.score = 3;
        game.high_score = 3;
        game.t = 0.99;
        game.ball = Vec3::new(5.0, 0.1, 11.95);

        let outcome = game.update(0.0, false, 0.0);

        assert!(outcome.missed);
        assert!(!game.is_playing());
        assert_eq!(game.score(), 3);
        assert_eq!(game.high_score(), 3);

        game.update(0.0, true, 0.0);
        assert_eq!(game.score(), 0);
        assert_eq!(game.high_score(), 3);
    }

    #[test]
    fn test_far_end_bounce_does_not_score() {
        let mut game = playing();
        game.ball_end.z = 0.0;
        game.ball = Vec3::new(-9.0, 0.1, 12.0);
        game.t = 1.0;
        let end = game.ball_end;

        let outcome = game.update(0.0, false, 0.0);

        // a completed flight lands exactly on its end point
        assert_relative_eq!(game.ball(), Vec3::new(end.x, 0.1, end.z), epsilon = 1e-5);
        assert!(!outcome.scored);
        assert!(outcome.ball_color.is_some());
        assert_eq!(game.ball_end.z, PLAYER_DEST_Z);
        assert!(game.is_playing());
    }

    #[test]
    fn test_same_seed_same_rally() {
        let mut a = Gameplay::with_seed(42);
        let mut b = Gameplay::with_seed(42);
        a.update(0.0, true, 0.0);
        b.update(0.0, true, 0.0);
        a.t = 1.0;
        b.t = 1.0;
        assert_eq!(a.update(0.0, false, 0.0), b.update(0.0, false, 0.0));
        assert_eq!(a.ball_end, b.ball_end);
    }
}
