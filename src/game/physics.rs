//! Platformer physics: walking, jumping, gravity, platform landing and arena bounds
//!
//! All quantities are per tick. There is no delta time: both peers step the
//! same fixed sequence, so results only depend on the inputs.

use serde::{Deserialize, Serialize};

use crate::catalog::Platform;

/// Arena width in pixels
pub const ARENA_WIDTH: f32 = 1200.0;
/// Arena height in pixels
pub const ARENA_HEIGHT: f32 = 700.0;
/// Downward acceleration per tick while airborne
pub const GRAVITY: f32 = 0.8;
/// Vertical velocity set by a jump (negative is up)
pub const JUMP_STRENGTH: f32 = -15.0;
/// Walking speed in pixels per tick
pub const WALK_SPEED: f32 = 5.0;
/// Walking speed while the Speed ability is active
pub const BOOSTED_WALK_SPEED: f32 = 10.0;
/// Fighter hitbox width
pub const ACTOR_WIDTH: f32 = 40.0;
/// Fighter hitbox height
pub const ACTOR_HEIGHT: f32 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    /// -1.0 for left, 1.0 for right
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

/// Movement keys held during one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveInput {
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub right: bool,
    #[serde(default)]
    pub jump: bool,
}

/// Axis-aligned moving box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub x: f32,
    pub y: f32,
    pub vel_x: f32,
    pub vel_y: f32,
    pub width: f32,
    pub height: f32,
    pub on_ground: bool,
    pub facing: Facing,
}

impl Body {
    /// Fighter-sized body at rest
    pub fn fighter(x: f32, y: f32, facing: Facing) -> Self {
        Self {
            x,
            y,
            vel_x: 0.0,
            vel_y: 0.0,
            width: ACTOR_WIDTH,
            height: ACTOR_HEIGHT,
            on_ground: false,
            facing,
        }
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// Strict rectangle overlap with another box
    pub fn overlaps(&self, x: f32, y: f32, width: f32, height: f32) -> bool {
        x < self.x + self.width && x + width > self.x && y < self.y + self.height && y + height > self.y
    }
}

/// Physics system for stepping fighter bodies
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Advance one body by one tick.
    ///
    /// Input and gravity are applied before collision. Any platform that
    /// reports a landing grounds the body; later platforms overwrite earlier
    /// snaps.
    pub fn step(body: &mut Body, input: MoveInput, walk_speed: f32, platforms: &[Platform]) {
        // Horizontal velocity is set, not accelerated. Right wins if both held.
        body.vel_x = 0.0;
        if input.left {
            body.vel_x = -walk_speed;
            body.facing = Facing::Left;
        }
        if input.right {
            body.vel_x = walk_speed;
            body.facing = Facing::Right;
        }

        if input.jump && body.on_ground {
            body.vel_y = JUMP_STRENGTH;
            body.on_ground = false;
        }

        if !body.on_ground {
            body.vel_y += GRAVITY;
        }

        let previous_bottom = body.bottom();
        body.x += body.vel_x;
        body.y += body.vel_y;

        body.on_ground = false;
        for platform in platforms {
            if Self::lands_on(body, previous_bottom, platform) {
                body.y = platform.y - body.height;
                body.vel_y = 0.0;
                body.on_ground = true;
            }
        }

        Self::clamp_to_arena(body);
    }

    /// Landing test: moving down, horizontally over the platform, and the
    /// bottom edge crossed the platform top during this tick's displacement.
    pub fn lands_on(body: &Body, previous_bottom: f32, platform: &Platform) -> bool {
        body.vel_y >= 0.0
            && body.x + body.width > platform.x
            && body.x < platform.x + platform.width
            && previous_bottom <= platform.y
            && body.bottom() >= platform.y
    }

    /// Keep the body inside the arena horizontally and catch it on the bottom
    /// edge so nothing falls out of the world.
    pub fn clamp_to_arena(body: &mut Body) {
        body.x = body.x.clamp(0.0, ARENA_WIDTH - body.width);

        if body.bottom() >= ARENA_HEIGHT {
            body.y = ARENA_HEIGHT - body.height;
            body.vel_y = 0.0;
            body.on_ground = true;
        }
    }
}
