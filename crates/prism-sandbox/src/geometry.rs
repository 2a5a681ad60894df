use prism_engine::gfx::ColorVertex;

const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
const MAGENTA: [f32; 4] = [1.0, 0.0, 1.0, 1.0];
const YELLOW: [f32; 4] = [1.0, 1.0, 0.0, 1.0];
const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Full-screen quad in strip order: top-left, bottom-left, top-right, bottom-right.
pub const FULLSCREEN_QUAD: [ColorVertex; 4] = [
    ColorVertex::new([-1.0, 1.0, 0.5], RED),
    ColorVertex::new([-1.0, -1.0, 0.5], MAGENTA),
    ColorVertex::new([1.0, 1.0, 0.5], YELLOW),
    ColorVertex::new([1.0, -1.0, 0.5], WHITE),
];
