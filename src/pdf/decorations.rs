//! Decorative vector motifs for the certificate page. Pure geometry: every
//! function only appends operations for the caller's current graphics state.

use lopdf::content::Operation;
use lopdf::Object;
use std::f32::consts::PI;

// Kappa for approximating a quarter arc with one cubic Bezier.
const K: f32 = 0.5523;

pub const HELIX_STEPS: usize = 8;

fn op(name: &str, operands: Vec<f32>) -> Operation {
    Operation::new(name, operands.into_iter().map(Object::Real).collect())
}

fn ellipse_path(ops: &mut Vec<Operation>, rx: f32, ry: f32) {
    ops.push(op("m", vec![rx, 0.0]));
    ops.push(op("c", vec![rx, ry * K, rx * K, ry, 0.0, ry]));
    ops.push(op("c", vec![-rx * K, ry, -rx, ry * K, -rx, 0.0]));
    ops.push(op("c", vec![-rx, -ry * K, -rx * K, -ry, 0.0, -ry]));
    ops.push(op("c", vec![rx * K, -ry, rx, -ry * K, rx, 0.0]));
}

fn filled_dot(ops: &mut Vec<Operation>, cx: f32, cy: f32, r: f32) {
    ops.push(op("m", vec![cx + r, cy]));
    ops.push(op("c", vec![cx + r, cy + r * K, cx + r * K, cy + r, cx, cy + r]));
    ops.push(op("c", vec![cx - r * K, cy + r, cx - r, cy + r * K, cx - r, cy]));
    ops.push(op("c", vec![cx - r, cy - r * K, cx - r * K, cy - r, cx, cy - r]));
    ops.push(op("c", vec![cx + r * K, cy - r, cx + r, cy - r * K, cx + r, cy]));
    ops.push(Operation::new("f", vec![]));
}

/// Circle outline, used for the top-center emblem roundel.
pub fn circle_stroke(ops: &mut Vec<Operation>, cx: f32, cy: f32, r: f32) {
    ops.push(op("m", vec![cx + r, cy]));
    ops.push(op("c", vec![cx + r, cy + r * K, cx + r * K, cy + r, cx, cy + r]));
    ops.push(op("c", vec![cx - r * K, cy + r, cx - r, cy + r * K, cx - r, cy]));
    ops.push(op("c", vec![cx - r, cy - r * K, cx - r * K, cy - r, cx, cy - r]));
    ops.push(op("c", vec![cx + r * K, cy - r, cx + r, cy - r * K, cx + r, cy]));
    ops.push(Operation::new("S", vec![]));
}

fn rotated_ellipse(ops: &mut Vec<Operation>, x: f32, y: f32, rx: f32, ry: f32, angle: f32) {
    let (s, c) = angle.sin_cos();
    ops.push(Operation::new("q", vec![]));
    ops.push(op("cm", vec![c, s, -s, c, x, y]));
    ellipse_path(ops, rx, ry);
    ops.push(Operation::new("S", vec![]));
    ops.push(Operation::new("Q", vec![]));
}

/// Nucleus-and-orbits glyph: two crossed orbit ellipses, a nucleus dot and
/// three satellites. Placed at the four page corners.
pub fn atom(ops: &mut Vec<Operation>, x: f32, y: f32, scale: f32) {
    let rx = 11.0 * scale;
    let ry = 4.5 * scale;
    rotated_ellipse(ops, x, y, rx, ry, PI / 3.0);
    rotated_ellipse(ops, x, y, rx, ry, -PI / 3.0);
    filled_dot(ops, x, y, 2.2 * scale);
    for angle in [0.3f32, 2.4, 4.4] {
        let (s, c) = (PI / 3.0).sin_cos();
        let (ox, oy) = (rx * angle.cos(), ry * angle.sin());
        ops.push(Operation::new("q", vec![]));
        ops.push(op("cm", vec![c, s, -s, c, x, y]));
        filled_dot(ops, ox, oy, 1.4 * scale);
        ops.push(Operation::new("Q", vec![]));
    }
}

/// Double-helix border motif down a vertical span: a fixed number of steps,
/// each with two phase-offset rail dots joined by a rung.
pub fn helix(ops: &mut Vec<Operation>, x: f32, y_top: f32, y_bottom: f32, scale: f32) {
    let amp = 7.0 * scale;
    let span = y_top - y_bottom;
    for i in 0..=HELIX_STEPS {
        let t = i as f32 / HELIX_STEPS as f32;
        let y = y_top - span * t;
        let phase = t * 2.0 * PI;
        let xa = x + amp * phase.cos();
        let xb = x - amp * phase.cos();
        ops.push(op("m", vec![xa, y]));
        ops.push(op("l", vec![xb, y]));
        ops.push(Operation::new("S", vec![]));
        filled_dot(ops, xa, y, 1.5 * scale);
        filled_dot(ops, xb, y, 1.5 * scale);
    }
}

/// Instrument silhouette: stacked rectangles for base, arm and tube plus
/// eyepiece and stage segments. Drawn inside the emblem roundel.
pub fn microscope(ops: &mut Vec<Operation>, x: f32, y: f32, scale: f32) {
    // base
    ops.push(op("re", vec![x - 9.0 * scale, y, 18.0 * scale, 2.5 * scale]));
    ops.push(Operation::new("f", vec![]));
    // arm
    ops.push(op(
        "re",
        vec![x - 2.0 * scale, y + 2.5 * scale, 3.5 * scale, 10.0 * scale],
    ));
    ops.push(Operation::new("f", vec![]));
    // tube, tilted toward the stage
    ops.push(op(
        "re",
        vec![x + 1.5 * scale, y + 7.0 * scale, 3.0 * scale, 9.0 * scale],
    ));
    ops.push(Operation::new("f", vec![]));
    // eyepiece
    ops.push(op("m", vec![x + 1.0 * scale, y + 16.5 * scale]));
    ops.push(op("l", vec![x + 6.0 * scale, y + 16.5 * scale]));
    ops.push(Operation::new("S", vec![]));
    // stage
    ops.push(op("m", vec![x - 6.0 * scale, y + 5.0 * scale]));
    ops.push(op("l", vec![x + 6.0 * scale, y + 5.0 * scale]));
    ops.push(Operation::new("S", vec![]));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(ops: &[Operation], name: &str) -> usize {
        ops.iter().filter(|o| o.operator == name).count()
    }

    #[test]
    fn atom_balances_graphics_state() {
        let mut ops = Vec::new();
        atom(&mut ops, 100.0, 100.0, 1.0);
        assert!(!ops.is_empty());
        assert_eq!(count(&ops, "q"), count(&ops, "Q"));
    }

    #[test]
    fn helix_emits_fixed_step_count() {
        let mut ops = Vec::new();
        helix(&mut ops, 40.0, 500.0, 100.0, 1.0);
        // one rung stroke per step plus the strokes inside no other helper
        assert_eq!(count(&ops, "S"), HELIX_STEPS + 1);
        // two filled rail dots per step
        assert_eq!(count(&ops, "f"), 2 * (HELIX_STEPS + 1));
    }

    #[test]
    fn microscope_is_three_rectangles_and_two_segments() {
        let mut ops = Vec::new();
        microscope(&mut ops, 0.0, 0.0, 1.0);
        assert_eq!(count(&ops, "re"), 3);
        assert_eq!(count(&ops, "S"), 2);
    }
}
