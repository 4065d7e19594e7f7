//! Pointer arithmetic: remote-to-local coordinate scaling and scroll ticks.

/// Size of a screen in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

impl ScreenSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Scales a point from the controller's view onto the local screen.
///
/// Returns `None` when either remote dimension is missing, zero, negative, or
/// not finite.  The result is `round(x / remote_w * local_w)` (same for y); a
/// point inside the remote rectangle always lands inside
/// `[0, local_w] × [0, local_h]`.
pub fn scale_to_local(
    x: f64,
    y: f64,
    remote_width: Option<f64>,
    remote_height: Option<f64>,
    local: ScreenSize,
) -> Option<(i32, i32)> {
    let rw = remote_width.filter(|w| w.is_finite() && *w > 0.0)?;
    let rh = remote_height.filter(|h| h.is_finite() && *h > 0.0)?;
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    let lx = (x / rw * f64::from(local.width)).round();
    let ly = (y / rh * f64::from(local.height)).round();
    // `as` saturates on overflow, which is what we want for absurd inputs.
    Some((lx as i32, ly as i32))
}

/// Scroll direction for one discrete wheel tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

impl ScrollDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            ScrollDirection::Up => "up",
            ScrollDirection::Down => "down",
        }
    }
}

/// Approximate wheel delta of one physical notch.
pub const SCROLL_UNITS_PER_TICK: f64 = 100.0;

/// Upper bound on ticks issued for one scroll message.
pub const MAX_SCROLL_TICKS: u32 = 100;

/// Converts a wheel `deltaY` into a direction and a tick count.
///
/// Negative deltas scroll up.  The count is `ceil(|deltaY| / 100)`, at least
/// one, and at most [`MAX_SCROLL_TICKS`].
pub fn scroll_ticks(delta_y: f64) -> (ScrollDirection, u32) {
    let direction = if delta_y < 0.0 {
        ScrollDirection::Up
    } else {
        ScrollDirection::Down
    };
    let magnitude = if delta_y.is_finite() {
        (delta_y.abs() / SCROLL_UNITS_PER_TICK).ceil()
    } else {
        f64::from(MAX_SCROLL_TICKS)
    };
    let ticks = (magnitude as u32).clamp(1, MAX_SCROLL_TICKS);
    (direction, ticks)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
