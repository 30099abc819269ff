//! Relocation of the decline control so it can never be pressed.
//!
//! Every policy shares one contract: the rectangle it returns never overlaps
//! the accept control grown by the policy's margin. Two bounded relaxations
//! exist. The fixed-slot policy reuses its unfiltered slots when every slot is
//! blocked, and the pointer-avoiding policy has a last tier that may land near
//! the pointer while still keeping clear of the accept control. When nothing
//! qualifies the control stays where it is. Exhaustion never fails an
//! interaction.

use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;

use rand::Rng;
use tracing::{debug, trace};

use crate::geom::{Point, Rect, Size, clamp_into};

/// Default decline/accept control size in CSS pixels.
pub const CONTROL_SIZE: Size = Size::new(100.0, 44.0);
/// Inset of the fixed slots from the container edges.
pub const SLOT_PADDING: f64 = 4.0;
/// Clearance kept around the accept control by the slot-based policies.
pub const OVERLAP_MARGIN: f64 = 16.0;
/// Horizontal gap between the two controls in the initial arrangement.
pub const INITIAL_GAP: f64 = 16.0;

/// Candidate slots as fractions of the safe zone, scanned in order.
pub const FRACTIONAL_SLOTS: [(f64, f64); 9] = [
    (0.0, 1.0),
    (1.0, 1.0),
    (0.5, 1.0),
    (0.0, 0.0),
    (1.0, 0.0),
    (0.0, 0.5),
    (1.0, 0.5),
    (0.25, 0.75),
    (0.75, 0.75),
];

pub const RADIAL_SAMPLES: usize = 60;
/// Minimum sampled radius, as a multiple of the control's diagonal.
pub const RADIAL_MIN_RADIUS_FACTOR: f64 = 1.0;
/// Maximum sampled radius, as a multiple of the control's diagonal.
pub const RADIAL_MAX_RADIUS_FACTOR: f64 = 2.5;
/// Candidates that end up closer than this share of the minimum radius are dropped.
pub const RADIAL_MIN_DISPLACEMENT: f64 = 0.8;

pub const POINTER_RADIAL_ATTEMPTS: usize = 80;
pub const POINTER_UNIFORM_ATTEMPTS: usize = 200;
pub const POINTER_RELAXED_ATTEMPTS: usize = 100;
/// Minimum distance between the pointer and the relocated control.
pub const POINTER_CLEARANCE: f64 = 48.0;
/// Gap kept around the accept control by the pointer-avoiding policy.
pub const ACCEPT_GAP: f64 = 12.0;

/// How the decline control picks its next spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum EvasionPolicy {
    /// Round-robin over fixed pixel slots around the container edges.
    FixedSlots,
    /// First free fractional slot of the safe zone below the heading.
    Fractional,
    /// Farthest of a batch of random polar jumps, applied as an offset.
    Radial,
    /// Jump away from the pointer, with relaxed random fallbacks.
    #[default]
    PointerAvoiding,
}

impl fmt::Display for EvasionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EvasionPolicy::FixedSlots => "slots",
            EvasionPolicy::Fractional => "fractional",
            EvasionPolicy::Radial => "radial",
            EvasionPolicy::PointerAvoiding => "pointer",
        };
        f.write_str(name)
    }
}

impl FromStr for EvasionPolicy {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "slots" => Ok(EvasionPolicy::FixedSlots),
            "fractional" => Ok(EvasionPolicy::Fractional),
            "radial" => Ok(EvasionPolicy::Radial),
            "pointer" => Ok(EvasionPolicy::PointerAvoiding),
            other => anyhow::bail!("unknown evasion policy: {other}"),
        }
    }
}

/// Geometry of the response card, measured by the screen controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub container: Size,
    pub control: Size,
    /// The accept control. Placed once and never moved.
    pub accept: Rect,
    /// Bottom edge of the heading; the safe zone starts here.
    pub heading_bottom: f64,
    /// Padding reserved at the bottom of the container.
    pub bottom_padding: f64,
}

impl Layout {
    pub fn new(container: Size, accept: Rect) -> Self {
        Layout {
            container,
            control: CONTROL_SIZE,
            accept,
            heading_bottom: 0.0,
            bottom_padding: 0.0,
        }
    }

    pub fn with_heading(mut self, heading_bottom: f64, bottom_padding: f64) -> Self {
        self.heading_bottom = heading_bottom;
        self.bottom_padding = bottom_padding;
        self
    }

    /// Area below the heading and above the bottom padding.
    pub fn safe_zone(&self) -> Rect {
        let top = self.heading_bottom.clamp(0.0, self.container.h);
        let h = (self.container.h - top - self.bottom_padding).max(0.0);
        Rect::new(0.0, top, self.container.w, h)
    }

    fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.container.w, self.container.h)
    }

    fn max_origin(&self) -> Point {
        Point::new(
            (self.container.w - self.control.w).max(0.0),
            (self.container.h - self.control.h).max(0.0),
        )
    }
}

/// Initial arrangement: accept centered at the top, decline just to its right.
pub fn initial_positions(container: Size, control: Size) -> (Rect, Point) {
    let accept_left = container.w / 2.0 - control.w / 2.0;
    let accept = Rect::new(accept_left, 0.0, control.w, control.h);
    let decline = clamp_into(
        container,
        control,
        Point::new(accept_left + control.w + INITIAL_GAP, 0.0),
    );
    (accept, decline)
}

/// The interaction that made the decline control move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trigger {
    PointerEnter(Option<Point>),
    Click(Option<Point>),
    TouchStart(Option<Point>),
    Focus,
}

impl Trigger {
    pub fn pointer(&self) -> Option<Point> {
        match *self {
            Trigger::PointerEnter(p) | Trigger::Click(p) | Trigger::TouchStart(p) => p,
            Trigger::Focus => None,
        }
    }
}

/// Where the screen controller should put the decline control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Top-left corner in container coordinates.
    Absolute(Point),
    /// Translation relative to the control's home position.
    Offset(Point),
}

/// Which pointer-avoiding tier produced a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTier {
    Radial,
    Uniform,
    Relaxed,
}

/// Per-session state of the decline control.
#[derive(Debug, Clone, PartialEq)]
pub struct Placer {
    policy: EvasionPolicy,
    home: Point,
    current: Point,
    slot_index: Option<usize>,
    clearance: f64,
}

impl Placer {
    pub fn new(policy: EvasionPolicy, home: Point) -> Self {
        Placer {
            policy,
            home,
            current: home,
            slot_index: None,
            clearance: POINTER_CLEARANCE,
        }
    }

    /// Rebuilds a placer from state kept by a stateless caller.
    pub fn from_parts(
        policy: EvasionPolicy,
        home: Point,
        current: Point,
        slot_index: Option<usize>,
    ) -> Self {
        Placer {
            policy,
            home,
            current,
            slot_index,
            clearance: POINTER_CLEARANCE,
        }
    }

    pub fn with_clearance(mut self, clearance: f64) -> Self {
        self.clearance = clearance;
        self
    }

    pub fn policy(&self) -> EvasionPolicy {
        self.policy
    }

    /// Current top-left corner in container coordinates.
    pub fn position(&self) -> Point {
        self.current
    }

    pub fn home(&self) -> Point {
        self.home
    }

    pub fn slot_index(&self) -> Option<usize> {
        self.slot_index
    }

    /// Moves the decline control in response to `trigger`.
    pub fn place<R: Rng + ?Sized>(
        &mut self,
        layout: &Layout,
        trigger: Trigger,
        rng: &mut R,
    ) -> Placement {
        let next = match self.policy {
            EvasionPolicy::FixedSlots => Some(self.next_fixed_slot(layout)),
            EvasionPolicy::Fractional => self.next_fractional_slot(layout),
            EvasionPolicy::Radial => self.radial_candidate(layout, rng),
            EvasionPolicy::PointerAvoiding => {
                let pointer = trigger
                    .pointer()
                    .unwrap_or_else(|| Rect::at(self.current, layout.control).center());
                self.pointer_candidate(layout, pointer, rng)
                    .map(|(pos, _)| pos)
            }
        };
        if let Some(pos) = next {
            self.current = pos;
        } else {
            debug!(policy = %self.policy, "no candidate found, decline control stays put");
        }
        debug!(
            policy = %self.policy,
            ?trigger,
            x = self.current.x,
            y = self.current.y,
            "placed decline control"
        );
        match self.policy {
            EvasionPolicy::Radial => Placement::Offset(Point::new(
                self.current.x - self.home.x,
                self.current.y - self.home.y,
            )),
            _ => Placement::Absolute(self.current),
        }
    }

    fn next_fixed_slot(&mut self, layout: &Layout) -> Point {
        let spots = fixed_slots(layout);
        let forbidden = layout.accept.expand(OVERLAP_MARGIN);
        let valid: Vec<Point> = spots
            .iter()
            .copied()
            .filter(|&spot| !Rect::at(spot, layout.control).intersects(&forbidden))
            .collect();
        let valid = if valid.is_empty() { spots } else { valid };
        let index = self.slot_index.map_or(0, |i| i + 1) % valid.len();
        self.slot_index = Some(index);
        trace!(index, candidates = valid.len(), "cycled fixed slot");
        valid[index]
    }

    fn next_fractional_slot(&mut self, layout: &Layout) -> Option<Point> {
        let zone = layout.safe_zone();
        let forbidden = layout.accept.expand(OVERLAP_MARGIN);
        let span_x = (zone.w - layout.control.w).max(0.0);
        let span_y = (zone.h - layout.control.h).max(0.0);
        let to_point = |(fx, fy): (f64, f64)| {
            clamp_into(
                layout.container,
                layout.control,
                Point::new(zone.x + fx * span_x, zone.y + fy * span_y),
            )
        };

        let len = FRACTIONAL_SLOTS.len();
        let start = self.slot_index.map_or(0, |i| i + 1) % len;
        let found = (0..len).map(|k| (start + k) % len).find(|&idx| {
            let rect = Rect::at(to_point(FRACTIONAL_SLOTS[idx]), layout.control);
            !rect.intersects(&forbidden)
        });
        let Some(index) = found else {
            trace!(start, "every fractional slot is blocked");
            return None;
        };
        self.slot_index = Some(index);
        trace!(index, "picked fractional slot");
        Some(to_point(FRACTIONAL_SLOTS[index]))
    }

    fn radial_candidate<R: Rng + ?Sized>(&self, layout: &Layout, rng: &mut R) -> Option<Point> {
        let diagonal = layout.control.diagonal();
        let min_radius = diagonal * RADIAL_MIN_RADIUS_FACTOR;
        let max_radius = diagonal * RADIAL_MAX_RADIUS_FACTOR;
        let min_displacement = min_radius * RADIAL_MIN_DISPLACEMENT;
        let forbidden = layout.accept.expand(OVERLAP_MARGIN);
        let accept_center = layout.accept.center();

        let mut best: Option<(Point, f64)> = None;
        for _ in 0..RADIAL_SAMPLES {
            let angle = rng.random_range(0.0..TAU);
            let radius = rng.random_range(min_radius..=max_radius);
            let candidate = clamp_into(
                layout.container,
                layout.control,
                self.current.polar_offset(angle, radius),
            );
            let displacement = candidate.distance(&self.current);
            if displacement < min_displacement {
                continue;
            }
            let rect = Rect::at(candidate, layout.control);
            if rect.center().distance(&accept_center) < layout.control.w
                || rect.intersects(&forbidden)
            {
                continue;
            }
            match best {
                Some((_, best_displacement)) if displacement <= best_displacement => {}
                _ => best = Some((candidate, displacement)),
            }
        }
        best.map(|(pos, _)| pos)
    }

    /// Searches the three pointer-avoiding tiers in order.
    pub fn pointer_candidate<R: Rng + ?Sized>(
        &self,
        layout: &Layout,
        pointer: Point,
        rng: &mut R,
    ) -> Option<(Point, PointerTier)> {
        let bounds = layout.bounds();
        let forbidden = layout.accept.expand(ACCEPT_GAP);
        let clearance = self.clearance;
        let half = Point::new(layout.control.w / 2.0, layout.control.h / 2.0);
        let min_radius = layout.control.diagonal() / 2.0 + clearance;
        let max_radius = min_radius + clearance.max(layout.control.w);

        let clear_of_accept = |pos: Point| !Rect::at(pos, layout.control).intersects(&forbidden);
        let clear_of_pointer =
            |pos: Point| Rect::at(pos, layout.control).distance_to_point(&pointer) >= clearance;

        for _ in 0..POINTER_RADIAL_ATTEMPTS {
            let angle = rng.random_range(0.0..TAU);
            let radius = rng.random_range(min_radius..=max_radius);
            let center = pointer.polar_offset(angle, radius);
            let pos = Point::new(center.x - half.x, center.y - half.y);
            if bounds.contains_rect(&Rect::at(pos, layout.control))
                && clear_of_accept(pos)
                && clear_of_pointer(pos)
            {
                trace!(x = pos.x, y = pos.y, "radial tier hit");
                return Some((pos, PointerTier::Radial));
            }
        }

        let max = layout.max_origin();
        let uniform = |rng: &mut R| {
            Point::new(
                rng.random_range(0.0..=max.x),
                rng.random_range(0.0..=max.y),
            )
        };

        for _ in 0..POINTER_UNIFORM_ATTEMPTS {
            let pos = uniform(&mut *rng);
            if clear_of_accept(pos) && clear_of_pointer(pos) {
                trace!(x = pos.x, y = pos.y, "uniform tier hit");
                return Some((pos, PointerTier::Uniform));
            }
        }

        for _ in 0..POINTER_RELAXED_ATTEMPTS {
            let pos = uniform(&mut *rng);
            if clear_of_accept(pos) {
                debug!(x = pos.x, y = pos.y, "relaxed tier ignored pointer clearance");
                return Some((pos, PointerTier::Relaxed));
            }
        }
        None
    }
}

/// The seven pixel slots used by [`EvasionPolicy::FixedSlots`].
fn fixed_slots(layout: &Layout) -> Vec<Point> {
    let Size { w, h } = layout.container;
    let Size { w: bw, h: bh } = layout.control;
    let pad = SLOT_PADDING;
    vec![
        Point::new(pad, pad),
        Point::new(w - bw - pad, pad),
        Point::new(pad, h - bh - pad),
        Point::new(w - bw - pad, h - bh - pad),
        Point::new((w - bw) / 2.0, h - bh - pad),
        Point::new(pad, (h - bh) / 2.0),
        Point::new(w - bw - pad, (h - bh) / 2.0),
    ]
}
