//! 2D points with stable identity.
//!
//! Every [`Point`] carries a UUID assigned at creation. The id is what the
//! draggable-point manager keys its maps on, so it survives arbitrary
//! coordinate mutation and is only ever reassigned through [`Point::duplicate`].
//!
//! Arithmetic mutates in place and returns `&mut Self`, which keeps call
//! sites close to how coordinates are actually updated during a drag:
//!
//! ```ignore
//! point.subtract(&last, 1.0).plus(&current, 1.0);
//! ```
//!
//! Each point also has a single-slot position snapshot: `save` overwrites
//! the slot, `restore` copies it back without clearing it. It is a slot,
//! not a history stack.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a [`Point`].
///
/// Generated as a UUID v4. Serializes as a plain string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointId(Uuid);

impl PointId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PointId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A 2D coordinate with a stable identity and a one-deep position snapshot.
///
/// `Clone` is a faithful data copy (same id, same snapshot); use
/// [`Point::duplicate`] when a copy should be a new logical point.
///
/// Serializes as `{ "x": .., "y": .., "id": ".." }`; the snapshot slot is
/// never serialized, and a payload without an id deserializes with a fresh
/// one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(default = "PointId::new")]
    id: PointId,
    #[serde(skip)]
    saved: Option<(f64, f64)>,
}

impl Point {
    /// Create a point at `(x, y)` with a fresh id and an empty snapshot slot.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            id: PointId::new(),
            saved: None,
        }
    }

    /// The identity assigned at creation.
    pub fn id(&self) -> PointId {
        self.id
    }

    /// Set both coordinates, returning `self` for chaining.
    pub fn set(&mut self, x: f64, y: f64) -> &mut Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Reset to the origin.
    pub fn zero(&mut self) {
        self.x = 0.0;
        self.y = 0.0;
    }

    /// Copy coordinates from `other`. Identity and snapshot are untouched.
    pub fn copy(&mut self, other: &Point) {
        self.x = other.x;
        self.y = other.y;
    }

    /// A new point at the same coordinates with a fresh id and an empty
    /// snapshot slot.
    ///
    /// This is the "same place, different point" copy. For a copy that
    /// represents the same logical point, see [`Point::deep_clone`].
    pub fn duplicate(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// An identity-preserving copy of this point.
    ///
    /// The returned point has this point's coordinates and id, and an empty
    /// snapshot slot. As a side effect, when this point's slot is occupied
    /// its current position is committed into the slot first, so a later
    /// `restore` returns here rather than to the older snapshot.
    pub fn deep_clone(&mut self) -> Point {
        if self.saved.is_some() {
            self.save();
        }
        Point {
            x: self.x,
            y: self.y,
            id: self.id,
            saved: None,
        }
    }

    /// Exact coordinate equality, ignoring identity. No epsilon.
    pub fn is_equal(&self, other: &Point) -> bool {
        self.x == other.x && self.y == other.y
    }

    /// Add `other * scale` to this point.
    pub fn plus(&mut self, other: &Point, scale: f64) -> &mut Self {
        self.x += other.x * scale;
        self.y += other.y * scale;
        self
    }

    /// Subtract `other * scale` from this point.
    pub fn subtract(&mut self, other: &Point, scale: f64) -> &mut Self {
        self.x -= other.x * scale;
        self.y -= other.y * scale;
        self
    }

    /// Multiply both coordinates by `factor`.
    pub fn multiply(&mut self, factor: f64) -> &mut Self {
        self.x *= factor;
        self.y *= factor;
        self
    }

    /// Divide both coordinates by `divisor`.
    ///
    /// A zero divisor is not guarded: the coordinates become non-finite
    /// (infinity or NaN), exactly as IEEE division defines.
    pub fn divide(&mut self, divisor: f64) -> &mut Self {
        self.x /= divisor;
        self.y /= divisor;
        self
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Angle of this point as seen from `origin`, in radians.
    ///
    /// Computed as `atan2(dy, dx)`, so the result is in `[-pi, pi]`.
    pub fn angle_from(&self, origin: &Point) -> f64 {
        (self.y - origin.y).atan2(self.x - origin.x)
    }

    /// A new point `distance` away from this one along `angle` (radians).
    pub fn vector_to(&self, angle: f64, distance: f64) -> Point {
        Point::new(
            self.x + angle.cos() * distance,
            self.y + angle.sin() * distance,
        )
    }

    /// Move this point onto the unit circle around `origin`, keeping its
    /// current angle. Destructive: the original coordinates are lost.
    pub fn normalize(&mut self, origin: &Point) -> &mut Self {
        let angle = self.angle_from(origin);
        let unit = origin.vector_to(angle, 1.0);
        self.copy(&unit);
        self
    }

    /// Store the current position in the snapshot slot, overwriting any
    /// previous snapshot.
    pub fn save(&mut self) {
        self.saved = Some((self.x, self.y));
    }

    /// Copy the snapshot back into the coordinates, if one exists. The
    /// slot is kept, so repeated restores return to the same position.
    pub fn restore(&mut self) {
        if let Some((x, y)) = self.saved {
            self.x = x;
            self.y = y;
        }
    }

    /// The coordinates as `[x, y]`.
    pub fn array(&self) -> [f64; 2] {
        [self.x, self.y]
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
