//! Draggable-point management.
//!
//! [`MovablePoints`] owns a set of identified [`Point`]s, tracks which
//! subset is focused (eligible for dragging), and turns pointer events into
//! coordinate updates for that subset. It is a pure state machine: the host
//! feeds [`PointerEvent`]s in arrival order and acts on the returned
//! [`PointerResponse`] before feeding the next one. There are no callbacks
//! and no DOM types in here.
//!
//! # Selection policy
//!
//! [`Target::Single`] keeps at most one point focused and clears the focus
//! when a gesture ends. [`Target::Select`] accumulates focused points and
//! keeps them across gestures, which also enables the "drag everything"
//! behavior: with points already focused, pressing anywhere and moving
//! drags the whole focused set, hit or no hit.
//!
//! # Coordinates
//!
//! Events carry client (CSS pixel) coordinates. The manager converts them
//! to canvas-space through its viewport, which knows the canvas pixel size
//! and, optionally, the canvas element's display bounds.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::point::{Point, PointId};

/// Hit acceptance is the point radius with this much slack.
const HIT_SLACK: f64 = 1.05;

/// Selection policy for focus changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// At most one focused point; focus clears when the gesture ends.
    #[default]
    Single,
    /// Focused points accumulate and persist across gestures.
    Select,
}

/// Manager configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovableOptions {
    /// When false, every pointer event is ignored.
    pub allow_modify: bool,
    /// Hit-test radius around each point, in canvas pixels.
    pub point_radius: f64,
}

impl Default for MovableOptions {
    fn default() -> Self {
        Self {
            allow_modify: true,
            point_radius: 5.0,
        }
    }
}

/// Partial update for [`MovableOptions`]; unset fields keep their value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MovableOptionsUpdate {
    pub allow_modify: Option<bool>,
    pub point_radius: Option<f64>,
}

impl MovableOptions {
    /// Merge an update into this configuration.
    pub fn merge(&mut self, update: &MovableOptionsUpdate) {
        if let Some(allow_modify) = update.allow_modify {
            self.allow_modify = allow_modify;
        }
        if let Some(point_radius) = update.point_radius {
            self.point_radius = point_radius;
        }
    }
}

/// A pointer event in client coordinates, as delivered by the host.
///
/// `Leave` is handled exactly like `Up`: the gesture ends either way.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { x: f64, y: f64, pointer_id: i32 },
    Move { x: f64, y: f64 },
    Up { pointer_id: i32 },
    Leave { pointer_id: i32 },
}

/// What the host should do after an event was processed.
///
/// The host redraws when `redraw` is set, re-reads
/// [`MovablePoints::focused_points`] when `focus_changed` is set, and
/// captures or releases the pointer when the respective id is present.
/// Release failures are the host's to swallow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerResponse {
    pub redraw: bool,
    pub focus_changed: bool,
    pub capture: Option<i32>,
    pub release: Option<i32>,
}

impl PointerResponse {
    /// Combine responses from two managers fed the same event.
    pub fn merge(self, other: PointerResponse) -> PointerResponse {
        PointerResponse {
            redraw: self.redraw || other.redraw,
            focus_changed: self.focus_changed || other.focus_changed,
            capture: self.capture.or(other.capture),
            release: self.release.or(other.release),
        }
    }
}

/// CSS display bounds of the canvas element, in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayBounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Client-to-canvas coordinate conversion state.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Viewport {
    width: f64,
    height: f64,
    display: Option<DisplayBounds>,
}

impl Viewport {
    /// Convert client coordinates to canvas-space. Without display bounds
    /// (or with degenerate ones) the mapping is the identity.
    fn to_canvas(&self, client_x: f64, client_y: f64) -> Point {
        match self.display {
            Some(d) if d.width > 0.0 && d.height > 0.0 => Point::new(
                (client_x - d.left) * (self.width / d.width),
                (client_y - d.top) * (self.height / d.height),
            ),
            _ => Point::new(client_x, client_y),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct PointerState {
    position: Option<Point>,
    is_down: bool,
}

/// A set of named draggable points plus the focused subset.
///
/// Points are stored by id; iteration and hit-test tie-breaking follow
/// registration order.
#[derive(Debug, Clone)]
pub struct MovablePoints {
    options: MovableOptions,
    /// Selection policy. Externally settable at any time.
    pub target: Target,
    points: HashMap<PointId, Point>,
    order: Vec<PointId>,
    focused: Vec<PointId>,
    pointer: PointerState,
    view: Viewport,
}

impl MovablePoints {
    /// Create a manager for a canvas of the given pixel size.
    pub fn new(canvas_width: f64, canvas_height: f64, options: MovableOptionsUpdate) -> Self {
        let mut merged = MovableOptions::default();
        merged.merge(&options);
        Self {
            options: merged,
            target: Target::default(),
            points: HashMap::new(),
            order: Vec::new(),
            focused: Vec::new(),
            pointer: PointerState::default(),
            view: Viewport {
                width: canvas_width,
                height: canvas_height,
                display: None,
            },
        }
    }

    pub fn options(&self) -> MovableOptions {
        self.options
    }

    /// Merge a partial option update.
    pub fn set_options(&mut self, update: MovableOptionsUpdate) {
        self.options.merge(&update);
    }

    pub fn set_point_radius(&mut self, radius: f64) {
        self.options.point_radius = radius;
    }

    /// Point the manager at a different canvas. Display bounds are reset
    /// since they belonged to the previous element.
    pub fn set_canvas(&mut self, width: f64, height: f64) {
        self.view = Viewport {
            width,
            height,
            display: None,
        };
    }

    /// Record where the canvas element sits on screen, for client-to-canvas
    /// conversion under CSS scaling.
    pub fn set_display_bounds(&mut self, bounds: DisplayBounds) {
        self.view.display = Some(bounds);
    }

    /// Register points. A point whose id is already present has its data
    /// replaced but keeps its original position in the registration order.
    pub fn add_points<I>(&mut self, points: I)
    where
        I: IntoIterator<Item = Point>,
    {
        for point in points {
            let id = point.id();
            if self.points.insert(id, point).is_none() {
                self.order.push(id);
            }
        }
    }

    /// Remove points by id. Focused entries are left alone; a focused id
    /// without a backing point is simply skipped by the drag loop.
    pub fn remove_points(&mut self, ids: &[PointId]) {
        for id in ids {
            self.points.remove(id);
        }
        self.order.retain(|id| self.points.contains_key(id));
    }

    pub fn point(&self, id: PointId) -> Option<&Point> {
        self.points.get(&id)
    }

    pub fn point_mut(&mut self, id: PointId) -> Option<&mut Point> {
        self.points.get_mut(&id)
    }

    /// All points in registration order.
    pub fn points(&self) -> impl Iterator<Item = &Point> {
        self.order.iter().filter_map(|id| self.points.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Ids of the focused points, in focus order.
    pub fn focused_ids(&self) -> &[PointId] {
        &self.focused
    }

    pub fn is_focused(&self, id: PointId) -> bool {
        self.focused.contains(&id)
    }

    /// Snapshot of the focused id-to-point mapping.
    pub fn focused_points(&self) -> Vec<(PointId, Point)> {
        self.focused
            .iter()
            .filter_map(|id| self.points.get(id).map(|p| (*id, p.clone())))
            .collect()
    }

    /// Focus the given points under the current policy.
    pub fn select(&mut self, ids: &[PointId]) {
        self.try_focus(ids);
    }

    /// Focus every registered point. Under [`Target::Single`] this leaves
    /// only the last-registered point focused.
    pub fn select_all(&mut self) {
        let ids: Vec<PointId> = self.order.clone();
        self.try_focus(&ids);
    }

    pub fn deselect(&mut self, ids: &[PointId]) {
        self.focused.retain(|id| !ids.contains(id));
    }

    pub fn deselect_all(&mut self) {
        self.focused.clear();
    }

    /// Process one pointer event.
    ///
    /// Down: hit-test, focus on a hit (requesting pointer capture), then
    /// run the shared position update. Move: position update only. Up and
    /// Leave: end the gesture, deselect everything under
    /// [`Target::Single`], clear the stored position, request release.
    ///
    /// Every processed event requests a redraw. While `allow_modify` is
    /// off, events are ignored entirely.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> PointerResponse {
        if !self.options.allow_modify {
            return PointerResponse::default();
        }

        let mut response = PointerResponse {
            redraw: true,
            ..Default::default()
        };

        match event {
            PointerEvent::Down { x, y, pointer_id } => {
                self.pointer.is_down = true;
                let position = self.view.to_canvas(x, y);
                if let Some(hit) = self.find_nearest(&position) {
                    self.try_focus(&[hit]);
                    response.focus_changed = true;
                    response.capture = Some(pointer_id);
                }
                self.update_pointer_position(Some(position));
            }
            PointerEvent::Move { x, y } => {
                let position = self.view.to_canvas(x, y);
                self.update_pointer_position(Some(position));
            }
            PointerEvent::Up { pointer_id } | PointerEvent::Leave { pointer_id } => {
                self.pointer.is_down = false;
                if self.target == Target::Single {
                    self.deselect_all();
                    response.focus_changed = true;
                }
                self.update_pointer_position(None);
                response.release = Some(pointer_id);
            }
        }

        response
    }

    /// Nearest registered point within `point_radius * 1.05` of `position`,
    /// scanning in registration order. A later point at exactly the same
    /// distance replaces an earlier one.
    fn find_nearest(&self, position: &Point) -> Option<PointId> {
        let mut nearest = None;
        let mut nearest_dist = f64::INFINITY;

        for id in &self.order {
            let Some(point) = self.points.get(id) else {
                continue;
            };
            let dist = point.distance(position);
            if dist <= nearest_dist {
                nearest = Some(*id);
                nearest_dist = dist;
            }
        }

        if nearest_dist > self.options.point_radius * HIT_SLACK {
            return None;
        }
        nearest
    }

    /// Focus points one at a time: already-focused points are skipped (so a
    /// drag anchor survives), otherwise Single replaces the whole set and
    /// Select unions in.
    fn try_focus(&mut self, ids: &[PointId]) {
        for id in ids {
            if self.focused.contains(id) {
                continue;
            }
            match self.target {
                Target::Single => {
                    self.focused.clear();
                    self.focused.push(*id);
                }
                Target::Select => self.focused.push(*id),
            }
        }
    }

    /// The shared tail of every pointer event: apply the drag delta when a
    /// previous position exists and the pointer is down, then store the new
    /// position.
    fn update_pointer_position(&mut self, position: Option<Point>) {
        if self.pointer.is_down {
            if let (Some(last), Some(current)) = (&self.pointer.position, &position) {
                for id in &self.focused {
                    if let Some(point) = self.points.get_mut(id) {
                        point.subtract(last, 1.0).plus(current, 1.0);
                    }
                }
            }
        }
        self.pointer.position = position;
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Strategy for integer-valued canvas coordinates (exact f64 math).
    fn exact_coord_strategy() -> impl Strategy<Value = f64> {
        (0i64..=200).prop_map(|v| v as f64)
    }

    /// Strategy for a handful of point positions.
    fn positions_strategy() -> impl Strategy<Value = Vec<(f64, f64)>> {
        prop::collection::vec((exact_coord_strategy(), exact_coord_strategy()), 1..8)
    }

    proptest! {
        /// Property: a reported hit is always within the slackened radius,
        /// and a miss means every point is outside it.
        #[test]
        fn prop_hit_test_respects_radius(
            positions in positions_strategy(),
            (cx, cy) in (exact_coord_strategy(), exact_coord_strategy()),
        ) {
            let mut m = MovablePoints::new(200.0, 200.0, MovableOptionsUpdate::default());
            m.set_point_radius(10.0);
            m.add_points(positions.iter().map(|&(x, y)| Point::new(x, y)));

            let response = m.handle_pointer(PointerEvent::Down { x: cx, y: cy, pointer_id: 1 });
            let click = Point::new(cx, cy);

            if response.focus_changed {
                let focused = m.focused_points();
                prop_assert_eq!(focused.len(), 1);
                prop_assert!(focused[0].1.distance(&click) <= 10.0 * 1.05);
            } else {
                for point in m.points() {
                    prop_assert!(point.distance(&click) > 10.0 * 1.05);
                }
            }
        }

        /// Property: under Single, the focused set never grows past one,
        /// whatever the click sequence.
        #[test]
        fn prop_single_focus_at_most_one(
            positions in positions_strategy(),
            clicks in prop::collection::vec(
                (exact_coord_strategy(), exact_coord_strategy(), any::<bool>()),
                0..20,
            ),
        ) {
            let mut m = MovablePoints::new(200.0, 200.0, MovableOptionsUpdate::default());
            m.add_points(positions.iter().map(|&(x, y)| Point::new(x, y)));

            for (x, y, lift) in clicks {
                m.handle_pointer(PointerEvent::Down { x, y, pointer_id: 1 });
                prop_assert!(m.focused_ids().len() <= 1);
                if lift {
                    m.handle_pointer(PointerEvent::Up { pointer_id: 1 });
                    prop_assert!(m.focused_ids().is_empty());
                }
            }
        }

        /// Property: a drag translates every focused point by the net
        /// pointer delta (exact for integer coordinates).
        #[test]
        fn prop_drag_translates_by_net_delta(
            positions in positions_strategy(),
            (sx, sy) in (exact_coord_strategy(), exact_coord_strategy()),
            path in prop::collection::vec(
                (exact_coord_strategy(), exact_coord_strategy()),
                1..10,
            ),
        ) {
            let mut m = MovablePoints::new(200.0, 200.0, MovableOptionsUpdate::default());
            m.target = Target::Select;
            m.add_points(positions.iter().map(|&(x, y)| Point::new(x, y)));
            m.select_all();
            let before = m.focused_points();

            m.handle_pointer(PointerEvent::Down { x: sx, y: sy, pointer_id: 1 });
            for &(x, y) in &path {
                m.handle_pointer(PointerEvent::Move { x, y });
            }
            m.handle_pointer(PointerEvent::Up { pointer_id: 1 });

            let (ex, ey) = *path.last().unwrap();
            let (dx, dy) = (ex - sx, ey - sy);
            for (id, old) in before {
                let new = m.point(id).unwrap();
                prop_assert_eq!(new.x, old.x + dx);
                prop_assert_eq!(new.y, old.y + dy);
            }
        }
    }
}
