//! Pick identifiers and the CPU-side ID buffer
//!
//! Every pixel of the ID buffer holds a `u32`: 0 for background, ids at or
//! above [`GIZMO_ID_BASE`] for gizmo handles and everything else for scene
//! entities.

use std::collections::BTreeSet;

use vi_core::EntityId;
use vi_core::constants::GIZMO_ID_BASE;

use crate::constants::picking::MAX_TOLERANCE_PX;
use crate::gizmo::GizmoHandle;

/// Identifier read from the ID buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PickId(pub u32);

impl PickId {
    /// Nothing under the pointer
    pub const NONE: PickId = PickId(0);

    /// True for the background sentinel
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// True for gizmo handle ids
    pub fn is_gizmo(self) -> bool {
        self.0 >= GIZMO_ID_BASE
    }

    /// True for scene entity ids
    pub fn is_entity(self) -> bool {
        !self.is_none() && !self.is_gizmo()
    }

    /// The entity named by this id
    pub fn entity(self) -> Option<EntityId> {
        self.is_entity().then_some(EntityId(self.0))
    }

    /// The gizmo handle named by this id
    pub fn handle(self) -> Option<GizmoHandle> {
        GizmoHandle::from_pick_id(self)
    }
}

impl From<EntityId> for PickId {
    fn from(id: EntityId) -> Self {
        PickId(id.raw())
    }
}

/// Window offsets within `radius`, nearest to the center first.
///
/// Ties in distance are broken by row, then column, so the scan order is
/// fully deterministic. The radius is capped at [`MAX_TOLERANCE_PX`].
pub fn spiral_offsets(radius: u32) -> Vec<(i32, i32)> {
    let r = radius.min(MAX_TOLERANCE_PX) as i32;
    let mut offsets: Vec<(i32, i32)> = (-r..=r)
        .flat_map(|dy| (-r..=r).map(move |dx| (dx, dy)))
        .collect();
    offsets.sort_by_key(|&(dx, dy)| (dx * dx + dy * dy, dy, dx));
    offsets
}

/// Per-pixel identifier and depth buffer
#[derive(Debug, Clone, Default)]
pub struct IdBuffer {
    width: u32,
    height: u32,
    ids: Vec<u32>,
    depth: Vec<f32>,
    /// Scan order for the largest window, shared by every smaller radius
    spiral: Vec<(i32, i32)>,
}

impl IdBuffer {
    /// Allocate a cleared buffer
    pub fn new(width: u32, height: u32) -> Self {
        let mut buffer = Self::default();
        buffer.resize(width, height);
        buffer
    }

    /// Reallocate for a new size, clearing the contents
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        let len = width as usize * height as usize;
        self.ids = vec![0; len];
        self.depth = vec![1.0; len];
        if self.spiral.is_empty() {
            self.spiral = spiral_offsets(MAX_TOLERANCE_PX);
        }
    }

    /// Reset every pixel to background at the far plane
    pub fn clear(&mut self) {
        self.ids.fill(0);
        self.depth.fill(1.0);
    }

    /// Buffer width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Buffer height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Write an id if `depth` is nearer than the stored depth
    pub fn write(&mut self, x: i32, y: i32, id: u32, depth: f32) -> bool {
        let Some(i) = self.index(x, y) else {
            return false;
        };
        if depth < self.depth[i] {
            self.ids[i] = id;
            self.depth[i] = depth;
            true
        } else {
            false
        }
    }

    /// Write an id on top of everything, leaving depth untouched
    pub fn write_overlay(&mut self, x: i32, y: i32, id: u32) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.ids[i] = id;
                true
            }
            None => false,
        }
    }

    /// Identifier at a pixel; background outside the buffer
    pub fn id_at(&self, x: i32, y: i32) -> PickId {
        self.index(x, y).map_or(PickId::NONE, |i| PickId(self.ids[i]))
    }

    /// NDC depth at a pixel; `None` outside the buffer
    pub fn depth_at(&self, x: i32, y: i32) -> Option<f32> {
        self.index(x, y).map(|i| self.depth[i])
    }

    /// First non-zero id in the `(2r+1)²` window around a pixel.
    ///
    /// The window is scanned nearest-first, so the id closest to the exact
    /// pointer position wins. A center outside the buffer yields
    /// [`PickId::NONE`]. The radius is capped at [`MAX_TOLERANCE_PX`].
    pub fn pick_fat(&self, x: i32, y: i32, radius: u32) -> PickId {
        if self.index(x, y).is_none() {
            return PickId::NONE;
        }
        let r = radius.min(MAX_TOLERANCE_PX) as i32;
        self.spiral
            .iter()
            .take_while(|&&(dx, dy)| dx * dx + dy * dy <= 2 * r * r)
            .filter(|&&(dx, dy)| dx.abs() <= r && dy.abs() <= r)
            .map(|&(dx, dy)| self.id_at(x + dx, y + dy))
            .find(|id| !id.is_none())
            .unwrap_or(PickId::NONE)
    }

    /// Distinct non-zero ids inside a rectangle given by any two corners
    pub fn ids_in_rect(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> BTreeSet<PickId> {
        let mut found = BTreeSet::new();
        if self.width == 0 || self.height == 0 {
            return found;
        }
        let max_x = self.width as i32 - 1;
        let max_y = self.height as i32 - 1;
        let (left, right) = (x0.min(x1).max(0), x0.max(x1).min(max_x));
        let (top, bottom) = (y0.min(y1).max(0), y0.max(y1).min(max_y));
        for y in top..=bottom {
            for x in left..=right {
                let id = self.id_at(x, y);
                if !id.is_none() {
                    found.insert(id);
                }
            }
        }
        found
    }
}
