//! Frame driver contract.
//!
//! A [`FrameDriver`] owns the render surface. Scenes hand it opaque
//! [`ObjectId`]s to attach and detach, and once per frame a list of
//! [`DrawItem`]s borrowed from the scene's buffers. Because drawing and
//! mutation happen on the same thread in a fixed order, a draw item never
//! observes a half-written buffer.
//!
//! [`HeadlessDriver`] implements the contract without a GPU; it records
//! what it was asked to do and is what the tests drive the choreography
//! through. The windowed renderer lives in [`crate::gpu`].

use std::ops::Range;

use glam::Mat4;

use crate::choreographer::Choreographer;
use crate::field::PointStyle;

/// Handle for one drawable object attached to a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

/// Geometry of a draw item, borrowed from its owner for the frame.
#[derive(Debug, Clone)]
pub enum Primitive<'a> {
    /// Point sprites, one per `x, y, z` triple.
    Points {
        positions: &'a [f32],
        style: PointStyle,
    },
    /// Vertex-colored line segments. Only `range` is drawn; the rest of the
    /// buffers is reserved capacity.
    Lines {
        positions: &'a [f32],
        colors: &'a [f32],
        range: Range<usize>,
        opacity: f32,
    },
}

impl Primitive<'_> {
    /// Number of vertices that will actually be drawn.
    pub fn vertex_count(&self) -> usize {
        match self {
            Primitive::Points { positions, .. } => positions.len() / 3,
            Primitive::Lines { range, .. } => range.len(),
        }
    }
}

/// One object to draw this frame.
#[derive(Debug, Clone)]
pub struct DrawItem<'a> {
    pub id: ObjectId,
    /// Model transform of the object's group.
    pub transform: Mat4,
    pub primitive: Primitive<'a>,
    /// Whether the geometry changed since the last frame and must be
    /// re-uploaded.
    pub dirty: bool,
}

/// The rendering side of a scene.
pub trait FrameDriver {
    /// Attach objects so they are drawn from now on.
    fn add(&mut self, objects: &[ObjectId]);

    /// Detach objects immediately and release their resources at the next
    /// idle slot.
    fn cleanup(&mut self, objects: &[ObjectId]);

    /// Draw the attached subset of `items`.
    fn render(&mut self, items: &[DrawItem<'_>]);

    /// Start invoking the scene's per-frame update after every draw.
    fn animate(&mut self);

    /// Stop invoking the per-frame update.
    fn cancel_animate(&mut self);

    /// Whether the per-frame update is currently scheduled.
    fn is_animating(&self) -> bool;
}

/// What a [`HeadlessDriver`] drew for one item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawnItem {
    pub id: ObjectId,
    pub vertex_count: usize,
    /// Line opacity, `1.0` for points.
    pub opacity: f32,
    pub uploaded: bool,
}

/// Frame driver without a surface.
#[derive(Debug, Default)]
pub struct HeadlessDriver {
    attached: Vec<ObjectId>,
    pending_disposal: Vec<ObjectId>,
    disposed: Vec<ObjectId>,
    animating: bool,
    frames: u64,
    last_frame: Vec<DrawnItem>,
}

impl HeadlessDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one display refresh: draw, then tick the scene if animating.
    pub fn frame(&mut self, scene: &mut Choreographer, now: f32) {
        self.render(&scene.draw_items());
        scene.mark_rendered();
        if self.animating {
            scene.update(now);
        }
    }

    /// Currently attached objects, in attach order.
    pub fn attached(&self) -> &[ObjectId] {
        &self.attached
    }

    /// Objects detached but not yet released.
    pub fn pending_disposal(&self) -> &[ObjectId] {
        &self.pending_disposal
    }

    /// Objects whose resources were released.
    pub fn disposed(&self) -> &[ObjectId] {
        &self.disposed
    }

    /// Number of frames rendered.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Items drawn by the last [`render`](FrameDriver::render).
    pub fn last_frame(&self) -> &[DrawnItem] {
        &self.last_frame
    }

    /// Release everything pending disposal.
    fn flush_disposals(&mut self) {
        self.disposed.append(&mut self.pending_disposal);
    }
}

impl FrameDriver for HeadlessDriver {
    fn add(&mut self, objects: &[ObjectId]) {
        for id in objects {
            // Re-attaching cancels a pending disposal
            self.pending_disposal.retain(|pending| pending != id);
            if !self.attached.contains(id) {
                self.attached.push(*id);
            }
        }
    }

    fn cleanup(&mut self, objects: &[ObjectId]) {
        self.attached.retain(|id| !objects.contains(id));
        for id in objects {
            if !self.pending_disposal.contains(id) {
                self.pending_disposal.push(*id);
            }
        }
    }

    fn render(&mut self, items: &[DrawItem<'_>]) {
        // The start of a frame is the idle slot for deferred disposal
        self.flush_disposals();

        self.last_frame.clear();
        for item in items.iter().filter(|item| self.attached.contains(&item.id)) {
            let opacity = match item.primitive {
                Primitive::Points { .. } => 1.0,
                Primitive::Lines { opacity, .. } => opacity,
            };
            self.last_frame.push(DrawnItem {
                id: item.id,
                vertex_count: item.primitive.vertex_count(),
                opacity,
                uploaded: item.dirty,
            });
        }
        self.frames += 1;
    }

    fn animate(&mut self) {
        self.animating = true;
    }

    fn cancel_animate(&mut self) {
        self.animating = false;
    }

    fn is_animating(&self) -> bool {
        self.animating
    }
}
