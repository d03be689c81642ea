//! Map surfaces: one rendering target per projection.
//!
//! The reconciler talks to surfaces only through [`MapSurface`]. The
//! [`HeadlessSurface`] implementation keeps the layer stack and view state in
//! memory and is what the replay tool and the tests drive.

use std::collections::BTreeSet;

use map_common::{BoundingBox, LayerId, ProjectionDescriptor, ProjectionId};

use crate::handle::LayerHandle;

/// Optional on-map controls that depend on the device size class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Control {
    ScaleMetric,
    ScaleImperial,
    MousePosition,
}

impl Control {
    /// Controls shown only on large devices.
    pub const SIZE_DEPENDENT: [Control; 3] = [
        Control::ScaleMetric,
        Control::ScaleImperial,
        Control::MousePosition,
    ];
}

/// A rendering target bound to one projection.
///
/// Index 0 of the layer stack is drawn first (bottom-most).
pub trait MapSurface {
    fn projection(&self) -> &ProjectionDescriptor;

    fn layers(&self) -> &[LayerHandle];

    /// Insert at `index`, clamped to the stack length.
    fn insert_layer(&mut self, index: usize, layer: LayerHandle);

    /// Replace the layer at `index`, returning the previous one.
    fn replace_layer(&mut self, index: usize, layer: LayerHandle) -> Option<LayerHandle>;

    fn remove_layer_at(&mut self, index: usize) -> Option<LayerHandle>;

    fn set_graticule(&mut self, shown: bool);

    fn has_graticule(&self) -> bool;

    fn set_shown(&mut self, shown: bool);

    fn is_shown(&self) -> bool;

    fn center(&self) -> (f64, f64);

    fn set_center(&mut self, center: (f64, f64));

    fn zoom(&self) -> u32;

    fn set_zoom(&mut self, zoom: u32);

    /// Viewport size in pixels as last measured.
    fn size(&self) -> (u32, u32);

    /// Re-measure the container. Surfaces that were hidden during a resize
    /// only pick up the new size here.
    fn update_size(&mut self);

    /// Center the view on `extent` at the closest zoom that shows all of it.
    fn fit_extent(&mut self, extent: &BoundingBox);

    fn add_control(&mut self, control: Control);

    fn remove_control(&mut self, control: Control);

    fn has_control(&self, control: Control) -> bool;

    fn resolution(&self) -> f64 {
        self.projection().resolution_at(self.zoom())
    }

    /// Extent currently visible in the viewport.
    fn calculate_extent(&self) -> BoundingBox {
        BoundingBox::from_view(self.center(), self.resolution(), self.size())
    }

    fn find_layer(&self, id: &LayerId) -> Option<usize> {
        self.layers().iter().position(|l| l.id() == id)
    }

    fn clear_layers(&mut self) {
        while !self.layers().is_empty() {
            let last = self.layers().len() - 1;
            self.remove_layer_at(last);
        }
    }
}

/// In-memory surface.
#[derive(Debug)]
pub struct HeadlessSurface {
    projection: ProjectionDescriptor,
    layers: Vec<LayerHandle>,
    graticule: bool,
    shown: bool,
    center: (f64, f64),
    zoom: u32,
    size: (u32, u32),
    container_size: (u32, u32),
    controls: BTreeSet<Control>,
}

impl HeadlessSurface {
    /// A hidden surface at the projection's start view, with every
    /// size-dependent control present.
    pub fn new(projection: ProjectionDescriptor, size: (u32, u32)) -> Self {
        Self {
            center: projection.initial_center(),
            zoom: projection.start_zoom,
            projection,
            layers: Vec::new(),
            graticule: false,
            shown: false,
            size,
            container_size: size,
            controls: Control::SIZE_DEPENDENT.into_iter().collect(),
        }
    }

    /// Resize the hosting container. Takes effect on the next
    /// [`update_size`](MapSurface::update_size).
    pub fn resize_container(&mut self, size: (u32, u32)) {
        self.container_size = size;
    }

    pub fn projection_id(&self) -> &ProjectionId {
        &self.projection.id
    }

    /// Ids of the stacked layers, bottom-most first.
    pub fn layer_ids(&self) -> Vec<LayerId> {
        self.layers.iter().map(|l| l.id().clone()).collect()
    }

    pub fn controls(&self) -> impl Iterator<Item = Control> + '_ {
        self.controls.iter().copied()
    }
}

impl MapSurface for HeadlessSurface {
    fn projection(&self) -> &ProjectionDescriptor {
        &self.projection
    }

    fn layers(&self) -> &[LayerHandle] {
        &self.layers
    }

    fn insert_layer(&mut self, index: usize, layer: LayerHandle) {
        let index = index.min(self.layers.len());
        self.layers.insert(index, layer);
    }

    fn replace_layer(&mut self, index: usize, layer: LayerHandle) -> Option<LayerHandle> {
        let slot = self.layers.get_mut(index)?;
        Some(std::mem::replace(slot, layer))
    }

    fn remove_layer_at(&mut self, index: usize) -> Option<LayerHandle> {
        (index < self.layers.len()).then(|| self.layers.remove(index))
    }

    fn set_graticule(&mut self, shown: bool) {
        self.graticule = shown;
    }

    fn has_graticule(&self) -> bool {
        self.graticule
    }

    fn set_shown(&mut self, shown: bool) {
        self.shown = shown;
    }

    fn is_shown(&self) -> bool {
        self.shown
    }

    fn center(&self) -> (f64, f64) {
        self.center
    }

    fn set_center(&mut self, center: (f64, f64)) {
        self.center = center;
    }

    fn zoom(&self) -> u32 {
        self.zoom
    }

    fn set_zoom(&mut self, zoom: u32) {
        self.zoom = zoom.min(self.projection.max_zoom());
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn update_size(&mut self) {
        self.size = self.container_size;
    }

    fn fit_extent(&mut self, extent: &BoundingBox) {
        let (w, h) = (self.size.0.max(1) as f64, self.size.1.max(1) as f64);
        let needed = (extent.width() / w).max(extent.height() / h);
        let zoom = (0..=self.projection.max_zoom())
            .rev()
            .find(|z| self.projection.resolution_at(*z) >= needed)
            .unwrap_or(0);
        self.zoom = zoom;
        self.center = extent.center();
    }

    fn add_control(&mut self, control: Control) {
        self.controls.insert(control);
    }

    fn remove_control(&mut self, control: Control) {
        self.controls.remove(&control);
    }

    fn has_control(&self, control: Control) -> bool {
        self.controls.contains(&control)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use map_common::CrsCode;

    fn geographic() -> ProjectionDescriptor {
        ProjectionDescriptor {
            id: ProjectionId::from("geographic"),
            epsg: 4326,
            crs: CrsCode::Epsg4326,
            max_extent: Some(BoundingBox::new(-180.0, -90.0, 180.0, 90.0)),
            resolutions: vec![0.5625, 0.28125, 0.140625, 0.0703125],
            start_center: None,
            start_zoom: 1,
            num_zoom_levels: None,
        }
    }

    #[test]
    fn test_new_surface_state() {
        let surface = HeadlessSurface::new(geographic(), (800, 600));
        assert!(!surface.is_shown());
        assert_eq!(surface.center(), (0.0, 0.0));
        assert_eq!(surface.zoom(), 1);
        assert!(surface.has_control(Control::MousePosition));
        assert_eq!(surface.calculate_extent(), BoundingBox::new(-112.5, -84.375, 112.5, 84.375));
    }

    #[test]
    fn test_resize_applies_on_update_size() {
        let mut surface = HeadlessSurface::new(geographic(), (800, 600));
        surface.resize_container((400, 300));
        assert_eq!(surface.size(), (800, 600));
        surface.update_size();
        assert_eq!(surface.size(), (400, 300));
    }

    #[test]
    fn test_fit_extent_picks_closest_zoom() {
        let mut surface = HeadlessSurface::new(geographic(), (512, 512));
        surface.fit_extent(&BoundingBox::new(-10.0, -10.0, 50.0, 30.0));
        // 60 degrees over 512 px needs 0.117 deg/px; zoom 2 is 0.14
        assert_eq!(surface.zoom(), 2);
        assert_eq!(surface.center(), (20.0, 10.0));

        surface.fit_extent(&BoundingBox::new(-400.0, -90.0, 400.0, 90.0));
        assert_eq!(surface.zoom(), 0);
    }

    #[test]
    fn test_zoom_clamped_to_max() {
        let mut surface = HeadlessSurface::new(geographic(), (512, 512));
        surface.set_zoom(40);
        assert_eq!(surface.zoom(), 4);
    }
}
