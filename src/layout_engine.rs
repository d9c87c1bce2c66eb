use serde::{Deserialize, Serialize};

use crate::error::{MuseumError, Result};

/// Default gap between collage items (px)
pub const DEFAULT_MARGIN: f32 = 8.0;

/// Headroom on the initial collage scale so most inputs fit in one pass
const COLLAGE_SCALE_HEADROOM: f32 = 0.85;
/// Headroom applied on top of the height-correction pass
const HEIGHT_SHRINK_HEADROOM: f32 = 0.95;

/// A measured image. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub src: String,
    pub width: u32,
    pub height: u32,
}

impl ImageRecord {
    pub fn new(src: impl Into<String>, width: u32, height: u32) -> Result<Self> {
        let src = src.into();
        if width == 0 || height == 0 {
            return Err(MuseumError::InvalidImage {
                path: src,
                width,
                height,
            });
        }
        Ok(Self { src, width, height })
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn area(&self) -> f64 {
        self.width as f64 * self.height as f64
    }
}

/// One placed image in a collage pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    /// Index into the input slice
    pub index: usize,
    pub src: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollageLayout {
    pub scale: f32,
    /// Set when the stacked rows overflowed and were shrunk uniformly
    pub height_scale: Option<f32>,
    pub rows: usize,
    pub placements: Vec<Placement>,
}

/// Frame color for the photo on display
pub const FRAME_ACTIVE: [f32; 4] = [0.79, 0.64, 0.15, 1.0];
/// Frame color for the rest of the room
pub const FRAME_IDLE: [f32; 4] = [0.36, 0.29, 0.22, 1.0];

/// GPU instance for one collage frame, drawn behind the confetti
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameInstance {
    pub position: [f32; 2], // Top-left corner (px)
    pub size: [f32; 2],     // Width, height (px)
    pub color: [f32; 4],    // RGBA
}

impl CollageLayout {
    pub fn placement_of(&self, src: &str) -> Option<&Placement> {
        self.placements.iter().find(|placement| placement.src == src)
    }

    /// One frame per placement; `active` picks out the photo on display
    pub fn frame_instances(&self, active: Option<&str>) -> Vec<FrameInstance> {
        self.placements
            .iter()
            .map(|placement| FrameInstance {
                position: [placement.x, placement.y],
                size: [placement.width, placement.height],
                color: if active == Some(placement.src.as_str()) {
                    FRAME_ACTIVE
                } else {
                    FRAME_IDLE
                },
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Landscape,
    Portrait,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    Wide,
    Tall,
    Standard,
}

/// Display size of a masonry tile
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MasonrySize {
    pub class: SizeClass,
    pub width: f32,
    pub height: f32,
}

/// Row span of an item in a CSS-grid style masonry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridSpan {
    pub rows: u32,
    pub orientation: Option<Orientation>,
}

/// JSON Layout Descriptor
#[derive(Debug, Deserialize, Serialize)]
pub struct LayoutDescriptor {
    pub version: String,
    pub layout: LayoutConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LayoutConfig {
    #[serde(rename = "type")]
    pub layout_type: String,
    #[serde(default)]
    pub params: LayoutParams,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct LayoutParams {
    // Collage
    pub margin: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Arrangement {
    Collage(CollageLayout),
    Masonry { items: Vec<MasonrySize> },
    Spans { items: Vec<GridSpan> },
}

struct Row {
    items: Vec<Placement>,
    height: f32,
}

pub struct LayoutEngine {
    container_width: f32,
    container_height: f32,
    margin: f32,
}

impl LayoutEngine {
    pub fn new(container_width: f32, container_height: f32) -> Self {
        Self {
            container_width,
            container_height,
            margin: DEFAULT_MARGIN,
        }
    }

    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }

    pub fn container(&self) -> (f32, f32) {
        (self.container_width, self.container_height)
    }

    /// Generate an arrangement from a JSON descriptor string
    pub fn generate_from_json_str(&self, json: &str, images: &[ImageRecord]) -> Arrangement {
        match serde_json::from_str::<LayoutDescriptor>(json) {
            Ok(descriptor) => self.generate_from_json(&descriptor, images),
            Err(e) => {
                log::warn!("Layout descriptor parse error: {}. Falling back to collage.", e);
                Arrangement::Collage(self.arrange_collage(images))
            }
        }
    }

    pub fn generate_from_json(&self, descriptor: &LayoutDescriptor, images: &[ImageRecord]) -> Arrangement {
        if descriptor.version != "1.0" {
            log::warn!(
                "Unknown layout descriptor version '{}'. Expected '1.0'",
                descriptor.version
            );
        }

        let layout_type = descriptor.layout.layout_type.to_lowercase();
        match layout_type.as_str() {
            "collage" => {
                let margin = descriptor.layout.params.margin.unwrap_or(self.margin);
                let engine = LayoutEngine::new(self.container_width, self.container_height)
                    .with_margin(margin);
                Arrangement::Collage(engine.arrange_collage(images))
            }
            "masonry" => Arrangement::Masonry {
                items: images.iter().map(masonry_size).collect(),
            },
            "spans" | "grid" => Arrangement::Spans {
                items: images.iter().map(grid_span).collect(),
            },
            _ => {
                log::warn!("Unknown layout type '{}'. Falling back to collage.", layout_type);
                Arrangement::Collage(self.arrange_collage(images))
            }
        }
    }

    /// Initial uniform scale for a set of images
    pub fn collage_scale(&self, images: &[ImageRecord]) -> f32 {
        let total_area: f64 = images.iter().map(ImageRecord::area).sum();
        if total_area <= 0.0 {
            return 1.0;
        }
        let available = ((self.container_width - self.margin * 6.0).max(0.0) as f64)
            * ((self.container_height - self.margin * 6.0).max(0.0) as f64);
        ((available / total_area).sqrt() as f32) * COLLAGE_SCALE_HEADROOM
    }

    /// Greedy row packing, largest images first.
    ///
    /// Always produces a placement; fit is approximate. An image that cannot
    /// fit an empty row still gets a row of its own.
    pub fn arrange_collage(&self, images: &[ImageRecord]) -> CollageLayout {
        if images.is_empty() {
            return CollageLayout {
                scale: 1.0,
                height_scale: None,
                rows: 0,
                placements: Vec::new(),
            };
        }

        let mut order: Vec<usize> = (0..images.len()).collect();
        // stable: ties keep input order
        order.sort_by(|&a, &b| {
            images[b]
                .area()
                .partial_cmp(&images[a].area())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let scale = self.collage_scale(images);
        let usable_width = self.container_width - self.margin * 2.0;
        let usable_height = self.container_height - self.margin * 2.0;

        let mut rows: Vec<Row> = Vec::new();
        let mut current: Vec<Placement> = Vec::new();
        let mut row_width = 0.0_f32;
        let mut row_height = 0.0_f32;
        let mut total_height = 0.0_f32;

        for idx in order {
            let image = &images[idx];
            let width = image.width as f32 * scale;
            let height = image.height as f32 * scale;
            let placement = Placement {
                index: idx,
                src: image.src.clone(),
                x: 0.0,
                y: 0.0,
                width,
                height,
            };

            if row_width + width + self.margin <= usable_width {
                current.push(placement);
                row_width += width + self.margin;
                row_height = row_height.max(height);
            } else {
                if !current.is_empty() {
                    total_height += row_height + self.margin;
                    rows.push(Row {
                        items: std::mem::take(&mut current),
                        height: row_height,
                    });
                }
                current.push(placement);
                row_width = width + self.margin;
                row_height = height;
            }
        }

        if !current.is_empty() {
            total_height += row_height;
            rows.push(Row {
                items: current,
                height: row_height,
            });
        }

        let mut height_scale = None;
        if total_height > usable_height {
            let shrink = usable_height / total_height * HEIGHT_SHRINK_HEADROOM;
            for row in &mut rows {
                row.height *= shrink;
                for item in &mut row.items {
                    item.width *= shrink;
                    item.height *= shrink;
                }
            }
            height_scale = Some(shrink);
        }

        let row_count = rows.len();
        let mut placements = Vec::with_capacity(images.len());
        let mut y = self.margin;
        for row in rows {
            let widths: f32 = row.items.iter().map(|item| item.width).sum();
            let row_width = widths + (row.items.len() as f32 - 1.0) * self.margin;
            let mut x = if row_width < usable_width {
                (self.container_width - row_width) / 2.0
            } else {
                self.margin
            };

            for mut item in row.items {
                item.x = x;
                item.y = y;
                x += item.width + self.margin;
                placements.push(item);
            }
            y += row.height + self.margin;
        }

        log::debug!(
            "Collage: {}x{} container, {} images, scale {:.3}, {} rows",
            self.container_width,
            self.container_height,
            images.len(),
            scale,
            row_count
        );

        CollageLayout {
            scale,
            height_scale,
            rows: row_count,
            placements,
        }
    }
}

/// Masonry tile size from natural dimensions
pub fn masonry_size(image: &ImageRecord) -> MasonrySize {
    let aspect = image.aspect_ratio();
    let (w, h) = (image.width as f32, image.height as f32);

    if aspect > 1.5 {
        let width = w.min(400.0);
        MasonrySize {
            class: SizeClass::Wide,
            width,
            height: width / aspect,
        }
    } else if aspect < 0.7 {
        let height = h.min(500.0);
        MasonrySize {
            class: SizeClass::Tall,
            width: height * aspect,
            height,
        }
    } else if w > h {
        let width = w.min(350.0);
        MasonrySize {
            class: SizeClass::Standard,
            width,
            height: width / aspect,
        }
    } else {
        let height = h.min(350.0);
        MasonrySize {
            class: SizeClass::Standard,
            width: height * aspect,
            height,
        }
    }
}

/// Grid rows an item spans: image rows scaled by height/width plus a quote block
pub fn grid_span(image: &ImageRecord) -> GridSpan {
    const BASE_SPAN: u32 = 20;
    const QUOTE_SPAN: u32 = 8;

    let ratio = image.height as f32 / image.width as f32;
    let rows = (BASE_SPAN as f32 * ratio).ceil() as u32 + QUOTE_SPAN;
    let orientation = if ratio > 1.2 {
        Some(Orientation::Portrait)
    } else if ratio < 0.8 {
        Some(Orientation::Landscape)
    } else {
        None
    };

    GridSpan {
        rows: rows.max(BASE_SPAN + QUOTE_SPAN),
        orientation,
    }
}

/// Frame orientation for the room browser
pub fn frame_orientation(width: u32, height: u32) -> Orientation {
    if height > 0 && width as f32 / height as f32 > 1.0 {
        Orientation::Landscape
    } else {
        Orientation::Portrait
    }
}

/// Modal layout: side-by-side for portrait/square, stacked for landscape
pub fn modal_layout(width: u32, height: u32) -> Orientation {
    if height > 0 && width as f32 / height as f32 >= 1.2 {
        Orientation::Landscape
    } else {
        Orientation::Portrait
    }
}
