//! Garment panels: freestanding textured surfaces placed around the
//! mannequin to stand in for a garment photo.
//!
//! Tops, bottoms and dresses are open partial-cylinder shells wrapped around
//! the torso or legs; shoes are a flat tilted plane at the feet. Each slot has
//! a fixed render order so panels layer top > dress > bottom > shoes
//! regardless of true depth.

use std::f32::consts::PI;

use bevy::image::{ImageAddressMode, ImageFilterMode, ImageSampler, ImageSamplerDescriptor};
use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use mq_utils::GarmentSlot;
use tracing::debug;

use crate::components::{GarmentPanel, PanelRenderOrder};

pub const RADIAL_SEGMENTS: u32 = 48;
pub const HEIGHT_SEGMENTS: u32 = 1;

pub const MIN_ASPECT: f32 = 0.5;
pub const MAX_ASPECT: f32 = 2.0;
pub const MAX_SIZE_MULTIPLIER: f32 = 1.0;

/// Render order the depth bias is measured from.
pub const BASE_RENDER_ORDER: i32 = 999;
/// Depth bias per render-order step.
pub const DEPTH_BIAS_STEP: f32 = 1.0;

/// Width / height of a garment photo, clamped to `[0.5, 2.0]`. A zero height
/// counts as square.
pub fn aspect_ratio(width: u32, height: u32) -> f32 {
    let ratio = width as f32 / height as f32;
    if !ratio.is_finite() {
        return 1.0;
    }
    ratio.clamp(MIN_ASPECT, MAX_ASPECT)
}

/// Size factor applied to panel dimensions; wide photos never grow a panel
/// past its tuned size.
pub fn size_multiplier(aspect: f32) -> f32 {
    aspect.clamp(MIN_ASPECT, MAX_SIZE_MULTIPLIER)
}

/// Depth bias for a panel drawn at `order`.
pub fn order_depth_bias(order: i32) -> f32 {
    (order - BASE_RENDER_ORDER) as f32 * DEPTH_BIAS_STEP
}

pub const fn render_order(slot: GarmentSlot) -> i32 {
    match slot {
        GarmentSlot::Top => 1001,
        GarmentSlot::Dress => 1000,
        GarmentSlot::Bottom => 999,
        GarmentSlot::Shoes => 998,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelShape {
    /// Open cylinder section centred on +Z.
    Shell {
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
        theta_length: f32,
    },
    Plane {
        width: f32,
        height: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelSpec {
    pub slot: GarmentSlot,
    pub shape: PanelShape,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub render_order: i32,
}

impl PanelSpec {
    pub fn for_slot(slot: GarmentSlot, size_multiplier: f32) -> Self {
        let (shape, translation, rotation, scale) = match slot {
            GarmentSlot::Top => {
                let radius = 0.29;
                (
                    PanelShape::Shell {
                        radius_top: radius,
                        radius_bottom: radius * 0.85,
                        height: 0.80,
                        theta_length: PI,
                    },
                    // Slightly forward so it sits over a bottom panel.
                    Vec3::new(0.0, 1.2, 0.05),
                    Quat::IDENTITY,
                    Vec3::new(1.0, 1.0, 0.6),
                )
            }
            GarmentSlot::Bottom => {
                let radius = 0.32;
                (
                    PanelShape::Shell {
                        radius_top: radius,
                        radius_bottom: radius * 0.5,
                        height: 1.05,
                        theta_length: PI * 1.1,
                    },
                    Vec3::new(0.0, 0.50, -0.02),
                    Quat::IDENTITY,
                    Vec3::new(1.0, 1.0, 0.6),
                )
            }
            GarmentSlot::Dress => {
                let radius = 0.2;
                (
                    PanelShape::Shell {
                        radius_top: radius,
                        radius_bottom: radius * 0.75,
                        height: 0.95 + size_multiplier * 0.15,
                        theta_length: PI,
                    },
                    Vec3::new(0.0, 0.95, 0.0),
                    Quat::IDENTITY,
                    Vec3::ONE,
                )
            }
            GarmentSlot::Shoes => (
                PanelShape::Plane {
                    width: 0.35,
                    height: 0.25,
                },
                Vec3::new(0.0, 0.12, 0.15),
                Quat::from_rotation_x(-PI / 6.0),
                Vec3::ONE,
            ),
        };

        Self {
            slot,
            shape,
            translation,
            rotation,
            scale,
            render_order: render_order(slot),
        }
    }

    pub fn transform(&self) -> Transform {
        Transform {
            translation: self.translation,
            rotation: self.rotation,
            scale: self.scale,
        }
    }

    pub fn build_mesh(&self) -> Mesh {
        match self.shape {
            PanelShape::Shell {
                radius_top,
                radius_bottom,
                height,
                theta_length,
            } => shell_mesh(
                radius_top,
                radius_bottom,
                height,
                RADIAL_SEGMENTS,
                HEIGHT_SEGMENTS,
                -theta_length / 2.0,
                theta_length,
            ),
            PanelShape::Plane { width, height } => plane_mesh(width, height),
        }
    }

    pub fn depth_bias(&self) -> f32 {
        order_depth_bias(self.render_order)
    }
}

/// Side surface of a (possibly tapered) cylinder, open at both ends, spanning
/// `theta_length` radians from `theta_start`. Angle 0 points along +Z.
pub fn shell_mesh(
    radius_top: f32,
    radius_bottom: f32,
    height: f32,
    radial_segments: u32,
    height_segments: u32,
    theta_start: f32,
    theta_length: f32,
) -> Mesh {
    let radial_segments = radial_segments.max(1);
    let height_segments = height_segments.max(1);
    let half_height = height / 2.0;
    let slope = (radius_bottom - radius_top) / height;

    let columns = radial_segments + 1;
    let rows = height_segments + 1;
    let mut positions: Vec<[f32; 3]> = Vec::with_capacity((columns * rows) as usize);
    let mut normals: Vec<[f32; 3]> = Vec::with_capacity((columns * rows) as usize);
    let mut uvs: Vec<[f32; 2]> = Vec::with_capacity((columns * rows) as usize);
    let mut indices: Vec<u32> =
        Vec::with_capacity((radial_segments * height_segments * 6) as usize);

    for y in 0..rows {
        let v = y as f32 / height_segments as f32;
        let radius = v * (radius_bottom - radius_top) + radius_top;
        for x in 0..columns {
            let u = x as f32 / radial_segments as f32;
            let theta = u * theta_length + theta_start;
            let (sin, cos) = theta.sin_cos();

            positions.push([radius * sin, half_height - v * height, radius * cos]);
            normals.push(Vec3::new(sin, slope, cos).normalize().to_array());
            // Image rows run top to bottom, matching the shell's v.
            uvs.push([u, v]);
        }
    }

    for y in 0..height_segments {
        for x in 0..radial_segments {
            let a = y * columns + x;
            let b = (y + 1) * columns + x;
            let c = (y + 1) * columns + x + 1;
            let d = y * columns + x + 1;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}

/// Quad in the XY plane, normal +Z.
pub fn plane_mesh(width: f32, height: f32) -> Mesh {
    let (hw, hh) = (width / 2.0, height / 2.0);
    let positions = vec![
        [-hw, -hh, 0.0],
        [hw, -hh, 0.0],
        [hw, hh, 0.0],
        [-hw, hh, 0.0],
    ];
    let normals = vec![[0.0, 0.0, 1.0]; 4];
    let uvs = vec![[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];
    let indices = vec![0u32, 1, 2, 0, 2, 3];

    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}

/// Garment photo as a texture: wraps horizontally around the shell, clamps
/// vertically, shown once.
pub fn garment_image(rgba: Vec<u8>, width: u32, height: u32) -> Image {
    let mut image = Image::new_fill(
        Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        &[0, 0, 0, 0],
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    );
    image.data = Some(rgba);

    let mut sampler = ImageSamplerDescriptor::linear();
    sampler.mag_filter = ImageFilterMode::Linear;
    sampler.min_filter = ImageFilterMode::Linear;
    sampler.address_mode_u = ImageAddressMode::Repeat;
    sampler.address_mode_v = ImageAddressMode::ClampToEdge;
    sampler.address_mode_w = ImageAddressMode::ClampToEdge;
    image.sampler = ImageSampler::Descriptor(sampler);
    image
}

/// Unlit, double-sided and blended. The depth bias is filled in from the
/// panel's `PanelRenderOrder` once it is spawned.
pub fn panel_material(texture: Handle<Image>) -> StandardMaterial {
    StandardMaterial {
        base_color: Color::WHITE,
        base_color_texture: Some(texture),
        alpha_mode: AlphaMode::Blend,
        cull_mode: None,
        double_sided: true,
        unlit: true,
        ..Default::default()
    }
}

/// Keep each panel material's depth bias in step with its render order.
pub fn sync_panel_depth_bias(
    panels: Query<
        (&GarmentPanel, &PanelRenderOrder, &MeshMaterial3d<StandardMaterial>),
        Changed<PanelRenderOrder>,
    >,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for (panel, order, material) in &panels {
        let Some(material) = materials.get_mut(&material.0) else {
            continue;
        };
        material.depth_bias = order_depth_bias(order.0);
        debug!(
            "{} panel drawn at order {} (depth bias {})",
            panel.slot, order.0, material.depth_bias
        );
    }
}
