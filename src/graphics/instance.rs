use bitflags::bitflags;
use nalgebra::Matrix4;

bitflags! {
    /// Shading branches selected per instance.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MaterialFlags: u32 {
        const VEHICLE = 1 << 0;
        const TRAFFIC_LIGHT = 1 << 1;
        const DESTINATION = 1 << 2;
        const ROAD = 1 << 3;
        const OBSTACLE = 1 << 4;
        const BUILDING = 1 << 5;
        const GROUND = 1 << 6;
    }
}

/// Per-instance data handed to the renderer, laid out for direct upload.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RenderInstance {
    pub world: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub material: u32,
    pub _padding: [u32; 3],
}

impl RenderInstance {
    pub fn new(world: &Matrix4<f32>, color: [f32; 4], material: MaterialFlags) -> Self {
        Self {
            world: (*world).into(),
            color,
            material: material.bits(),
            _padding: [0; 3],
        }
    }

    pub fn material(&self) -> MaterialFlags {
        MaterialFlags::from_bits_truncate(self.material)
    }

    pub fn world_matrix(&self) -> Matrix4<f32> {
        Matrix4::from(self.world)
    }

    /// Translation column of the world matrix.
    pub fn position(&self) -> [f32; 3] {
        [self.world[3][0], self.world[3][1], self.world[3][2]]
    }
}
