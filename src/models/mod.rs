pub mod analysis;
pub mod image;
pub mod scale;

pub use analysis::*;
pub use image::*;
pub use scale::*;

/// 实体通用trait
pub trait Entity {
    type Id;
    fn id(&self) -> Self::Id;
}
