pub mod image;
pub mod model;

pub use image::ImageRef;
pub use model::TaskRequest;
