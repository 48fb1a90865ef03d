pub mod depth;
pub mod io;
pub mod traits;

pub use self::depth::DepthMap;
pub use self::traits::{ImageView, ImageViewMut, Rows};
