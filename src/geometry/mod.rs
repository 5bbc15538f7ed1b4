//! Pure geometry for the transition effects: projective quad mapping, camera folds, mask paths.

mod camera;
mod projective;
mod shapes;

pub use camera::{Hinge, camera_rotation, focal_length_px, fold_half_transform, fold_squeeze};
pub use projective::{Projective, perspective_quad, quad_to_quad};
pub use shapes::{alpha_mask_path, centered_rect, scaled_rect_around_center};
