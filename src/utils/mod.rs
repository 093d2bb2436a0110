pub mod escape;
pub mod post_id;
pub mod quality;
pub mod validate;
