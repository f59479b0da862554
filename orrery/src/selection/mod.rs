//! Resolving pointer hits, label clicks and text queries to bodies

pub mod picking;
pub mod search;

pub use crate::camera::Ray;
pub use picking::{hit_test, label_target, ray_sphere, PickHit};
pub use search::{search, SearchFilter, SearchResult};
