pub mod basis;
pub mod bezier;
pub mod cage;

pub use basis::MonomialSegment;
pub use bezier::BezierSegment;
pub use cage::{CurvedCage, Degree, Orientation};
