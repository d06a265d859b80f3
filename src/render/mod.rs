//! Panel scenes: projection around a centre, hexagon aggregation, and the
//! declarative scene each map panel draws (and exports).

pub mod hexbin;
pub mod projection;
pub mod scene;
