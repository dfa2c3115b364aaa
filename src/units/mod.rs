//! Logical-to-pixel coordinate resolution.

mod resolver;

pub use resolver::{
    Axis, Coord, CoordField, CoordSet, ResolvedCoords, Units, resolve_coords, resolve_position,
    resolve_size, unresolve_position, unresolve_size,
};
