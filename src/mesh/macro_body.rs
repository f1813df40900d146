/// An aggregated point mass standing in for all particles of a non-empty
/// cell during the coarse (inter-cell) force pass.
///
/// Recomputed from scratch every step; never carried across steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacroBody {
    /// Mass-weighted centroid, x component.
    pub center_x: f64,
    /// Mass-weighted centroid, y component.
    pub center_y: f64,
    /// Sum of the member particles' masses.
    pub total_mass: f64,
    /// Index of the source cell in its pass's generation order.
    pub cell_index: usize,
}

/// Reduces a cell's member particles to a single [`MacroBody`].
///
/// Pure function over the given arrays. Returns `None` when the total mass
/// is zero (an empty cell), so the caller never divides by zero and the
/// cell drops out of the coarse pass.
///
/// # Examples
///
/// ```
/// use starmesh::mesh::aggregate;
///
/// let rx = [0.0, 10.0];
/// let ry = [0.0, 0.0];
/// let m = [2.0, 3.0];
/// let body = aggregate(&[0, 1], &rx, &ry, &m, 7).unwrap();
/// assert_eq!(body.total_mass, 5.0);
/// assert_eq!((body.center_x, body.center_y), (6.0, 0.0));
/// assert_eq!(body.cell_index, 7);
/// ```
pub fn aggregate(
    members: &[usize],
    rx: &[f64],
    ry: &[f64],
    m: &[f64],
    cell_index: usize,
) -> Option<MacroBody> {
    let total_mass: f64 = members.iter().map(|&i| m[i]).sum();
    if total_mass == 0.0 {
        return None;
    }
    let center_x = members.iter().map(|&i| m[i] * rx[i]).sum::<f64>() / total_mass;
    let center_y = members.iter().map(|&i| m[i] * ry[i]).sum::<f64>() / total_mass;
    Some(MacroBody {
        center_x,
        center_y,
        total_mass,
        cell_index,
    })
}
