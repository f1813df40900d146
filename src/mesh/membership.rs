use super::grid::Cell;

/// Returns the indices of the particles whose position falls inside `cell`.
///
/// Each call scans the position arrays independently; there is no shared
/// state across cells, so memberships for different cells can be computed
/// in any order. A particle exactly on a shared edge lands in the cell
/// whose lower bound it equals (half-open interval). Particles outside the
/// cell grid entirely are simply absent from every membership - callers
/// are responsible for keeping positions inside the domain.
pub fn particles_in_cell(rx: &[f64], ry: &[f64], cell: &Cell) -> Vec<usize> {
    rx.iter()
        .zip(ry.iter())
        .enumerate()
        .filter(|(_, (&x, &y))| cell.contains(x, y))
        .map(|(i, _)| i)
        .collect()
}

/// Like [`particles_in_cell`], but restricted to a candidate index list.
/// Used by the refiner, which re-buckets only the parent cell's members.
pub fn particles_in_cell_subset(
    rx: &[f64],
    ry: &[f64],
    candidates: &[usize],
    cell: &Cell,
) -> Vec<usize> {
    candidates
        .iter()
        .copied()
        .filter(|&i| cell.contains(rx[i], ry[i]))
        .collect()
}
