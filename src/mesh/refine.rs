use std::collections::HashSet;

use log::debug;

use crate::errors::SimError;

use super::grid::{Cell, MeshSpec};
use super::membership::particles_in_cell_subset;

/// A below-threshold cell produced by refinement, small enough for the
/// O(k^2) pairwise kernel.
#[derive(Debug, Clone)]
pub struct LeafCell {
    pub cell: Cell,
    pub members: Vec<usize>,
}

/// Subdivides an over-dense cell until every leaf holds at most
/// `threshold` particles.
///
/// Each subdivision re-applies the grid generator with the same fan-out,
/// centered on the parent cell, and re-buckets only the parent's members.
/// Driven by an explicit worklist rather than native recursion, so the
/// depth is bounded by memory, not the call stack.
///
/// Termination: sub-cell sides shrink geometrically, so members with
/// distinct positions separate once the side falls below their coordinate
/// difference. A sub-cell whose members all coincide can never be
/// separated and is accepted as a leaf even above threshold, as is a
/// single-particle cell. Every particle of the input membership lands in
/// exactly one leaf.
pub fn refine_cell(
    cell: Cell,
    members: Vec<usize>,
    rx: &[f64],
    ry: &[f64],
    fanout: usize,
    threshold: usize,
) -> Result<Vec<LeafCell>, SimError> {
    let mut leaves = Vec::new();
    let mut worklist = vec![(cell, members)];
    while let Some((cell, members)) = worklist.pop() {
        if members.len() <= threshold || members.len() <= 1 {
            leaves.push(LeafCell { cell, members });
            continue;
        }
        let (center_x, center_y) = cell.center();
        let spec = MeshSpec::with_center(fanout, cell.side / 2.0, center_x, center_y)?;
        debug!(
            "refining cell at ({}, {}) holding {} particles into {} sub-cells",
            cell.origin_x,
            cell.origin_y,
            members.len(),
            spec.cell_count()
        );
        let mut placed: HashSet<usize> = HashSet::with_capacity(members.len());
        for sub in spec.cells() {
            let sub_members = particles_in_cell_subset(rx, ry, &members, &sub);
            if sub_members.is_empty() {
                continue;
            }
            placed.extend(sub_members.iter().copied());
            let first = sub_members[0];
            let coincident = sub_members
                .iter()
                .all(|&i| rx[i] == rx[first] && ry[i] == ry[first]);
            // Coincident members can never be separated, and a fan-out of
            // two "subdivides" into a single cell of the parent's size;
            // both would recurse forever.
            if coincident || sub.side >= cell.side {
                leaves.push(LeafCell {
                    cell: sub,
                    members: sub_members,
                });
            } else {
                worklist.push((sub, sub_members));
            }
        }
        // Float rounding at the parent's edges can leave a member outside
        // every sub-cell; such stragglers form their own leaf rather than
        // dropping out of the step.
        let leftover: Vec<usize> = members
            .iter()
            .copied()
            .filter(|i| !placed.contains(i))
            .collect();
        if !leftover.is_empty() {
            leaves.push(LeafCell {
                cell,
                members: leftover,
            });
        }
    }
    Ok(leaves)
}
