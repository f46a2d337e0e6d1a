//! Minimum-cost square assignment (Hungarian algorithm, primal-dual
//! shortest-augmenting-path formulation, O(n^3)).
//!
//! Kept as a pure function over a cost matrix so the solver can be
//! tested independently of the tool-domain logic that builds the costs.

/// Solves the square assignment problem: `result[row] = column` such
/// that total `cost[row][result[row]]` is minimal. `cost` must be
/// square; an empty matrix yields an empty assignment.
pub fn assign(cost: &[Vec<f64>]) -> Vec<usize> {
    let n = cost.len();
    if n == 0 {
        return Vec::new();
    }
    debug_assert!(cost.iter().all(|row| row.len() == n));

    // Index n is the virtual row/column used to seed each augmentation.
    let mut u = vec![0.0_f64; n + 1];
    let mut v = vec![0.0_f64; n + 1];
    let mut matched_row = vec![n; n + 1]; // matched_row[col] = row, n = free
    let mut way = vec![0usize; n + 1];

    for row in 0..n {
        matched_row[n] = row;
        let mut j0 = n;
        let mut minv = vec![f64::INFINITY; n + 1];
        let mut used = vec![false; n + 1];

        loop {
            used[j0] = true;
            let i0 = matched_row[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = n;

            for j in 0..n {
                if used[j] {
                    continue;
                }
                let reduced = cost[i0][j] - u[i0] - v[j];
                if reduced < minv[j] {
                    minv[j] = reduced;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }

            for j in 0..=n {
                if used[j] {
                    u[matched_row[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }

            j0 = j1;
            if matched_row[j0] == n {
                break;
            }
        }

        // Augment along the alternating path back to the virtual column.
        loop {
            let j1 = way[j0];
            matched_row[j0] = matched_row[j1];
            j0 = j1;
            if j0 == n {
                break;
            }
        }
    }

    let mut result = vec![0usize; n];
    for (col, &row) in matched_row.iter().enumerate().take(n) {
        result[row] = col;
    }
    result
}

/// Total cost of an assignment under a cost matrix.
pub fn assignment_cost(cost: &[Vec<f64>], assignment: &[usize]) -> f64 {
    assignment
        .iter()
        .enumerate()
        .map(|(row, &col)| cost[row][col])
        .sum()
}
