//! Native sparse LU factorization
//!
//! Left-looking (Gilbert–Peierls) elimination with threshold partial pivoting:
//! column `k` of the factors is obtained by a sparse triangular solve with the
//! columns of `L` computed so far. The non-zero pattern of that solve is found
//! by a depth-first search over the graph of `L`, so the work per column is
//! proportional to the arithmetic actually performed.
//!
//! The result satisfies `P·A·Q = L·U` where `Q` takes columns in the order of
//! `perm_c` and `P` sends original row `i` to position `perm_r[i]`.

use super::{DirectSolver, FactorStats, FactorStatus};
use crate::ordering::is_permutation;
use crate::sparse::CscStorage;
use crate::traits::ComplexField;
use num_traits::{FromPrimitive, One, Zero};

/// Marks a row that has not been chosen as a pivot yet
const UNASSIGNED: usize = usize::MAX;

/// Sparse LU engine.
///
/// `fill_limit` caps the number of entries stored in `L` and `U` together;
/// exceeding it is reported as a memory overflow status.
#[derive(Debug, Clone, Default)]
pub struct SparseLu {
    /// Maximum number of factor entries, `None` for no limit
    pub fill_limit: Option<usize>,
}

impl SparseLu {
    /// Create an engine without a fill limit
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine that gives up after `limit` factor entries
    pub fn with_fill_limit(limit: usize) -> Self {
        Self {
            fill_limit: Some(limit),
        }
    }
}

/// Triangular factors of a sparse LU factorization.
///
/// Rows are stored in pivot order. Within a column, `L` holds its unit
/// diagonal first and `U` holds its diagonal last; the remaining rows are
/// not sorted.
#[derive(Debug, Clone)]
pub struct LuFactors<T: ComplexField> {
    n: usize,
    l: CscStorage<T>,
    u: CscStorage<T>,
}

impl<T: ComplexField> LuFactors<T> {
    /// Dimension of the factored matrix
    pub fn dim(&self) -> usize {
        self.n
    }

    /// Unit lower triangular factor
    pub fn l(&self) -> &CscStorage<T> {
        &self.l
    }

    /// Upper triangular factor
    pub fn u(&self) -> &CscStorage<T> {
        &self.u
    }
}

/// Scratch space for one [`SparseLu`] factorization
#[derive(Debug)]
pub struct LuWorkspace<T: ComplexField> {
    /// Dense accumulator for the current column
    x: Vec<T>,
    /// DFS visit flags, one per row
    marked: Vec<bool>,
    /// Reach of the current column, valid from `top` to the end
    pattern: Vec<usize>,
    /// DFS node stack
    stack: Vec<usize>,
    /// DFS resume position per node
    pstack: Vec<usize>,
    stats: FactorStats,
}

impl<T: ComplexField> LuWorkspace<T> {
    fn new(n: usize) -> Self {
        Self {
            x: vec![T::zero(); n],
            marked: vec![false; n],
            pattern: vec![0; n],
            stack: Vec::with_capacity(n),
            pstack: vec![0; n],
            stats: FactorStats::default(),
        }
    }

    fn reset(&mut self, n: usize) {
        self.x.clear();
        self.x.resize(n, T::zero());
        self.marked.clear();
        self.marked.resize(n, false);
        self.pattern.resize(n, 0);
        self.pstack.resize(n, 0);
        self.stack.clear();
        self.stats = FactorStats::default();
    }

    /// Statistics of the last factorization run in this workspace
    pub fn stats(&self) -> FactorStats {
        self.stats
    }
}

impl<T: ComplexField> DirectSolver<T> for SparseLu {
    type Factors = LuFactors<T>;
    type Workspace = LuWorkspace<T>;

    fn workspace(&self, n: usize) -> LuWorkspace<T> {
        LuWorkspace::new(n)
    }

    fn factor(
        &self,
        ws: &mut LuWorkspace<T>,
        a: &CscStorage<T>,
        pivot_threshold: f64,
        perm_c: &[usize],
        perm_r: &mut [usize],
    ) -> Result<LuFactors<T>, FactorStatus> {
        if !a.is_square() {
            return Err(-1);
        }
        if !(0.0..=1.0).contains(&pivot_threshold) {
            return Err(-2);
        }
        let n = a.ncols;
        if perm_c.len() != n || !is_permutation(perm_c) {
            return Err(-3);
        }
        if perm_r.len() != n {
            return Err(-4);
        }

        ws.reset(n);
        let tol = T::Real::from_f64(pivot_threshold).unwrap_or_else(T::Real::one);
        perm_r.fill(UNASSIGNED);

        let mut l_ptrs = Vec::with_capacity(n + 1);
        let mut l_rows = Vec::with_capacity(a.nnz());
        let mut l_vals: Vec<T> = Vec::with_capacity(a.nnz());
        let mut u_ptrs = Vec::with_capacity(n + 1);
        let mut u_rows = Vec::with_capacity(a.nnz());
        let mut u_vals: Vec<T> = Vec::with_capacity(a.nnz());
        let mut interchanges = 0;

        for (k, &col) in perm_c.iter().enumerate() {
            l_ptrs.push(l_rows.len());
            u_ptrs.push(u_rows.len());

            let a_range = a.col_range(col);
            let top = reach(&a.row_indices[a_range.clone()], &l_ptrs, &l_rows, perm_r, ws);

            // Sparse triangular solve x = L \ A(:, col)
            for &i in &ws.pattern[top..] {
                ws.x[i] = T::zero();
            }
            for idx in a_range {
                ws.x[a.row_indices[idx]] += a.values[idx];
            }
            for &j in &ws.pattern[top..] {
                let jnew = perm_r[j];
                if jnew == UNASSIGNED {
                    continue;
                }
                let xj = ws.x[j];
                for p in (l_ptrs[jnew] + 1)..l_ptrs[jnew + 1] {
                    ws.x[l_rows[p]] -= l_vals[p] * xj;
                }
            }

            // Rows already pivoted form column k of U; the largest
            // remaining entry is the pivot candidate
            let mut ipiv = None;
            let mut amax = T::Real::zero();
            for &i in &ws.pattern[top..] {
                if perm_r[i] == UNASSIGNED {
                    let t = ws.x[i].norm();
                    if t > amax {
                        amax = t;
                        ipiv = Some(i);
                    }
                } else {
                    u_rows.push(perm_r[i]);
                    u_vals.push(ws.x[i]);
                }
            }
            let Some(mut ipiv) = ipiv else {
                return Err((k + 1) as FactorStatus);
            };

            // Keep the diagonal when it is within the threshold of the maximum
            if perm_r[col] == UNASSIGNED {
                let diag = ws.x[col].norm();
                if diag > T::Real::zero() && diag >= amax * tol {
                    ipiv = col;
                }
            }
            if ipiv != col {
                interchanges += 1;
            }

            let pivot = ws.x[ipiv];
            u_rows.push(k);
            u_vals.push(pivot);
            perm_r[ipiv] = k;
            l_rows.push(ipiv);
            l_vals.push(T::one());
            for &i in &ws.pattern[top..] {
                if perm_r[i] == UNASSIGNED {
                    l_rows.push(i);
                    l_vals.push(ws.x[i] / pivot);
                }
                ws.x[i] = T::zero();
                ws.marked[i] = false;
            }

            if let Some(limit) = self.fill_limit {
                let used = l_rows.len() + u_rows.len();
                if used > limit {
                    return Err((n + used) as FactorStatus);
                }
            }
        }

        l_ptrs.push(l_rows.len());
        u_ptrs.push(u_rows.len());
        for row in &mut l_rows {
            *row = perm_r[*row];
        }

        ws.stats = FactorStats {
            original_nnz: a.nnz(),
            l_nnz: l_rows.len(),
            u_nnz: u_rows.len(),
            row_interchanges: interchanges,
        };

        Ok(LuFactors {
            n,
            l: CscStorage {
                nrows: n,
                ncols: n,
                values: l_vals,
                row_indices: l_rows,
                col_ptrs: l_ptrs,
            },
            u: CscStorage {
                nrows: n,
                ncols: n,
                values: u_vals,
                row_indices: u_rows,
                col_ptrs: u_ptrs,
            },
        })
    }

    fn solve(&self, factors: &LuFactors<T>, perm_r: &[usize], perm_c: &[usize], rhs: &mut [T]) {
        let n = factors.n;
        let (l, u) = (&factors.l, &factors.u);

        let mut y = vec![T::zero(); n];
        for (i, &b) in rhs.iter().enumerate() {
            y[perm_r[i]] = b;
        }

        // L is unit lower triangular, diagonal stored first
        for k in 0..n {
            let yk = y[k];
            for p in (l.col_ptrs[k] + 1)..l.col_ptrs[k + 1] {
                y[l.row_indices[p]] -= l.values[p] * yk;
            }
        }

        // U diagonal stored last
        for k in (0..n).rev() {
            let last = u.col_ptrs[k + 1] - 1;
            y[k] /= u.values[last];
            let yk = y[k];
            for p in u.col_ptrs[k]..last {
                y[u.row_indices[p]] -= u.values[p] * yk;
            }
        }

        for (k, &col) in perm_c.iter().enumerate() {
            rhs[col] = y[k];
        }
    }

    fn stats(&self, ws: &LuWorkspace<T>) -> FactorStats {
        ws.stats
    }
}

/// Find the rows reachable from the pattern of `a_rows` in the graph of `L`.
///
/// On return `ws.pattern[top..]` lists them in topological order and the
/// visited rows are left marked. Returns `top`.
fn reach<T: ComplexField>(
    a_rows: &[usize],
    l_ptrs: &[usize],
    l_rows: &[usize],
    perm_r: &[usize],
    ws: &mut LuWorkspace<T>,
) -> usize {
    let mut top = ws.pattern.len();
    for &start in a_rows {
        if ws.marked[start] {
            continue;
        }
        ws.stack.push(start);
        while let Some(&j) = ws.stack.last() {
            let jnew = perm_r[j];
            let end = if jnew == UNASSIGNED { 0 } else { l_ptrs[jnew + 1] };
            if !ws.marked[j] {
                ws.marked[j] = true;
                ws.pstack[j] = if jnew == UNASSIGNED { 0 } else { l_ptrs[jnew] };
            }

            let mut descended = false;
            while ws.pstack[j] < end {
                let i = l_rows[ws.pstack[j]];
                ws.pstack[j] += 1;
                if !ws.marked[i] {
                    ws.stack.push(i);
                    descended = true;
                    break;
                }
            }

            if !descended {
                ws.stack.pop();
                top -= 1;
                ws.pattern[top] = j;
            }
        }
    }
    top
}
