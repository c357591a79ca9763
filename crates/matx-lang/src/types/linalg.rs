//! Pure matrix and quaternion math: no `Value`s, no diagnostics.
//!
//! Matrices are column-major: element (row, col) = data[col * N + row].
//! Quaternions are stored `[x, y, z, w]`, scalar part last.

// ─── Shared square-matrix kernels ────────────────────────────────────────────

fn mul_into(a: &[f64], b: &[f64], n: usize, out: &mut [f64]) {
    for col in 0..n {
        for row in 0..n {
            out[col * n + row] = (0..n).map(|k| a[k * n + row] * b[col * n + k]).sum();
        }
    }
}

/// Column-vector transform: `m * v`.
fn transform_into(m: &[f64], v: &[f64], n: usize, out: &mut [f64]) {
    for (row, slot) in out.iter_mut().enumerate().take(n) {
        *slot = (0..n).map(|col| m[col * n + row] * v[col]).sum();
    }
}

/// Row-vector transform: `v * m`.
fn row_transform_into(v: &[f64], m: &[f64], n: usize, out: &mut [f64]) {
    for (col, slot) in out.iter_mut().enumerate().take(n) {
        *slot = (0..n).map(|row| v[row] * m[col * n + row]).sum();
    }
}

fn transpose_into(m: &[f64], n: usize, out: &mut [f64]) {
    for col in 0..n {
        for row in 0..n {
            out[row * n + col] = m[col * n + row];
        }
    }
}

// ─── Mat3 ────────────────────────────────────────────────────────────────────

pub type M3 = [f64; 9];

pub fn m3_identity() -> M3 {
    [1., 0., 0.,
     0., 1., 0.,
     0., 0., 1.]
}

pub fn m3_mul(a: &M3, b: &M3) -> M3 {
    let mut c = [0.0; 9];
    mul_into(a, b, 3, &mut c);
    c
}

pub fn m3_mul_vec(m: &M3, v: &[f64; 3]) -> [f64; 3] {
    let mut r = [0.0; 3];
    transform_into(m, v, 3, &mut r);
    r
}

pub fn vec_mul_m3(v: &[f64; 3], m: &M3) -> [f64; 3] {
    let mut r = [0.0; 3];
    row_transform_into(v, m, 3, &mut r);
    r
}

pub fn m3_transpose(m: &M3) -> M3 {
    let mut t = [0.0; 9];
    transpose_into(m, 3, &mut t);
    t
}

pub fn m3_det(m: &M3) -> f64 {
    m[0] * (m[4] * m[8] - m[5] * m[7])
  - m[3] * (m[1] * m[8] - m[2] * m[7])
  + m[6] * (m[1] * m[5] - m[2] * m[4])
}

// ─── Mat4 ────────────────────────────────────────────────────────────────────

pub type M4 = [f64; 16];

pub fn m4_identity() -> M4 {
    [1., 0., 0., 0.,
     0., 1., 0., 0.,
     0., 0., 1., 0.,
     0., 0., 0., 1.]
}

pub fn m4_mul(a: &M4, b: &M4) -> M4 {
    let mut c = [0.0; 16];
    mul_into(a, b, 4, &mut c);
    c
}

pub fn m4_mul_vec(m: &M4, v: &[f64; 4]) -> [f64; 4] {
    let mut r = [0.0; 4];
    transform_into(m, v, 4, &mut r);
    r
}

pub fn vec_mul_m4(v: &[f64; 4], m: &M4) -> [f64; 4] {
    let mut r = [0.0; 4];
    row_transform_into(v, m, 4, &mut r);
    r
}

pub fn m4_transpose(m: &M4) -> M4 {
    let mut t = [0.0; 16];
    transpose_into(m, 4, &mut t);
    t
}

/// Determinant of the 3×3 minor left after deleting `skip_row` and `skip_col`.
fn minor3(m: &M4, skip_row: usize, skip_col: usize) -> f64 {
    let keep = |skip: usize| {
        let mut idx = [0usize; 3];
        for (slot, i) in idx.iter_mut().zip((0..4).filter(|&i| i != skip)) {
            *slot = i;
        }
        idx
    };
    let (rows, cols) = (keep(skip_row), keep(skip_col));
    let a = |r: usize, c: usize| m[cols[c] * 4 + rows[r]];
    a(0, 0) * (a(1, 1) * a(2, 2) - a(1, 2) * a(2, 1))
  - a(0, 1) * (a(1, 0) * a(2, 2) - a(1, 2) * a(2, 0))
  + a(0, 2) * (a(1, 0) * a(2, 1) - a(1, 1) * a(2, 0))
}

pub fn m4_det(m: &M4) -> f64 {
    (0..4)
        .map(|col| {
            let sign = if col % 2 == 0 { 1.0 } else { -1.0 };
            sign * m[col * 4] * minor3(m, 0, col)
        })
        .sum()
}

// ─── Quaternions ─────────────────────────────────────────────────────────────

pub type Q = [f64; 4];

/// Hamilton product `p * q`.
pub fn q_mul(p: &Q, q: &Q) -> Q {
    let [px, py, pz, pw] = *p;
    let [qx, qy, qz, qw] = *q;
    [
        px * qw + pw * qx + py * qz - pz * qy,
        py * qw + pw * qy + pz * qx - px * qz,
        pz * qw + pw * qz + px * qy - py * qx,
        pw * qw - px * qx - py * qy - pz * qz,
    ]
}

pub fn q_conj(q: &Q) -> Q {
    [-q[0], -q[1], -q[2], q[3]]
}

pub fn q_norm_sq(q: &Q) -> f64 {
    q.iter().map(|c| c * c).sum()
}

pub fn q_length(q: &Q) -> f64 {
    q_norm_sq(q).sqrt()
}

/// Conjugate over squared norm. The zero quaternion inverts to itself.
pub fn q_inverse(q: &Q) -> Q {
    let dot = q_norm_sq(q);
    if dot == 0.0 {
        return [0.0; 4];
    }
    let inv = 1.0 / dot;
    let [x, y, z, w] = q_conj(q);
    [x * inv, y * inv, z * inv, w * inv]
}

/// `p / q` as `p * q⁻¹`.
pub fn q_div(p: &Q, q: &Q) -> Q {
    q_mul(p, &q_inverse(q))
}

/// Rotates `v` by `q` (assumed unit length).
pub fn q_rotate(q: &Q, v: &[f64; 3]) -> [f64; 3] {
    let [qx, qy, qz, qw] = *q;
    let [vx, vy, vz] = *v;
    let tx = 2.0 * (qy * vz - qz * vy);
    let ty = 2.0 * (qz * vx - qx * vz);
    let tz = 2.0 * (qx * vy - qy * vx);
    [
        vx + qw * tx + (qy * tz - qz * ty),
        vy + qw * ty + (qz * tx - qx * tz),
        vz + qw * tz + (qx * ty - qy * tx),
    ]
}

/// Real power in polar form: `|q|^t (cos tθ + n̂ sin tθ)`.
pub fn q_pow(q: &Q, t: f64) -> Q {
    let len = q_length(q);
    if len == 0.0 {
        return [0.0; 4];
    }
    let theta = (q[3] / len).clamp(-1.0, 1.0).acos();
    let scale = len.powf(t);
    let axis_len = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2]).sqrt();
    if axis_len == 0.0 {
        return [0.0, 0.0, 0.0, scale * (t * theta).cos()];
    }
    let (sin, cos) = (t * theta).sin_cos();
    let k = scale * sin / axis_len;
    [q[0] * k, q[1] * k, q[2] * k, scale * cos]
}
