use ndarray::Array2;

/// Fill interior holes of a binary component.
///
/// Background pixels reachable from the image border (4-connectivity) stay
/// background; every other pixel becomes foreground. Equivalent to drawing
/// the component's external contour filled.
pub fn fill_holes(mask: &Array2<bool>) -> Array2<bool> {
    let (h, w) = mask.dim();
    if h == 0 || w == 0 {
        return mask.clone();
    }

    let mut outside = Array2::from_elem((h, w), false);
    let mut stack: Vec<(usize, usize)> = Vec::new();

    let mut push = |r: usize, c: usize, outside: &mut Array2<bool>, stack: &mut Vec<(usize, usize)>| {
        if !mask[[r, c]] && !outside[[r, c]] {
            outside[[r, c]] = true;
            stack.push((r, c));
        }
    };

    for c in 0..w {
        push(0, c, &mut outside, &mut stack);
        push(h - 1, c, &mut outside, &mut stack);
    }
    for r in 0..h {
        push(r, 0, &mut outside, &mut stack);
        push(r, w - 1, &mut outside, &mut stack);
    }

    while let Some((r, c)) = stack.pop() {
        if r > 0 {
            push(r - 1, c, &mut outside, &mut stack);
        }
        if r + 1 < h {
            push(r + 1, c, &mut outside, &mut stack);
        }
        if c > 0 {
            push(r, c - 1, &mut outside, &mut stack);
        }
        if c + 1 < w {
            push(r, c + 1, &mut outside, &mut stack);
        }
    }

    ndarray::Zip::from(mask)
        .and(&outside)
        .map_collect(|&set, &out| set || !out)
}

/// Dilate a binary mask with a disk structuring element of the given radius.
///
/// Implemented as a threshold on the squared Euclidean distance transform,
/// which keeps the cost linear in the pixel count regardless of the radius.
/// Dilation is monotonic: every set input pixel stays set.
pub fn dilate_disk(mask: &Array2<bool>, radius: usize) -> Array2<bool> {
    if radius == 0 {
        return mask.clone();
    }
    let dist2 = distance_transform_squared(mask);
    let r2 = (radius * radius) as f64;
    dist2.mapv(|d| d <= r2)
}

/// Squared Euclidean distance from each pixel to the nearest set pixel,
/// via the two-pass separable lower-envelope algorithm (Felzenszwalb &
/// Huttenlocher). Set pixels have distance 0; a mask with no set pixels
/// yields infinity everywhere.
pub fn distance_transform_squared(mask: &Array2<bool>) -> Array2<f64> {
    let (h, w) = mask.dim();
    let mut dist = Array2::<f64>::zeros((h, w));
    for ((r, c), d) in dist.indexed_iter_mut() {
        *d = if mask[[r, c]] { 0.0 } else { f64::INFINITY };
    }

    // Column pass.
    let mut line = vec![0.0f64; h.max(w)];
    for c in 0..w {
        for r in 0..h {
            line[r] = dist[[r, c]];
        }
        let transformed = dt_1d(&line[..h]);
        for r in 0..h {
            dist[[r, c]] = transformed[r];
        }
    }

    // Row pass.
    for r in 0..h {
        for c in 0..w {
            line[c] = dist[[r, c]];
        }
        let transformed = dt_1d(&line[..w]);
        for c in 0..w {
            dist[[r, c]] = transformed[c];
        }
    }

    dist
}

/// 1D squared distance transform: lower envelope of parabolas rooted at
/// `(i, f[i])`.
fn dt_1d(f: &[f64]) -> Vec<f64> {
    let n = f.len();
    let mut result = vec![0.0f64; n];
    if n == 0 {
        return result;
    }

    // v: parabola roots; z: boundaries between envelope segments.
    let mut v = vec![0usize; n];
    let mut z = vec![0.0f64; n + 1];
    let mut k = 0usize;
    z[0] = f64::NEG_INFINITY;
    z[1] = f64::INFINITY;

    for q in 1..n {
        if f[q].is_infinite() {
            continue;
        }
        loop {
            let p = v[k];
            let s = if f[p].is_infinite() {
                f64::NEG_INFINITY
            } else {
                ((f[q] + (q * q) as f64) - (f[p] + (p * p) as f64)) / (2.0 * (q - p) as f64)
            };
            if s <= z[k] {
                if k == 0 {
                    v[0] = q;
                    z[1] = f64::INFINITY;
                    break;
                }
                k -= 1;
                continue;
            }
            k += 1;
            v[k] = q;
            z[k] = s;
            z[k + 1] = f64::INFINITY;
            break;
        }
    }

    if f[v[0]].is_infinite() && k == 0 {
        // No finite source on this line.
        return f.to_vec();
    }

    let mut k2 = 0usize;
    for (q, out) in result.iter_mut().enumerate() {
        while z[k2 + 1] < q as f64 {
            k2 += 1;
        }
        let p = v[k2];
        let d = q as f64 - p as f64;
        *out = d * d + f[p];
    }
    result
}
