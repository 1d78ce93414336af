use ndarray::Array2;

/// Extract the largest connected bright region of a binary mask as its own
/// mask, using two-pass labeling with union-find and 4-connectivity.
///
/// Returns `None` when the input contains no true pixels.
pub fn largest_component(mask: &Array2<bool>) -> Option<Array2<bool>> {
    let (h, w) = mask.dim();
    if h == 0 || w == 0 {
        return None;
    }

    let mut labels = Array2::<u32>::zeros((h, w));
    let mut next_label: u32 = 1;
    // Union-find parent array. Index 0 unused; labels start at 1.
    let mut parent: Vec<u32> = vec![0; h * w / 2 + 2];

    // Pass 1: assign provisional labels.
    for row in 0..h {
        for col in 0..w {
            if !mask[[row, col]] {
                continue;
            }

            let up = if row > 0 { labels[[row - 1, col]] } else { 0 };
            let left = if col > 0 { labels[[row, col - 1]] } else { 0 };

            match (up > 0, left > 0) {
                (false, false) => {
                    if next_label as usize >= parent.len() {
                        parent.resize(parent.len() * 2, 0);
                    }
                    parent[next_label as usize] = next_label;
                    labels[[row, col]] = next_label;
                    next_label += 1;
                }
                (true, false) => {
                    labels[[row, col]] = up;
                }
                (false, true) => {
                    labels[[row, col]] = left;
                }
                (true, true) => {
                    let smaller = up.min(left);
                    let larger = up.max(left);
                    labels[[row, col]] = smaller;
                    if smaller != larger {
                        union(&mut parent, smaller, larger);
                    }
                }
            }
        }
    }

    if next_label == 1 {
        return None;
    }

    // Flatten parent references.
    for i in 1..next_label as usize {
        parent[i] = find(&parent, i as u32);
    }

    // Pass 2: count areas of resolved labels.
    let mut areas = vec![0usize; next_label as usize];
    for &lbl in labels.iter() {
        if lbl > 0 {
            areas[parent[lbl as usize] as usize] += 1;
        }
    }

    let best = areas
        .iter()
        .enumerate()
        .max_by_key(|(_, &area)| area)
        .map(|(label, _)| label as u32)?;

    let mut component = Array2::from_elem((h, w), false);
    for row in 0..h {
        for col in 0..w {
            let lbl = labels[[row, col]];
            if lbl > 0 && parent[lbl as usize] == best {
                component[[row, col]] = true;
            }
        }
    }
    Some(component)
}

fn find(parent: &[u32], mut x: u32) -> u32 {
    while parent[x as usize] != x {
        x = parent[x as usize];
    }
    x
}

fn union(parent: &mut [u32], a: u32, b: u32) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        // Merge larger root into smaller root to keep labels consistent.
        let (small, big) = if ra < rb { (ra, rb) } else { (rb, ra) };
        parent[big as usize] = small;
    }
}
