//! Greedy maximum-coverage selection over corruption bitmaps

use fxhash::FxHashSet;

use crate::analysis::CorruptionMatrix;

/// Select up to `budget` candidates maximizing covered (output, vector) bits
///
/// Selection starts from the mandatory prefix (the hybrid path feeds its
/// best clique here) and adds, at each step, the candidate with the most
/// newly covered bits, ties to the lower index. Candidates whose row is
/// bit-identical to an earlier candidate's can never add coverage once the
/// earlier one is considered, so only the first of each equivalence class
/// competes. Stops early when no candidate improves coverage.
pub fn select_max_coverage(m: &CorruptionMatrix, budget: usize, mandatory: &[usize]) -> Vec<usize> {
    let mut representative = vec![false; m.nb_candidates()];
    let mut seen_rows: FxHashSet<&[u64]> = FxHashSet::default();
    for c in 0..m.nb_candidates() {
        if seen_rows.insert(m.row(c)) {
            representative[c] = true;
        }
    }

    let mut covered = vec![0u64; m.nb_words()];
    let mut selected = Vec::new();
    let mut in_selection = vec![false; m.nb_candidates()];
    for c in mandatory.iter().take(budget) {
        selected.push(*c);
        in_selection[*c] = true;
        for (w, r) in covered.iter_mut().zip(m.row(*c)) {
            *w |= r;
        }
    }

    while selected.len() < budget {
        let mut best: Option<(usize, usize)> = None;
        for c in 0..m.nb_candidates() {
            if !representative[c] || in_selection[c] {
                continue;
            }
            let gain: usize = m
                .row(c)
                .iter()
                .zip(&covered)
                .map(|(r, w)| (r & !w).count_ones() as usize)
                .sum();
            if gain > 0 && best.map_or(true, |(_, g)| gain > g) {
                best = Some((c, gain));
            }
        }
        match best {
            Some((c, _)) => {
                selected.push(c);
                in_selection[c] = true;
                for (w, r) in covered.iter_mut().zip(m.row(c)) {
                    *w |= r;
                }
            }
            None => break,
        }
    }
    selected
}

/// Fraction of (output, vector) bits disturbed by at least one selected signal
pub fn corruption_cover(m: &CorruptionMatrix, selection: &[usize]) -> f64 {
    if m.nb_bits() == 0 {
        return 0.0;
    }
    let mut covered = vec![0u64; m.nb_words()];
    for c in selection {
        for (w, r) in covered.iter_mut().zip(m.row(*c)) {
            *w |= r;
        }
    }
    let nb: usize = covered.iter().map(|w| w.count_ones() as usize).sum();
    nb as f64 / m.nb_bits() as f64
}

/// Average corruption of the selection over (output, vector) bits
///
/// On 0/1 bitmaps this coincides with [`corruption_cover`]; it is kept
/// separate so weighted bitmaps can diverge later.
pub fn corruption_rate(m: &CorruptionMatrix, selection: &[usize]) -> f64 {
    corruption_cover(m, selection)
}
