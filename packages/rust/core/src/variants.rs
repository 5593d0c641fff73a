//! Capitalization variants of monster names.
//!
//! The catalog capitalizes words inconsistently ("Bouftou royal" next to
//! "Chef de Guerre Bouftou"), so an exact-name miss is retried with every
//! combination of upper-cased word starts.
//!
//! A letter is eligible when it directly follows an apostrophe, or directly
//! follows a space and is not itself followed by an apostrophe (the `d` of
//! `" d'"` stays lower-case). A name with `n` eligible letters yields
//! `2^n - 1` variants, one per non-empty subset. Catalog names have `n <= 4`
//! in practice; the output is not capped, so callers feeding arbitrary text
//! should expect exponential growth in both memory and catalog queries.

use std::collections::BTreeSet;

/// Char indices (not byte offsets) of the letters that may be upper-cased.
pub fn eligible_positions(name: &str) -> Vec<usize> {
    let chars: Vec<char> = name.chars().collect();

    (1..chars.len())
        .filter(|&i| {
            if !chars[i].is_alphabetic() {
                return false;
            }
            match chars[i - 1] {
                '\'' => true,
                ' ' => chars.get(i + 1) != Some(&'\''),
                _ => false,
            }
        })
        .collect()
}

/// Every variant of `name` with at least one eligible letter upper-cased.
///
/// Variants that coincide (letters already upper-case) are collapsed, and a
/// name whose eligible letters are all upper-case yields itself. The set is
/// ordered only so iteration is deterministic.
pub fn name_variants(name: &str) -> BTreeSet<String> {
    let chars: Vec<char> = name.chars().collect();
    let positions = eligible_positions(name);

    // Powerset of `positions`, built by doubling.
    let mut subsets: Vec<Vec<usize>> = vec![Vec::new()];
    for &pos in &positions {
        let with_pos: Vec<Vec<usize>> = subsets
            .iter()
            .map(|subset| {
                let mut subset = subset.clone();
                subset.push(pos);
                subset
            })
            .collect();
        subsets.extend(with_pos);
    }

    subsets
        .iter()
        .filter(|subset| !subset.is_empty())
        .map(|subset| render(&chars, subset))
        .collect()
}

fn render(chars: &[char], upper: &[usize]) -> String {
    let mut out = String::with_capacity(chars.len());
    for (i, c) in chars.iter().enumerate() {
        if upper.contains(&i) {
            out.extend(c.to_uppercase());
        } else {
            out.push(*c);
        }
    }
    out
}
