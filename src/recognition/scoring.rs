use std::cmp::Reverse;

/// Digit-string lengths of the UPC/EAN family (EAN-8, UPC-A, EAN-13)
pub const PLAUSIBLE_LENGTHS: [usize; 3] = [8, 12, 13];

/// Sort key for a candidate; lower is better.
///
/// Plausible barcode lengths come first, then longer strings.
pub fn candidate_score(candidate: &str) -> (u8, Reverse<usize>) {
    let len = candidate.len();
    let length_class = if PLAUSIBLE_LENGTHS.contains(&len) { 0 } else { 1 };
    (length_class, Reverse(len))
}

/// Pick the best candidate. Exact ties go to the earliest candidate.
pub fn select_winner<S: AsRef<str>>(candidates: &[S]) -> Option<&str> {
    candidates
        .iter()
        .map(AsRef::as_ref)
        .min_by_key(|c| candidate_score(c))
}
