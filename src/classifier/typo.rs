use textdistance::str::levenshtein;
use tracing::debug;

/// Closest typo target within the allowed edit distance, if any.
///
/// Short targets only tolerate a single edit; targets of nine characters or
/// more (`gmail.com`, `hotmail.com`…) tolerate two.
pub(crate) fn closest_target<'a>(domain: &str, targets: &'a [String]) -> Option<&'a str> {
    let mut best: Option<(&str, usize)> = None;
    for target in targets {
        let distance = levenshtein(domain, target);
        if distance == 0 {
            return None;
        }
        let allowed = if target.len() >= 9 { 2 } else { 1 };
        if distance > allowed {
            continue;
        }
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((target.as_str(), distance));
        }
    }
    if let Some((target, distance)) = best {
        debug!("domain {domain} looks like a typo of {target} (distance {distance})");
    }
    best.map(|(target, _)| target)
}
