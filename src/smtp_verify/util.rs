use rand::{Rng, distributions::Alphanumeric};

pub const DECOY_LEN: usize = 24;

/// Improbable local part used to detect catch-all servers. Never equal to
/// `target`.
pub fn random_local_part(target: &str) -> String {
    let mut rng = rand::thread_rng();
    loop {
        let candidate: String = (&mut rng)
            .sample_iter(&Alphanumeric)
            .take(DECOY_LEN)
            .map(|byte| char::from(byte).to_ascii_lowercase())
            .collect();
        if !candidate.eq_ignore_ascii_case(target) {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoy_is_lowercase_alphanumeric() {
        let decoy = random_local_part("john");
        assert_eq!(decoy.len(), DECOY_LEN);
        assert!(
            decoy
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        );
        assert_ne!(decoy, random_local_part("john"));
    }
}
