use rand::distributions::Alphanumeric;
use rand::Rng;

use super::rng::get_crypto_rng;

/// Length of the opaque codes embedded into emailed links.
pub const LIFECYCLE_CODE_LENGTH: usize = 26;

/// Generate a single-use lifecycle code (activation, recovery, deletion,
/// unlock). Drawn from a CSPRNG only - never derived from the account id or
/// the clock.
pub fn generate_code() -> String {
    get_crypto_rng()
        .sample_iter(&Alphanumeric)
        .take(LIFECYCLE_CODE_LENGTH)
        .map(char::from)
        .collect()
}

/// Generate a short numeric code for the email two-factor step.
pub fn generate_two_factor_code() -> String {
    let code: u32 = get_crypto_rng().gen_range(0..1_000_000);
    format!("{code:06}")
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn codes_are_alphanumeric_and_fixed_length() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), LIFECYCLE_CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn ten_thousand_codes_have_no_collisions() {
        let codes: HashSet<String> = (0..10_000).map(|_| generate_code()).collect();
        assert_eq!(codes.len(), 10_000);
    }

    #[test]
    fn two_factor_codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_two_factor_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn two_factor_codes_keep_leading_zeros() {
        let mut found_zero_start = false;
        for _ in 0..1000 {
            if generate_two_factor_code().starts_with('0') {
                found_zero_start = true;
                break;
            }
        }
        assert!(found_zero_start);
    }
}
