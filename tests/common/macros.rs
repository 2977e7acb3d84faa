/// Asserts that every value of a slice lies in `[lo, hi]`.
#[macro_export]
macro_rules! assert_all_within {
    ($values:expr, $lo:expr, $hi:expr) => {
        for (i, v) in $values.iter().enumerate() {
            assert!(
                *v >= $lo && *v <= $hi,
                "value {} at index {} outside [{}, {}]",
                v,
                i,
                $lo,
                $hi
            );
        }
    };
}

/// Asserts that two floats differ by at most `eps`.
#[macro_export]
macro_rules! assert_close {
    ($a:expr, $b:expr, $eps:expr) => {
        let (a, b) = ($a as f32, $b as f32);
        assert!((a - b).abs() <= $eps, "{} is not within {} of {}", a, $eps, b);
    };
}

/// Asserts that a genome passes structural validation.
#[macro_export]
macro_rules! assert_valid_genome {
    ($genome:expr) => {
        if let Err(e) = biosoup_lib::genetics::validate_genome(&$genome) {
            panic!("genome {} is invalid: {}", $genome.id, e);
        }
    };
}
