/// Property-based tests using proptest
/// Tests invariants of the CEP shape check that should hold for all inputs
use enrollment_api::services::{is_valid_cep, CEP_LENGTH};
use proptest::prelude::*;

proptest! {
    #[test]
    fn cep_validation_never_panics(cep in "\\PC*") {
        let _ = is_valid_cep(&cep);
    }

    #[test]
    fn eight_digit_ceps_are_accepted(cep in "[0-9]{8}") {
        prop_assert!(is_valid_cep(&cep));
    }

    #[test]
    fn wrong_length_is_rejected(cep in "[0-9]{0,20}") {
        prop_assume!(cep.len() != CEP_LENGTH);
        prop_assert!(!is_valid_cep(&cep));
    }

    #[test]
    fn non_numeric_start_is_rejected(head in "[a-zA-Z]", tail in "[0-9]{7}") {
        let cep = format!("{}{}", head, tail);
        prop_assert!(!is_valid_cep(&cep));
    }

    #[test]
    fn numeric_prefix_with_trailing_garbage_is_accepted(
        head in "[0-9]{1,7}",
        tail in "[a-wyz-]{7}"
    ) {
        let cep: String = format!("{}{}", head, tail).chars().take(CEP_LENGTH).collect();
        prop_assert!(is_valid_cep(&cep));
    }

    #[test]
    fn hex_prefix_without_hex_digit_is_rejected(
        sign in "[+-]?",
        x in "[xX]",
        tail in "[g-z]{6}"
    ) {
        let cep: String = format!("{}0{}{}", sign, x, tail).chars().take(CEP_LENGTH).collect();
        prop_assume!(cep.encode_utf16().count() == CEP_LENGTH);
        prop_assert!(!is_valid_cep(&cep));
    }

    #[test]
    fn nel_is_not_leading_whitespace(tail in "[0-9]{7}") {
        let cep = format!("\u{85}{}", tail);
        prop_assert!(!is_valid_cep(&cep));
    }

    #[test]
    fn astral_characters_count_as_two(head in "[0-9]{7}") {
        let cep = format!("{}\u{1F600}", head);
        prop_assert!(!is_valid_cep(&cep));
    }
}
