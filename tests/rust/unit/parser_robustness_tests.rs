//! Unit tests for projection parsing edge cases and error handling
//!
//! Tests malformed projections, edge cases, and error conditions to ensure
//! robust parsing without panics.

#[cfg(test)]
mod parser_robustness_tests {
    use regroup::projection_parser::{ast::ProjectionAst, parse_projection};

    /// Test that malformed projections don't cause panics
    #[test]
    fn test_malformed_projections_no_panic() {
        let malformed = vec![
            "",
            "new",
            "new {",
            "new { }",
            "new { ,}",
            "new { a = }",
            "new Wrapper(",
            "new Wrapper(a,",
            "new Wrapper { A }",
            "new Wrapper { = a }",
            "customer..OrderSet",
            ".OrderSet",
            "customer.OrderSet)",
            "new { customer } trailing",
            "{ customer }",
        ];

        for projection in malformed {
            assert!(
                parse_projection(projection).is_err(),
                "Expected an error for: {:?}",
                projection
            );
        }
    }

    #[test]
    fn test_whitespace_is_insignificant_between_tokens() {
        let compact = parse_projection("new Wrapper(customer){B=customer.OrderSet}").unwrap();
        let spaced = parse_projection(
            "\n  new   Wrapper ( customer )\n  {\n    B = customer.OrderSet\n  }\n",
        )
        .unwrap();
        assert_eq!(compact, spaced);
    }

    #[test]
    fn test_unicode_identifiers() {
        let parsed = parse_projection("kunde.Bestellungen_ÄÖ").unwrap();
        let ProjectionAst::Path(path) = parsed else {
            panic!("expected a member path");
        };
        assert_eq!(path.root, "kunde");
        assert_eq!(path.members, vec!["Bestellungen_ÄÖ"]);
    }

    #[test]
    fn test_error_display_lists_context() {
        let err = parse_projection("new { customer.OrderSet").unwrap_err();
        let rendered = err.to_string();
        assert!(rendered.contains("Expected `}`"), "got: {}", rendered);
    }
}
