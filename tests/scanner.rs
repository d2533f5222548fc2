#[cfg(test)]
mod scanner_tests {
    use loxwalk as lox;

    use lox::error::LoxError;
    use lox::scanner::*;
    use lox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_two_char_operators_are_greedy() {
        assert_token_sequence(
            "!= ! == = <= < >= >",
            &[
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::BANG, "!"),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::EQUAL, "="),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::LESS, "<"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::GREATER, ">"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_ternary_tokens() {
        assert_token_sequence(
            "a ? b : c",
            &[
                (TokenType::IDENTIFIER, "a"),
                (TokenType::QUESTION, "?"),
                (TokenType::IDENTIFIER, "b"),
                (TokenType::COLON, ":"),
                (TokenType::IDENTIFIER, "c"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_keywords_override_identifiers() {
        assert_token_sequence(
            "class self this super fun classy _x",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::SELF, "self"),
                (TokenType::IDENTIFIER, "this"),
                (TokenType::SUPER, "super"),
                (TokenType::FUN, "fun"),
                (TokenType::IDENTIFIER, "classy"),
                (TokenType::IDENTIFIER, "_x"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_05_numbers() {
        let (tokens, errors) = Scanner::new("12 3.25 7.").scan_all();
        assert!(errors.is_empty());

        let kinds: Vec<&TokenType> = tokens.iter().map(|t| &t.token_type).collect();
        assert!(matches!(kinds[0], TokenType::NUMBER(n) if *n == 12.0));
        assert!(matches!(kinds[1], TokenType::NUMBER(n) if *n == 3.25));
        // A trailing dot is not part of the number.
        assert!(matches!(kinds[2], TokenType::NUMBER(n) if *n == 7.0));
        assert_eq!(*kinds[3], TokenType::DOT);
        assert_eq!(*kinds[4], TokenType::EOF);
    }

    #[test]
    fn test_scanner_06_comments_are_skipped() {
        assert_token_sequence(
            "1 // line comment\n/* outer /* inner */ still outer */ 2",
            &[
                (TokenType::NUMBER(0.0), "1"),
                (TokenType::NUMBER(0.0), "2"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_07_block_comment_counts_lines() {
        let (tokens, errors) = Scanner::new("/* a\nb\n*/ x").scan_all();
        assert!(errors.is_empty());
        assert_eq!(tokens[0].lexeme, "x");
        assert_eq!(tokens[0].line, 3);
    }

    #[test]
    fn test_scanner_08_unterminated_block_comment() {
        let (tokens, errors) = Scanner::new("/* /* */ never closed").scan_all();

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].to_string(),
            "[line 1] Error: Unterminated block comment."
        );
        assert_eq!(tokens.last().map(|t| &t.token_type), Some(&TokenType::EOF));
    }

    #[test]
    fn test_scanner_09_strings() {
        let (tokens, errors) = Scanner::new("\"hi\nthere\" \"open").scan_all();

        assert_eq!(
            tokens[0].token_type,
            TokenType::STRING(String::new()),
            "expected a STRING token"
        );
        assert_eq!(tokens[0].to_string(), "STRING \"hi\nthere\" hi\nthere");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "[line 2] Error: Unterminated string.");
    }

    #[test]
    fn test_scanner_10_token_display() {
        let (tokens, _) = Scanner::new("var x = 3; 2.5").scan_all();
        let rendered: Vec<String> = tokens.iter().map(ToString::to_string).collect();

        assert_eq!(
            rendered,
            [
                "VAR var null",
                "IDENTIFIER x null",
                "EQUAL = null",
                "NUMBER 3 3.0",
                "SEMICOLON ; null",
                "NUMBER 2.5 2.5",
                "EOF  null",
            ]
        );
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let scanner = Scanner::new(source);

        // Collect all results (both tokens and errors)
        let results: Vec<_> = scanner.collect();

        // We expect this sequence:
        // 0: COMMA ','
        // 1: DOT '.'
        // 2: Error for '$'
        // 3: LEFT_PAREN '('
        // 4: Error for '#'
        // 5: EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let errors: Vec<String> = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .map(ToString::to_string)
            .collect();

        assert_eq!(
            errors,
            [
                "[line 1] Error: Unexpected character: $",
                "[line 1] Error: Unexpected character: #",
            ]
        );

        fn assert_token_matches(
            result: &Result<Token, LoxError>,
            expected_type: TokenType,
            expected_lexeme: &str,
        ) {
            match result {
                Ok(token) => {
                    assert_eq!(
                        token.token_type, expected_type,
                        "Expected token type {:?}, got {:?}",
                        expected_type, token.token_type
                    );
                    assert_eq!(
                        token.lexeme, expected_lexeme,
                        "Expected lexeme '{}', got '{}'",
                        expected_lexeme, token.lexeme
                    );
                }
                Err(e) => panic!("Expected token but got error: {}", e),
            }
        }
    }

    #[test]
    fn test_scanner_11_multibyte_unexpected_character() {
        let (tokens, errors) = Scanner::new("a é b").scan_all();

        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], LoxError::Lex { line: 1, .. }));
        assert_eq!(tokens.len(), 3); // a, b, EOF
    }

    #[test]
    fn test_scanner_12_fused_after_eof() {
        let mut scanner = Scanner::new("");
        assert!(matches!(scanner.next(), Some(Ok(t)) if t.token_type == TokenType::EOF));
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }
}
