use murk_core::EncryptionKey;
use murk_core::SymbolAlphabet;
use murk_tests::{init_tracing, obfuscate, run_lua, test_seed};
use rand::SeedableRng;
use rand::rngs::StdRng;

#[test]
fn test_single_character_literal_round_trips() {
    init_tracing();
    let result = obfuscate("print(\"A\")", "literals", &[], test_seed(1)).unwrap();

    assert!(!result.obfuscated_code.contains("\"A\""));
    assert_eq!(result.metadata.literals_encrypted, 1);
    assert_eq!(run_lua(&result.obfuscated_code).unwrap(), vec!["A"]);
}

#[test]
fn test_awkward_strings_round_trip_at_runtime() {
    init_tracing();
    let source = r#"
print("h\u{e9}llo \u{2713}", "quote\"inside", 'tab\tand\\slash')
print("100% {#symbols}: !$&()*+,-./:;<=>?@[]^|~", [[long
bracket]], "\0\255" == "\0\255")
print("" .. "x", ('%d-%s'):format(7, "y"))
"#;
    let expected = run_lua(source).unwrap();
    let result = obfuscate(source, "literals", &[], test_seed(2)).unwrap();

    assert!(!result.obfuscated_code.contains("quote"));
    assert!(!result.obfuscated_code.contains("symbols"));
    // the empty literal is skipped
    assert!(result.obfuscated_code.contains("\"\" .."));
    assert_eq!(run_lua(&result.obfuscated_code).unwrap(), expected);
}

#[test]
fn test_long_bracket_line_breaks_match_runtime() {
    init_tracing();
    let source = "local s = [[a\r\nb\rc]]\r\nprint(#s, s == \"a\\nb\\nc\")\r\n";
    let expected = run_lua(source).unwrap();
    assert_eq!(expected, vec!["5\ttrue"]);

    let result = obfuscate(source, "literals", &[], test_seed(5)).unwrap();
    assert_eq!(result.metadata.literals_encrypted, 2);
    assert_eq!(run_lua(&result.obfuscated_code).unwrap(), expected);
}

#[test]
fn test_integers_are_decomposed_and_floats_kept() {
    init_tracing();
    let source = "local big = 123456 print(big + 0x10, 2.5, -7, 2^3)";
    let result = obfuscate(source, "literals", &[], test_seed(3)).unwrap();

    assert!(!result.obfuscated_code.contains("123456"));
    assert!(result.obfuscated_code.contains("2.5"));
    assert_eq!(result.metadata.numbers_decomposed, 5);
    assert_eq!(
        run_lua(&result.obfuscated_code).unwrap(),
        run_lua(source).unwrap()
    );
}

#[test]
fn test_equal_constants_get_different_operands() {
    let result = obfuscate("print(42, 42, 42)", "literals", &[], test_seed(4)).unwrap();
    let code = result.obfuscated_code.trim();
    let inner = code
        .strip_prefix("print(")
        .and_then(|rest| rest.strip_suffix(')'))
        .unwrap();
    let parts: Vec<&str> = inner.split(", ").collect();
    assert_eq!(parts.len(), 3);
    assert!(parts[0] != parts[1] || parts[1] != parts[2]);
}

#[test]
fn test_key_and_alphabet_round_trip() {
    let mut rng = StdRng::seed_from_u64(99);
    let key = EncryptionKey::generate(&mut rng, 8, 16);
    let alphabet = SymbolAlphabet::shuffled(&mut rng);
    for sample in ["", "A", "\u{e9}\u{2713}", "\"\\"] {
        let framed = alphabet.encode(&key.xor(sample.as_bytes()));
        assert!(framed.chars().all(|c| !c.is_alphanumeric() && c != '"' && c != '\\'));
        let back = key.xor(&alphabet.decode(&framed).unwrap());
        assert_eq!(back, sample.as_bytes());
    }
}
