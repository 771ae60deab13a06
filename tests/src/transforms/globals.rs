use murk_tests::{SAMPLE_PROGRAM, init_tracing, obfuscate, run_lua, test_seed};

#[test]
fn test_globals_and_keywords_go_through_table() {
    init_tracing();
    let source = "local ok = true print(type(ok), tostring(false), nil == false)";
    let result = obfuscate(source, "literals,rename,globals", &[], test_seed(10)).unwrap();
    let code = &result.obfuscated_code;

    for hidden in ["print", "tostring", "type(", "true", "false"] {
        assert!(!code.contains(hidden), "{hidden} still visible");
    }
    assert_eq!(result.metadata.globals_indirected, 3);
    assert_eq!(run_lua(code).unwrap(), run_lua(source).unwrap());
}

#[test]
fn test_rebound_globals_stay_direct() {
    let source = r#"
local print = print
local function tostring(v) return "<" .. type(v) .. ">" end
print(tostring(1))
"#;
    let result = obfuscate(source, "globals", &[], test_seed(11)).unwrap();
    // `print` and `tostring` are bound by the program; only `type` moves.
    assert_eq!(result.metadata.globals_indirected, 1);
    assert!(result.obfuscated_code.contains("local print = print"));
    assert_eq!(run_lua(&result.obfuscated_code).unwrap(), vec!["<number>"]);
}

#[test]
fn test_sample_program_with_every_transform() {
    init_tracing();
    let expected = run_lua(SAMPLE_PROGRAM).unwrap();
    let result = obfuscate(SAMPLE_PROGRAM, "all", &[], test_seed(12)).unwrap();
    assert!(result.metadata.globals_indirected >= 4);
    assert_eq!(run_lua(&result.obfuscated_code).unwrap(), expected);
}
