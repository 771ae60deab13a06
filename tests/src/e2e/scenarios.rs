//! End to end scenarios: obfuscate, then execute the artifact under a
//! reference Lua interpreter and compare against the plain program.

use murk_tests::{SAMPLE_PROGRAM, init_tracing, obfuscate, run_lua, test_seed};
use murk_transform::layers::LayerKind;

#[test]
fn test_local_arithmetic_prints_six() {
    init_tracing();
    let result = obfuscate("local x = 5 print(x + 1)", "default", &[], test_seed(40)).unwrap();
    assert_eq!(run_lua(&result.obfuscated_code).unwrap(), vec!["6"]);
}

#[test]
fn test_layer_counts_are_observationally_equal() {
    init_tracing();
    let expected = run_lua(SAMPLE_PROGRAM).unwrap();
    assert_eq!(expected.len(), 3);

    let stacks: [&[LayerKind]; 4] = [
        &[],
        &[LayerKind::Hex],
        &[LayerKind::Xor, LayerKind::Base64],
        &[LayerKind::Symbol, LayerKind::Hex],
    ];
    for (i, layers) in stacks.into_iter().enumerate() {
        let result = obfuscate(SAMPLE_PROGRAM, "all", layers, test_seed(41 + i as u8)).unwrap();
        assert_eq!(result.metadata.layers_applied, layers);
        assert_eq!(
            run_lua(&result.obfuscated_code).unwrap(),
            expected,
            "layers {layers:?}"
        );
    }
}

#[test]
fn test_result_reports_sizes() {
    let result = obfuscate(SAMPLE_PROGRAM, "all", &[LayerKind::Xor], test_seed(45)).unwrap();
    assert_eq!(result.original_size, SAMPLE_PROGRAM.len());
    assert_eq!(result.obfuscated_size, result.obfuscated_code.len());
    assert!(result.size_increase_percentage > 0.0);
    assert_eq!(
        result.metadata.transforms_applied,
        vec![
            "LiteralEncryptor",
            "IdentifierRenamer",
            "GlobalIndirection",
            "ControlFlowFlattener"
        ]
    );
}

#[test]
fn test_pass_order_does_not_matter() {
    let a = obfuscate(SAMPLE_PROGRAM, "flatten,globals,rename,literals", &[], test_seed(46));
    let b = obfuscate(SAMPLE_PROGRAM, "all", &[], test_seed(46));
    assert_eq!(a.unwrap().obfuscated_code, b.unwrap().obfuscated_code);
}

#[test]
fn test_malformed_source_is_a_parse_error() {
    let err = obfuscate("local function (", "default", &[], test_seed(47)).unwrap_err();
    assert!(err.is_parse_error());
}

#[test]
fn test_unknown_pass_is_rejected() {
    let err = obfuscate("print(1)", "literals,teleport", &[], test_seed(48)).unwrap_err();
    assert!(matches!(err, murk_transform::Error::InvalidPass(name) if name == "teleport"));
}
