use murk_tests::{init_tracing, obfuscate, run_lua, test_seed};
use murk_transform::PassConfig;
use murk_transform::layers::{LayerKind, PayloadLayer};
use rand::SeedableRng;
use rand::rngs::StdRng;

#[test]
fn test_each_layer_kind_runs() {
    init_tracing();
    let source = "local x = 5 print(x + 1, 'ok')";
    for kind in LayerKind::ALL {
        let result = obfuscate(source, "default", &[kind], test_seed(30)).unwrap();
        assert!(!result.obfuscated_code.contains("print"), "{kind}");
        assert_eq!(
            run_lua(&result.obfuscated_code).unwrap(),
            vec!["6\tok"],
            "{kind}"
        );
    }
}

#[test]
fn test_rust_side_decode_recovers_module() {
    let mut rng = StdRng::seed_from_u64(31);
    let module = "local a = {1, 2, 3}\nreturn #a\n";
    for kind in LayerKind::ALL {
        let layer = PayloadLayer::new(kind, &PassConfig::default(), &mut rng);
        let framed = layer.encode(module.as_bytes());
        assert_eq!(layer.decode(&framed).unwrap(), module.as_bytes());
    }
}

#[test]
fn test_corrupted_payload_fails_closed() {
    let result = obfuscate("print('hi')", "default", &[LayerKind::Hex], test_seed(32)).unwrap();
    let code = result.obfuscated_code;

    // the payload is the longest quoted string in the stub
    let payload = code
        .split('"')
        .enumerate()
        .filter(|(i, _)| i % 2 == 1)
        .map(|(_, s)| s)
        .max_by_key(|s| s.len())
        .unwrap()
        .to_string();
    let corrupted = code.replacen(&payload, &format!("zz{}", &payload[2..]), 1);

    assert_eq!(run_lua(&corrupted).unwrap(), Vec::<String>::new());
}
