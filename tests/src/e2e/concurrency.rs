//! Concurrent runs sharing one configuration must not share run state.

use murk_core::seed::Seed;
use murk_tests::{init_tracing, run_lua};
use murk_transform::obfuscator::{ObfuscationConfig, obfuscate_source};
use murk_transform::{PassConfig, build_passes};
use std::collections::HashSet;

fn program(prefix: &str, value: i64) -> String {
    format!(
        "local {prefix}_base = {value}\n\
         local function {prefix}_twice(n_) return n_ * 2 end\n\
         print('{prefix}', {prefix}_twice({prefix}_base))\n"
    )
}

#[test]
fn test_concurrent_runs_have_independent_tables() {
    init_tracing();
    let mut config = ObfuscationConfig::with_seed(Seed::generate());
    config.transforms = build_passes("all", &PassConfig::default()).unwrap();
    let config = &config;

    let outputs = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                scope.spawn(move || {
                    let prefix = format!("task{i}");
                    let source = program(&prefix, i);
                    (prefix, obfuscate_source(&source, config).unwrap())
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect::<Vec<_>>()
    });

    for (i, (prefix, result)) in outputs.iter().enumerate() {
        let keys: HashSet<&str> = result.rename_mapping.keys().map(String::as_str).collect();
        let expected: HashSet<String> = ["base", "twice"]
            .iter()
            .map(|suffix| format!("{prefix}_{suffix}"))
            .chain(std::iter::once("n_".to_string()))
            .collect();
        assert_eq!(
            keys,
            expected.iter().map(String::as_str).collect::<HashSet<_>>(),
            "run {prefix} saw foreign names"
        );

        let printed = run_lua(&result.obfuscated_code).unwrap();
        assert_eq!(printed, vec![format!("{prefix}\t{}", i * 2)]);
    }
}

#[test]
fn test_same_config_repeated_runs_do_not_accumulate() {
    let mut config = ObfuscationConfig::with_seed(Seed::generate());
    config.transforms = build_passes("rename", &PassConfig::default()).unwrap();

    let first = obfuscate_source("local alpha = 1 print(alpha)", &config).unwrap();
    let second = obfuscate_source("local beta = 2 print(beta)", &config).unwrap();
    assert_eq!(first.rename_mapping.keys().collect::<Vec<_>>(), vec!["alpha"]);
    assert_eq!(second.rename_mapping.keys().collect::<Vec<_>>(), vec!["beta"]);
}
