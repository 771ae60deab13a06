use murk_tests::{eval_lua, init_tracing, obfuscate, run_lua, test_seed};

#[test]
fn test_flatten_preserves_statement_order() {
    init_tracing();
    let source = "print(1) print(2) local x = 3 print(x) print('four') print(5)";
    let result = obfuscate(source, "flatten", &[], test_seed(20)).unwrap();

    assert_eq!(result.metadata.dispatch_states, 5);
    assert!(result.obfuscated_code.contains("pcall"));
    assert_eq!(
        run_lua(&result.obfuscated_code).unwrap(),
        vec!["1", "2", "3", "four", "5"]
    );
}

#[test]
fn test_flatten_swallows_runtime_errors() {
    let source = "print('before') error('boom') print('after')";
    assert!(run_lua(source).is_err());

    let result = obfuscate(source, "flatten", &[], test_seed(21)).unwrap();
    // the error ends the program quietly instead of propagating
    assert_eq!(run_lua(&result.obfuscated_code).unwrap(), vec!["before"]);
}

#[test]
fn test_flatten_forwards_return_values() {
    let source = "local M = {} M.answer = 42 return M.answer, 'done'";
    let result = obfuscate(source, "default", &[], test_seed(22)).unwrap();
    let (answer, tag): (i64, String) = eval_lua(&result.obfuscated_code).unwrap();
    assert_eq!(answer, 42);
    assert_eq!(tag, "done");
}

#[test]
fn test_flatten_handles_loops_and_closures() {
    let source = r#"
local fns = {}
for i = 1, 3 do
  fns[i] = function() return i * i end
end
local n = 0
while n < 3 do
  n = n + 1
  if n == 2 then goto skip end
  print(fns[n]())
  ::skip::
end
"#;
    let result = obfuscate(source, "default", &[], test_seed(23)).unwrap();
    assert_eq!(run_lua(&result.obfuscated_code).unwrap(), vec!["1", "9"]);
}
