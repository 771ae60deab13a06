use murk_core::ReservedSet;
use murk_tests::{init_tracing, obfuscate, run_lua, test_seed};
use murk_transform::names::RenameTable;
use murk_transform::rename::substitute;
use std::collections::HashSet;

const SOURCE: &str = r#"
local inventory = {}
local function add(item, count)
  inventory[item] = (inventory[item] or 0) + count
  return inventory[item]
end
add("apple", 2)
add("apple", 3)
local keys = {}
for fruit, amount in pairs(inventory) do
  keys[#keys + 1] = fruit .. "=" .. amount
end
print(table.concat(keys, ","), string.format("%d", add("pear", 1)))
"#;

#[test]
fn test_renaming_is_injective_and_total() {
    init_tracing();
    let result = obfuscate(SOURCE, "rename", &[], test_seed(5)).unwrap();
    let mapping = &result.rename_mapping;

    for name in ["inventory", "add", "item", "count", "keys", "fruit", "amount"] {
        assert!(mapping.contains_key(name), "{name} was not renamed");
        let pattern = format!("local {name}");
        assert!(!result.obfuscated_code.contains(&pattern));
    }
    let replacements: HashSet<&String> = mapping.values().collect();
    assert_eq!(replacements.len(), mapping.len(), "two names share a replacement");
    assert_eq!(result.metadata.identifiers_renamed, mapping.len());

    assert_eq!(
        run_lua(&result.obfuscated_code).unwrap(),
        run_lua(SOURCE).unwrap()
    );
}

#[test]
fn test_reserved_names_are_never_renamed() {
    let result = obfuscate(SOURCE, "literals,rename", &[], test_seed(6)).unwrap();
    let reserved = ReservedSet::lua();
    for original in result.rename_mapping.keys() {
        assert!(!reserved.contains(original), "{original} is reserved");
    }
    for kept in ["pairs", "table.concat", "string.format", "print", "local function"] {
        assert!(result.obfuscated_code.contains(kept), "{kept} disappeared");
    }
}

#[test]
fn test_substitution_twice_equals_once() {
    let result = obfuscate(SOURCE, "rename", &[], test_seed(7)).unwrap();
    let mut table = RenameTable::new();
    for (from, to) in &result.rename_mapping {
        table.insert(from.clone(), to.clone()).unwrap();
    }
    let once = substitute(SOURCE, &table).unwrap();
    let twice = substitute(&once, &table).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_same_seed_same_names() {
    let a = obfuscate(SOURCE, "default", &[], test_seed(8)).unwrap();
    let b = obfuscate(SOURCE, "default", &[], test_seed(8)).unwrap();
    let c = obfuscate(SOURCE, "default", &[], test_seed(9)).unwrap();
    assert_eq!(a.obfuscated_code, b.obfuscated_code);
    assert_eq!(a.rename_mapping, b.rename_mapping);
    assert_ne!(a.obfuscated_code, c.obfuscated_code);
}

#[test]
fn test_runtime_table_fields_keep_their_names() {
    init_tracing();
    let source = r#"
local stamp = os.date("!*t", 86400 * 365)
print(stamp.year, stamp.month, stamp.day, stamp.hour, stamp.isdst)
local back = os.time({ year = stamp.year, month = stamp.month, day = stamp.day, hour = 12 })
print(os.date("%Y-%m-%d", back))
"#;
    let result = obfuscate(source, "rename", &[], test_seed(11)).unwrap();
    assert!(result.rename_mapping.contains_key("stamp"));
    for field in ["year", "month", "day", "hour", "isdst"] {
        assert!(!result.rename_mapping.contains_key(field), "{field} was renamed");
    }
    let expected = run_lua(source).unwrap();
    assert_eq!(expected[0], "1971\t1\t1\t0\tfalse");
    assert_eq!(run_lua(&result.obfuscated_code).unwrap(), expected);
}

#[test]
fn test_string_keyed_fields_are_not_renamed_with_dotted_access() {
    // Renaming is lexical: `t["b"]` keeps its key while `t.b` is rewritten,
    // so mixing the two spellings for one field loses the value.
    let source = r#"local t = { ["b"] = 2 } print(t.b)"#;
    assert_eq!(run_lua(source).unwrap(), vec!["2"]);

    let result = obfuscate(source, "rename", &[], test_seed(12)).unwrap();
    assert!(result.rename_mapping.contains_key("b"));
    assert!(result.obfuscated_code.contains("[\"b\"]"));
    assert_eq!(run_lua(&result.obfuscated_code).unwrap(), vec!["nil"]);
}
