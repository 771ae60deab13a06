use murk_core::seed::Seed;
use rand::RngCore;

#[test]
fn test_deterministic_rng() {
    let seed = Seed::from_hex("0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef")
        .unwrap();

    let mut rng1 = seed.create_deterministic_rng();
    let mut rng2 = seed.create_deterministic_rng();

    assert_eq!(rng1.next_u32(), rng2.next_u32());
    assert_eq!(rng1.next_u64(), rng2.next_u64());
}

#[test]
fn test_hash_deterministic() {
    let seed = Seed::from_hex("0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef")
        .unwrap();
    assert_eq!(seed.hash(), seed.hash());

    let hash_hex = seed.hash_hex();
    assert!(hash_hex.starts_with("0x"));
    assert_eq!(hash_hex.len(), 66);
}

#[test]
fn test_different_seeds_different_rngs() {
    let seed1 =
        Seed::from_hex("0x1111111111111111111111111111111111111111111111111111111111111111")
            .unwrap();
    let seed2 =
        Seed::from_hex("0x2222222222222222222222222222222222222222222222222222222222222222")
            .unwrap();

    let mut rng1 = seed1.create_deterministic_rng();
    let mut rng2 = seed2.create_deterministic_rng();

    assert_ne!(rng1.next_u64(), rng2.next_u64());
}

#[test]
fn test_seed_hex_round_trip_and_errors() {
    let seed = Seed::generate();
    assert_eq!(Seed::from_hex(&seed.to_hex()).unwrap(), seed);
    assert!(Seed::from_hex("0x1234").is_err());
    assert!(Seed::from_hex(&"zz".repeat(32)).is_err());
}

#[test]
fn test_debug_hides_seed() {
    let seed = Seed::from_hex(&"ab".repeat(32)).unwrap();
    let printed = format!("{seed:?}");
    assert!(!printed.contains(&"ab".repeat(32)));
    assert!(printed.contains(&seed.hash_hex()));
}
