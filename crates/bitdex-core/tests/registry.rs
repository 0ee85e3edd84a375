//! The process-wide chain registry. Coins share network magics, so this
//! file runs as one sequential test in its own process.

use bitdex_core::chain::{self, ChainParams};
use bitdex_core::{ChainTag, Coin, CoreError};

#[test]
fn registry_lifecycle() {
    // Every coin resolves once the registry is cleared for it.
    for coin in Coin::ALL {
        chain::reset();
        let main = chain::lookup(coin, "main").expect("main network");
        assert_eq!(main.coin, coin);
        assert_eq!(main.tag, ChainTag::Main);
        assert!(chain::is_registered(main), "{} not registered", main.label());
        assert_eq!(
            chain::lookup_by_magic(main.magic).map(ChainParams::label),
            Some(main.label())
        );
        // Unknown tags resolve to main.
        assert_eq!(chain::lookup(coin, "mainnet-ish").expect("fallback"), main);
    }

    // Bitcoin testnet3 and Groestlcoin testnet share a magic.
    chain::reset();
    let bitcoin_test = chain::lookup(Coin::Bitcoin, "test").expect("bitcoin");
    assert!(matches!(
        chain::lookup(Coin::Groestlcoin, "main"),
        Err(CoreError::RegistrationConflict { magic, .. }) if magic == bitcoin_test.magic
    ));

    // Re-registering the same record is harmless, a different chain on a
    // taken magic is not.
    chain::register(bitcoin_test).expect("idempotent");
    let impostor: &'static ChainParams = Box::leak(Box::new(ChainParams {
        coin: Coin::Litecoin,
        ..bitcoin_test.clone()
    }));
    assert!(matches!(
        chain::register(impostor),
        Err(CoreError::RegistrationConflict { .. })
    ));

    // Regtest records are served without registration.
    let regtest = chain::lookup(Coin::Bitcoin, "regtest").expect("regtest");
    assert_eq!(regtest.tag, ChainTag::Regtest);
    assert!(!chain::is_registered(regtest));

    chain::reset();
    assert!(chain::lookup_by_magic(bitcoin_test.magic).is_none());
}
