#![no_main]

use libfuzzer_sys::fuzz_target;
use pgp_keyring::key_store::{KeyCodec, KeyStore, KeyStoreFormat, NativeCodec};

fuzz_target!(|data: &[u8]| {
    // Decoding must fail cleanly on malformed input
    if NativeCodec.decode(data).is_err() {
        return;
    }

    // What loads must re-encode and load again with the same keys
    let mut store = match KeyStore::new(KeyStoreFormat::Gpg, "fuzz.gpg") {
        Ok(store) => store,
        Err(_) => return,
    };
    if store.load_from_bytes(&NativeCodec, data).is_err() {
        return;
    }

    let encoded = store.write_to_bytes(&NativeCodec).expect("loaded store must encode");
    let mut reloaded = KeyStore::new(KeyStoreFormat::Gpg, "fuzz.gpg").expect("store creation");
    reloaded
        .load_from_bytes(&NativeCodec, &encoded)
        .expect("encoded store must decode");
    assert_eq!(reloaded.key_count(), store.key_count());
});
