#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pgp_keyring::secure_memory::{with_secure_scope, SecureBytes};

#[derive(Arbitrary, Debug)]
struct SecureMemoryFuzzInput {
    initial: Vec<u8>,
    appends: Vec<Vec<u8>>,
    replacement: Vec<u8>,
    capacity: u16,
}

fuzz_target!(|input: SecureMemoryFuzzInput| {
    let mut buffer = SecureBytes::with_capacity(input.capacity as usize);
    buffer.extend_from_slice(&input.initial);

    let mut expected = input.initial.clone();
    for chunk in &input.appends {
        buffer.extend_from_slice(chunk);
        expected.extend_from_slice(chunk);
    }
    assert_eq!(buffer.as_bytes(), expected.as_slice());
    assert_eq!(buffer, SecureBytes::from(expected));

    buffer.set(&input.replacement);
    assert_eq!(buffer.as_bytes(), input.replacement.as_slice());

    let len = with_secure_scope(&mut buffer, |data| data.len());
    assert_eq!(len, input.replacement.len());

    buffer.clear();
    assert!(buffer.is_empty());
});
