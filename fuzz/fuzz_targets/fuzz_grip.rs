#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pgp_keyring::grip::{compute_grip, Curve};
use pgp_keyring::key::{compute_fingerprint, KeyMaterial, PublicKeyAlgorithm, PublicMaterial};

#[derive(Arbitrary, Debug)]
enum FuzzMaterial {
    Rsa { n: Vec<u8>, e: Vec<u8> },
    Dsa { p: Vec<u8>, q: Vec<u8>, g: Vec<u8>, y: Vec<u8> },
    Elgamal { p: Vec<u8>, g: Vec<u8>, y: Vec<u8> },
    Ec { curve: u8, point: Vec<u8> },
}

#[derive(Arbitrary, Debug)]
struct GripFuzzInput {
    algorithm: u8,
    creation_time: u32,
    material: FuzzMaterial,
}

fuzz_target!(|input: GripFuzzInput| {
    let public = match input.material {
        FuzzMaterial::Rsa { n, e } => PublicMaterial::Rsa { n, e },
        FuzzMaterial::Dsa { p, q, g, y } => PublicMaterial::Dsa { p, q, g, y },
        FuzzMaterial::Elgamal { p, g, y } => PublicMaterial::Elgamal { p, g, y },
        FuzzMaterial::Ec { curve, point } => PublicMaterial::Ec {
            curve: Curve::ALL[curve as usize % Curve::ALL.len()],
            point,
            kdf: None,
        },
    };
    let material = KeyMaterial::new(PublicKeyAlgorithm::from_id(input.algorithm), public);

    // Any material either yields a grip or an error, and the same grip twice
    if let Ok(grip) = compute_grip(&material) {
        assert_eq!(compute_grip(&material).ok(), Some(grip));
    }
    let _ = compute_fingerprint(input.creation_time, &material);
});
