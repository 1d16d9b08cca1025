use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use pgp_keyring::prelude::*;

fn rsa_material(seed: u16, bytes: usize) -> KeyMaterial {
    let mut n: Vec<u8> = (0..bytes)
        .map(|i| (seed as usize).wrapping_mul(131).wrapping_add(i) as u8)
        .collect();
    n[0] = 0xC0 | (seed as u8 & 0x3F);
    n[1] = (seed >> 8) as u8;
    KeyMaterial::new(
        PublicKeyAlgorithm::Rsa,
        PublicMaterial::Rsa {
            n,
            e: vec![0x01, 0x00, 0x01],
        },
    )
}

fn primary_key(seed: u16) -> Key {
    let packet = KeyPacket::new_public(PacketTag::PublicKey, 1_600_000_000, rsa_material(seed, 256));
    let mut key = Key::from_packet(packet, KeyStoreFormat::Gpg).unwrap();
    let idx = key.add_userid(UserId::new(&format!("user{}@example.org", seed))).unwrap();
    let cert = Signature {
        sig_type: SignatureType::CertPositive,
        version: 4,
        alg: key.alg(),
        hash_alg: 8,
        creation_time: 1_600_000_000,
        issuer_keyid: Some(*key.keyid()),
        issuer_fingerprint: Some(*key.fingerprint()),
        material: vec![0x42; 256],
    };
    key.add_signature(cert, Some(idx)).unwrap();
    key
}

fn grip_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("grip");

    for bits in [2048usize, 3072, 4096].iter() {
        let material = rsa_material(1, bits / 8);
        group.bench_with_input(BenchmarkId::new("rsa", bits), bits, |b, _| {
            b.iter(|| compute_grip(&material))
        });
    }

    for curve in [Curve::NistP256, Curve::NistP521, Curve::Ed25519].iter() {
        let point = if curve.has_prefixed_point() {
            vec![0x40; 33]
        } else {
            let size = (curve.params().bits + 7) / 8;
            vec![0x04; 1 + 2 * size]
        };
        let material = KeyMaterial::new(
            PublicKeyAlgorithm::Ecdsa,
            PublicMaterial::Ec {
                curve: *curve,
                point,
                kdf: None,
            },
        );
        group.bench_with_input(
            BenchmarkId::new("ec", curve.params().name),
            curve,
            |b, _| b.iter(|| compute_grip(&material)),
        );
    }

    group.finish();
}

fn store_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_store");

    for count in [100u16, 1000].iter() {
        let keys: Vec<Key> = (0..*count).map(primary_key).collect();

        group.bench_with_input(BenchmarkId::new("bulk_add", count), count, |b, _| {
            b.iter(|| {
                let mut store = KeyStore::new(KeyStoreFormat::Gpg, "pubring.gpg").unwrap();
                for key in &keys {
                    store.add_key(key.clone()).unwrap();
                }
                store
            })
        });

        let mut populated = KeyStore::new(KeyStoreFormat::Gpg, "pubring.gpg").unwrap();
        for key in &keys {
            populated.add_key(key.clone()).unwrap();
        }
        group.bench_with_input(BenchmarkId::new("bulk_merge", count), count, |b, _| {
            b.iter(|| {
                for key in &keys {
                    populated.add_key(key.clone()).unwrap();
                }
            })
        });

        let search = KeySearch::UserId(format!("user{}@example.org", count - 1));
        group.bench_with_input(BenchmarkId::new("search_last", count), count, |b, _| {
            b.iter(|| populated.search(&search, None).unwrap().is_some())
        });
    }

    group.finish();
}

criterion_group!(benches, grip_benchmarks, store_benchmarks);
criterion_main!(benches);
