use criterion::{criterion_group, criterion_main, Criterion, black_box};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use esm::bfv::encoding::encode_slots;
use esm::bfv::encrypt::{decrypt, encrypt_pk_with_rng};
use esm::bfv::eval::{bfv_add, bfv_cumulative_add, bfv_mul_and_relin};
use esm::bfv::keygen::{
    gen_key_material_with_rng, gen_public_key_with_rng, gen_relin_key_with_rng,
    gen_secret_key_with_rng,
};
use esm::matcher::{Matcher, MatcherConfig};
use esm::params::presets::compact_bfv;

fn bfv_keygen(c: &mut Criterion) {
    let params = compact_bfv().unwrap();
    let mut rng = ChaCha20Rng::seed_from_u64(0);

    c.bench_function("bfv_keygen_secret", |b| {
        b.iter(|| gen_secret_key_with_rng(black_box(&params), &mut rng))
    });

    let sk = gen_secret_key_with_rng(&params, &mut rng).unwrap();
    c.bench_function("bfv_keygen_public", |b| {
        b.iter(|| gen_public_key_with_rng(black_box(&sk), &mut rng))
    });

    c.bench_function("bfv_keygen_relin", |b| {
        b.iter(|| gen_relin_key_with_rng(black_box(&sk), &mut rng))
    });
}

fn bfv_encrypt_decrypt(c: &mut Criterion) {
    let params = compact_bfv().unwrap();
    let mut rng = ChaCha20Rng::seed_from_u64(1);
    let keys = gen_key_material_with_rng(&params, &mut rng).unwrap();
    let slots: Vec<u64> = (0..params.slot_count() as u64).map(|i| i & 1).collect();
    let pt = encode_slots(&slots, &params).unwrap();

    c.bench_function("bfv_encrypt_pk", |b| {
        b.iter(|| encrypt_pk_with_rng(black_box(&pt), &keys.public, &mut rng))
    });

    let ct = encrypt_pk_with_rng(&pt, &keys.public, &mut rng).unwrap();
    c.bench_function("bfv_decrypt", |b| {
        b.iter(|| decrypt(black_box(&ct), &keys.secret))
    });
}

fn bfv_eval(c: &mut Criterion) {
    let params = compact_bfv().unwrap();
    let mut rng = ChaCha20Rng::seed_from_u64(2);
    let keys = gen_key_material_with_rng(&params, &mut rng).unwrap();
    let slots: Vec<u64> = (0..params.slot_count() as u64).map(|i| (i >> 1) & 1).collect();
    let pt = encode_slots(&slots, &params).unwrap();
    let ct1 = encrypt_pk_with_rng(&pt, &keys.public, &mut rng).unwrap();
    let ct2 = encrypt_pk_with_rng(&pt, &keys.public, &mut rng).unwrap();

    c.bench_function("bfv_add", |b| {
        b.iter(|| bfv_add(black_box(&ct1), black_box(&ct2)))
    });

    c.bench_function("bfv_mul_and_relin", |b| {
        b.iter(|| bfv_mul_and_relin(black_box(&ct1), black_box(&ct2), &keys.relin))
    });

    c.bench_function("bfv_cumulative_add", |b| {
        b.iter(|| bfv_cumulative_add(black_box(&ct1), &keys.galois))
    });
}

fn matcher_equal(c: &mut Criterion) {
    let matcher = Matcher::ready(MatcherConfig::default()).unwrap();
    let a = matcher.encrypt_str("hello world").unwrap();
    let b = matcher.encrypt_str("hello world").unwrap();

    let mut group = c.benchmark_group("matcher");
    group.sample_size(10);
    group.bench_function("encrypt_str", |bench| {
        bench.iter(|| matcher.encrypt_str(black_box("hello world")))
    });
    group.bench_function("equal", |bench| {
        bench.iter(|| matcher.equal(black_box(&a), black_box(&b)))
    });
    group.finish();
}

criterion_group!(benches, bfv_keygen, bfv_encrypt_decrypt, bfv_eval, matcher_equal);
criterion_main!(benches);
