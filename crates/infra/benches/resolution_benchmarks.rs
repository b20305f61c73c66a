//! Cached vs uncached resolution cost.
//!
//! The guard chain runs on every protected navigation; these benchmarks
//! keep an eye on the two paths it can take: a full membership + grant
//! derivation against the directory, and a resolution-cache hit.

use std::sync::Arc;

use chrono::Utc;
use criterion::{Criterion, black_box, criterion_group, criterion_main};

use mostrador_auth::AuthorizationOracle;
use mostrador_core::AuthUserId;
use mostrador_infra::InMemoryDirectory;
use mostrador_session::{CachePolicy, ResolutionCache, ResolutionSnapshot};
use mostrador_tenancy::MembershipValidator;

fn seeded_directory(auth_id: AuthUserId) -> Arc<InMemoryDirectory> {
    let directory = Arc::new(InMemoryDirectory::new());
    directory.insert_organization(1, "Ferretería Centro", true);
    let user_id = directory.insert_user(auth_id, Some(1), true);
    directory.insert_role(3, "VENDEDOR", true);
    directory.assign_role(user_id, 3, true);
    for i in 0..50 {
        directory.insert_permission(i, &format!("modulo{}.accion{}", i % 10, i), true);
        directory.link_permission(3, i, true);
    }
    directory
}

fn bench_resolution(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("failed to build runtime");
    let auth_id = AuthUserId::new();
    let directory = seeded_directory(auth_id);

    let validator = MembershipValidator::new(directory.clone());
    c.bench_function("membership_validate_uncached", |b| {
        b.iter(|| rt.block_on(validator.validate(black_box(auth_id))))
    });

    let oracle = AuthorizationOracle::new(directory.clone());
    let assignments = rt
        .block_on(validator.validate(auth_id))
        .user
        .expect("seeded user resolves")
        .assignments;
    c.bench_function("grant_set_derivation", |b| {
        b.iter(|| rt.block_on(oracle.granted_permissions(black_box(&assignments))))
    });

    let cache = ResolutionCache::new(CachePolicy::default());
    let now = Utc::now();
    cache.put(ResolutionSnapshot {
        user_id: auth_id,
        is_super_admin: false,
        organization: None,
        cached_at: now,
    });
    c.bench_function("resolution_cache_hit", |b| {
        b.iter(|| cache.get(black_box(auth_id), now))
    });
}

criterion_group!(benches, bench_resolution);
criterion_main!(benches);
