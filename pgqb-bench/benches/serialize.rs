use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pgqb::{
    constant, count, not, Bool, Int4, IntoExpr, JoinExt, Params, SelectExt, Serializable, Text,
};

pgqb::table! {
    pub struct Posts as "posts" {
        id: Int4,
        name: Text,
        deleted: Bool,
    }

    pub struct UserPost as "user_post" {
        user_id: Int4,
        post_id: Int4,
    }
}

pgqb::parameters! {
    pub struct FeedParams: FeedValues {
        user_id: Int4,
    }
}

fn serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize");

    group.bench_function("simple select", |b| {
        b.iter(|| {
            let query = Posts::table().select(|p| (p.id().label("id"),));
            black_box(query.serialize())
        });
    });

    group.bench_function("join + where + group", |b| {
        let params = FeedParams::declare();
        b.iter(|| {
            let query = Posts::table()
                .alias("s")
                .inner_join(UserPost::table().alias("up"), |(s, up)| {
                    s.id().eq(up.post_id())
                })
                .select(|(s, _)| (s.id().label("id"), count(s.id()).label("n")))
                .filter(|(s, up)| {
                    not(s.deleted()).and(up.user_id().eq(params.user_id.clone()))
                })
                .group_by(|(s, _)| pgqb::exprs![s.id()])
                .having(|(s, _)| count(s.id()).into_expr().gt(constant(1i64)))
                .order_by(|(s, _)| vec![s.id().desc()])
                .limit(50)
                .offset(100);
            black_box(query.serialize())
        });
    });

    group.finish();
}

criterion_group!(benches, serialize);
criterion_main!(benches);
