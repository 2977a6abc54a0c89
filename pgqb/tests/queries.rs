//! End-to-end serialisation checks through the public facade.

use pretty_assertions::assert_eq;

use pgqb::{
    constant, count, exists, field, not, percentile_cont, Bool, Error, Float8, Int4,
    IntoExpr, IntoSubquery, JoinExt, Lock, Params, SelectExt, Serializable, Text, Value,
};

pgqb::table! {
    /// Blog posts.
    pub struct Posts as "posts" {
        id: Int4,
        name: Text,
        deleted: Bool,
    }

    /// The user/post join table.
    pub struct UserPost as "user_post" {
        user_id: Int4,
        post_id: Int4,
    }
}

pgqb::parameters! {
    /// Parameters of the feed query.
    pub struct FeedParams: FeedValues {
        user_id: Int4,
    }
}

#[test]
fn constants_and_null_tests() {
    assert_eq!(constant("abc").is_null().serialize(), "('abc' IS NULL)");
    assert_eq!(
        constant(1)
            .is_in([constant(1), constant(2), constant(3)])
            .serialize(),
        "(1 IN (1, 2, 3))"
    );
    assert_eq!(constant(1).cast_as::<Bool>().serialize(), "CAST(1 AS boolean)");
}

#[test]
fn field_references_quote_on_demand() {
    assert_eq!(field::<Text>("users", "name").serialize(), "users.name");
    assert_eq!(
        field::<Text>("user group", "select").serialize(),
        "\"user group\".\"select\""
    );
}

#[test]
fn aggregate_with_filter() {
    let expr = count(field::<Int4>("users", "id"))
        .filter_where(field::<Bool>("users", "active").eq(constant(true)))
        .into_expr();
    assert_eq!(
        expr.serialize(),
        "count(users.id) FILTER (WHERE (users.active = true))"
    );
}

#[test]
fn joined_filtered_query_with_parameter() {
    let params = FeedParams::declare();
    let query = Posts::table()
        .alias("s")
        .inner_join(UserPost::table().alias("up"), |(s, up)| {
            s.id().eq(up.post_id())
        })
        .select(|(s, _)| (s.id().label("id"), s.name().label("name")))
        .filter(|(s, up)| not(s.deleted()).and(up.user_id().eq(params.user_id.clone())));

    assert_eq!(
        query.serialize(),
        "SELECT s.id AS id, s.name AS name \
         FROM (posts AS s INNER JOIN user_post AS up ON (s.id = up.post_id)) \
         WHERE ((not s.deleted) AND (up.user_id = $1))"
    );

    // Rendering twice is byte-identical and does not disturb the query.
    assert_eq!(query.serialize(), query.serialize());

    assert_eq!(
        FeedParams::pack(FeedValues { user_id: 42 }),
        vec![Value::Int4(42)]
    );
}

#[test]
fn ordered_set_aggregate_within_group() {
    let expr = percentile_cont(constant(0.5))
        .within_group_order_by(vec![field::<Float8>("t", "x").asc()])
        .into_expr();
    assert_eq!(
        expr.serialize(),
        "percentile_cont(0.5) WITHIN GROUP (ORDER BY t.x ASC)"
    );
}

#[test]
fn scalar_arity_is_checked_at_the_ast_layer() {
    let query = UserPost::table()
        .select(|up| (up.user_id().label("a"), up.post_id().label("b")))
        .into_subquery();
    assert_eq!(query.scalar().unwrap_err(), Error::ScalarArity(2));
}

#[test]
fn exists_and_scalar_subqueries() {
    let inner = UserPost::table().select(|up| (up.user_id().label("user_id"),));
    let expr = exists(inner);
    assert_eq!(
        expr.serialize(),
        "EXISTS (SELECT user_post.user_id AS user_id FROM user_post)"
    );

    let scalar = UserPost::table()
        .alias("up")
        .select(|up| (count(up.post_id()).label("n"),))
        .scalar();
    assert_eq!(
        scalar.serialize(),
        "(SELECT count(up.post_id) AS n FROM user_post AS up)"
    );
}

#[test]
fn locks_are_refused_after_set_ops_by_construction() {
    // `for_lock` after a set operation does not compile; the nearest legal
    // shape locks before combining on the left input only.
    let left = Posts::table()
        .select(|p| (p.id().label("id"),))
        .for_lock(Lock::update());
    assert_eq!(
        left.serialize(),
        "SELECT posts.id AS id FROM posts FOR UPDATE"
    );

    let combined = Posts::table()
        .select(|p| (p.id().label("id"),))
        .union_all(Posts::table().select(|p| (p.id().label("id"),)));
    assert_eq!(
        combined.serialize(),
        "SELECT posts.id AS id FROM posts UNION ALL SELECT posts.id AS id FROM posts"
    );
}
