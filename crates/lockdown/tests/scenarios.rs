//! Policy scenarios spanning roles, transactions, and saves.

use std::sync::Arc;

use lockdown::core::{Context, Entity, FieldMap, Record, Role, RuleExpr, Value, EVERYONE};
use lockdown::engine::{AccessError, EngineConfig, ValidationPolicy};
use lockdown::store::MemoryStore;
use lockdown::{Error, Repository, RepositoryConfig};
use lockdown_testkit::fixtures::{is_owner, same_group, split_writers, TestFixture};

fn repository(fixture: TestFixture, config: RepositoryConfig) -> Repository<MemoryStore> {
    Repository::new(fixture.store, config)
}

#[tokio::test]
async fn test_read_rule_needs_context() {
    let fixture = TestFixture::new();
    let user = fixture.create_user("u").await;
    let group = fixture.create_group("g").await;
    fixture.create_bicycle(&user, &group, None).await;
    let bicycle = fixture.schema.bicycle.clone();

    let mut role = Role::new("api");
    role.lockdown(&bicycle).readable_by(same_group());
    let mut ctx = Context::with_role(Arc::new(role));

    let repo = repository(fixture, RepositoryConfig::default());
    let b = repo.get(&Context::new(), &bicycle, 1).await.unwrap();

    assert!(!repo.engine().is_readable(&ctx, &b, None));
    ctx.set("group", group);
    assert!(repo.engine().is_readable(&ctx, &b, None));
}

#[tokio::test]
async fn test_field_write_denied_on_subset_save() -> anyhow::Result<()> {
    let fixture = TestFixture::new();
    let user = fixture.create_user("u").await;
    let group = fixture.create_group("g").await;
    fixture.create_bicycle(&user, &group, Some("1")).await;
    let bicycle = fixture.schema.bicycle.clone();

    let mut role = Role::new("api");
    role.lockdown(&bicycle).field_writeable_by("serial", is_owner());
    let mut ctx = Context::with_role(Arc::new(role));
    ctx.set("user", 99);

    let repo = repository(fixture, RepositoryConfig::default());
    let mut b = repo.get(&ctx, &bicycle, 1).await?;
    repo.set_field(&ctx, &mut b, "serial", "2")?;

    let plan = repo.save(&ctx, &mut b, Some(&["serial"][..])).await?;
    assert!(plan.fields.is_empty());
    assert_eq!(repo.get(&ctx, &bicycle, 1).await?.get("serial"), &Value::from("1"));
    Ok(())
}

#[tokio::test]
async fn test_create_rule_with_unassigned_owner() -> anyhow::Result<()> {
    let fixture = TestFixture::new();
    let bicycle = fixture.schema.bicycle.clone();

    let mut role = Role::new("api");
    role.lockdown(&bicycle).creatable_by(is_owner());
    let mut ctx = Context::with_role(Arc::new(role));
    ctx.set("user", 5);

    let repo = repository(fixture, RepositoryConfig::default());
    let engine = repo.engine();

    let mut b = Record::new(&bicycle);
    assert!(engine.is_creatable(&ctx, &bicycle, Some(&b), None));
    assert!(engine.is_creatable(&ctx, &bicycle, None, None));

    b.put_field("owner", Value::reference("user", 6));
    assert!(!engine.is_creatable(&ctx, &bicycle, Some(&b), None));
    let err = repo.save(&ctx, &mut b, None).await.unwrap_err();
    assert!(matches!(err, Error::Access(AccessError::NotCreatable { .. })));

    b.put_field("owner", Value::reference("user", 5));
    let plan = repo.save(&ctx, &mut b, None).await?;
    assert!(plan.is_new);
    assert_eq!(b.identity(), Some(&Value::Int(1)));
    Ok(())
}

#[test]
fn test_nested_transaction_depth() {
    let mut ctx = Context::new();
    let mut outer = ctx.enter_transaction();
    {
        let inner = outer.enter_transaction();
        assert_eq!(inner.transaction_depth(), 2);
    }
    assert_eq!(outer.transaction_depth(), 1);
    drop(outer);
    assert_eq!(ctx.transaction_depth(), 0);
}

#[tokio::test]
async fn test_provenance_across_roles() -> anyhow::Result<()> {
    let fixture = TestFixture::new();
    let user = fixture.create_user("u").await;
    let group = fixture.create_group("g").await;
    let other_group = fixture.create_group("h").await;
    fixture.create_bicycle(&user, &group, Some("1")).await;
    let bicycle = fixture.schema.bicycle.clone();
    let (serial_writer, group_writer) = split_writers(&fixture.schema);

    let repo = repository(fixture, RepositoryConfig::default());
    let mut ctx = Context::new();
    let mut b = repo.get(&ctx, &bicycle, 1).await?;

    {
        let mut tx = ctx.enter_transaction();
        tx.set_role(Some(serial_writer));
        repo.set_field(&tx, &mut b, "serial", "2")?;

        tx.set_role(Some(group_writer.clone()));
        repo.set_field(&tx, &mut b, "group", Value::reference("group", other_group.clone()))?;

        // Each role may only have written one of the two fields.
        assert!(repo.set_field(&tx, &mut b, "serial", "3").is_err());
    }

    // The save runs under the role that may not write serial.
    let plan = repo.save(&ctx, &mut b, Some(&["serial", "group"][..])).await?;
    assert_eq!(plan.fields.len(), 2);
    assert!(b.provenance().is_empty());

    let stored = repo.get(&Context::new(), &bicycle, 1).await?;
    assert_eq!(stored.get("serial"), &Value::from("2"));
    assert_eq!(stored.get("group").reduce(), &other_group);
    assert_eq!(ctx.active_role().map(|r| r.name()), Some(group_writer.name()));
    Ok(())
}

#[tokio::test]
async fn test_rules_inherited_from_base_type_and_parent_role() -> anyhow::Result<()> {
    let fixture = TestFixture::new();
    let user = fixture.create_user("u").await;
    let group = fixture.create_group("g").await;
    fixture.create_bicycle(&user, &group, Some("1")).await;
    let schema = fixture.schema.clone();

    // The parent constrains every vehicle; the child adds nothing for reads.
    let mut base = Role::new("base");
    base.lockdown(&schema.vehicle).readable_by(same_group());
    let mut api = Role::with_parents("api", [Arc::new(base)]);
    api.lockdown(&schema.bicycle).writeable_by(EVERYONE);
    let mut ctx = Context::with_role(Arc::new(api));

    let repo = repository(fixture, RepositoryConfig::default());
    assert!(repo.select(&ctx, &schema.bicycle).await?.is_empty());

    ctx.set("group", group);
    assert_eq!(repo.select(&ctx, &schema.bicycle).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_create_validates_each_field() -> anyhow::Result<()> {
    let fixture = TestFixture::new();
    let bicycle = fixture.schema.bicycle.clone();

    let mut role = Role::new("api");
    role.lockdown(&bicycle).validate(
        "serial",
        RuleExpr::predicate(|input| matches!(input.value, Some(Value::Text(s)) if s.len() == 6)),
    );
    let mut ctx = Context::with_role(Arc::new(role));
    let repo = repository(fixture, RepositoryConfig::default());

    let mut fields = FieldMap::new();
    fields.insert("serial".into(), Value::from("abc"));
    let err = repo.create(&mut ctx, &bicycle, fields).await.unwrap_err();
    assert!(matches!(err, Error::Access(AccessError::ValidationFailed { .. })));
    assert!(!err.is_authorization());
    assert_eq!(ctx.transaction_depth(), 0);
    assert_eq!(repo.store().len(&bicycle).await, 0);

    let mut fields = FieldMap::new();
    fields.insert("serial".into(), Value::from("abc123"));
    let b = repo.create(&mut ctx, &bicycle, fields).await?;
    assert_eq!(b.get("serial"), &Value::from("abc123"));
    Ok(())
}

#[tokio::test]
async fn test_drop_field_policy_on_save() -> anyhow::Result<()> {
    let fixture = TestFixture::new();
    let user = fixture.create_user("u").await;
    let group = fixture.create_group("g").await;
    fixture.create_bicycle(&user, &group, Some("1")).await;
    let bicycle = fixture.schema.bicycle.clone();

    let mut role = Role::new("api");
    let known = [RuleExpr::literal("1"), RuleExpr::literal("2")];
    role.lockdown(&bicycle)
        .validate("serial", RuleExpr::field("serial").is_in(known));
    let ctx = Context::with_role(Arc::new(role));

    let config = RepositoryConfig {
        engine: EngineConfig {
            validation_policy: ValidationPolicy::DropField,
            ..EngineConfig::default()
        },
        ..RepositoryConfig::default()
    };
    let repo = repository(fixture, config);

    let mut b = repo.get(&ctx, &bicycle, 1).await?;
    repo.set_field(&ctx, &mut b, "serial", "9")?;
    let plan = repo.save(&ctx, &mut b, None).await?;
    assert_eq!(plan.dropped, vec!["serial".to_string()]);
    assert_eq!(repo.get(&ctx, &bicycle, 1).await?.get("serial"), &Value::from("1"));
    Ok(())
}
