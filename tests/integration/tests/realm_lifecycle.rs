//! Realm creation, configuration round trips and handle binding.

use crate::common::TestEnv;

#[tokio::test]
async fn test_realm_configuration_round_trip() -> anyhow::Result<()> {
    let env = TestEnv::new();

    let mut session = env.session().await?;
    let mut realm = env.manager.create_realm(&mut session, "JUGGLER").await?;
    realm.set_access_code_lifespan(&mut session, 100)?;
    realm.set_cookie_login_allowed(&mut session, true)?;
    realm.set_enabled(&mut session, true)?;
    realm.set_name(&mut session, "JUGGLER")?;
    realm.set_private_key_pem(&mut session, "0234234")?;
    realm.set_public_key_pem(&mut session, "0234234")?;
    realm.set_token_lifespan(&mut session, 1000)?;
    realm.set_automatic_registration_after_social_login(&mut session, true)?;
    realm.add_default_role(&mut session, "foo").await?;
    let id = realm.id();
    session.commit().await?;
    session.close().await?;

    let mut session = env.session().await?;
    let loaded = env.realm(&mut session, id).await?;
    assert_eq!(loaded.id(), id);
    assert_eq!(loaded.name(), "JUGGLER");
    assert_eq!(loaded.access_code_lifespan(), 100);
    assert_eq!(loaded.token_lifespan(), 1000);
    assert!(loaded.is_enabled());
    assert!(loaded.is_cookie_login_allowed());
    assert!(loaded.is_automatic_registration_after_social_login());
    assert_eq!(loaded.public_key_pem().as_deref(), Some("0234234"));
    assert_eq!(loaded.private_key_pem().as_deref(), Some("0234234"));
    let defaults: Vec<String> = loaded
        .get_default_roles(&mut session)
        .await?
        .into_iter()
        .map(|role| role.name)
        .collect();
    assert_eq!(defaults, vec!["foo"]);
    session.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_new_realm_starts_disabled() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let id = env.committed_realm("fresh").await?;

    let mut session = env.session().await?;
    let realm = env.realm(&mut session, id).await?;
    assert!(!realm.is_enabled());
    assert!(realm.get_required_credentials().is_empty());
    assert!(realm.default_role_ids().is_empty());
    session.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_unknown_realm_is_none() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let mut session = env.session().await?;

    let found = env.manager.get_realm(&mut session, uuid::Uuid::now_v7()).await?;
    assert!(found.is_none());
    session.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_realm_names_need_not_be_unique() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let first = env.committed_realm("twin").await?;
    let second = env.committed_realm("twin").await?;
    assert_ne!(first, second);

    let mut session = env.session().await?;
    assert_eq!(env.manager.list_realms(&mut session).await?.len(), 2);
    session.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_delete_realm_removes_everything() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let id = env.committed_realm("doomed").await?;

    let mut session = env.session().await?;
    let mut realm = env.realm(&mut session, id).await?;
    realm.add_default_role(&mut session, "user").await?;
    realm.add_user(&mut session, "bburke").await?;
    session.commit().await?;
    session.close().await?;

    let mut session = env.session().await?;
    env.manager.delete_realm(&mut session, id).await?;
    session.commit().await?;
    session.close().await?;

    let mut session = env.session().await?;
    assert!(env.manager.get_realm(&mut session, id).await?.is_none());
    let err = env
        .manager
        .delete_realm(&mut session, id)
        .await
        .expect_err("realm already deleted");
    assert!(err.is_not_found());
    session.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_second_handle_reads_pending_changes() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let id = env.committed_realm("JUGGLER").await?;

    let mut session = env.session().await?;
    let mut first = env.realm(&mut session, id).await?;
    let second = env.realm(&mut session, id).await?;

    let foo = first.add_default_role(&mut session, "foo").await?;
    first.add_required_credential(&mut session, "password")?;
    first.set_token_lifespan(&mut session, 1000)?;

    assert_eq!(second.default_role_ids(), vec![foo.id]);
    assert_eq!(second.get_required_credentials().len(), 1);
    assert_eq!(second.token_lifespan(), 1000);

    // A handle loaded after the changes sees them too
    let third = env.realm(&mut session, id).await?;
    assert_eq!(third.realm(), first.realm());
    session.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_handle_rejects_other_session() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let id = env.committed_realm("bound").await?;

    let mut first = env.session().await?;
    let mut realm = env.realm(&mut first, id).await?;

    let mut second = env.session().await?;
    let err = realm
        .set_enabled(&mut second, true)
        .expect_err("handle belongs to the first session");
    assert!(err.is_state());
    let err = realm
        .add_role(&mut second, "admin")
        .await
        .expect_err("handle belongs to the first session");
    assert!(err.is_state());

    first.close().await?;
    second.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_invalid_settings_have_no_effect() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let id = env.committed_realm("strict").await?;

    let mut session = env.session().await?;
    let mut realm = env.realm(&mut session, id).await?;
    assert!(realm.set_access_code_lifespan(&mut session, -1).is_err());
    assert!(realm.set_name(&mut session, "").is_err());
    session.commit().await?;
    session.close().await?;

    let mut session = env.session().await?;
    let realm = env.realm(&mut session, id).await?;
    assert_eq!(realm.access_code_lifespan(), 60);
    assert_eq!(realm.name(), "strict");
    session.close().await?;
    Ok(())
}
