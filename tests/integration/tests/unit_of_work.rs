//! Session lifecycle and factory shutdown.

use kc_spi::TransactionState;

use crate::common::TestEnv;

#[tokio::test]
async fn test_rolled_back_writes_are_invisible() -> anyhow::Result<()> {
    let env = TestEnv::new();

    let mut session = env.session().await?;
    let realm = env.manager.create_realm(&mut session, "ephemeral").await?;
    let id = realm.id();
    realm.add_user(&mut session, "bburke").await?;
    session.rollback().await?;
    assert_eq!(session.state(), TransactionState::RolledBack);
    session.close().await?;

    let mut session = env.session().await?;
    assert!(env.manager.get_realm(&mut session, id).await?.is_none());
    assert!(env.manager.list_realms(&mut session).await?.is_empty());
    session.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_uncommitted_writes_are_private() -> anyhow::Result<()> {
    let env = TestEnv::new();

    let mut writer = env.session().await?;
    let id = env.manager.create_realm(&mut writer, "pending").await?.id();

    let mut reader = env.session().await?;
    assert!(env.manager.get_realm(&mut reader, id).await?.is_none());

    writer.commit().await?;
    writer.close().await?;
    reader.close().await?;

    let mut reader = env.session().await?;
    assert!(env.manager.get_realm(&mut reader, id).await?.is_some());
    reader.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_staged_changes_dropped_on_close() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let id = env.committed_realm("JUGGLER").await?;

    let mut session = env.session().await?;
    let mut realm = env.realm(&mut session, id).await?;
    realm.set_enabled(&mut session, true)?;
    assert!(env.realm(&mut session, id).await?.is_enabled());
    session.close().await?;
    assert_eq!(session.state(), TransactionState::Closed);

    let mut session = env.session().await?;
    assert!(!env.realm(&mut session, id).await?.is_enabled());
    session.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_operations_outside_active_fail() -> anyhow::Result<()> {
    let env = TestEnv::new();

    let mut session = env.factory.create_session()?;
    assert_eq!(session.state(), TransactionState::Created);
    let err = env
        .manager
        .create_realm(&mut session, "early")
        .await
        .expect_err("session not begun");
    assert!(err.is_state());
    assert!(session.commit().await.expect_err("not begun").is_state());

    session.begin().await?;
    assert!(session.begin().await.expect_err("already begun").is_state());
    let mut realm = env.manager.create_realm(&mut session, "late").await?;
    session.commit().await?;
    assert_eq!(session.state(), TransactionState::Committed);

    assert!(session.commit().await.expect_err("committed").is_state());
    assert!(session.rollback().await.expect_err("committed").is_state());
    assert!(realm.set_enabled(&mut session, true).expect_err("committed").is_state());
    assert!(
        realm
            .add_user(&mut session, "bburke")
            .await
            .expect_err("committed")
            .is_state()
    );

    session.close().await?;
    session.close().await?;
    assert!(session.is_closed());
    Ok(())
}

#[tokio::test]
async fn test_failed_commit_ends_rolled_back() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let id = env.committed_realm("JUGGLER").await?;

    let mut first = env.session().await?;
    let mut second = env.session().await?;
    let realm_a = env.realm(&mut first, id).await?;
    let mut realm_b = env.realm(&mut second, id).await?;

    realm_a.add_user(&mut first, "bburke").await?;
    realm_b.add_user(&mut second, "bburke").await?;
    realm_b.set_enabled(&mut second, true)?;

    first.commit().await?;
    let err = second.commit().await.expect_err("duplicate username");
    assert!(err.is_conflict());
    assert_eq!(second.state(), TransactionState::RolledBack);
    first.close().await?;
    second.close().await?;

    let mut session = env.session().await?;
    let realm = env.realm(&mut session, id).await?;
    assert!(!realm.is_enabled());
    assert_eq!(realm.get_users(&mut session).await?.len(), 1);
    session.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_stale_realm_write_does_not_overwrite_commit() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let id = env.committed_realm("JUGGLER").await?;

    // Both sessions read the realm before either commits
    let mut first = env.session().await?;
    let mut second = env.session().await?;
    let mut realm_a = env.realm(&mut first, id).await?;
    let mut realm_b = env.realm(&mut second, id).await?;

    realm_a.add_default_role(&mut first, "foo").await?;
    realm_a.add_required_credential(&mut first, "password")?;
    first.commit().await?;
    first.close().await?;

    realm_b.set_name(&mut second, "renamed")?;
    let err = second.commit().await.expect_err("realm changed since it was read");
    assert!(err.is_conflict());
    assert_eq!(second.state(), TransactionState::RolledBack);
    second.close().await?;

    let mut session = env.session().await?;
    let realm = env.realm(&mut session, id).await?;
    assert_eq!(realm.name(), "JUGGLER");
    assert_eq!(realm.get_required_credentials().len(), 1);
    let defaults: Vec<String> = realm
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
async fn test_factory_shutdown_rules() -> anyhow::Result<()> {
    let env = TestEnv::new();

    let mut session = env.session().await?;
    assert_eq!(env.factory.open_sessions(), 1);
    let err = env.factory.shutdown().await.expect_err("session still open");
    assert!(err.is_state());
    assert!(!env.factory.is_shut_down());

    session.close().await?;
    assert_eq!(env.factory.open_sessions(), 0);
    env.factory.shutdown().await?;
    assert!(env.factory.is_shut_down());

    assert!(env.factory.create_session().expect_err("shut down").is_state());
    assert!(env.factory.shutdown().await.expect_err("twice").is_state());
    Ok(())
}

#[tokio::test]
async fn test_dropped_session_releases_count() -> anyhow::Result<()> {
    let env = TestEnv::new();
    {
        let _session = env.session().await?;
        assert_eq!(env.factory.open_sessions(), 1);
    }
    assert_eq!(env.factory.open_sessions(), 0);
    env.factory.shutdown().await?;
    Ok(())
}
