//! Roles, default roles and grants across sessions.

use std::sync::Arc;

use crate::common::TestEnv;

#[tokio::test]
async fn test_role_grants_survive_commit() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let id = env.committed_realm("JUGGLER").await?;

    let mut session = env.session().await?;
    let realm = env.realm(&mut session, id).await?;
    let user = realm.add_user(&mut session, "bburke").await?;
    let admin = realm.add_role(&mut session, "admin").await?;
    realm.add_role(&mut session, "user").await?;
    realm.grant_role(&mut session, &user, &admin).await?;
    session.commit().await?;
    session.close().await?;

    let mut session = env.session().await?;
    let realm = env.realm(&mut session, id).await?;
    let user = realm
        .get_user(&mut session, "bburke")
        .await?
        .expect("user committed");
    let admin = realm.get_role(&mut session, "admin").await?.expect("admin");
    let plain = realm.get_role(&mut session, "user").await?.expect("user");

    assert!(realm.has_role(&mut session, &user, &admin).await?);
    assert!(!realm.has_role(&mut session, &user, &plain).await?);
    let roles = realm.get_user_roles(&mut session, &user).await?;
    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0].name, "admin");
    session.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_role_count_includes_defaults() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let id = env.committed_realm("JUGGLER").await?;

    let mut session = env.session().await?;
    let mut realm = env.realm(&mut session, id).await?;
    realm.add_default_role(&mut session, "user").await?;
    realm.add_default_role(&mut session, "guest").await?;
    realm.add_role(&mut session, "admin").await?;
    realm.add_role(&mut session, "auditor").await?;
    realm.add_role(&mut session, "operator").await?;
    session.commit().await?;
    session.close().await?;

    let mut session = env.session().await?;
    let realm = env.realm(&mut session, id).await?;
    assert_eq!(realm.get_roles(&mut session).await?.len(), 5);
    assert_eq!(realm.get_default_roles(&mut session).await?.len(), 2);
    session.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_role_by_id_is_stable() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let id = env.committed_realm("JUGGLER").await?;

    let mut session = env.session().await?;
    let realm = env.realm(&mut session, id).await?;
    let role = realm.add_role(&mut session, "admin").await?;
    session.commit().await?;
    session.close().await?;

    for _ in 0..2 {
        let mut session = env.session().await?;
        let realm = env.realm(&mut session, id).await?;
        let found = realm
            .get_role_by_id(&mut session, role.id)
            .await?
            .expect("role committed");
        assert_eq!(found.name, "admin");
        session.close().await?;
    }
    Ok(())
}

#[tokio::test]
async fn test_add_default_role_is_idempotent() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let id = env.committed_realm("JUGGLER").await?;

    let mut session = env.session().await?;
    let mut realm = env.realm(&mut session, id).await?;
    let first = realm.add_default_role(&mut session, "user").await?;
    let second = realm.add_default_role(&mut session, "user").await?;
    assert_eq!(first.id, second.id);
    assert_eq!(realm.default_role_ids(), vec![first.id]);
    session.commit().await?;
    session.close().await?;

    let mut session = env.session().await?;
    let mut realm = env.realm(&mut session, id).await?;
    realm.add_default_role(&mut session, "user").await?;
    assert_eq!(realm.get_roles(&mut session).await?.len(), 1);
    assert_eq!(realm.default_role_ids().len(), 1);
    session.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_default_roles_are_granted_on_request() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let id = env.committed_realm("JUGGLER").await?;

    let mut session = env.session().await?;
    let mut realm = env.realm(&mut session, id).await?;
    let user_role = realm.add_default_role(&mut session, "user").await?;
    let user = realm.add_user(&mut session, "bburke").await?;
    assert!(!realm.has_role(&mut session, &user, &user_role).await?);

    realm.grant_default_roles(&mut session, &user).await?;
    assert!(realm.has_role(&mut session, &user, &user_role).await?);
    session.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_handles_in_one_session_converge() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let id = env.committed_realm("JUGGLER").await?;

    let mut session = env.session().await?;
    let mut first = env.realm(&mut session, id).await?;
    let mut second = env.realm(&mut session, id).await?;
    let user = first.add_default_role(&mut session, "user").await?;
    let guest = second.add_default_role(&mut session, "guest").await?;
    session.commit().await?;
    session.close().await?;

    let mut session = env.session().await?;
    let realm = env.realm(&mut session, id).await?;
    let defaults = realm.default_role_ids();
    assert!(defaults.contains(&user.id));
    assert!(defaults.contains(&guest.id));
    session.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_role_removed_through_other_handle_leaves_no_default() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let id = env.committed_realm("JUGGLER").await?;

    let mut session = env.session().await?;
    let mut first = env.realm(&mut session, id).await?;
    let mut second = env.realm(&mut session, id).await?;
    let foo = first.add_default_role(&mut session, "foo").await?;
    second.remove_role(&mut session, &foo).await?;
    session.commit().await?;
    session.close().await?;

    let mut session = env.session().await?;
    let realm = env.realm(&mut session, id).await?;
    assert!(realm.default_role_ids().is_empty());
    assert!(realm.get_default_roles(&mut session).await?.is_empty());
    assert!(realm.get_role(&mut session, "foo").await?.is_none());
    session.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_interleaved_duplicate_role_conflicts_once() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let id = env.committed_realm("JUGGLER").await?;

    let mut first = env.session().await?;
    let mut second = env.session().await?;
    let realm_a = env.realm(&mut first, id).await?;
    let realm_b = env.realm(&mut second, id).await?;

    realm_a.add_role(&mut first, "admin").await?;
    realm_b.add_role(&mut second, "admin").await?;

    first.commit().await?;
    let err = second.commit().await.expect_err("duplicate role name");
    assert!(err.is_conflict());
    first.close().await?;
    second.close().await?;

    let mut session = env.session().await?;
    let realm = env.realm(&mut session, id).await?;
    assert_eq!(realm.get_roles(&mut session).await?.len(), 1);
    session.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_concurrent_duplicate_role_conflicts_once() -> anyhow::Result<()> {
    let env = Arc::new(TestEnv::new());
    let id = env.committed_realm("JUGGLER").await?;

    let mut handles = Vec::new();
    for _ in 0..2 {
        let env = Arc::clone(&env);
        handles.push(tokio::spawn(async move {
            let mut session = env.session().await?;
            let realm = env.realm(&mut session, id).await?;
            let created = match realm.add_role(&mut session, "admin").await {
                Ok(_) => session.commit().await,
                Err(err) => Err(err),
            };
            session.close().await?;
            anyhow::Ok(created)
        }));
    }

    let mut committed = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await?? {
            Ok(()) => committed += 1,
            Err(err) if err.is_conflict() => conflicts += 1,
            Err(err) => return Err(err.into()),
        }
    }
    assert_eq!(committed, 1);
    assert_eq!(conflicts, 1);

    let mut session = env.session().await?;
    let realm = env.realm(&mut session, id).await?;
    assert_eq!(realm.get_roles(&mut session).await?.len(), 1);
    session.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_removed_role_leaves_defaults_and_grants() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let id = env.committed_realm("JUGGLER").await?;

    let mut session = env.session().await?;
    let mut realm = env.realm(&mut session, id).await?;
    let role = realm.add_default_role(&mut session, "user").await?;
    let user = realm.add_user(&mut session, "bburke").await?;
    realm.grant_role(&mut session, &user, &role).await?;
    realm.remove_role(&mut session, &role).await?;
    session.commit().await?;
    session.close().await?;

    let mut session = env.session().await?;
    let realm = env.realm(&mut session, id).await?;
    assert!(realm.default_role_ids().is_empty());
    let user = realm
        .get_user(&mut session, "bburke")
        .await?
        .expect("user committed");
    assert!(realm.get_user_roles(&mut session, &user).await?.is_empty());
    session.close().await?;
    Ok(())
}
