//! Required credential policy and password validation.

use kc_model::{CredentialType, UserCredential};
use kc_storage::CredentialProvider;

use crate::common::TestEnv;

#[tokio::test]
async fn test_single_required_password() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let id = env.committed_realm("JUGGLER").await?;

    let mut session = env.session().await?;
    let mut realm = env.realm(&mut session, id).await?;
    realm.add_required_credential(&mut session, "password")?;
    session.commit().await?;
    session.close().await?;

    let mut session = env.session().await?;
    let realm = env.realm(&mut session, id).await?;
    let required = realm.get_required_credentials();
    assert_eq!(required.len(), 1);
    assert_eq!(required[0].credential_type, CredentialType::Password);
    assert!(required[0].input);
    assert!(required[0].secret);
    session.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_bulk_required_credentials_update() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let id = env.committed_realm("JUGGLER").await?;

    let mut session = env.session().await?;
    let mut realm = env.realm(&mut session, id).await?;
    realm.add_required_credential(&mut session, "cert")?;
    realm.update_required_credentials(&mut session, ["password", "totp"])?;
    session.commit().await?;
    session.close().await?;

    let mut session = env.session().await?;
    let realm = env.realm(&mut session, id).await?;
    let required = realm.get_required_credentials();
    assert_eq!(required.len(), 2);

    let password = required
        .iter()
        .find(|c| c.credential_type == CredentialType::Password)
        .expect("password required");
    assert!(password.input);
    assert!(password.secret);

    let totp = required
        .iter()
        .find(|c| c.credential_type == CredentialType::Totp)
        .expect("totp required");
    assert!(totp.input);
    assert!(!totp.secret);
    session.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_unknown_credential_type_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let id = env.committed_realm("JUGGLER").await?;

    let mut session = env.session().await?;
    let mut realm = env.realm(&mut session, id).await?;
    let err = realm
        .add_required_credential(&mut session, "kerberos")
        .expect_err("unknown type");
    assert!(err.is_validation());
    assert!(realm.get_required_credentials().is_empty());
    session.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_password_validation() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let id = env.committed_realm("JUGGLER").await?;

    let mut session = env.session().await?;
    let realm = env.realm(&mut session, id).await?;
    let user = realm.add_user(&mut session, "bburke").await?;
    realm
        .update_credential(&mut session, &user, &UserCredential::password("geheim"))
        .await?;
    session.commit().await?;
    session.close().await?;

    let mut session = env.session().await?;
    let realm = env.realm(&mut session, id).await?;
    let user = realm
        .get_user(&mut session, "bburke")
        .await?
        .expect("user committed");
    assert!(realm.validate_password(&mut session, &user, "geheim").await?);
    assert!(!realm.validate_password(&mut session, &user, "wrong").await?);

    let stored = session
        .transaction()?
        .get_credential(id, user.id, CredentialType::Password)
        .await?
        .expect("password stored");
    assert_ne!(stored.secret_data, "geheim");
    assert!(stored.secret_data.starts_with("$argon2id$"));
    session.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_password_update_replaces_previous() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let id = env.committed_realm("JUGGLER").await?;

    let mut session = env.session().await?;
    let realm = env.realm(&mut session, id).await?;
    let user = realm.add_user(&mut session, "bburke").await?;
    realm
        .update_credential(&mut session, &user, &UserCredential::password("first"))
        .await?;
    realm
        .update_credential(&mut session, &user, &UserCredential::password("second"))
        .await?;

    assert!(!realm.validate_password(&mut session, &user, "first").await?);
    assert!(realm.validate_password(&mut session, &user, "second").await?);
    assert_eq!(
        session.transaction()?.list_credentials(id, user.id).await?.len(),
        1
    );
    session.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_user_without_password_never_validates() -> anyhow::Result<()> {
    let env = TestEnv::new();
    let id = env.committed_realm("JUGGLER").await?;

    let mut session = env.session().await?;
    let realm = env.realm(&mut session, id).await?;
    let user = realm.add_user(&mut session, "nopass").await?;
    assert!(!realm.validate_password(&mut session, &user, "").await?);
    assert!(!realm.validate_password(&mut session, &user, "anything").await?);
    session.close().await?;
    Ok(())
}
