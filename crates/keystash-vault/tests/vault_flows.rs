//! End-to-end vault flows, run against both persistence backends.

use std::sync::Arc;

use tempfile::TempDir;

use keystash_core::REDACTED;
use keystash_vault::{
    Cipher, EncryptionConfig, FileBackend, NewProject, NewSecret, ProjectChanges, SecretChanges,
    SecretKind, SqliteBackend, VaultBackend, VaultError, VaultRepository, VaultService,
    ENV_DEVELOPMENT,
};

/// Both backends, assembled with encryption enabled, plus a handle to the
/// raw backend so tests can look at what actually landed in storage.
async fn services() -> Vec<(&'static str, VaultService, Arc<dyn VaultBackend>, Option<TempDir>)> {
    let tmp = TempDir::new().unwrap();
    let file_backend: Arc<dyn VaultBackend> =
        Arc::new(FileBackend::new(tmp.path().join("vault.json")));
    let file_service = VaultService::new(VaultRepository::new(
        file_backend.clone(),
        Cipher::from_config(&EncryptionConfig::with_key("k1", "saltysaltysalty")),
    ));

    let sqlite_backend: Arc<dyn VaultBackend> =
        Arc::new(SqliteBackend::open_in_memory().await.unwrap());
    let sqlite_service = VaultService::new(VaultRepository::new(
        sqlite_backend.clone(),
        Cipher::from_config(&EncryptionConfig::with_key("k1", "saltysaltysalty")),
    ));

    vec![
        ("file", file_service, file_backend, Some(tmp)),
        ("sqlite", sqlite_service, sqlite_backend, None),
    ]
}

fn new_project(name: &str) -> NewProject {
    NewProject {
        name: name.to_string(),
        description: String::new(),
        color: None,
    }
}

fn new_secret(name: &str, value: &str) -> NewSecret {
    NewSecret {
        name: name.to_string(),
        description: String::new(),
        kind: SecretKind::EnvironmentVariable,
        value: value.to_string(),
        environment_id: ENV_DEVELOPMENT,
    }
}

#[tokio::test]
async fn project_names_are_unique_case_insensitively() {
    for (backend_name, service, _, _tmp) in services().await {
        service
            .create_project(NewProject {
                name: "Infra".to_string(),
                description: String::new(),
                color: None,
            })
            .await
            .unwrap();

        let result = service
            .create_project(NewProject {
                name: "infra".to_string(),
                description: "x".to_string(),
                color: None,
            })
            .await;
        assert!(
            matches!(result, Err(VaultError::UniqueConstraint(_))),
            "{backend_name}: duplicate name must be rejected"
        );
        assert_eq!(
            service.list_projects().await.unwrap().len(),
            1,
            "{backend_name}: failed create must not mutate storage"
        );
    }
}

#[tokio::test]
async fn listed_secrets_are_redacted_and_value_fetch_decrypts() {
    for (backend_name, service, _, _tmp) in services().await {
        let project = service.create_project(new_project("Infra")).await.unwrap();
        let secret = service
            .create_secret(&project.id, new_secret("CI_TOKEN", "abc123"))
            .await
            .unwrap();

        let listed = service.list_secrets(&project.id).await.unwrap();
        assert_eq!(listed.len(), 1, "{backend_name}");
        assert_eq!(listed[0].value, REDACTED, "{backend_name}");

        let value = service
            .get_secret_value(&project.id, &secret.id)
            .await
            .unwrap();
        assert_eq!(value.expose_secret(), "abc123", "{backend_name}");
    }
}

#[tokio::test]
async fn same_plaintext_stores_different_envelopes() {
    for (backend_name, service, backend, _tmp) in services().await {
        let project = service.create_project(new_project("Infra")).await.unwrap();
        let a = service
            .create_secret(&project.id, new_secret("FIRST", "abc123"))
            .await
            .unwrap();
        let b = service
            .create_secret(&project.id, new_secret("SECOND", "abc123"))
            .await
            .unwrap();

        // Look below the service at the stored ciphertext.
        let stored_a = backend.get_secret_value(&project.id, &a.id).await.unwrap();
        let stored_b = backend.get_secret_value(&project.id, &b.id).await.unwrap();
        assert_ne!(stored_a, "abc123", "{backend_name}: value must be encrypted");
        assert_ne!(
            stored_a, stored_b,
            "{backend_name}: fresh IV per encryption"
        );

        // Both decrypt back through the service.
        for id in [&a.id, &b.id] {
            let value = service.get_secret_value(&project.id, id).await.unwrap();
            assert_eq!(value.expose_secret(), "abc123", "{backend_name}");
        }
    }
}

#[tokio::test]
async fn empty_secret_value_fails_validation_and_persists_nothing() {
    for (backend_name, service, _, _tmp) in services().await {
        let project = service.create_project(new_project("Infra")).await.unwrap();

        let result = service
            .create_secret(&project.id, new_secret("CI_TOKEN", ""))
            .await;
        match result {
            Err(VaultError::Validation(fields)) => {
                assert!(
                    fields.iter().any(|f| f.field == "value"),
                    "{backend_name}: error must mention the value field"
                );
            }
            other => panic!("{backend_name}: expected Validation, got {other:?}"),
        }

        assert!(
            service.list_secrets(&project.id).await.unwrap().is_empty(),
            "{backend_name}"
        );
    }
}

#[tokio::test]
async fn deleting_a_project_takes_its_secrets_with_it() {
    for (backend_name, service, _, _tmp) in services().await {
        let project = service.create_project(new_project("Infra")).await.unwrap();
        let a = service
            .create_secret(&project.id, new_secret("A", "1"))
            .await
            .unwrap();
        service
            .create_secret(&project.id, new_secret("B", "2"))
            .await
            .unwrap();

        service.delete_project(&project.id).await.unwrap();

        // The two backends report an emptied project differently (error vs.
        // empty list); both count as unreachable.
        match service.list_secrets(&project.id).await {
            Ok(secrets) => assert!(secrets.is_empty(), "{backend_name}"),
            Err(VaultError::NotFound(_)) => {}
            Err(other) => panic!("{backend_name}: unexpected error {other:?}"),
        }
        assert!(
            matches!(
                service.get_secret_value(&project.id, &a.id).await,
                Err(VaultError::NotFound(_))
            ),
            "{backend_name}: secret value must be unreachable"
        );
    }
}

#[tokio::test]
async fn value_update_bumps_timestamp_and_leaves_metadata_alone() {
    for (backend_name, service, _, _tmp) in services().await {
        let project = service.create_project(new_project("Infra")).await.unwrap();
        let secret = service
            .create_secret(&project.id, new_secret("CI_TOKEN", "abc123"))
            .await
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        service
            .update_secret_value(&project.id, &secret.id, "xyz789")
            .await
            .unwrap();

        let listed = service.list_secrets(&project.id).await.unwrap();
        assert_eq!(listed[0].name, "CI_TOKEN", "{backend_name}");
        assert_eq!(listed[0].kind, SecretKind::EnvironmentVariable, "{backend_name}");
        assert_eq!(listed[0].environment_id, ENV_DEVELOPMENT, "{backend_name}");
        assert!(
            listed[0].updated_at > secret.updated_at,
            "{backend_name}: updated_at must advance"
        );

        let value = service
            .get_secret_value(&project.id, &secret.id)
            .await
            .unwrap();
        assert_eq!(value.expose_secret(), "xyz789", "{backend_name}");
    }
}

#[tokio::test]
async fn metadata_update_leaves_value_alone() {
    for (backend_name, service, _, _tmp) in services().await {
        let project = service.create_project(new_project("Infra")).await.unwrap();
        let secret = service
            .create_secret(&project.id, new_secret("CI_TOKEN", "abc123"))
            .await
            .unwrap();

        service
            .update_secret(
                &project.id,
                SecretChanges {
                    id: secret.id.clone(),
                    name: "DEPLOY_TOKEN".to_string(),
                    description: "deploys".to_string(),
                    kind: SecretKind::Token,
                    environment_id: ENV_DEVELOPMENT,
                },
            )
            .await
            .unwrap();

        let value = service
            .get_secret_value(&project.id, &secret.id)
            .await
            .unwrap();
        assert_eq!(
            value.expose_secret(),
            "abc123",
            "{backend_name}: metadata update must not touch the value"
        );
    }
}

#[tokio::test]
async fn project_update_changes_metadata_only() {
    for (backend_name, service, _, _tmp) in services().await {
        let project = service.create_project(new_project("Infra")).await.unwrap();
        service
            .create_secret(&project.id, new_secret("CI_TOKEN", "abc123"))
            .await
            .unwrap();

        let updated = service
            .update_project(
                &project.id,
                ProjectChanges {
                    name: "Infrastructure".to_string(),
                    description: "all of it".to_string(),
                    color: Some("#00ff00".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Infrastructure", "{backend_name}");

        // Secrets under the project are untouched by the rename.
        assert_eq!(
            service.list_secrets(&project.id).await.unwrap().len(),
            1,
            "{backend_name}"
        );
    }
}

#[tokio::test]
async fn unencrypted_vault_round_trips_plaintext() {
    // Pass-through mode: no key configured, values stored as-is.
    let tmp = TempDir::new().unwrap();
    let backend: Arc<dyn VaultBackend> =
        Arc::new(FileBackend::new(tmp.path().join("vault.json")));
    let service = VaultService::new(VaultRepository::new(
        backend.clone(),
        Cipher::from_config(&EncryptionConfig::disabled()),
    ));

    let project = service.create_project(new_project("Infra")).await.unwrap();
    let secret = service
        .create_secret(&project.id, new_secret("CI_TOKEN", "abc123"))
        .await
        .unwrap();

    // Stored as raw plaintext...
    let stored = backend.get_secret_value(&project.id, &secret.id).await.unwrap();
    assert_eq!(stored, "abc123");

    // ...but still redacted in listings.
    let listed = service.list_secrets(&project.id).await.unwrap();
    assert_eq!(listed[0].value, REDACTED);

    let value = service
        .get_secret_value(&project.id, &secret.id)
        .await
        .unwrap();
    assert_eq!(value.expose_secret(), "abc123");
}

#[tokio::test]
async fn enabling_encryption_keeps_legacy_plaintext_readable() {
    // A vault written without a key, later opened with one: old values have
    // no envelope delimiter and pass through decrypt unchanged.
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("vault.json");

    let backend: Arc<dyn VaultBackend> = Arc::new(FileBackend::new(path.clone()));
    let plain_service = VaultService::new(VaultRepository::new(
        backend,
        Cipher::from_config(&EncryptionConfig::disabled()),
    ));
    let project = plain_service
        .create_project(new_project("Infra"))
        .await
        .unwrap();
    let secret = plain_service
        .create_secret(&project.id, new_secret("LEGACY", "plain-value"))
        .await
        .unwrap();

    let backend: Arc<dyn VaultBackend> = Arc::new(FileBackend::new(path));
    let encrypted_service = VaultService::new(VaultRepository::new(
        backend,
        Cipher::from_config(&EncryptionConfig::with_key("k1", "saltysaltysalty")),
    ));
    let value = encrypted_service
        .get_secret_value(&project.id, &secret.id)
        .await
        .unwrap();
    assert_eq!(value.expose_secret(), "plain-value");
}

#[tokio::test]
async fn export_returns_decrypted_pairs() {
    for (backend_name, service, _, _tmp) in services().await {
        let project = service.create_project(new_project("Infra")).await.unwrap();
        service
            .create_secret(&project.id, new_secret("API_URL", "https://api.example.com"))
            .await
            .unwrap();
        service
            .create_secret(&project.id, new_secret("API_KEY", "abc123"))
            .await
            .unwrap();

        let exports = service.export_secrets(&project.id, None).await.unwrap();
        assert_eq!(exports.len(), 2, "{backend_name}");
        assert!(
            exports
                .iter()
                .any(|e| e.name == "API_KEY" && e.value == "abc123"),
            "{backend_name}: exported values must be decrypted"
        );
    }
}
