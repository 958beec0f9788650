//! Upload, review, replacement and deletion against real SQLite and disk.

use domains::{DomainError, FileKind, MaterialRepository};
use integration_tests::{
    author, file, file_upload, link_upload, metadata, TestApp, ADMIN, REVIEWER, STRANGER, STUDENT,
    VIEWER_BASE,
};
use services::UpdateRequest;

fn juan() -> domains::AuthorDraft {
    author("Juan", "Perez", Some("Lopez"), "juan.perez@alumno.ipn.mx")
}

#[tokio::test]
async fn zip_thesis_is_hidden_until_an_admin_publishes_it() -> anyhow::Result<()> {
    let app = TestApp::start().await?;
    let services = &app.services;

    let uploaded = services
        .lifecycle
        .upload(file_upload(
            STUDENT,
            metadata("Tesis X", &[juan()], &[]),
            file("tesis.zip", b"PK\x03\x04"),
        ))
        .await?;
    let id = uploaded.material.id;
    assert_eq!(uploaded.material.file_type, FileKind::Zip);
    assert!(!uploaded.material.available);
    assert!(!uploaded.material.reviewed);
    assert_eq!(uploaded.access_url, Some(format!("{VIEWER_BASE}view?id={id}")));
    assert_eq!(
        app.notifier.sent(),
        vec![("Tesis X".to_string(), "Juan Perez Lopez".to_string())]
    );

    let hidden = services.catalog.get_material(id, Some(STUDENT)).await;
    assert!(matches!(hidden, Err(DomainError::NotFound(..))));
    // Privileged roles see it while it waits for review.
    services.catalog.get_material(id, Some(REVIEWER)).await?;

    services.lifecycle.set_availability(id, 1).await?;
    let visible = services.catalog.get_material(id, Some(STUDENT)).await?;
    assert_eq!(visible.material.id, id);
    assert!(visible.material.available);
    assert!(!visible.material.reviewed);
    Ok(())
}

#[tokio::test]
async fn pdf_and_link_are_published_immediately() -> anyhow::Result<()> {
    let app = TestApp::start().await?;
    let services = &app.services;

    let pdf = services
        .lifecycle
        .upload(file_upload(
            STUDENT,
            metadata("Apuntes", &[juan()], &[]),
            file("apuntes.PDF", b"%PDF-1.7"),
        ))
        .await?;
    let link = services
        .lifecycle
        .upload(link_upload(
            STUDENT,
            metadata("Video", &[juan()], &[]),
            "https://example.org/video",
        ))
        .await?;

    for detail in [&pdf, &link] {
        assert!(detail.material.available && detail.material.reviewed);
        assert_eq!(detail.access_url, None);
    }
    assert_eq!(link.material.url, "https://example.org/video");
    assert!(app.notifier.sent().is_empty());

    // Both uploads reused the same author row.
    assert_eq!(pdf.authors[0].id, link.authors[0].id);
    assert_eq!(app.stored_files()?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn rejected_uploads_leave_nothing_behind() -> anyhow::Result<()> {
    let app = TestApp::start().await?;
    let services = &app.services;
    let outsider = author("Ana", "Gomez", None, "ana@gmail.com");

    let foreign = services
        .lifecycle
        .upload(file_upload(
            STUDENT,
            metadata("Notas", &[outsider], &[]),
            file("notas.pdf", b"%PDF"),
        ))
        .await;
    assert!(matches!(foreign, Err(DomainError::Validation(_))));

    let unknown_tag = services
        .lifecycle
        .upload(file_upload(
            STUDENT,
            metadata("Notas", &[juan()], &[404]),
            file("notas.pdf", b"%PDF"),
        ))
        .await;
    assert!(matches!(unknown_tag, Err(DomainError::Validation(_))));

    let mut both = file_upload(STUDENT, metadata("Notas", &[juan()], &[]), file("n.pdf", b"%PDF"));
    both.url = Some("https://example.org".into());
    assert!(matches!(
        services.lifecycle.upload(both).await,
        Err(DomainError::Validation(_))
    ));

    assert!(app.stored_files()?.is_empty());
    assert!(app.db.materials().list(false).await?.is_empty());
    assert!(services.authors.list().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn replacing_with_a_zip_puts_the_material_back_in_review() -> anyhow::Result<()> {
    let app = TestApp::start().await?;
    let services = &app.services;

    let pdf = services
        .lifecycle
        .upload(file_upload(
            STUDENT,
            metadata("Practica 1", &[juan()], &[]),
            file("practica.pdf", b"%PDF"),
        ))
        .await?;
    let id = pdf.material.id;
    let old_file = app.stored_files()?;

    let updated = services
        .lifecycle
        .update(
            id,
            UpdateRequest {
                file: Some(file("practica.zip", b"PK\x03\x04")),
                ..UpdateRequest::default()
            },
        )
        .await?;
    assert_eq!(updated.material.file_type, FileKind::Zip);
    assert!(!updated.material.available && !updated.material.reviewed);
    assert_eq!(app.notifier.sent().len(), 1);

    let files = app.stored_files()?;
    assert_eq!(files.len(), 1);
    assert_ne!(files, old_file);

    let hidden = services.catalog.get_material(id, Some(STUDENT)).await;
    assert!(matches!(hidden, Err(DomainError::NotFound(..))));
    Ok(())
}

#[tokio::test]
async fn update_renames_and_relinks() -> anyhow::Result<()> {
    let app = TestApp::start().await?;
    let services = &app.services;
    let redes = services.tags.create("Redes").await?;
    let maria = services
        .authors
        .create(author("Maria", "Ruiz", None, "maria@ipn.mx"))
        .await?;

    let original = services
        .lifecycle
        .upload(link_upload(
            STUDENT,
            metadata("Borrador", &[juan()], &[redes.id]),
            "https://example.org/doc",
        ))
        .await?;
    let id = original.material.id;

    let updated = services
        .lifecycle
        .update(
            id,
            UpdateRequest {
                metadata: Some(format!(
                    r#"{{"materialName":"Final","autores":[{}],"tagIds":[]}}"#,
                    maria.id
                )),
                ..UpdateRequest::default()
            },
        )
        .await?;
    assert_eq!(updated.material.name, "Final");
    assert_eq!(updated.authors.len(), 1);
    assert_eq!(updated.authors[0].id, maria.id);
    assert!(updated.tags.is_empty());
    // No content change, so the flags are untouched.
    assert!(updated.material.available);

    let empty_authors = services
        .lifecycle
        .update(
            id,
            UpdateRequest {
                metadata: Some(r#"{"autores":[]}"#.into()),
                ..UpdateRequest::default()
            },
        )
        .await;
    assert!(matches!(empty_authors, Err(DomainError::Validation(_))));
    Ok(())
}

#[tokio::test]
async fn toggles_validate_their_value() -> anyhow::Result<()> {
    let app = TestApp::start().await?;
    let services = &app.services;

    let bad = services.lifecycle.set_availability(1, 2).await;
    assert!(matches!(bad, Err(DomainError::Validation(_))));
    let missing = services.lifecycle.set_status(1, 1).await;
    assert!(matches!(missing, Err(DomainError::NotFound(..))));

    let zip = services
        .lifecycle
        .upload(file_upload(
            STUDENT,
            metadata("Tesis", &[juan()], &[]),
            file("t.zip", b"PK"),
        ))
        .await?;
    services.lifecycle.set_status(zip.material.id, 1).await?;
    let row = app
        .db
        .materials()
        .find(zip.material.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("material vanished"))?;
    assert!(row.reviewed && !row.available);
    assert!(row.updated_at >= zip.material.updated_at);
    Ok(())
}

#[tokio::test]
async fn delete_cascades_and_removes_the_file() -> anyhow::Result<()> {
    let app = TestApp::start().await?;
    let services = &app.services;

    let pdf = services
        .lifecycle
        .upload(file_upload(
            STUDENT,
            metadata("Guia", &[juan()], &[]),
            file("guia.pdf", b"%PDF"),
        ))
        .await?;
    let id = pdf.material.id;
    let author_id = pdf.authors[0].id;
    services.favorites.add(STUDENT, id).await?;
    services.catalog.get_material(id, Some(STUDENT)).await?;
    assert_eq!(services.history.list(STUDENT).await?.len(), 1);

    services.lifecycle.delete(id).await?;

    assert!(services
        .catalog
        .materials_by_author(author_id, Some(ADMIN))
        .await?
        .is_empty());
    assert!(services.favorites.list(STUDENT).await?.is_empty());
    assert!(matches!(
        services.history.list(STUDENT).await,
        Ok(entries) if entries.is_empty()
    ));
    assert!(app.stored_files()?.is_empty());
    assert!(matches!(
        services.lifecycle.delete(id).await,
        Err(DomainError::NotFound(..))
    ));
    Ok(())
}

#[tokio::test]
async fn stored_file_is_served_behind_the_visibility_gate() -> anyhow::Result<()> {
    let app = TestApp::start().await?;
    let services = &app.services;

    let zip = services
        .lifecycle
        .upload(file_upload(
            STUDENT,
            metadata("Codigo", &[juan()], &[]),
            file("codigo.zip", b"PK\x03\x04data"),
        ))
        .await?;
    let id = zip.material.id;

    let hidden = services.catalog.material_file(id, Some(STRANGER)).await;
    assert!(matches!(hidden, Err(DomainError::NotFound(..))));

    let served = services.catalog.material_file(id, Some(ADMIN)).await?;
    assert_eq!(served.file_name, "Codigo.zip");
    assert_eq!(&served.content[..], b"PK\x03\x04data");
    Ok(())
}
