//! Search filters compiled to SQL and run against real rows.

use domains::{DomainError, MaterialId};
use integration_tests::{author, link_upload, metadata, TestApp, ADMIN, STRANGER, STUDENT};
use services::SearchQuery;

struct Seeded {
    app: TestApp,
    redes: i64,
    bases: i64,
    juan_perez: MaterialId,
    juan_garcia: MaterialId,
    maria_perez: MaterialId,
}

/// Three LINK materials by different authors, plus one unavailable copy.
async fn seeded() -> anyhow::Result<Seeded> {
    let app = TestApp::start().await?;
    let s = &app.services;
    let redes = s.tags.create("Redes").await?.id;
    let bases = s.tags.create("Bases de datos").await?.id;

    let upload = |name: &str, draft, tags: &[i64]| {
        link_upload(
            STUDENT,
            metadata(name, &[draft], tags),
            "https://example.org/material",
        )
    };
    let juan_perez = s
        .lifecycle
        .upload(upload(
            "Redes de computadoras",
            author("Juan", "Perez", None, "jperez@ipn.mx"),
            &[redes],
        ))
        .await?
        .material
        .id;
    let juan_garcia = s
        .lifecycle
        .upload(upload(
            "Modelo relacional",
            author("Juan", "Garcia", None, "jgarcia@ipn.mx"),
            &[bases],
        ))
        .await?
        .material
        .id;
    let maria_perez = s
        .lifecycle
        .upload(upload(
            "Redes neuronales",
            author("Maria", "Lopez", Some("Perez"), "mlopez@ipn.mx"),
            &[redes, bases],
        ))
        .await?
        .material
        .id;

    Ok(Seeded {
        app,
        redes,
        bases,
        juan_perez,
        juan_garcia,
        maria_perez,
    })
}

fn ids(details: &[domains::MaterialDetail]) -> Vec<MaterialId> {
    details.iter().map(|d| d.material.id).collect()
}

#[tokio::test]
async fn two_token_author_query_needs_both_tokens() -> anyhow::Result<()> {
    let seed = seeded().await?;
    let catalog = &seed.app.services.catalog;

    let query = SearchQuery {
        author_name: Some("Juan Perez".into()),
        ..SearchQuery::default()
    };
    let found = catalog.search(query, Some(STUDENT)).await?;
    assert_eq!(ids(&found), vec![seed.juan_perez]);

    let query = SearchQuery {
        author_name: Some("Juan".into()),
        ..SearchQuery::default()
    };
    let found = catalog.search(query, Some(STUDENT)).await?;
    assert_eq!(ids(&found), vec![seed.juan_perez, seed.juan_garcia]);

    // A single token also matches the maternal surname.
    let query = SearchQuery {
        author_name: Some("perez".into()),
        ..SearchQuery::default()
    };
    let found = catalog.search(query, Some(STUDENT)).await?;
    assert_eq!(ids(&found), vec![seed.juan_perez, seed.maria_perez]);
    Ok(())
}

#[tokio::test]
async fn tags_match_any_and_categories_combine_with_and() -> anyhow::Result<()> {
    let seed = seeded().await?;
    let catalog = &seed.app.services.catalog;

    let query = SearchQuery {
        tag_ids: vec![seed.redes, seed.bases],
        ..SearchQuery::default()
    };
    let found = catalog.search(query, Some(STUDENT)).await?;
    assert_eq!(
        ids(&found),
        vec![seed.juan_perez, seed.juan_garcia, seed.maria_perez]
    );

    let query = SearchQuery {
        material_name: Some("REDES".into()),
        tag_ids: vec![seed.bases],
        ..SearchQuery::default()
    };
    let found = catalog.search(query, Some(STUDENT)).await?;
    assert_eq!(ids(&found), vec![seed.maria_perez]);
    assert_eq!(found[0].tags.len(), 2);
    Ok(())
}

#[tokio::test]
async fn wildcards_in_the_name_are_literal() -> anyhow::Result<()> {
    let seed = seeded().await?;
    let query = SearchQuery {
        material_name: Some("%".into()),
        ..SearchQuery::default()
    };
    let found = seed.app.services.catalog.search(query, Some(STUDENT)).await?;
    assert!(found.is_empty());
    Ok(())
}

#[tokio::test]
async fn unavailable_materials_only_reach_privileged_roles() -> anyhow::Result<()> {
    let seed = seeded().await?;
    let services = &seed.app.services;
    services.lifecycle.set_availability(seed.juan_garcia, 0).await?;

    let query = SearchQuery {
        author_name: Some("Juan".into()),
        ..SearchQuery::default()
    };
    let student = services.catalog.search(query.clone(), Some(STUDENT)).await?;
    assert_eq!(ids(&student), vec![seed.juan_perez]);
    let stranger = services.catalog.search(query.clone(), Some(STRANGER)).await?;
    assert_eq!(ids(&stranger), vec![seed.juan_perez]);
    let admin = services.catalog.search(query, Some(ADMIN)).await?;
    assert_eq!(ids(&admin), vec![seed.juan_perez, seed.juan_garcia]);

    let listing = services.catalog.list_materials(Some(STUDENT)).await?;
    assert_eq!(listing.len(), 2);
    assert_eq!(services.catalog.list_for_review().await?.len(), 3);

    let by_tag = services.catalog.materials_by_tag(seed.bases, None).await?;
    assert_eq!(ids(&by_tag), vec![seed.maria_perez]);
    Ok(())
}

#[tokio::test]
async fn search_needs_a_user_and_lookups_need_existing_parents() -> anyhow::Result<()> {
    let seed = seeded().await?;
    let catalog = &seed.app.services.catalog;

    let anonymous = catalog.search(SearchQuery::default(), None).await;
    assert!(matches!(anonymous, Err(DomainError::Validation(_))));
    assert!(matches!(
        catalog.materials_by_author(9_999, Some(STUDENT)).await,
        Err(DomainError::NotFound(..))
    ));
    assert!(matches!(
        catalog.materials_by_tag(9_999, Some(STUDENT)).await,
        Err(DomainError::NotFound(..))
    ));

    let everything = catalog.search(SearchQuery::default(), Some(STUDENT)).await?;
    assert_eq!(everything.len(), 3);
    Ok(())
}
