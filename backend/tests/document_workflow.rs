//! End-to-end document workflow over the assembled HTTP application.
//!
//! Requests run through the production routing, session and error mapping
//! with in-memory repositories and a temporary upload directory.

mod support;

use actix_web::http::StatusCode;
use actix_web::test;
use rstest::rstest;
use serde_json::Value;

use doctrack::server::build_app;
use support::{
    ADMIN, ANA, MAYCO, Part, call_json, create_document, get, harness, login, multipart_post,
    status_request,
};

const LIMIT: usize = 64 * 1024;

#[actix_web::test]
async fn document_travels_from_delivery_to_completion() {
    let harness = harness(LIMIT).await;
    let app = test::init_service(build_app(harness.deps.clone())).await;
    let admin = login(&app, ADMIN).await;
    let mayco = login(&app, MAYCO).await;

    let (status, consultants) = call_json(&app, get("/api/consultants", &admin)).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = consultants
        .as_array()
        .expect("consultant list")
        .iter()
        .filter_map(|user| user["id"].as_str())
        .collect();
    assert_eq!(names, [ANA.0, MAYCO.0]);

    let id = create_document(&app, &admin, "Contrato de prestação", MAYCO.0).await;
    let (status, created) = call_json(&app, get(&format!("/api/documents/{id}"), &mayco)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["status"], "DELIVERED");
    assert_eq!(created["consultant"]["id"], MAYCO.0);
    let initial_url = created["attachments"][0]["fileUrl"]
        .as_str()
        .expect("initial file url")
        .to_owned();
    assert!(initial_url.starts_with("/uploads/"));

    let (status, confirmed) = call_json(&app, status_request(&id, &mayco, "RECEIPT_CONFIRMED")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["status"], "RECEIPT_CONFIRMED");

    let (status, returned) = call_json(
        &app,
        multipart_post(
            &format!("/api/documents/{id}/return"),
            &mayco,
            &[Part::File("file", "assinado.pdf", b"%PDF-1.7 signed")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(returned["status"], "RETURN_SENT");
    let kinds: Vec<&str> = returned["attachments"]
        .as_array()
        .expect("attachments")
        .iter()
        .filter_map(|attachment| attachment["attachmentType"].as_str())
        .collect();
    assert_eq!(kinds, ["INITIAL", "RETURN"]);
    assert_eq!(harness.stored_files(), 2);

    let (status, completed) = call_json(&app, status_request(&id, &admin, "COMPLETED")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["status"], "COMPLETED");

    let (status, body) = call_json(&app, status_request(&id, &mayco, "RECEIPT_CONFIRMED")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_transition");

    let res = test::call_service(&app, get(&initial_url, &admin)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(test::read_body(res).await, "%PDF-1.7 initial");
}

#[actix_web::test]
async fn consultants_only_see_their_own_documents() {
    let harness = harness(LIMIT).await;
    let app = test::init_service(build_app(harness.deps.clone())).await;
    let admin = login(&app, ADMIN).await;
    let ana = login(&app, ANA).await;
    let id = create_document(&app, &admin, "Aditivo", MAYCO.0).await;

    let (status, listed) = call_json(&app, get("/api/documents", &ana)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, Value::Array(Vec::new()));

    let (status, body) = call_json(&app, get(&format!("/api/documents/{id}"), &ana)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");

    let (status, _) = call_json(&app, status_request(&id, &ana, "RECEIPT_CONFIRMED")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[rstest]
#[case::empty(Part::File("file", "vazio.pdf", b""))]
#[case::nameless(Part::File("file", "", b"%PDF"))]
#[actix_web::test]
async fn wrong_caller_is_forbidden_whatever_the_file(#[case] file: Part<'static>) {
    let harness = harness(LIMIT).await;
    let app = test::init_service(build_app(harness.deps.clone())).await;
    let admin = login(&app, ADMIN).await;
    let mayco = login(&app, MAYCO).await;
    let ana = login(&app, ANA).await;

    let (status, body) = call_json(
        &app,
        multipart_post(
            "/api/documents",
            &mayco,
            &[
                Part::Text("title", "Indevido"),
                Part::Text("consultantId", MAYCO.0),
                file,
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");

    let id = create_document(&app, &admin, "Procuração", MAYCO.0).await;
    call_json(&app, status_request(&id, &mayco, "RECEIPT_CONFIRMED")).await;
    let (status, body) = call_json(
        &app,
        multipart_post(&format!("/api/documents/{id}/return"), &ana, &[file]),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");
    assert_eq!(harness.stored_files(), 1);
}

#[actix_web::test]
async fn failed_return_leaves_the_document_untouched() {
    let harness = harness(LIMIT).await;
    let app = test::init_service(build_app(harness.deps.clone())).await;
    let admin = login(&app, ADMIN).await;
    let mayco = login(&app, MAYCO).await;
    let id = create_document(&app, &admin, "Procuração", MAYCO.0).await;

    // Receipt has not been confirmed yet.
    let (status, body) = call_json(
        &app,
        multipart_post(
            &format!("/api/documents/{id}/return"),
            &mayco,
            &[Part::File("file", "assinado.pdf", b"signed")],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_transition");
    let (_, document) = call_json(&app, get(&format!("/api/documents/{id}"), &mayco)).await;
    assert_eq!(document["status"], "DELIVERED");
    assert_eq!(document["attachments"].as_array().map(Vec::len), Some(1));
    assert_eq!(harness.stored_files(), 1);
}

#[rstest]
#[case::create(true)]
#[case::submit_return(false)]
#[actix_web::test]
async fn oversized_uploads_are_rejected_without_storing(#[case] on_create: bool) {
    let harness = harness(1024).await;
    let app = test::init_service(build_app(harness.deps.clone())).await;
    let admin = login(&app, ADMIN).await;
    let mayco = login(&app, MAYCO).await;
    let oversized = vec![b'x'; 4096];

    let (status, body) = if on_create {
        call_json(
            &app,
            multipart_post(
                "/api/documents",
                &admin,
                &[
                    Part::Text("title", "Grande"),
                    Part::Text("consultantId", MAYCO.0),
                    Part::File("file", "grande.bin", &oversized),
                ],
            ),
        )
        .await
    } else {
        let id = create_document(&app, &admin, "Pequeno", MAYCO.0).await;
        let (status, _) = call_json(&app, status_request(&id, &mayco, "RECEIPT_CONFIRMED")).await;
        assert_eq!(status, StatusCode::OK);
        call_json(
            &app,
            multipart_post(
                &format!("/api/documents/{id}/return"),
                &mayco,
                &[Part::File("file", "grande.bin", &oversized)],
            ),
        )
        .await
    };

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["code"], "payload_too_large");
    let expected_files = usize::from(!on_create);
    assert_eq!(harness.stored_files(), expected_files);
}

#[actix_web::test]
async fn stats_add_up_to_the_total() {
    let harness = harness(LIMIT).await;
    let app = test::init_service(build_app(harness.deps.clone())).await;
    let admin = login(&app, ADMIN).await;
    let mayco = login(&app, MAYCO).await;
    let first = create_document(&app, &admin, "Um", MAYCO.0).await;
    let second = create_document(&app, &admin, "Dois", MAYCO.0).await;
    create_document(&app, &admin, "Três", ANA.0).await;
    call_json(&app, status_request(&first, &mayco, "RECEIPT_CONFIRMED")).await;
    call_json(&app, status_request(&second, &admin, "ARCHIVED")).await;

    let (status, stats) = call_json(&app, get("/api/stats", &admin)).await;
    assert_eq!(status, StatusCode::OK);
    let parts: u64 = ["delivered", "receiptConfirmed", "returnSent", "completed", "archived"]
        .iter()
        .filter_map(|key| stats[*key].as_u64())
        .sum();
    assert_eq!(stats["total"], 3);
    assert_eq!(parts, 3);
    assert_eq!(stats["delivered"], 1);
    assert_eq!(stats["receiptConfirmed"], 1);
    assert_eq!(stats["archived"], 1);

    let (_, scoped) = call_json(&app, get("/api/stats", &mayco)).await;
    assert_eq!(scoped["total"], 2);
}

#[actix_web::test]
async fn deleting_a_document_removes_its_files() {
    let harness = harness(LIMIT).await;
    let app = test::init_service(build_app(harness.deps.clone())).await;
    let admin = login(&app, ADMIN).await;
    let id = create_document(&app, &admin, "Rascunho", MAYCO.0).await;
    assert_eq!(harness.stored_files(), 1);

    let res = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/documents/{id}"))
            .cookie(admin.clone())
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(harness.stored_files(), 0);
    let (status, _) = call_json(&app, get(&format!("/api/documents/{id}"), &admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn anonymous_requests_are_unauthorised() {
    let harness = harness(LIMIT).await;
    let app = test::init_service(build_app(harness.deps.clone())).await;

    let (status, body) = call_json(
        &app,
        test::TestRequest::get().uri("/api/documents").to_request(),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");
    assert!(body["traceId"].is_string());
}
