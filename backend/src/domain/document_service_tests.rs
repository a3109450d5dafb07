//! Tests for the document workflow service.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{
    DocumentRepositoryError, MockBlobStore, MockDocumentRepository, MockUserRepository,
};
use crate::domain::{ErrorCode, FILE_NAME_MAX, User};

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0)
        .single()
        .expect("valid fixture timestamp")
}

fn user(id: &str, role: Role) -> User {
    User::try_from_strings(id, format!("{id} name"), role).expect("valid user")
}

fn caller(id: &str, role: Role) -> Caller {
    Caller::new(UserId::new(id).expect("valid id"), role)
}

fn document_in(status: DocumentStatus) -> Document {
    let mut document = Document::delivered(
        DocumentId::random(),
        DocumentTitle::new("Quarterly report").expect("title"),
        UserId::new("carla").expect("id"),
        now(),
    );
    document.status = status;
    document
}

fn details_of(document: &Document) -> DocumentDetails {
    DocumentDetails {
        document: document.clone(),
        consultant: user("carla", Role::Consultant),
        attachments: Vec::new(),
    }
}

fn upload(bytes: usize) -> FilePart {
    FilePart::named("report.pdf", vec![7_u8; bytes])
}

#[fixture]
fn admin() -> Caller {
    caller("admin", Role::Admin)
}

#[fixture]
fn owner() -> Caller {
    caller("carla", Role::Consultant)
}

#[fixture]
fn stranger() -> Caller {
    caller("bruno", Role::Consultant)
}

fn service(
    documents: MockDocumentRepository,
    users: MockUserRepository,
    blobs: MockBlobStore,
) -> DocumentService<MockDocumentRepository, MockUserRepository, MockBlobStore> {
    DocumentService::new(
        Arc::new(documents),
        Arc::new(users),
        Arc::new(blobs),
        Arc::new(FixedClock(now())),
    )
}

fn stored_blob() -> StoredBlob {
    StoredBlob {
        key: "blob-key".to_owned(),
        url: "/uploads/blob-key".to_owned(),
    }
}

fn new_document_request(file: Option<FilePart>) -> NewDocumentRequest {
    NewDocumentRequest {
        title: "Quarterly report".to_owned(),
        consultant_id: "carla".to_owned(),
        file,
    }
}

#[rstest]
#[tokio::test]
async fn create_document_requires_admin(owner: Caller) {
    let mut blobs = MockBlobStore::new();
    blobs.expect_store().times(0);
    let svc = service(MockDocumentRepository::new(), MockUserRepository::new(), blobs);

    let err = svc
        .create_document(&owner, new_document_request(Some(upload(4))))
        .await
        .expect_err("consultants cannot create");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[case::nameless(FilePart { file_name: None, bytes: Vec::new() })]
#[case::empty(FilePart::named("report.pdf", Vec::new()))]
#[tokio::test]
async fn create_document_checks_the_role_before_the_file(owner: Caller, #[case] file: FilePart) {
    let svc = service(
        MockDocumentRepository::new(),
        MockUserRepository::new(),
        MockBlobStore::new(),
    );

    let err = svc
        .create_document(&owner, new_document_request(Some(file)))
        .await
        .expect_err("consultants cannot create");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[case::nameless(FilePart { file_name: None, bytes: vec![1] }, "empty_file_name")]
#[case::directory_only(FilePart::named("docs/", vec![1]), "empty_file_name")]
#[case::empty(FilePart::named("report.pdf", Vec::new()), "empty_file")]
#[case::long_name(FilePart::named("a".repeat(FILE_NAME_MAX + 1), vec![1]), "file_name_too_long")]
#[tokio::test]
async fn create_document_rejects_malformed_files(
    admin: Caller,
    #[case] file: FilePart,
    #[case] code: &str,
) {
    let mut blobs = MockBlobStore::new();
    blobs.expect_store().times(0);
    let svc = service(MockDocumentRepository::new(), MockUserRepository::new(), blobs);

    let err = svc
        .create_document(&admin, new_document_request(Some(file)))
        .await
        .expect_err("malformed file");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    let details = err.details().expect("details");
    assert_eq!(details["field"], "file");
    assert_eq!(details["code"], code);
}

#[rstest]
#[case("   ", "title")]
#[case("", "title")]
#[tokio::test]
async fn create_document_rejects_blank_title(
    admin: Caller,
    #[case] title: &str,
    #[case] field: &str,
) {
    let svc = service(
        MockDocumentRepository::new(),
        MockUserRepository::new(),
        MockBlobStore::new(),
    );
    let mut request = new_document_request(Some(upload(4)));
    request.title = title.to_owned();

    let err = svc
        .create_document(&admin, request)
        .await
        .expect_err("blank title");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(err.details().expect("details")["field"], field);
}

#[rstest]
#[tokio::test]
async fn create_document_requires_a_file(admin: Caller) {
    let svc = service(
        MockDocumentRepository::new(),
        MockUserRepository::new(),
        MockBlobStore::new(),
    );

    let err = svc
        .create_document(&admin, new_document_request(None))
        .await
        .expect_err("file missing");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(err.details().expect("details")["field"], "file");
}

#[rstest]
#[tokio::test]
async fn create_document_rejects_oversized_file_before_storing(admin: Caller) {
    let mut blobs = MockBlobStore::new();
    blobs.expect_store().times(0);
    let mut documents = MockDocumentRepository::new();
    documents.expect_create().times(0);
    let svc = service(documents, MockUserRepository::new(), blobs).with_max_upload_bytes(8);

    let err = svc
        .create_document(&admin, new_document_request(Some(upload(9))))
        .await
        .expect_err("too large");

    assert_eq!(err.code(), ErrorCode::PayloadTooLarge);
}

#[rstest]
#[tokio::test]
async fn create_document_reports_unknown_consultant(admin: Caller) {
    let mut users = MockUserRepository::new();
    users.expect_find_by_id().return_once(|_| Ok(None));
    let svc = service(MockDocumentRepository::new(), users, MockBlobStore::new());

    let err = svc
        .create_document(&admin, new_document_request(Some(upload(4))))
        .await
        .expect_err("unknown consultant");

    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn create_document_refuses_non_consultant_target(admin: Caller) {
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .return_once(|_| Ok(Some(user("carla", Role::Admin))));
    let svc = service(MockDocumentRepository::new(), users, MockBlobStore::new());

    let err = svc
        .create_document(&admin, new_document_request(Some(upload(4))))
        .await
        .expect_err("admin target");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(err.details().expect("details")["code"], "not_a_consultant");
}

#[rstest]
#[tokio::test]
async fn create_document_delivers_with_initial_attachment(admin: Caller) {
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .return_once(|_| Ok(Some(user("carla", Role::Consultant))));
    let mut blobs = MockBlobStore::new();
    blobs
        .expect_store()
        .withf(|name, bytes| name == "report.pdf" && bytes.len() == 4)
        .times(1)
        .return_once(|_, _| Ok(stored_blob()));
    let mut documents = MockDocumentRepository::new();
    documents
        .expect_create()
        .withf(|document, initial| {
            document.status == DocumentStatus::Delivered
                && initial.kind == AttachmentKind::Initial
                && initial.document_id == document.id
        })
        .times(1)
        .return_once(|_, _| Ok(()));
    let svc = service(documents, users, blobs);

    let details = svc
        .create_document(&admin, new_document_request(Some(upload(4))))
        .await
        .expect("document created");

    assert_eq!(details.document.status, DocumentStatus::Delivered);
    assert_eq!(details.document.created_at, now());
    assert_eq!(details.attachments.len(), 1);
    assert_eq!(details.attachments[0].url, "/uploads/blob-key");
    assert_eq!(details.attachments[0].file_name, "report.pdf");
}

#[rstest]
#[tokio::test]
async fn create_document_removes_blob_when_insert_fails(admin: Caller) {
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .return_once(|_| Ok(Some(user("carla", Role::Consultant))));
    let mut blobs = MockBlobStore::new();
    blobs.expect_store().return_once(|_, _| Ok(stored_blob()));
    blobs
        .expect_remove()
        .withf(|key| key == "blob-key")
        .times(1)
        .return_once(|_| Ok(()));
    let mut documents = MockDocumentRepository::new();
    documents
        .expect_create()
        .return_once(|_, _| Err(DocumentRepositoryError::connection("pool exhausted")));
    let svc = service(documents, users, blobs);

    let err = svc
        .create_document(&admin, new_document_request(Some(upload(4))))
        .await
        .expect_err("insert fails");

    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[tokio::test]
async fn confirm_receipt_moves_delivered_document(owner: Caller) {
    let document = document_in(DocumentStatus::Delivered);
    let mut confirmed = document.clone();
    confirmed.status = DocumentStatus::ReceiptConfirmed;
    let id = document.id.clone();

    let mut documents = MockDocumentRepository::new();
    documents.expect_find().return_once(move |_| Ok(Some(document)));
    documents
        .expect_update_status()
        .withf(|_, expected, new, at| {
            *expected == DocumentStatus::Delivered
                && *new == DocumentStatus::ReceiptConfirmed
                && *at == now()
        })
        .times(1)
        .return_once(|_, _, _, _| Ok(true));
    let confirmed_details = details_of(&confirmed);
    documents
        .expect_find_details()
        .return_once(move |_| Ok(Some(confirmed_details)));
    let svc = service(documents, MockUserRepository::new(), MockBlobStore::new());

    let details = svc.confirm_receipt(&owner, &id).await.expect("confirmed");

    assert_eq!(details.document.status, DocumentStatus::ReceiptConfirmed);
}

#[rstest]
#[tokio::test]
async fn confirm_receipt_by_another_consultant_is_forbidden(stranger: Caller) {
    let document = document_in(DocumentStatus::Delivered);
    let id = document.id.clone();
    let mut documents = MockDocumentRepository::new();
    documents.expect_find().return_once(move |_| Ok(Some(document)));
    documents.expect_update_status().times(0);
    let svc = service(documents, MockUserRepository::new(), MockBlobStore::new());

    let err = svc
        .confirm_receipt(&stranger, &id)
        .await
        .expect_err("not the owner");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn confirm_receipt_twice_is_an_invalid_transition(owner: Caller) {
    let document = document_in(DocumentStatus::ReceiptConfirmed);
    let id = document.id.clone();
    let mut documents = MockDocumentRepository::new();
    documents.expect_find().return_once(move |_| Ok(Some(document)));
    documents.expect_update_status().times(0);
    let svc = service(documents, MockUserRepository::new(), MockBlobStore::new());

    let err = svc
        .confirm_receipt(&owner, &id)
        .await
        .expect_err("already confirmed");

    assert_eq!(err.code(), ErrorCode::InvalidTransition);
}

#[rstest]
#[tokio::test]
async fn lost_compare_and_set_reports_invalid_transition(owner: Caller) {
    let document = document_in(DocumentStatus::Delivered);
    let id = document.id.clone();
    let mut raced = document.clone();
    raced.status = DocumentStatus::ReceiptConfirmed;

    let mut documents = MockDocumentRepository::new();
    let mut reads = vec![raced, document];
    documents
        .expect_find()
        .times(2)
        .returning(move |_| Ok(reads.pop()));
    documents
        .expect_update_status()
        .return_once(|_, _, _, _| Ok(false));
    documents.expect_find_details().times(0);
    let svc = service(documents, MockUserRepository::new(), MockBlobStore::new());

    let err = svc
        .confirm_receipt(&owner, &id)
        .await
        .expect_err("race lost");

    assert_eq!(err.code(), ErrorCode::InvalidTransition);
    assert!(err.message().contains("RECEIPT_CONFIRMED"));
}

#[rstest]
#[tokio::test]
async fn transition_on_missing_document_is_not_found(admin: Caller) {
    let mut documents = MockDocumentRepository::new();
    documents.expect_find().return_once(|_| Ok(None));
    let svc = service(documents, MockUserRepository::new(), MockBlobStore::new());

    let err = svc
        .confirm_return(&admin, &DocumentId::random())
        .await
        .expect_err("missing");

    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn submit_return_requires_a_file(owner: Caller) {
    let document = document_in(DocumentStatus::ReceiptConfirmed);
    let id = document.id.clone();
    let mut documents = MockDocumentRepository::new();
    documents.expect_find().return_once(move |_| Ok(Some(document)));
    documents.expect_record_return().times(0);
    let svc = service(documents, MockUserRepository::new(), MockBlobStore::new());

    let err = svc
        .submit_return(&owner, &id, None)
        .await
        .expect_err("no file");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn submit_return_by_another_consultant_is_forbidden_whatever_the_file(stranger: Caller) {
    let document = document_in(DocumentStatus::ReceiptConfirmed);
    let id = document.id.clone();
    let mut documents = MockDocumentRepository::new();
    documents.expect_find().return_once(move |_| Ok(Some(document)));
    documents.expect_record_return().times(0);
    let mut blobs = MockBlobStore::new();
    blobs.expect_store().times(0);
    let svc = service(documents, MockUserRepository::new(), blobs);
    let empty = FilePart::named("retorno.pdf", Vec::new());

    let err = svc
        .submit_return(&stranger, &id, Some(empty))
        .await
        .expect_err("not the owner");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn submit_return_records_attachment_and_status(owner: Caller) {
    let document = document_in(DocumentStatus::ReceiptConfirmed);
    let id = document.id.clone();
    let mut returned = details_of(&document);
    returned.document.status = DocumentStatus::ReturnSent;

    let mut documents = MockDocumentRepository::new();
    documents.expect_find().return_once(move |_| Ok(Some(document)));
    documents
        .expect_record_return()
        .withf(|_, attachment, _| attachment.kind == AttachmentKind::Return)
        .times(1)
        .return_once(|_, _, _| Ok(true));
    documents
        .expect_find_details()
        .return_once(move |_| Ok(Some(returned)));
    let mut blobs = MockBlobStore::new();
    blobs
        .expect_store()
        .times(1)
        .return_once(|_, _| Ok(stored_blob()));
    blobs.expect_remove().times(0);
    let svc = service(documents, MockUserRepository::new(), blobs);

    let details = svc
        .submit_return(&owner, &id, Some(upload(16)))
        .await
        .expect("return submitted");

    assert_eq!(details.document.status, DocumentStatus::ReturnSent);
}

#[rstest]
#[tokio::test]
async fn submit_return_cleans_up_when_status_moved(owner: Caller) {
    let document = document_in(DocumentStatus::ReceiptConfirmed);
    let id = document.id.clone();
    let mut archived = document.clone();
    archived.status = DocumentStatus::Archived;

    let mut documents = MockDocumentRepository::new();
    let mut reads = vec![archived, document];
    documents
        .expect_find()
        .times(2)
        .returning(move |_| Ok(reads.pop()));
    documents
        .expect_record_return()
        .return_once(|_, _, _| Ok(false));
    let mut blobs = MockBlobStore::new();
    blobs.expect_store().return_once(|_, _| Ok(stored_blob()));
    blobs.expect_remove().times(1).return_once(|_| Ok(()));
    let svc = service(documents, MockUserRepository::new(), blobs);

    let err = svc
        .submit_return(&owner, &id, Some(upload(16)))
        .await
        .expect_err("archived meanwhile");

    assert_eq!(err.code(), ErrorCode::InvalidTransition);
}

#[rstest]
#[case(DocumentStatus::Delivered)]
#[case(DocumentStatus::ReturnSent)]
#[tokio::test]
async fn change_status_refuses_unreachable_targets(admin: Caller, #[case] status: DocumentStatus) {
    let mut documents = MockDocumentRepository::new();
    documents.expect_find().times(0);
    let svc = service(documents, MockUserRepository::new(), MockBlobStore::new());

    let err = svc
        .change_status(&admin, &DocumentId::random(), status)
        .await
        .expect_err("not requestable");

    assert_eq!(err.code(), ErrorCode::InvalidTransition);
}

#[rstest]
#[tokio::test]
async fn change_status_routes_archive(admin: Caller) {
    let document = document_in(DocumentStatus::Completed);
    let id = document.id.clone();
    let mut archived = details_of(&document);
    archived.document.status = DocumentStatus::Archived;

    let mut documents = MockDocumentRepository::new();
    documents.expect_find().return_once(move |_| Ok(Some(document)));
    documents
        .expect_update_status()
        .withf(|_, expected, new, _| {
            *expected == DocumentStatus::Completed && *new == DocumentStatus::Archived
        })
        .return_once(|_, _, _, _| Ok(true));
    documents
        .expect_find_details()
        .return_once(move |_| Ok(Some(archived)));
    let svc = service(documents, MockUserRepository::new(), MockBlobStore::new());

    let details = svc
        .change_status(&admin, &id, DocumentStatus::Archived)
        .await
        .expect("archived");

    assert_eq!(details.document.status, DocumentStatus::Archived);
}

#[rstest]
#[tokio::test]
async fn delete_document_requires_admin(owner: Caller) {
    let mut documents = MockDocumentRepository::new();
    documents.expect_delete().times(0);
    let svc = service(documents, MockUserRepository::new(), MockBlobStore::new());

    let err = svc
        .delete_document(&owner, &DocumentId::random())
        .await
        .expect_err("forbidden");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn delete_document_reports_missing(admin: Caller) {
    let mut documents = MockDocumentRepository::new();
    documents.expect_delete().return_once(|_| Ok(None));
    let svc = service(documents, MockUserRepository::new(), MockBlobStore::new());

    let err = svc
        .delete_document(&admin, &DocumentId::random())
        .await
        .expect_err("missing");

    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn delete_document_removes_blobs_even_if_one_fails(admin: Caller) {
    let document = document_in(DocumentStatus::Completed);
    let attachment = |kind, key: &str| Attachment {
        id: Uuid::new_v4(),
        document_id: document.id.clone(),
        kind,
        file_name: "f.pdf".to_owned(),
        store_key: key.to_owned(),
        url: format!("/uploads/{key}"),
        created_at: now(),
    };
    let removed = vec![
        attachment(AttachmentKind::Initial, "a"),
        attachment(AttachmentKind::Return, "b"),
    ];

    let mut documents = MockDocumentRepository::new();
    documents.expect_delete().return_once(move |_| Ok(Some(removed)));
    let mut blobs = MockBlobStore::new();
    blobs
        .expect_remove()
        .times(2)
        .returning(|key| match key {
            "a" => Err(crate::domain::ports::BlobStoreError::io("busy")),
            _ => Ok(()),
        });
    let svc = service(documents, MockUserRepository::new(), blobs);

    svc.delete_document(&admin, &document.id)
        .await
        .expect("deleted");
}

#[rstest]
#[tokio::test]
async fn get_document_hides_other_consultants_documents(stranger: Caller) {
    let document = document_in(DocumentStatus::Delivered);
    let id = document.id.clone();
    let details = details_of(&document);
    let mut documents = MockDocumentRepository::new();
    documents
        .expect_find_details()
        .return_once(move |_| Ok(Some(details)));
    let svc = service(documents, MockUserRepository::new(), MockBlobStore::new());

    let err = svc
        .get_document(&stranger, &id)
        .await
        .expect_err("not visible");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn list_documents_scopes_consultants_to_their_own(owner: Caller) {
    let mut documents = MockDocumentRepository::new();
    documents
        .expect_list_details()
        .withf(|scope| *scope == DocumentScope::AssignedTo(UserId::new("carla").expect("id")))
        .times(1)
        .return_once(|_| Ok(Vec::new()));
    let svc = service(documents, MockUserRepository::new(), MockBlobStore::new());

    let listed = svc.list_documents(&owner).await.expect("listed");

    assert!(listed.is_empty());
}

#[rstest]
#[tokio::test]
async fn stats_totals_visible_documents(admin: Caller) {
    let mut documents = MockDocumentRepository::new();
    documents
        .expect_status_counts()
        .withf(|scope| *scope == DocumentScope::All)
        .return_once(|_| {
            Ok(vec![
                (DocumentStatus::Delivered, 3),
                (DocumentStatus::ReturnSent, 1),
                (DocumentStatus::Archived, 2),
            ])
        });
    let svc = service(documents, MockUserRepository::new(), MockBlobStore::new());

    let stats = svc.stats(&admin).await.expect("stats");

    assert_eq!(stats.delivered, 3);
    assert_eq!(stats.receipt_confirmed, 0);
    assert_eq!(stats.archived, 2);
    assert_eq!(stats.total, 6);
}

#[rstest]
#[tokio::test]
async fn repository_query_errors_become_internal(admin: Caller) {
    let mut documents = MockDocumentRepository::new();
    documents
        .expect_list_details()
        .return_once(|_| Err(DocumentRepositoryError::query("bad sql")));
    let svc = service(documents, MockUserRepository::new(), MockBlobStore::new());

    let err = svc.list_documents(&admin).await.expect_err("query fails");

    assert_eq!(err.code(), ErrorCode::InternalError);
}
