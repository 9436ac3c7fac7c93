//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::Duration;
use ligtas_core::{
  case::NewCase,
  chat::{ChatKind, NewChatMessage},
  form::{CompletionForm, IncidentType, IntakeForm, InvestigationForm, ReferralForm},
  news::NewNews,
  reference::ReferenceCode,
  staff::{Role, StaffUpdate},
  status::CaseStatus,
  store::{CaseQuery, CaseStore, Failure, StoreError},
  workflow::{Capture, TransitionRequest},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn intake() -> IntakeForm {
  IntakeForm {
    reportee: "Maria Santos".into(),
    name: "Juan Dela Cruz".into(),
    age: 9,
    contact: "09171234567".into(),
    incident_type: IncidentType::PhysicalAbuse,
    address: "Poblacion".into(),
    sex: "Male".into(),
    ..Default::default()
  }
}

fn new_case() -> NewCase {
  NewCase { form_data: intake(), ..Default::default() }
}

fn assign(email: &str) -> TransitionRequest {
  TransitionRequest::with(CaseStatus::Assigned, Capture::Assignee(email.into()))
}

fn referral() -> TransitionRequest {
  TransitionRequest::with(
    CaseStatus::UnderInvestigation,
    Capture::Referral(ReferralForm {
      referral_reason: "bruises noticed at school".into(),
      ..Default::default()
    }),
  )
}

fn investigation() -> TransitionRequest {
  TransitionRequest::with(
    CaseStatus::InProgress,
    Capture::Investigation(InvestigationForm {
      officer_report: "home visit done".into(),
      ..Default::default()
    }),
  )
}

fn completion() -> TransitionRequest {
  TransitionRequest::with(
    CaseStatus::Completed,
    Capture::Completion(CompletionForm { initial_assessment: "child is safe".into() }),
  )
}

// ─── Cases ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_case() {
  let s = store().await;
  let case = s.create_case(new_case()).await.unwrap();
  assert_eq!(case.status, CaseStatus::Review);
  assert_eq!(case.version, 1);

  let fetched = s.get_case(case.case_id).await.unwrap().unwrap();
  assert_eq!(fetched, case);
}

#[tokio::test]
async fn get_case_missing_returns_none() {
  let s = store().await;
  assert!(s.get_case(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn reference_lookup_matches_prefix_and_suffix() {
  let s = store().await;
  let case = s.create_case(new_case()).await.unwrap();
  s.create_case(new_case()).await.unwrap();

  let typed = case.reference_code.as_str().to_uppercase();
  let code = ReferenceCode::parse(&typed).unwrap();
  let found = s.find_by_reference(&code).await.unwrap().unwrap();
  assert_eq!(found.case_id, case.case_id);
  assert!(code.matches(found.case_id));

  let other = ReferenceCode::parse("ffffff").unwrap();
  let miss = s.find_by_reference(&other).await.unwrap();
  assert!(miss.is_none_or(|c| other.matches(c.case_id)));
}

#[tokio::test]
async fn colliding_reference_code_redraws_the_id() {
  let s = store().await;
  let first = Uuid::parse_str("abc00000-0000-4000-8000-000000000def").unwrap();
  let clash = Uuid::parse_str("abc11111-1111-4111-8111-111111111def").unwrap();
  let fresh = Uuid::parse_str("12300000-0000-4000-8000-000000000456").unwrap();

  let a = s.create_case_drawing(new_case(), || first).await.unwrap();
  let mut ids = vec![clash, fresh].into_iter();
  let b = s
    .create_case_drawing(new_case(), move || ids.next().unwrap_or_else(Uuid::new_v4))
    .await
    .unwrap();

  assert_eq!(a.reference_code.as_str(), "abcdef");
  assert_eq!(b.case_id, fresh);
  assert_eq!(b.reference_code.as_str(), "123456");
}

#[tokio::test]
async fn exhausted_reference_codes_fail_cleanly() {
  let s = store().await;
  let id = Uuid::new_v4();
  s.create_case_drawing(new_case(), || id).await.unwrap();
  let err = s.create_case_drawing(new_case(), || id).await.unwrap_err();
  assert!(matches!(err, Error::ReferenceCodeExhausted));
}

#[tokio::test]
async fn list_cases_filters_and_orders_newest_first() {
  let s = store().await;
  let a = s.create_case(new_case()).await.unwrap();
  let b = s
    .create_case(NewCase {
      form_data: IntakeForm {
        incident_type: IncidentType::Neglect,
        address: "Tiep".into(),
        name: "Ana Reyes".into(),
        ..intake()
      },
      ..Default::default()
    })
    .await
    .unwrap();

  let all = s.list_cases(&CaseQuery::default()).await.unwrap();
  let ids: Vec<Uuid> = all.iter().map(|c| c.case_id).collect();
  assert_eq!(ids, vec![b.case_id, a.case_id]);

  let q = CaseQuery { address: Some("tiep".into()), ..Default::default() };
  assert_eq!(s.list_cases(&q).await.unwrap().len(), 1);

  let q = CaseQuery { incident_type: Some(IncidentType::PhysicalAbuse), ..Default::default() };
  let found = s.list_cases(&q).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].case_id, a.case_id);

  let q = CaseQuery { text: Some("reyes".into()), ..Default::default() };
  assert_eq!(s.list_cases(&q).await.unwrap()[0].case_id, b.case_id);

  let q = CaseQuery { limit: Some(1), offset: Some(1), ..Default::default() };
  assert_eq!(s.list_cases(&q).await.unwrap()[0].case_id, a.case_id);

  let q = CaseQuery {
    created_after: Some(a.created_at + Duration::days(1)),
    ..Default::default()
  };
  assert!(s.list_cases(&q).await.unwrap().is_empty());
}

#[tokio::test]
async fn text_search_treats_wildcards_literally() {
  let s = store().await;
  let plain = s.create_case(new_case()).await.unwrap();
  let marked = s
    .create_case(NewCase {
      form_data: IntakeForm { name: "Ana 100% Reyes".into(), ..intake() },
      ..Default::default()
    })
    .await
    .unwrap();

  for text in ["_", "%", "Juan_Dela"] {
    let q = CaseQuery { text: Some(text.into()), ..Default::default() };
    let found: Vec<Uuid> =
      s.list_cases(&q).await.unwrap().iter().map(|c| c.case_id).collect();
    assert!(!found.contains(&plain.case_id), "{text:?} matched {found:?}");
  }

  let q = CaseQuery { text: Some("100%".into()), ..Default::default() };
  let found = s.list_cases(&q).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].case_id, marked.case_id);
}

#[tokio::test]
async fn removed_cases_can_be_hidden() {
  let s = store().await;
  let kept = s.create_case(new_case()).await.unwrap();
  let gone = s.create_case(new_case()).await.unwrap();
  s.transition(gone.case_id, 1, TransitionRequest::to(CaseStatus::Removed))
    .await
    .unwrap();

  let q = CaseQuery { hide_removed: true, ..Default::default() };
  let visible = s.list_cases(&q).await.unwrap();
  assert_eq!(visible.len(), 1);
  assert_eq!(visible[0].case_id, kept.case_id);

  let q = CaseQuery {
    hide_removed: true,
    status: Some(CaseStatus::Removed),
    ..Default::default()
  };
  assert_eq!(s.list_cases(&q).await.unwrap()[0].case_id, gone.case_id);
}

// ─── Transitions ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn intake_to_investigation_then_skip_is_rejected() {
  let s = store().await;
  let case = s.create_case(new_case()).await.unwrap();
  let id = case.case_id;

  let case = s
    .transition(id, case.version, TransitionRequest::to(CaseStatus::Unassigned))
    .await
    .unwrap();
  assert_eq!(case.status, CaseStatus::Unassigned);

  let case = s.transition(id, case.version, assign("officer@bani.gov")).await.unwrap();
  assert_eq!(case.status, CaseStatus::Assigned);
  assert_eq!(case.assigned.as_deref(), Some("officer@bani.gov"));

  let case = s.transition(id, case.version, referral()).await.unwrap();
  assert_eq!(case.status, CaseStatus::UnderInvestigation);
  let first_form = case.first_form.as_ref().unwrap();
  assert_eq!(first_form.user_name, "Juan Dela Cruz");

  let err = s.transition(id, case.version, completion()).await.unwrap_err();
  assert_eq!(err.failure(), Failure::Rejected);
  assert_eq!(err.rejection().unwrap().reason(), "invalid-transition");

  let stored = s.get_case(id).await.unwrap().unwrap();
  assert_eq!(stored, case);
}

#[tokio::test]
async fn every_stored_status_carries_its_form() {
  let s = store().await;
  let mut case = s.create_case(new_case()).await.unwrap();
  let id = case.case_id;

  for request in [
    TransitionRequest::to(CaseStatus::Unassigned),
    assign("officer@bani.gov"),
    referral(),
    investigation(),
    completion(),
    TransitionRequest::to(CaseStatus::InProgress),
    TransitionRequest::to(CaseStatus::UnderInvestigation),
  ] {
    case = s.transition(id, case.version, request).await.unwrap();
    let stored = s.get_case(id).await.unwrap().unwrap();
    assert!(stored.capture_invariant_holds(), "broken at {}", stored.status);
  }
}

#[tokio::test]
async fn reopening_preserves_completion_form() {
  let s = store().await;
  let mut case = s.create_case(new_case()).await.unwrap();
  let id = case.case_id;
  for request in [
    TransitionRequest::to(CaseStatus::Unassigned),
    assign("officer@bani.gov"),
    referral(),
    investigation(),
    completion(),
  ] {
    case = s.transition(id, case.version, request).await.unwrap();
  }
  let completed_form = case.complete_form.clone();

  let reopened = s
    .transition(id, case.version, TransitionRequest::to(CaseStatus::InProgress))
    .await
    .unwrap();
  assert_eq!(reopened.status, CaseStatus::InProgress);
  assert_eq!(reopened.complete_form, completed_form);
  assert!(reopened.complete_form.is_some());
}

#[tokio::test]
async fn missing_form_is_rejected_and_nothing_changes() {
  let s = store().await;
  let case = s.create_case(new_case()).await.unwrap();
  let id = case.case_id;
  let case = s
    .transition(id, 1, TransitionRequest::to(CaseStatus::Unassigned))
    .await
    .unwrap();

  let err = s
    .transition(id, case.version, TransitionRequest::to(CaseStatus::Assigned))
    .await
    .unwrap_err();
  assert_eq!(err.rejection().unwrap().reason(), "missing-required-form");
  assert_eq!(s.get_case(id).await.unwrap().unwrap(), case);
}

#[tokio::test]
async fn second_stale_assignment_conflicts() {
  let s = store().await;
  let case = s.create_case(new_case()).await.unwrap();
  let id = case.case_id;
  let case = s
    .transition(id, 1, TransitionRequest::to(CaseStatus::Unassigned))
    .await
    .unwrap();
  let seen = case.version;

  let first = s.transition(id, seen, assign("first@bani.gov")).await.unwrap();
  let err = s.transition(id, seen, assign("second@bani.gov")).await.unwrap_err();
  assert_eq!(err.failure(), Failure::Conflict);

  let stored = s.get_case(id).await.unwrap().unwrap();
  assert_eq!(stored.assigned.as_deref(), Some("first@bani.gov"));
  assert_eq!(stored.version, first.version);
}

#[tokio::test]
async fn concurrent_assignments_have_one_winner() {
  let s = store().await;
  let case = s.create_case(new_case()).await.unwrap();
  let id = case.case_id;
  let case = s
    .transition(id, 1, TransitionRequest::to(CaseStatus::Unassigned))
    .await
    .unwrap();
  let seen = case.version;

  let (a, b) = tokio::join!(
    s.transition(id, seen, assign("first@bani.gov")),
    s.transition(id, seen, assign("second@bani.gov")),
  );
  let winners = [&a, &b].iter().filter(|r| r.is_ok()).count();
  assert_eq!(winners, 1);
  let loser = if a.is_ok() { b } else { a };
  assert_eq!(loser.unwrap_err().failure(), Failure::Conflict);
}

#[tokio::test]
async fn transition_on_missing_case_is_not_found() {
  let s = store().await;
  let err = s
    .transition(Uuid::new_v4(), 1, TransitionRequest::to(CaseStatus::Unassigned))
    .await
    .unwrap_err();
  assert_eq!(err.failure(), Failure::NotFound);
}

#[tokio::test]
async fn correct_intake_bumps_version_and_refilters() {
  let s = store().await;
  let case = s.create_case(new_case()).await.unwrap();
  let fixed = IntakeForm { address: "Tiep".into(), ..intake() };

  let case = s.correct_intake(case.case_id, 1, fixed).await.unwrap();
  assert_eq!(case.version, 2);
  let q = CaseQuery { address: Some("Tiep".into()), ..Default::default() };
  assert_eq!(s.list_cases(&q).await.unwrap().len(), 1);

  let err = s.correct_intake(case.case_id, 1, intake()).await.unwrap_err();
  assert_eq!(err.failure(), Failure::Conflict);
}

#[tokio::test]
async fn attachments_append_in_order() {
  let s = store().await;
  let case = s
    .create_case(NewCase { file_uploads: vec!["a.jpg".into()], ..new_case() })
    .await
    .unwrap();

  let case = s
    .attach_files(case.case_id, vec!["b.jpg".into(), " ".into(), "c.pdf".into()])
    .await
    .unwrap();
  assert_eq!(case.file_uploads, vec!["a.jpg", "b.jpg", "c.pdf"]);
  assert_eq!(case.version, 2);

  let err = s.attach_files(Uuid::new_v4(), vec!["x".into()]).await.unwrap_err();
  assert_eq!(err.failure(), Failure::NotFound);
}

#[tokio::test]
async fn delete_case_takes_its_chats() {
  let s = store().await;
  let case = s.create_case(new_case()).await.unwrap();
  s.append_chat(case.case_id, "client".into(), NewChatMessage::text("hello"))
    .await
    .unwrap();

  assert!(s.delete_case(case.case_id).await.unwrap());
  assert!(!s.delete_case(case.case_id).await.unwrap());
  assert!(s.list_chats(case.case_id, None).await.unwrap().is_empty());
}

// ─── Chats ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn chats_are_ordered_and_incremental() {
  let s = store().await;
  let case = s.create_case(new_case()).await.unwrap();
  let id = case.case_id;

  let first = s.append_chat(id, "client".into(), NewChatMessage::text("one")).await.unwrap();
  s.append_chat(id, "officer".into(), NewChatMessage::text("two")).await.unwrap();
  let file = s
    .append_chat(id, "client".into(), NewChatMessage {
      message: String::new(),
      files:   vec!["x.jpg".into(), "y.jpg".into()],
    })
    .await
    .unwrap();
  assert_eq!(file.kind, ChatKind::File);
  assert_eq!(file.files(), vec!["x.jpg", "y.jpg"]);

  let all = s.list_chats(id, None).await.unwrap();
  let bodies: Vec<&str> = all.iter().map(|m| m.body.as_str()).collect();
  assert_eq!(bodies, vec!["one", "two", "x.jpg,y.jpg"]);

  let later = s.list_chats(id, Some(first.created_at)).await.unwrap();
  assert!(later.iter().all(|m| m.created_at > first.created_at));
  assert!(later.iter().all(|m| m.message_id != first.message_id));
}

#[tokio::test]
async fn chat_on_missing_case_is_not_found() {
  let s = store().await;
  let err = s
    .append_chat(Uuid::new_v4(), "x".into(), NewChatMessage::text("hi"))
    .await
    .unwrap_err();
  assert_eq!(err.failure(), Failure::NotFound);
}

// ─── News ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn news_lists_newest_first() {
  let s = store().await;
  let older = s
    .publish_news(NewNews {
      title:   "Older".into(),
      caption: "first".into(),
      images:  vec![],
    })
    .await
    .unwrap();
  let newer = s
    .publish_news(NewNews {
      title:   " Newer ".into(),
      caption: "second".into(),
      images:  vec!["banner.png".into()],
    })
    .await
    .unwrap();
  assert_eq!(newer.title, "Newer");

  let list = s.list_news().await.unwrap();
  let ids: Vec<Uuid> = list.iter().map(|n| n.news_id).collect();
  assert_eq!(ids, vec![newer.news_id, older.news_id]);
  assert_eq!(s.get_news(older.news_id).await.unwrap().unwrap(), older);
}

// ─── Staff ───────────────────────────────────────────────────────────────────

fn officer(email: &str, role: Role) -> StaffUpdate {
  StaffUpdate {
    email:     email.into(),
    full_name: "Officer Full".into(),
    name:      "Officer".into(),
    role,
    address:   "Poblacion".into(),
  }
}

#[tokio::test]
async fn staff_crud_and_email_uniqueness() {
  let s = store().await;
  let a = s
    .create_staff(officer("officer@bani.gov", Role::Admin), "$argon2id$x".into())
    .await
    .unwrap();

  let dup = s
    .create_staff(officer("OFFICER@bani.gov", Role::Barangay), "$argon2id$y".into())
    .await
    .unwrap_err();
  assert_eq!(dup.failure(), Failure::Duplicate);

  let found = s.find_staff_by_email("Officer@Bani.gov").await.unwrap().unwrap();
  assert_eq!(found.staff_id, a.staff_id);
  assert_eq!(found.password_hash, "$argon2id$x");

  let b = s
    .create_staff(officer("captain@bani.gov", Role::Barangay), "$argon2id$z".into())
    .await
    .unwrap();
  let clash = s
    .update_staff(b.staff_id, officer("officer@bani.gov", Role::Barangay))
    .await
    .unwrap_err();
  assert_eq!(clash.failure(), Failure::Duplicate);

  let updated = s
    .update_staff(b.staff_id, StaffUpdate {
      address: "Tiep".into(),
      ..officer("captain@bani.gov", Role::Barangay)
    })
    .await
    .unwrap();
  assert_eq!(updated.address, "Tiep");
  assert_eq!(updated.password_hash, "$argon2id$z");

  let missing = s
    .update_staff(Uuid::new_v4(), officer("x@bani.gov", Role::Admin))
    .await
    .unwrap_err();
  assert_eq!(missing.failure(), Failure::NotFound);

  assert!(s.delete_staff(a.staff_id).await.unwrap());
  assert!(!s.delete_staff(a.staff_id).await.unwrap());
}

#[tokio::test]
async fn list_staff_by_role() {
  let s = store().await;
  s.create_staff(officer("a@bani.gov", Role::Admin), "h".into()).await.unwrap();
  s.create_staff(officer("b@bani.gov", Role::Barangay), "h".into()).await.unwrap();
  s.create_staff(officer("c@bani.gov", Role::Superadmin), "h".into()).await.unwrap();

  let officers = s.list_staff(&[Role::Admin]).await.unwrap();
  assert_eq!(officers.len(), 1);
  assert_eq!(officers[0].email, "a@bani.gov");

  let managed = s.list_staff(&[Role::Admin, Role::Barangay]).await.unwrap();
  assert_eq!(managed.len(), 2);
  assert_eq!(s.list_staff(&[]).await.unwrap().len(), 3);
}
