//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::Utc;
use reel_core::{
  ReviewDesk,
  access::{ApplicationStatus, CampaignDirectory},
  actor::{Actor, Role},
  asset::AssetRef,
  entry::{
    Category, EntryStatus, MediaKind, NewEntry, Review, Source, Submission,
  },
  metrics::{MetricKey, Metrics},
  status::Decision,
  store::{EntryReview, ReviewStore, ThreadChange},
  thread::{NewComment, ThreadKey, ThreadStatus, ThreadSummary},
  version::is_well_formed,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

const KEY: ThreadKey = ThreadKey {
  campaign_id:   10,
  brand_id:      1,
  influencer_id: 2,
};

fn photo() -> Submission {
  let mut s = Submission::new(Category::new(Source::Manual, MediaKind::Post));
  s.asset = Some(AssetRef {
    path:         "9f/9f86d081.jpg".into(),
    content_hash: "9f86d081".into(),
    media_type:   "image/jpeg".into(),
    size:         512,
    file_name:    Some("beach.jpg".into()),
  });
  s.metrics = Metrics::new().with(MetricKey::Likes, 120);
  s
}

/// Append one submission to `thread_id` at its next version.
async fn append(
  s: &SqliteStore,
  thread_id: i64,
  root: Option<i64>,
) -> reel_core::store::Committed {
  let thread = s.get_thread(thread_id).await.unwrap().unwrap();
  let version = thread.summary.latest_version + 1;
  let mut change =
    ThreadChange::new(thread_id, thread.summary.latest_version, ThreadSummary {
      latest_status: ThreadStatus::Submitted,
      latest_version: version,
      ..thread.summary
    });
  change
    .appended
    .push(NewEntry::submission(thread_id, version, root, 2, photo()));
  s.commit(change).await.unwrap()
}

// ─── Threads ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn find_or_create_is_idempotent() {
  let s = store().await;

  let a = s.find_or_create_thread(KEY).await.unwrap();
  let b = s.find_or_create_thread(KEY).await.unwrap();
  assert_eq!(a.thread_id, b.thread_id);
  assert_eq!(a.key, KEY);
  assert_eq!(a.status(), ThreadStatus::Open);
  assert_eq!(a.summary.latest_version, 0);

  let other = s
    .find_or_create_thread(ThreadKey { influencer_id: 3, ..KEY })
    .await
    .unwrap();
  assert_ne!(other.thread_id, a.thread_id);

  let all = s.list_threads(KEY.campaign_id).await.unwrap();
  assert_eq!(all.len(), 2);
  assert!(s.list_threads(99).await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_thread_and_entry_return_none() {
  let s = store().await;
  assert!(s.get_thread(1234).await.unwrap().is_none());
  assert!(s.get_entry(1234).await.unwrap().is_none());

  let created = s.find_or_create_thread(KEY).await.unwrap();
  assert!(s.root_entry(created.thread_id).await.unwrap().is_none());
  let found = s.get_thread(created.thread_id).await.unwrap().unwrap();
  assert_eq!(found.key, created.key);
}

// ─── Commit ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn root_entry_points_at_itself() {
  let s = store().await;
  let thread = s.find_or_create_thread(KEY).await.unwrap();

  let committed = append(&s, thread.thread_id, None).await;
  let root = &committed.appended[0];
  assert_eq!(root.parent_entry_id, root.entry_id);
  assert_eq!(root.version, 1);
  assert_eq!(committed.thread.summary.latest_version, 1);
  assert_eq!(committed.thread.status(), ThreadStatus::Submitted);

  let second = append(&s, thread.thread_id, Some(root.entry_id)).await;
  assert_eq!(second.appended[0].parent_entry_id, root.entry_id);

  let fetched = s.root_entry(thread.thread_id).await.unwrap().unwrap();
  assert_eq!(fetched.entry_id, root.entry_id);

  let entries = s.list_entries(thread.thread_id).await.unwrap();
  assert_eq!(entries.len(), 2);
  assert!(is_well_formed(&entries));
}

#[tokio::test]
async fn entry_columns_round_trip() {
  let s = store().await;
  let thread = s.find_or_create_thread(KEY).await.unwrap();
  let committed = append(&s, thread.thread_id, None).await;

  let e = s
    .get_entry(committed.appended[0].entry_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(e.submitted_by, Role::Influencer);
  assert_eq!(e.category, Category::new(Source::Manual, MediaKind::Post));
  assert_eq!(e.metrics.get(MetricKey::Likes), Some(120));
  assert_eq!(e.asset, photo().asset);
  assert_eq!(e.status, EntryStatus::Submitted);
  assert!(e.review.is_none());
  assert!(e.is_live());
}

#[tokio::test]
async fn stale_change_is_rejected_and_rolled_back() {
  let s = store().await;
  let thread = s.find_or_create_thread(KEY).await.unwrap();
  append(&s, thread.thread_id, None).await;

  // Planned against version 0, but the thread is at version 1.
  let mut stale = ThreadChange::new(thread.thread_id, 0, thread.summary);
  stale
    .appended
    .push(NewEntry::submission(thread.thread_id, 1, None, 2, photo()));
  let err = s.commit(stale).await.unwrap_err();
  assert!(matches!(
    err,
    Error::VersionConflict { expected: 0, found: 1, .. }
  ));

  let entries = s.list_entries(thread.thread_id).await.unwrap();
  assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn foreign_review_rolls_back_whole_change() {
  let s = store().await;
  let a = s.find_or_create_thread(KEY).await.unwrap();
  let b = s
    .find_or_create_thread(ThreadKey { influencer_id: 3, ..KEY })
    .await
    .unwrap();
  let a1 = append(&s, a.thread_id, None).await.appended.remove(0);
  let b1 = append(&s, b.thread_id, None).await.appended.remove(0);

  let b_now = s.get_thread(b.thread_id).await.unwrap().unwrap();
  let mut change = ThreadChange::new(b.thread_id, 1, b_now.summary);
  change.appended.push(NewEntry::request_card(
    b.thread_id,
    2,
    Some(b1.entry_id),
    1,
    b1.category,
    None,
  ));
  change.reviews.push(EntryReview {
    entry_id: a1.entry_id,
    status:   EntryStatus::Approved,
    review:   Review {
      reviewed_by: 1,
      note:        None,
      reviewed_at: Utc::now(),
    },
  });

  let err = s.commit(change).await.unwrap_err();
  assert!(matches!(err, Error::ForeignEntry { .. }));

  let a1_now = s.get_entry(a1.entry_id).await.unwrap().unwrap();
  assert_eq!(a1_now.status, EntryStatus::Submitted);
  assert_eq!(s.list_entries(b.thread_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn misnumbered_append_is_malformed() {
  let s = store().await;
  let thread = s.find_or_create_thread(KEY).await.unwrap();

  let mut change = ThreadChange::new(thread.thread_id, 0, thread.summary);
  change
    .appended
    .push(NewEntry::submission(thread.thread_id, 3, None, 2, photo()));
  let err = s.commit(change).await.unwrap_err();
  assert!(matches!(err, Error::MalformedChange(_)));
}

#[tokio::test]
async fn review_and_discard_update_in_place() {
  let s = store().await;
  let thread = s.find_or_create_thread(KEY).await.unwrap();
  let v1 = append(&s, thread.thread_id, None).await.appended.remove(0);
  let v2 = append(&s, thread.thread_id, Some(v1.entry_id))
    .await
    .appended
    .remove(0);

  let current = s.get_thread(thread.thread_id).await.unwrap().unwrap();
  let mut change = ThreadChange::new(thread.thread_id, 2, current.summary);
  change.reviews.push(EntryReview {
    entry_id: v1.entry_id,
    status:   EntryStatus::NeedsChanges,
    review:   Review {
      reviewed_by: 1,
      note:        Some("brighter".into()),
      reviewed_at: Utc::now(),
    },
  });
  change.discard = Some(v2.entry_id);
  change.summary.latest_status = ThreadStatus::NeedsChanges;
  let committed = s.commit(change).await.unwrap();
  assert!(committed.appended.is_empty());
  assert_eq!(committed.thread.status(), ThreadStatus::NeedsChanges);
  assert_eq!(committed.thread.summary.latest_version, 2);

  let v1_now = s.get_entry(v1.entry_id).await.unwrap().unwrap();
  assert_eq!(v1_now.status, EntryStatus::NeedsChanges);
  let review = v1_now.review.unwrap();
  assert_eq!(review.reviewed_by, 1);
  assert_eq!(review.note.as_deref(), Some("brighter"));

  let v2_now = s.get_entry(v2.entry_id).await.unwrap().unwrap();
  assert!(!v2_now.is_live());
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn comments_are_listed_oldest_first() {
  let s = store().await;
  let thread = s.find_or_create_thread(KEY).await.unwrap();

  for (role, id, body) in [(Role::Brand, 1, "first"), (Role::Influencer, 2, "second")] {
    s.add_comment(NewComment {
      thread_id:   thread.thread_id,
      author_role: role,
      author_id:   id,
      body:        body.into(),
    })
    .await
    .unwrap();
  }

  let comments = s.list_comments(thread.thread_id).await.unwrap();
  assert_eq!(comments.len(), 2);
  assert_eq!(comments[0].body, "first");
  assert_eq!(comments[1].author_role, Role::Influencer);

  let err = s
    .add_comment(NewComment {
      thread_id:   999,
      author_role: Role::Brand,
      author_id:   1,
      body:        "lost".into(),
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::ThreadNotFound(999)));
}

// ─── Directory ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn directory_upserts() {
  let s = store().await;
  assert_eq!(s.campaign_owner(10).await.unwrap(), None);
  assert_eq!(s.application_status(10, 2).await.unwrap(), None);

  s.upsert_campaign(10, 1).await.unwrap();
  s.upsert_campaign(10, 5).await.unwrap();
  assert_eq!(s.campaign_owner(10).await.unwrap(), Some(5));

  s.set_application_status(10, 2, ApplicationStatus::Pending)
    .await
    .unwrap();
  s.set_application_status(10, 2, ApplicationStatus::BrandApproved)
    .await
    .unwrap();
  assert_eq!(
    s.application_status(10, 2).await.unwrap(),
    Some(ApplicationStatus::BrandApproved)
  );
}

// ─── Through the desk ────────────────────────────────────────────────────────

#[tokio::test]
async fn review_workflow_over_sqlite() {
  let s = store().await;
  s.upsert_campaign(10, 1).await.unwrap();
  s.set_application_status(10, 2, ApplicationStatus::Approved)
    .await
    .unwrap();
  let desk = ReviewDesk::new(s.clone(), s.clone());
  let brand = Actor::brand(1);
  let influencer = Actor::influencer(2);

  let v1 = desk
    .submit_entry(None, 10, influencer, photo())
    .await
    .unwrap();
  let outcome = desk
    .review_entries(
      &[v1.entry_id],
      brand,
      Decision::NeedsChanges,
      Some("retake photo".into()),
      true,
    )
    .await
    .unwrap();
  assert_eq!(outcome.thread.status(), ThreadStatus::Requested);
  assert_eq!(outcome.thread.summary.latest_version, 2);

  let v3 = desk
    .submit_entry(Some(v1.thread_id), 10, influencer, photo())
    .await
    .unwrap();
  assert_eq!(v3.version, 3);

  let outcome = desk
    .review_entries(&[v3.entry_id], brand, Decision::Approved, None, false)
    .await
    .unwrap();
  assert_eq!(outcome.thread.status(), ThreadStatus::Approved);
  assert!(desk.verified_thread(v1.thread_id, brand).await.unwrap());

  let entries = s.list_entries(v1.thread_id).await.unwrap();
  assert!(is_well_formed(&entries));
  assert_eq!(
    entries.iter().map(|e| e.status).collect::<Vec<_>>(),
    vec![
      EntryStatus::NeedsChanges,
      EntryStatus::Requested,
      EntryStatus::Approved,
    ]
  );

  let chain = desk.version_chain(v1.entry_id, influencer).await.unwrap();
  assert_eq!(chain.versions.len(), 3);
  assert_eq!(chain.root_id, v1.entry_id);
  assert_eq!(chain.current_id, v3.entry_id);
}

#[tokio::test]
async fn reopening_a_file_keeps_state() {
  let path = std::env::temp_dir().join(format!(
    "reel-store-test-{}-{}.db",
    std::process::id(),
    Utc::now().timestamp_nanos_opt().unwrap_or_default()
  ));

  let thread_id = {
    let s = SqliteStore::open(&path).await.unwrap();
    let thread = s.find_or_create_thread(KEY).await.unwrap();
    append(&s, thread.thread_id, None).await;
    thread.thread_id
  };

  let s = SqliteStore::open(&path).await.unwrap();
  let thread = s.get_thread(thread_id).await.unwrap().unwrap();
  assert_eq!(thread.summary.latest_version, 1);
  assert_eq!(s.list_entries(thread_id).await.unwrap().len(), 1);

  drop(s);
  for suffix in ["", "-wal", "-shm"] {
    let mut p = path.clone().into_os_string();
    p.push(suffix);
    let _ = std::fs::remove_file(p);
  }
}
