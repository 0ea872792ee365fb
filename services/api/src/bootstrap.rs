//! services/api/src/bootstrap.rs
//!
//! Startup work run once after the store connects: index creation and seed data.
//! Every step is idempotent, and no failure here stops the server from starting.

use classcom_core::domain::{Entity, Message, Meta, Presentation, PresentationStatus, Student, Subject};
use classcom_core::ports::{DocumentStore, PortResult};
use classcom_core::query::{Filter, IndexSpec, SortDirection};
use classcom_core::records;
use tracing::{info, warn};

pub const ADMIN_ROLL_NUMBER: &str = "ADMIN";

/// (code, acronym, title, syllabus)
const SEED_SUBJECTS: [(&str, &str, &str, [&str; 3]); 3] = [
    ("CS101", "CS", "Computer Science Basics", ["Intro to CS", "Algorithms", "Data Structures"]),
    ("MA101", "MA", "Calculus I", ["Limits", "Derivatives", "Integrals"]),
    ("PH101", "PH", "Physics I", ["Kinematics", "Dynamics", "Work & Energy"]),
];

/// (subject code, acronym, topics)
const SEED_TOPICS: [(&str, &str, [&str; 3]); 3] = [
    ("CS101", "CS", ["Sorting Algorithms", "Big-O Notation", "Hash Tables"]),
    ("MA101", "MA", ["Limits in Depth", "Chain Rule", "Area under Curve"]),
    ("PH101", "PH", ["Projectile Motion", "Newton's Laws", "Energy Conservation"]),
];

/// Runs every bootstrap step, logging failures as warnings.
pub async fn run(store: &dyn DocumentStore) {
    ensure_indexes(store).await;

    if let Err(e) = seed_subjects(store).await {
        warn!("Seeding subjects failed: {}", e);
    }
    if let Err(e) = seed_presentations(store).await {
        warn!("Seeding presentations failed: {}", e);
    }
    if let Err(e) = seed_admin(store).await {
        warn!("Seeding the admin account failed: {}", e);
    }
}

async fn ensure_indexes(store: &dyn DocumentStore) {
    let indexes = [
        (Student::COLLECTION, IndexSpec::unique("roll_number")),
        (Subject::COLLECTION, IndexSpec::unique("code")),
        (Meta::COLLECTION, IndexSpec::unique("key")),
        (
            Presentation::COLLECTION,
            IndexSpec::compound([
                ("assigned_to", SortDirection::Ascending),
                ("due_date", SortDirection::Ascending),
            ]),
        ),
        (
            Message::COLLECTION,
            IndexSpec::compound([("created_at", SortDirection::Descending)]),
        ),
    ];

    for (collection, index) in &indexes {
        if let Err(e) = store.ensure_index(collection, index).await {
            warn!("Could not create index {}: {}", index.name(collection), e);
        }
    }
}

/// Submission form links are keyed by the subject acronym.
fn submission_link(acronym: &str) -> String {
    format!("https://forms.gle/your-{}-form", acronym.to_lowercase())
}

async fn seed_subjects(store: &dyn DocumentStore) -> PortResult<()> {
    if store.count(Subject::COLLECTION, &Filter::All).await? > 0 {
        return Ok(());
    }
    for (code, acronym, title, syllabus) in SEED_SUBJECTS {
        let subject = Subject {
            code: code.to_string(),
            acronym: acronym.to_string(),
            title: title.to_string(),
            syllabus: syllabus.iter().map(|s| s.to_string()).collect(),
        };
        records::insert(store, &subject).await?;
    }
    info!("Seeded {} subjects.", SEED_SUBJECTS.len());
    Ok(())
}

async fn seed_presentations(store: &dyn DocumentStore) -> PortResult<()> {
    if store.count(Presentation::COLLECTION, &Filter::All).await? > 0 {
        return Ok(());
    }
    let mut seeded = 0;
    for (code, acronym, topics) in SEED_TOPICS {
        for topic in topics {
            let presentation = Presentation {
                subject_code: code.to_string(),
                subject_acronym: acronym.to_string(),
                topic: topic.to_string(),
                assigned_to: None,
                due_date: None,
                status: PresentationStatus::Upcoming,
                submission_link: Some(submission_link(acronym)),
            };
            records::insert(store, &presentation).await?;
            seeded += 1;
        }
    }
    info!("Seeded {} presentation topics.", seeded);
    Ok(())
}

async fn seed_admin(store: &dyn DocumentStore) -> PortResult<()> {
    let filter = Filter::eq("roll_number", ADMIN_ROLL_NUMBER);
    if store.count(Student::COLLECTION, &filter).await? > 0 {
        return Ok(());
    }
    records::insert(store, &Student::admin(ADMIN_ROLL_NUMBER, "Administrator")).await?;
    info!("Seeded the {} account.", ADMIN_ROLL_NUMBER);
    Ok(())
}
