//! Tests for database repository operations.

use diesel::Connection;
use diesel::SqliteConnection;
use diesel::connection::SimpleConnection;
use diesel_migrations::MigrationHarness;
use tempfile::NamedTempFile;

use strictly_gomoku::{
    MIGRATIONS, MatchRepository, MatchStatus, MatchStore, MoveOutcome, Outcome, Seat,
};

/// Creates a temporary database file with schema applied, returns the file
/// handle (must stay in scope to keep the file alive) and a ready repository.
fn setup_test_db() -> (NamedTempFile, MatchRepository) {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();

    let mut conn = SqliteConnection::establish(&db_path).expect("Failed to connect");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Migrations failed");

    let repo = MatchRepository::new(db_path).expect("Failed to create repository");
    (db_file, repo)
}

#[test]
fn test_empty_path_rejected() {
    assert!(MatchRepository::new("  ".to_string()).is_err());
}

#[test]
fn test_run_migrations_is_idempotent() {
    let (_db, repo) = setup_test_db();
    repo.run_migrations().expect("Re-running migrations failed");
}

#[test]
fn test_insert_match_starts_waiting() {
    let (_db, repo) = setup_test_db();
    let game = repo.insert_match(1).expect("Create failed");
    assert_eq!(game.id(), 1);
    assert_eq!(game.status(), MatchStatus::Waiting);
    assert_eq!(game.host(), 1);
    assert_eq!(game.guest(), None);
    assert_eq!(game.board().stone_count(), 0);

    let second = repo.insert_match(1).expect("Create failed");
    assert_eq!(second.id(), 2);
}

#[test]
fn test_find_match_not_found() {
    let (_db, repo) = setup_test_db();
    assert!(repo.find_match(42).expect("Query failed").is_none());
}

#[test]
fn test_join_and_moves_round_trip() {
    let (_db, repo) = setup_test_db();
    let mut game = repo.insert_match(1).expect("Create failed");
    game.join(2).expect("Join failed");
    repo.save_match(&game).expect("Save failed");

    for (player, x, y) in [(1, 7, 7), (2, 0, 0), (1, 8, 7)] {
        let outcome = game.apply_move(player, x, y).expect("Move rejected");
        repo.record_move(&game, outcome.record())
            .expect("Record failed");
    }

    let loaded = repo
        .find_match(game.id())
        .expect("Query failed")
        .expect("Match missing");
    assert_eq!(loaded.status(), MatchStatus::Playing);
    assert_eq!(loaded.guest(), Some(2));
    assert_eq!(loaded.turn(), Some(2));
    assert_eq!(loaded.board(), game.board());
    let seqs: Vec<u32> = loaded.ledger().records().iter().map(|r| *r.seq()).collect();
    assert_eq!(seqs, vec![1, 2, 3]);
}

#[test]
fn test_finished_match_keeps_winner() {
    let (_db, repo) = setup_test_db();
    let mut game = repo.insert_match(1).expect("Create failed");
    game.join(2).expect("Join failed");
    repo.save_match(&game).expect("Save failed");

    for step in 0..5 {
        let outcome = game.apply_move(1, 7, 7 + step).expect("Host move rejected");
        repo.record_move(&game, outcome.record())
            .expect("Record failed");
        if let MoveOutcome::Won { winner, .. } = outcome {
            assert_eq!(winner, 1);
            break;
        }
        let outcome = game.apply_move(2, 0, step).expect("Guest move rejected");
        repo.record_move(&game, outcome.record())
            .expect("Record failed");
    }

    let loaded = repo.find_match(game.id()).unwrap().unwrap();
    assert_eq!(loaded.status(), MatchStatus::Finished);
    assert_eq!(loaded.winner(), Some(1));
    assert_eq!(loaded.outcome(), Some(Outcome::Win(Seat::A)));
    assert_eq!(loaded.turn(), None);
    assert!(loaded.finished_at().is_some());
}

#[test]
fn test_duplicate_seq_rolls_back_transaction() {
    let (_db, repo) = setup_test_db();
    let mut game = repo.insert_match(1).expect("Create failed");
    game.join(2).expect("Join failed");
    repo.save_match(&game).expect("Save failed");

    let first = game.apply_move(1, 7, 7).expect("Move rejected");
    repo.record_move(&game, first.record()).expect("Record failed");

    let before = repo.find_match(game.id()).unwrap().unwrap();

    let mut diverged = game.clone();
    let second = diverged.apply_move(2, 3, 3).expect("Move rejected");
    let replay = strictly_gomoku::MoveRecord::new(
        game.id(),
        2,
        3,
        3,
        *first.record().seq(),
        *second.record().played_at(),
    );
    assert!(repo.record_move(&diverged, &replay).is_err());

    let after = repo.find_match(game.id()).unwrap().unwrap();
    assert_eq!(after, before, "Failed transaction must not change the match");
}

#[test]
fn test_list_matches_paginates_by_id() {
    let (_db, repo) = setup_test_db();
    for creator in 1..=4 {
        repo.insert_match(creator).expect("Create failed");
    }
    let page: Vec<i64> = repo
        .list_matches(1, 2)
        .expect("List failed")
        .iter()
        .map(|m| m.id())
        .collect();
    assert_eq!(page, vec![2, 3]);
}

#[test]
fn test_list_matches_handles_oversized_page_bounds() {
    let (_db, repo) = setup_test_db();
    for creator in 1..=3 {
        repo.insert_match(creator).expect("Create failed");
    }
    assert_eq!(repo.list_matches(0, usize::MAX).expect("List failed").len(), 3);
    assert!(repo.list_matches(usize::MAX, 10).expect("List failed").is_empty());
}

#[test]
fn test_inconsistent_row_is_rejected() {
    let (db, repo) = setup_test_db();
    repo.insert_match(1).expect("Create failed");

    let mut conn =
        SqliteConnection::establish(db.path().to_str().unwrap()).expect("Failed to connect");
    conn.batch_execute("UPDATE games SET status = 'playing' WHERE id = 1")
        .expect("Update failed");

    assert!(repo.find_match(1).is_err(), "Playing without a guest must not load");
}

#[tokio::test]
async fn test_store_trait_runs_on_blocking_pool() {
    let (_db, repo) = setup_test_db();
    let store: &dyn MatchStore = &repo;

    let mut game = store.create_match(5).await.expect("Create failed");
    game.join(6).expect("Join failed");
    store.persist_match(&game).await.expect("Persist failed");

    let outcome = game.apply_move(5, 1, 1).expect("Move rejected");
    store
        .commit_move(&game, outcome.record())
        .await
        .expect("Commit failed");

    let loaded = store.load_match(game.id()).await.unwrap().unwrap();
    assert_eq!(loaded.ledger().len(), 1);
    assert_eq!(loaded.turn(), Some(6));
    assert_eq!(store.list_matches(0, 10).await.unwrap().len(), 1);
}
