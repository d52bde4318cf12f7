//! Tests for following commit/tag/tree edges through a Repository.

use std::process::Command;

use git_object::Object;
use git_repository::Repository;

fn setup_repo_with_history() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let work_tree = std::fs::canonicalize(dir.path()).unwrap();

    let run = |args: &[&str]| {
        Command::new("git")
            .args(args)
            .current_dir(&work_tree)
            .env("GIT_AUTHOR_NAME", "Test")
            .env("GIT_AUTHOR_EMAIL", "test@example.com")
            .env("GIT_COMMITTER_NAME", "Test")
            .env("GIT_COMMITTER_EMAIL", "test@example.com")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .unwrap()
    };

    assert!(run(&["init"]).success());
    std::fs::write(work_tree.join("a.txt"), b"hello\n").unwrap();
    assert!(run(&["add", "a.txt"]).success());
    assert!(run(&["commit", "-m", "first"]).success());
    std::fs::write(work_tree.join("a.txt"), b"hello again\n").unwrap();
    assert!(run(&["commit", "-am", "second"]).success());
    assert!(run(&["tag", "-a", "v1", "-m", "release"]).success());

    (dir, work_tree)
}

#[test]
fn resolve_commit_tree_and_parent() {
    let (_dir, work_tree) = setup_repo_with_history();
    let repo = Repository::open(&work_tree).unwrap();

    let head = repo.head_oid().unwrap().unwrap();
    let commit = match repo.find_object(&head).unwrap().as_ref() {
        Object::Commit(c) => c.clone(),
        _ => panic!("HEAD should be a commit"),
    };

    let tree_obj = repo.resolve_commit_tree(&commit).unwrap();
    assert!(matches!(tree_obj.as_ref(), Object::Tree(_)));

    let parent_obj = repo.resolve_commit_parent(&commit, 0).unwrap();
    assert!(parent_obj.is_some());
    assert!(matches!(parent_obj.unwrap().as_ref(), Object::Commit(_)));

    assert!(repo.resolve_commit_parent(&commit, 1).unwrap().is_none());
}

#[test]
fn resolve_tag_target_follows_to_commit() {
    let (_dir, work_tree) = setup_repo_with_history();
    let repo = Repository::open(&work_tree).unwrap();

    let output = Command::new("git")
        .args(["rev-parse", "v1"])
        .current_dir(&work_tree)
        .output()
        .unwrap();
    let tag_oid = git_hash::ObjectId::from_hex(
        String::from_utf8(output.stdout).unwrap().trim(),
    )
    .unwrap();

    let tag = match repo.find_object(&tag_oid).unwrap().as_ref() {
        Object::Tag(t) => t.clone(),
        _ => panic!("v1 should be an annotated tag"),
    };

    let target = repo.resolve_tag_target(&tag).unwrap();
    assert!(matches!(target.as_ref(), Object::Commit(_)));
}

#[test]
fn resolve_tree_entry_type_mismatch_is_an_error() {
    let (_dir, work_tree) = setup_repo_with_history();
    let repo = Repository::open(&work_tree).unwrap();

    let head = repo.head_oid().unwrap().unwrap();
    let commit = match repo.find_object(&head).unwrap().as_ref() {
        Object::Commit(c) => c.clone(),
        _ => panic!("HEAD should be a commit"),
    };

    // The root tree's oid, interpreted as if it were a commit, should fail.
    let err = repo.find_typed(&commit.tree, git_object::ObjectType::Commit);
    assert!(err.is_err());
}

#[test]
fn resolve_tree_entries_to_blob() {
    let (_dir, work_tree) = setup_repo_with_history();
    let repo = Repository::open(&work_tree).unwrap();

    let head = repo.head_oid().unwrap().unwrap();
    let commit = match repo.find_object(&head).unwrap().as_ref() {
        Object::Commit(c) => c.clone(),
        _ => panic!("HEAD should be a commit"),
    };
    let tree = match repo.resolve_commit_tree(&commit).unwrap().as_ref() {
        Object::Tree(t) => t.clone(),
        _ => panic!("expected a tree"),
    };

    let entry = tree.entries.iter().find(|e| e.name == "a.txt").unwrap();
    let blob = repo.resolve_tree_entry(entry).unwrap();
    assert!(matches!(blob.as_ref(), Object::Blob(_)));
}
