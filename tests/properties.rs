use std::fs;
use std::path::Path;

use secure_files::fs::clipboard::{ClipboardState, TransferAction};
use secure_files::fs::selection::Selection;
use secure_files::fs::sort::{sort_entries, SortConfig, SortDirection, SortKey};
use secure_files::{AppError, Storage};
use tempfile::TempDir;

fn setup() -> (TempDir, Storage) {
    let tmp = TempDir::new().unwrap();
    let storage = Storage::open(tmp.path()).unwrap();
    (tmp, storage)
}

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

#[tokio::test]
async fn directories_sort_first_for_every_key_and_direction() {
    let (_tmp, storage) = setup();
    let root = storage.root().to_path_buf();
    fs::create_dir(root.join("zeta")).unwrap();
    fs::create_dir(root.join("Alpha")).unwrap();
    write(&root, "a.txt", "x");
    write(&root, "big.bin", &"x".repeat(4096));

    let entries = storage.list_directory(&root).await.unwrap();
    for key in [SortKey::Name, SortKey::Size, SortKey::Date] {
        for direction in [SortDirection::Ascending, SortDirection::Descending] {
            let sorted = sort_entries(&entries, SortConfig::new(key, direction));
            let flags: Vec<bool> = sorted.iter().map(|e| e.is_directory).collect();
            assert_eq!(flags, vec![true, true, false, false], "{:?} {:?}", key, direction);
        }
    }
}

#[tokio::test]
async fn name_descending_reverses_each_group() {
    let (_tmp, storage) = setup();
    let root = storage.root().to_path_buf();
    fs::create_dir(root.join("b-dir")).unwrap();
    fs::create_dir(root.join("a-dir")).unwrap();
    write(&root, "c.txt", "");
    write(&root, "d.txt", "");

    let entries = storage.list_directory(&root).await.unwrap();
    let names = |config: SortConfig| -> Vec<String> {
        sort_entries(&entries, config).into_iter().map(|e| e.name).collect()
    };
    let mut config = SortConfig::default();
    assert_eq!(names(config), vec!["a-dir", "b-dir", "c.txt", "d.txt"]);
    config.select_key(SortKey::Name);
    assert_eq!(config.direction, SortDirection::Descending);
    assert_eq!(names(config), vec!["b-dir", "a-dir", "d.txt", "c.txt"]);
}

#[tokio::test]
async fn search_is_case_insensitive_and_recursive() {
    let (_tmp, storage) = setup();
    write(storage.root(), "work/2024/Report.pdf", "pdf");
    write(storage.root(), "notes.txt", "");

    for query in ["report", "REPORT"] {
        let results = storage.search_tree(query).await;
        assert_eq!(results.len(), 1, "query {}", query);
        assert_eq!(results[0].name, "Report.pdf");
    }
}

#[tokio::test]
async fn repeated_copy_probes_numbered_names() {
    let (_tmp, storage) = setup();
    let root = storage.root().to_path_buf();
    write(&root, "src/a.txt", "hello");
    write(&root, "dest/a.txt", "existing");
    let source = storage.entry_at(Path::new("src/a.txt")).await.unwrap();
    let dest = root.join("dest");

    let mut clipboard = ClipboardState::new();
    clipboard.stage(vec![source.clone()], TransferAction::Copy);
    let first = storage.paste_transfer(&mut clipboard, &dest).await.unwrap();
    assert_eq!(first.created, vec![dest.join("a(1).txt")]);

    clipboard.stage(vec![source], TransferAction::Copy);
    let second = storage.paste_transfer(&mut clipboard, &dest).await.unwrap();
    assert_eq!(second.created, vec![dest.join("a(2).txt")]);

    assert_eq!(fs::read_to_string(dest.join("a.txt")).unwrap(), "existing");
    assert_eq!(fs::read_to_string(dest.join("a(2).txt")).unwrap(), "hello");
    assert!(root.join("src/a.txt").exists());
}

#[tokio::test]
async fn moving_a_folder_into_its_descendant_is_rejected() {
    let (_tmp, storage) = setup();
    let root = storage.root().to_path_buf();
    write(&root, "foo/bar/keep.txt", "k");
    let foo = storage.entry_at(Path::new("foo")).await.unwrap();

    let mut clipboard = ClipboardState::new();
    clipboard.stage(vec![foo], TransferAction::Move);
    let err = storage
        .paste_transfer(&mut clipboard, &root.join("foo/bar"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SelfContainment { .. }));

    assert!(root.join("foo/bar/keep.txt").exists());
    let bar_children: Vec<_> = fs::read_dir(root.join("foo/bar")).unwrap().collect();
    assert_eq!(bar_children.len(), 1);
    assert!(!clipboard.is_empty());
}

#[tokio::test]
async fn creating_the_same_folder_twice_fails() {
    let (_tmp, storage) = setup();
    storage.create_directory(storage.root(), "Docs").await.unwrap();
    let err = storage
        .create_directory(storage.root(), "Docs")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AlreadyExists(_)));
}

#[tokio::test]
async fn deleting_a_missing_path_succeeds() {
    let (_tmp, storage) = setup();
    storage
        .delete_entry(&storage.root().join("never-existed"))
        .await
        .unwrap();
}

#[tokio::test]
async fn batch_delete_removes_every_path() {
    let (_tmp, storage) = setup();
    let root = storage.root().to_path_buf();
    write(&root, "one.txt", "");
    write(&root, "two.txt", "");

    storage
        .delete_many(&[root.join("one.txt"), root.join("two.txt")])
        .await
        .unwrap();
    assert!(!root.join("one.txt").exists());
    assert!(!root.join("two.txt").exists());
}

#[tokio::test]
async fn selection_size_follows_membership() {
    let (_tmp, storage) = setup();
    let root = storage.root().to_path_buf();
    write(&root, "a.bin", &"a".repeat(10));
    write(&root, "b.bin", &"b".repeat(25));
    let visible = storage.list_directory(&root).await.unwrap();
    let a = root.join("a.bin");
    let b = root.join("b.bin");

    let mut selection = Selection::new();
    selection.toggle(&a, &visible);
    selection.toggle(&b, &visible);
    assert_eq!(selection.size(), 35);

    selection.toggle(&a, &visible);
    assert_eq!(selection.paths(), &[b.clone()]);
    assert_eq!(selection.size(), 25);

    selection.toggle(&b, &visible);
    assert!(!selection.is_active());
    assert!(selection.is_empty());
    assert_eq!(selection.size(), 0);
}

#[tokio::test]
async fn paths_outside_the_root_are_refused() {
    let (_tmp, storage) = setup();
    let outside = TempDir::new().unwrap();
    write(outside.path(), "secret.txt", "s");

    let err = storage.entry_at(&outside.path().join("secret.txt")).await.unwrap_err();
    assert!(matches!(err, AppError::OutsideRoot(_)));
    assert!(storage.delete_entry(Path::new("../x")).await.is_err());
    assert!(outside.path().join("secret.txt").exists());
}
