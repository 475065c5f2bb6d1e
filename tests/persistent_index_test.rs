use falcata::index::{Index, IndexConfig, PersistentHashedIndex};
use tempfile::TempDir;

fn config() -> IndexConfig {
    IndexConfig { table_size: 1009 }
}

fn ingest_corpus(index: &mut PersistentHashedIndex) {
    let docs: &[(u32, &str, &[&str])] = &[
        (1, "pets.txt", &["cat", "hat", "cat"]),
        (2, "mice.txt", &["cat", "mouse"]),
        (3, "birds.txt", &["sparrow", "hawk", "sparrow", "owl"]),
    ];

    for (doc_id, name, tokens) in docs {
        index
            .register_doc(*doc_id, name, tokens.len() as u32)
            .unwrap();
        for (offset, token) in tokens.iter().enumerate() {
            index.insert(token, *doc_id, offset as u32).unwrap();
        }
    }
}

#[test]
fn test_build_commit_and_query_on_disk() {
    let dir = TempDir::new().unwrap();
    let mut index = PersistentHashedIndex::create_in_dir(dir.path(), config()).unwrap();

    ingest_corpus(&mut index);
    let stats = index.commit().unwrap();
    assert_eq!(stats.terms, 6);
    assert!(stats.data_bytes > 0);

    let cat = index.postings("cat").unwrap().unwrap();
    let ids: Vec<u32> = cat.iter().map(|e| e.doc_id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(cat.get(0).unwrap().offsets, vec![0, 2]);

    assert!(index.postings("dog").unwrap().is_none());
}

#[test]
fn test_reopen_from_directory() {
    let dir = TempDir::new().unwrap();

    {
        let mut index = PersistentHashedIndex::create_in_dir(dir.path(), config()).unwrap();
        ingest_corpus(&mut index);
        index.commit().unwrap();
    }

    let index = PersistentHashedIndex::open_dir(dir.path(), config()).unwrap();
    assert!(index.is_committed());

    let sparrow = index.postings("sparrow").unwrap().unwrap();
    assert_eq!(sparrow.len(), 1);
    assert_eq!(sparrow.get(0).unwrap().doc_id, 3);
    assert_eq!(sparrow.get(0).unwrap().offsets, vec![0, 2]);

    let meta = index.doc_meta();
    assert_eq!(meta.doc_count(), 3);
    assert_eq!(meta.name(2), Some("mice.txt"));
    assert_eq!(meta.length(3), Some(4));
    assert!(meta.euclidean_length(1).is_some());
}

#[test]
fn test_repeated_builds_are_byte_identical() {
    let build = || {
        let dir = TempDir::new().unwrap();
        let mut index = PersistentHashedIndex::create_in_dir(dir.path(), config()).unwrap();
        ingest_corpus(&mut index);
        index.commit().unwrap();

        let dictionary = std::fs::read(dir.path().join("dictionary")).unwrap();
        let data = std::fs::read(dir.path().join("data")).unwrap();
        (dictionary, data)
    };

    let (dict_a, data_a) = build();
    let (dict_b, data_b) = build();
    assert_eq!(dict_a, dict_b);
    assert_eq!(data_a, data_b);
}

#[test]
fn test_collisions_resolve_in_a_tiny_table() {
    // table_size = 7 forces "a" (97) and "h" (104) into the same slot.
    let dir = TempDir::new().unwrap();
    let mut index =
        PersistentHashedIndex::create_in_dir(dir.path(), IndexConfig { table_size: 7 }).unwrap();

    index.register_doc(1, "d1.txt", 1).unwrap();
    index.register_doc(2, "d2.txt", 1).unwrap();
    index.insert("a", 1, 0).unwrap();
    index.insert("h", 2, 0).unwrap();

    let stats = index.commit().unwrap();
    assert!(stats.collisions >= 1);

    let reopened =
        PersistentHashedIndex::open_dir(dir.path(), IndexConfig { table_size: 7 }).unwrap();
    assert_eq!(
        reopened.postings("a").unwrap().unwrap().get(0).unwrap().doc_id,
        1
    );
    assert_eq!(
        reopened.postings("h").unwrap().unwrap().get(0).unwrap().doc_id,
        2
    );
}

#[test]
fn test_open_with_wrong_table_size_fails() {
    let dir = TempDir::new().unwrap();

    {
        let mut index = PersistentHashedIndex::create_in_dir(dir.path(), config()).unwrap();
        ingest_corpus(&mut index);
        index.commit().unwrap();
    }

    assert!(PersistentHashedIndex::open_dir(dir.path(), IndexConfig { table_size: 2003 }).is_err());
}

#[test]
fn test_open_empty_directory_fails() {
    let dir = TempDir::new().unwrap();
    assert!(PersistentHashedIndex::open_dir(dir.path(), config()).is_err());
}
