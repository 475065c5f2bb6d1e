use falcata::index::{Index, IndexConfig, PersistentHashedIndex};
use falcata::query::{Query, QueryKind, Searcher};
use falcata::ranking::{
    self, BlendWeights, DfScheme, ImportanceScores, LengthNorm, RankParams, TfScheme,
};
use tempfile::TempDir;

fn config() -> IndexConfig {
    IndexConfig { table_size: 1009 }
}

fn build_committed_index(dir: &TempDir) -> PersistentHashedIndex {
    let mut index = PersistentHashedIndex::create_in_dir(dir.path(), config()).unwrap();

    let docs: &[(u32, &str, &[&str])] = &[
        (1, "d1.txt", &["cat", "hat"]),
        (2, "d2.txt", &["the", "cat", "sat", "on", "the", "cat"]),
        (3, "d3.txt", &["hat", "stand"]),
        (4, "d4.txt", &["dog"]),
    ];

    for (doc_id, name, tokens) in docs {
        index
            .register_doc(*doc_id, name, tokens.len() as u32)
            .unwrap();
        for (offset, token) in tokens.iter().enumerate() {
            index.insert(token, *doc_id, offset as u32).unwrap();
        }
    }

    index.commit().unwrap();
    index
}

#[test]
fn test_intersection_over_committed_index() {
    let dir = TempDir::new().unwrap();
    let index = build_committed_index(&dir);
    let searcher = Searcher::new(&index);

    let result = searcher
        .search(&Query::parse("cat hat"), &QueryKind::Intersection)
        .unwrap();
    let ids: Vec<u32> = result.iter().map(|e| e.doc_id).collect();
    assert_eq!(ids, vec![1]);
}

#[test]
fn test_phrase_over_committed_index() {
    let dir = TempDir::new().unwrap();
    let index = build_committed_index(&dir);
    let searcher = Searcher::new(&index);

    // "cat hat" is adjacent only in d1; d2 has "cat" but never followed
    // by "hat".
    let result = searcher
        .search(&Query::parse("cat hat"), &QueryKind::Phrase)
        .unwrap();
    let ids: Vec<u32> = result.iter().map(|e| e.doc_id).collect();
    assert_eq!(ids, vec![1]);
    assert_eq!(result.get(0).unwrap().offsets, vec![1]);

    let result = searcher
        .search(&Query::parse("the cat sat"), &QueryKind::Phrase)
        .unwrap();
    let ids: Vec<u32> = result.iter().map(|e| e.doc_id).collect();
    assert_eq!(ids, vec![2]);
}

#[test]
fn test_ranked_retrieval_orders_by_relevance() {
    let dir = TempDir::new().unwrap();
    let index = build_committed_index(&dir);
    let searcher = Searcher::new(&index);

    let params = RankParams {
        tf: TfScheme::Raw,
        df: DfScheme::Idf,
        norm: LengthNorm::None,
    };
    let result = searcher
        .search(&Query::parse("cat"), &QueryKind::Ranked(params))
        .unwrap();

    // d2 has tf=2, d1 has tf=1; without normalization d2 leads.
    let ids: Vec<u32> = result.iter().map(|e| e.doc_id).collect();
    assert_eq!(ids, vec![2, 1]);
    assert!(result.get(0).unwrap().score > result.get(1).unwrap().score);
}

#[test]
fn test_ranked_retrieval_with_euclidean_norm() {
    let dir = TempDir::new().unwrap();
    let index = build_committed_index(&dir);
    let searcher = Searcher::new(&index);

    let params = RankParams {
        tf: TfScheme::Raw,
        df: DfScheme::Idf,
        norm: LengthNorm::Euclidean,
    };
    let result = searcher
        .search(&Query::parse("cat hat"), &QueryKind::Ranked(params))
        .unwrap();

    // Union of "cat" and "hat" postings: every score finite and sorted
    // descending.
    assert_eq!(result.len(), 3);
    let scores: Vec<f64> = result.iter().map(|e| e.score).collect();
    for score in &scores {
        assert!(score.is_finite());
    }
    for pair in scores.windows(2) {
        assert!(pair[0] >= pair[1]);
    }
}

#[test]
fn test_importance_blend_promotes_important_documents() {
    let dir = TempDir::new().unwrap();
    let index = build_committed_index(&dir);
    let searcher = Searcher::new(&index);

    let params = RankParams {
        tf: TfScheme::Raw,
        df: DfScheme::Idf,
        norm: LengthNorm::None,
    };
    let ranked = searcher
        .search(&Query::parse("cat"), &QueryKind::Ranked(params))
        .unwrap();
    assert_eq!(ranked.get(0).unwrap().doc_id, 2);

    let importance = ImportanceScores::parse("d1.txt 0.8\nd2.txt 0.0001\n").unwrap();
    let blended = ranking::blend_importance(
        &index,
        &ranked,
        &importance,
        &BlendWeights {
            alpha: 0.5,
            beta: 10.0,
        },
    )
    .unwrap();

    let ids: Vec<u32> = blended.iter().map(|e| e.doc_id).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn test_queries_survive_reopen() {
    let dir = TempDir::new().unwrap();
    build_committed_index(&dir);

    let index = PersistentHashedIndex::open_dir(dir.path(), config()).unwrap();
    let searcher = Searcher::new(&index);

    let result = searcher
        .search(&Query::parse("cat hat"), &QueryKind::Phrase)
        .unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.get(0).unwrap().doc_id, 1);

    let result = searcher
        .search(
            &Query::parse("cat"),
            &QueryKind::Ranked(RankParams::default()),
        )
        .unwrap();
    assert_eq!(result.len(), 2);
}
