use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tempfile::NamedTempFile;
use tokcount::{create_with_cache, BpeCounter, Counter, Encoding, EncodingCache, Error, Server};

fn vocab_file(tokens: &[&[u8]]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for (rank, token) in tokens.iter().enumerate() {
        writeln!(file, "{} {}", STANDARD.encode(token), rank).unwrap();
    }
    file.flush().unwrap();
    file
}

fn path_of(file: &NamedTempFile) -> String {
    file.path().to_str().unwrap().to_string()
}

#[test]
fn test_worked_example() {
    let file = vocab_file(&[b"a", b"ab", b"abc"]);
    let cache = Arc::new(EncodingCache::new());
    let counter = create_with_cache("bpe", &path_of(&file), &cache).unwrap();

    assert_eq!(counter.count(b"abcabd"), 3);
    assert_eq!(counter.count(b""), 0);
}

#[test]
fn test_prepared_model_survives_file_removal() {
    let file = vocab_file(&[b"hello", b" world", b"h"]);
    let path = path_of(&file);
    let cache = Arc::new(EncodingCache::new());

    let first = create_with_cache("openai", &path, &cache).unwrap();
    drop(file);
    assert!(!std::path::Path::new(&path).exists());

    // cached, so the missing file is never read again
    let second = create_with_cache("openai", &path, &cache).unwrap();
    assert!(second.prepare().is_ok());
    assert_eq!(first.count(b"hello world"), 2);
    assert_eq!(second.count(b"hello world"), 2);
}

#[test]
fn test_counters_share_one_entry() {
    let file = vocab_file(&[b"ab"]);
    let path = path_of(&file);
    let cache = Arc::new(EncodingCache::new());
    cache.prepare(&path).unwrap();

    let counters: Vec<BpeCounter> = (0..5)
        .map(|_| BpeCounter::new(path.clone(), Arc::clone(&cache)).unwrap())
        .collect();
    for c in &counters[1..] {
        assert!(Arc::ptr_eq(c.encoding(), counters[0].encoding()));
    }
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_concurrent_prepare_of_one_file() {
    const THREADS: usize = 6;
    let file = vocab_file(&[b"a", b"ab", b"abc"]);
    let path = path_of(&file);
    let cache = EncodingCache::new();
    let barrier = Barrier::new(THREADS);
    let parses = AtomicUsize::new(0);

    let results: Vec<Arc<Encoding>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    cache
                        .prepare_with(&path, || {
                            parses.fetch_add(1, Ordering::SeqCst);
                            tokcount::loader::load(std::path::Path::new(&path))
                        })
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let parses = parses.load(Ordering::SeqCst);
    assert!((1..=THREADS).contains(&parses));
    assert_eq!(cache.len(), 1);
    let cached = cache.get(&path).unwrap();
    assert!(results.iter().all(|r| Arc::ptr_eq(r, &cached)));
    assert_eq!(cached.count_tokens(b"abcabd"), 3);
}

#[test]
fn test_malformed_file_is_not_cached() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"YQ== 0\nno-separator\n").unwrap();
    let path = path_of(&file);
    let cache = Arc::new(EncodingCache::new());

    let err = create_with_cache("bpe", &path, &cache).err().unwrap();
    assert!(matches!(err, Error::InvalidVocabularyFile { line: 2, .. }));
    assert!(!cache.contains(&path));

    let err = BpeCounter::new(path, cache).err().unwrap();
    assert!(matches!(err, Error::ModelNotPrepared(_)));
}

#[test]
fn test_binary_tokens() {
    let file = vocab_file(&[&[0xe4, 0xbd, 0xa0], &[0xe5, 0xa5, 0xbd], &[0x00, 0xff]]);
    let cache = Arc::new(EncodingCache::new());
    let counter = create_with_cache("bpe", &path_of(&file), &cache).unwrap();

    assert_eq!(counter.count("你好".as_bytes()), 2);
    assert_eq!(counter.count(&[0x00, 0xff, 0x00]), 2);
}

#[test]
fn test_server_over_loaded_vocabulary() {
    let file = vocab_file(&[b"a", b"ab", b"abc"]);
    let cache = Arc::new(EncodingCache::new());
    let counter = create_with_cache("bpe", &path_of(&file), &cache).unwrap();
    let server = Server::new(counter);

    let mut input = Vec::new();
    input.extend_from_slice(&0u32.to_le_bytes());
    input.extend_from_slice(&5u32.to_le_bytes());
    input.extend_from_slice(b"abcab");
    let mut out = Vec::new();
    server.run(&input[..], &mut out).unwrap();

    assert_eq!(out, b"\n2\n");
}
