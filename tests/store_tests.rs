//! Record stores backed by memory and by a directory of JSON files

mod common;

use rust_iris::config::MatchParams;
use rust_iris::features::KeypointExtractor;
use rust_iris::segmentation::RegionSegmenter;
use rust_iris::store::{IrisStore, JsonDirStore, MemoryStore, compare_stored};
use rust_iris::{IrisError, IrisMetadata, IrisRecord, RegionName, compare};
use std::fs;
use std::path::PathBuf;

fn record_for(seed: u64) -> IrisRecord {
    let img = common::synthetic_eye(seed);
    let (pupil, ext) = common::eye_circles();
    let mut regions = RegionSegmenter::new().segment(&img, &pupil, &ext);
    let extractor = KeypointExtractor::default();
    for record in regions.as_mut_slice() {
        extractor.fill(record);
    }
    IrisRecord {
        pupil_circle: pupil,
        ext_circle: ext,
        regions,
        metadata: IrisMetadata::default(),
    }
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("rust_iris_{}_{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

#[test]
fn test_json_dir_roundtrip() {
    let dir = temp_dir("roundtrip");
    let record = record_for(5);
    {
        let mut store = JsonDirStore::open(&dir).unwrap();
        store.insert("S2001R03", 2001, &record).unwrap();
    }

    let store = JsonDirStore::open(&dir).unwrap();
    let stored = store.get("S2001R03").unwrap().expect("stored record");
    assert_eq!(stored.feature_tag, "S2001R03");
    assert_eq!(stored.iris_id, 2001);
    assert_eq!(stored.record, record);
    assert!(store.get("S2001R04").unwrap().is_none());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_json_dir_duplicates_and_ids() {
    let dir = temp_dir("ids");
    let mut store = JsonDirStore::open(&dir).unwrap();
    let record = record_for(6);
    store.insert("b", 7, &record).unwrap();
    store.insert("a", 7, &record).unwrap();
    store.insert("c", 8, &record).unwrap();

    assert!(matches!(store.insert("a", 9, &record), Err(IrisError::Store(_))));
    assert_eq!(store.tags_for_id(7).unwrap(), vec!["a", "b"]);
    assert_eq!(store.tags_for_id(8).unwrap(), vec!["c"]);
    assert!(store.tags_for_id(9).unwrap().is_empty());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_corrupt_file_is_rejected() {
    let dir = temp_dir("corrupt");
    let mut store = JsonDirStore::open(&dir).unwrap();
    let mut record = record_for(6);
    if record.regions[RegionName::Complete].keypoints.is_empty() {
        let _ = fs::remove_dir_all(&dir);
        return;
    }
    record.regions[RegionName::Complete].keypoints.pop();
    // insert does not validate, reads do
    store.insert("bad", 1, &record).unwrap();
    assert!(matches!(store.get("bad"), Err(IrisError::RegionMismatch { .. })));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_compare_stored_matches_direct_compare() {
    let mut store = MemoryStore::new();
    let (a, b) = (record_for(10), record_for(11));
    store.insert("a", 1, &a).unwrap();
    store.insert("b", 2, &b).unwrap();

    let params = MatchParams::default();
    assert_eq!(compare_stored(&store, "a", "b", &params).unwrap(), compare(&a, &b).unwrap());
    assert!(compare_stored(&store, "a", "missing", &params).is_err());
}
