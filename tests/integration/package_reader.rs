//! Integration tests for reading package trees

use pkgio::document::{Document, INDEX_ANNOTATION, PATH_ANNOTATION};
use pkgio::error::PackageError;
use pkgio::tree::reader::{PackageReader, MATCH_ALL};
use std::fs;
use tempfile::TempDir;

use crate::integration::test_utils::{resource, stream, write_file};

fn provenance(docs: &[Document]) -> Vec<(String, String)> {
    docs.iter()
        .map(|d| {
            (
                d.annotation(PATH_ANNOTATION).unwrap_or_default().to_string(),
                d.annotation(INDEX_ANNOTATION).unwrap_or_default().to_string(),
            )
        })
        .collect()
}

#[test]
fn test_default_globs_read_yaml_only() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "a.yaml", &resource("ConfigMap", "a"));
    write_file(root, "b.json", "{\"apiVersion\": \"v1\", \"kind\": \"ConfigMap\"}");
    write_file(root, "c.yml", &resource("ConfigMap", "c"));

    let docs = PackageReader::new(root).read().unwrap();
    let names: Vec<_> = docs.iter().map(|d| d.name().unwrap()).collect();
    assert_eq!(names, vec!["a", "c"]);
}

#[test]
fn test_match_all_reads_json() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "a.yaml", &resource("ConfigMap", "a"));
    write_file(
        root,
        "b.json",
        "{\"apiVersion\": \"v1\", \"kind\": \"ConfigMap\", \"metadata\": {\"name\": \"b\"}}",
    );

    let mut reader = PackageReader::new(root);
    reader.match_files_glob = MATCH_ALL.iter().map(|s| s.to_string()).collect();
    let docs = reader.read().unwrap();
    assert_eq!(
        provenance(&docs),
        vec![
            ("a.yaml".to_string(), "0".to_string()),
            ("b.json".to_string(), "0".to_string())
        ]
    );
}

#[test]
fn test_wildcard_glob_reads_every_file() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "notes.txt", &resource("ConfigMap", "txt"));
    write_file(root, "a.yaml", &resource("ConfigMap", "a"));

    let mut reader = PackageReader::new(root);
    reader.match_files_glob = vec!["*".to_string()];
    let docs = reader.read().unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[1].annotation(PATH_ANNOTATION), Some("notes.txt"));
}

#[test]
fn test_nested_paths_use_forward_slashes() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "base/deploy/app.yaml", &resource("Deployment", "app"));

    let docs = PackageReader::new(root).read().unwrap();
    assert_eq!(docs[0].annotation(PATH_ANNOTATION), Some("base/deploy/app.yaml"));
}

#[test]
fn test_walk_order_is_directory_then_file_then_decode_order() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "z.yaml", &resource("ConfigMap", "z"));
    write_file(
        root,
        "a.yaml",
        &stream(&[resource("ConfigMap", "a0"), resource("ConfigMap", "a1")]),
    );
    write_file(root, "m/b.yaml", &resource("ConfigMap", "mb"));
    write_file(root, "m/a.yaml", &resource("ConfigMap", "ma"));

    let docs = PackageReader::new(root).read().unwrap();
    let names: Vec<_> = docs.iter().map(|d| d.name().unwrap()).collect();
    assert_eq!(names, vec!["a0", "a1", "ma", "mb", "z"]);
    assert_eq!(
        provenance(&docs)[..2],
        [
            ("a.yaml".to_string(), "0".to_string()),
            ("a.yaml".to_string(), "1".to_string())
        ]
    );
}

#[test]
fn test_single_file_root_uses_base_name() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "deep/dir/cm.yaml", &resource("ConfigMap", "cm"));

    let docs = PackageReader::new(root.join("deep").join("dir").join("cm.yaml"))
        .read()
        .unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].annotation(PATH_ANNOTATION), Some("cm.yaml"));
}

#[test]
fn test_empty_file_contributes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "empty.yaml", "");
    write_file(root, "a.yaml", &resource("ConfigMap", "a"));

    let docs = PackageReader::new(root).read().unwrap();
    assert_eq!(docs.len(), 1);
}

#[test]
fn test_ignored_file_is_never_read() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, ".krmignore", "broken.yaml\n");
    write_file(root, "broken.yaml", "a: [unclosed\n");
    write_file(root, "a.yaml", &resource("ConfigMap", "a"));

    let docs = PackageReader::new(root).read().unwrap();
    assert_eq!(docs.len(), 1);
}

#[test]
fn test_ignored_directory_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, ".krmignore", "generated/\n");
    write_file(root, "generated/out.yaml", &resource("ConfigMap", "gen"));
    write_file(root, "a.yaml", &resource("ConfigMap", "a"));

    let docs = PackageReader::new(root).read().unwrap();
    let names: Vec<_> = docs.iter().map(|d| d.name().unwrap()).collect();
    assert_eq!(names, vec!["a"]);
}

#[test]
fn test_nested_directory_ignore_file_is_scoped() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "sub/.krmignore", "skip.yaml\n");
    write_file(root, "sub/skip.yaml", &resource("ConfigMap", "sub-skip"));
    write_file(root, "skip.yaml", &resource("ConfigMap", "root-skip"));

    let docs = PackageReader::new(root).read().unwrap();
    let names: Vec<_> = docs.iter().map(|d| d.name().unwrap()).collect();
    assert_eq!(names, vec!["root-skip"]);
}

#[test]
fn test_custom_ignore_file_name() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, ".pkgignore", "a.yaml\n");
    write_file(root, "a.yaml", &resource("ConfigMap", "a"));

    let mut reader = PackageReader::new(root);
    assert_eq!(reader.read().unwrap().len(), 1);
    reader.ignore_file_name = ".pkgignore".to_string();
    assert!(reader.read().unwrap().is_empty());
}

#[test]
fn test_set_annotations_stamped_even_when_provenance_omitted() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "a.yaml", &resource("ConfigMap", "a"));

    let mut reader = PackageReader::new(root);
    reader.omit_reader_annotations = true;
    reader
        .set_annotations
        .insert("owner".to_string(), "platform".to_string());

    let docs = reader.read().unwrap();
    assert_eq!(docs[0].annotation("owner"), Some("platform"));
    assert_eq!(docs[0].annotation(PATH_ANNOTATION), None);
    assert_eq!(docs[0].annotation(INDEX_ANNOTATION), None);
}

#[test]
fn test_non_resources_dropped_or_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(
        root,
        "mixed.yaml",
        &stream(&["plain: data\n".to_string(), resource("ConfigMap", "a")]),
    );

    let mut reader = PackageReader::new(root);
    let docs = reader.read().unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].annotation(INDEX_ANNOTATION), Some("0"));

    reader.error_if_non_resources = true;
    match reader.read() {
        Err(PackageError::NonResource { path, index }) => {
            assert!(path.ends_with("mixed.yaml"));
            assert_eq!(index, 0);
        }
        other => panic!("expected non-resource error, got {:?}", other),
    }
}

#[test]
fn test_decode_error_aborts_walk() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "a.yaml", &resource("ConfigMap", "a"));
    write_file(root, "b.yaml", "key: [unclosed\n");
    write_file(root, "c.yaml", &resource("ConfigMap", "c"));

    let err = PackageReader::new(root).read().unwrap_err();
    assert!(err.to_string().contains("b.yaml"));
}

#[test]
fn test_missing_root_is_traversal_error() {
    let temp_dir = TempDir::new().unwrap();
    let err = PackageReader::new(temp_dir.path().join("missing"))
        .read()
        .unwrap_err();
    assert!(matches!(err, PackageError::Traversal { .. }));
}

#[test]
fn test_reading_does_not_modify_files() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let contents = resource("ConfigMap", "a");
    write_file(root, "a.yaml", &contents);

    PackageReader::new(root).read().unwrap();
    assert_eq!(fs::read_to_string(root.join("a.yaml")).unwrap(), contents);
}
